#![no_main]

use libfuzzer_sys::fuzz_target;

// Any input, valid TOML or not, must never panic the loader.
fuzz_target!(|data: &str| {
    let _ = ergo_config::load_toml(data);
});
