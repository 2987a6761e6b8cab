#![no_main]

use ergo_core::config::Config;
use ergo_core::pipeline::Pipeline;
use libfuzzer_sys::fuzz_target;

// Arbitrary, possibly non-monotonic and degenerate impulse timestamps must
// never panic the pipeline, regardless of ordering or repeats.
fuzz_target!(|timestamps: Vec<u64>| {
    let Ok(mut pipeline) = Pipeline::new(Config::default()) else {
        return;
    };
    for t in timestamps {
        pipeline.on_edge(t);
        pipeline.tick(t);
        let _ = pipeline.snapshot();
    }
});
