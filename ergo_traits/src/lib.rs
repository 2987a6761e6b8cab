#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Collaborator traits for the rowing pipeline's external world.
//!
//! - `EdgeSource` yields raw falling-edge timestamps, standing in for the sensor ISR.
//! - `BleNotifier` receives metrics snapshots, standing in for a BLE GATT characteristic.
//! - `SettingsStore` persists/loads validated configuration, standing in for EEPROM/NVS.
//! - `clock` offers a `MonotonicClock` for deterministic timing and testability in the
//!   host/demo crates. The pipeline core itself never reads wall-clock time directly.
//!
//! `ergo_core` depends on none of these at the type level — it only accepts plain
//! microsecond timestamps and plain data through `on_edge`/`configure`. They exist so
//! the host and CLI crates can be written against an abstraction instead of a concrete
//! simulated sensor or file format, and so tests can supply mocks.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Produces raw falling-edge timestamps (microseconds, monotonic) one at a time.
///
/// Implementations include a simulated magnet wheel and a file-replay reader.
/// `next_edge` returns `None` when the source is exhausted (demo/replay only;
/// a live sensor never returns `None`).
pub trait EdgeSource {
    fn next_edge(&mut self) -> Option<u64>;
}

/// Receives rower metrics snapshots for external consumption (BLE notify analogue).
pub trait BleNotifier {
    fn notify(&mut self, snapshot: &dyn std::fmt::Debug);
}

/// Persists and loads raw configuration bytes (TOML text) for the settings layer.
pub trait SettingsStore {
    fn load(&mut self) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
    fn save(&mut self, toml_text: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
