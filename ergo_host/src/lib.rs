#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Host-side collaborators for running [`ergo_core::Pipeline`] without real
//! hardware: a simulated/replay sensor, a logging BLE notifier, and a
//! file-backed settings store. None of this is on the pipeline's hot path —
//! it exists for the demo CLI and for integration tests.
pub mod ble;
pub mod error;
pub mod sensor;
pub mod settings;
pub mod util;

pub use ble::{LoggingBleNotifier, RecordingBleNotifier};
pub use error::{HostError, Result};
pub use sensor::{ReplaySensor, SimulatedSensor};
pub use settings::{FileSettingsStore, MemorySettingsStore};
