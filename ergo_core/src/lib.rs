#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Hardware-agnostic rowing-ergometer pipeline.
//!
//! Converts a stream of flywheel-magnet impulse timestamps into rowing metrics:
//! stroke count, drive/recovery durations, average stroke power, distance, drag
//! factor, and a per-drive handle-force curve.
//!
//! ## Architecture
//!
//! - **Conditioning**: debounce and delta-time extraction (`conditioner` module)
//! - **Cyclic correction**: per-magnet bias learning (`cyclic_filter` module)
//! - **Regression primitives**: `Series`, OLS and Theil-Sen estimators (`series`, `regression`)
//! - **Kinematics**: angular velocity/acceleration, torque, drag, handle force (`kinematics`)
//! - **Stroke detection**: Drive/Recovery state machine (`stroke_machine`)
//! - **Aggregation**: rolling `RowerMetrics` (`metrics`)
//! - **Wiring**: `Pipeline`, the single value that owns all of the above (`pipeline`)
//!
//! ## Numeric Precision
//!
//! Internals operate on a single pipeline-wide alias, [`Real`], `f32` by default
//! or `f64` with the `f64` feature. See `types::Real`.
//!
//! ## Concurrency
//!
//! `queue::EdgeQueue` is the only structure ever touched from interrupt context;
//! everything else in this crate runs on a single cooperative main-task thread.
//! See the crate-level invariants in the workspace `SPEC_FULL.md`.

pub mod conditioner;
pub mod config;
pub mod cyclic_filter;
pub mod error;
pub mod kinematics;
pub mod metrics;
pub mod pipeline;
pub mod queue;
pub mod regression;
pub mod series;
pub mod stroke_machine;
pub mod types;

pub use config::{
    Config, DragFactorSettings, MachineSettings, SensorSignalSettings, StrokeDetectionType,
    StrokePhaseDetectionSettings,
};
pub use error::ConfigError;
pub use pipeline::Pipeline;
pub use types::{CleanSample, Impulse, Real, RowerMetrics, StrokeEvent, StrokePhase};
