//! Configuration validation errors.
//!
//! The pipeline itself is total (see module docs on [`crate::pipeline`]): once a
//! [`crate::config::Config`] has passed [`crate::config::Config::validate`], nothing
//! downstream returns a `Result`. This is the only fallible surface in the crate.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("impulses_per_revolution must be nonzero")]
    ZeroMagnetCount,
    #[error("flywheel_inertia must be positive, got {0}")]
    NonPositiveInertia(f64),
    #[error("sprocket_radius_m must be positive, got {0}")]
    NonPositiveSprocketRadius(f64),
    #[error("rotation_debounce_time_min_ms must be nonzero")]
    ZeroDebounceTime,
    #[error("rowing_stopped_threshold_period_ms must be nonzero")]
    ZeroStoppedThreshold,
    #[error("goodness_of_fit_threshold must be within [0, 1], got {0}")]
    GoodnessOfFitOutOfRange(f64),
    #[error("drag factor thresholds are inverted: lower {lower} >= upper {upper}")]
    InvertedDragThresholds { lower: f64, upper: f64 },
    #[error("drag_coefficients_array_length must be nonzero")]
    ZeroDragWindow,
    #[error("impulse_data_array_length must be at least 2, got {0}")]
    ImpulseWindowTooSmall(u32),
    #[error("drive_handle_forces_max_capacity must be nonzero")]
    ZeroHandleForceCapacity,
    #[error("minimum_recovery_slope_margin must be nonnegative, got {0}")]
    NegativeSlopeMargin(f64),
}

pub type Result<T> = core::result::Result<T, ConfigError>;
