//! Runtime configuration types for the rowing pipeline.
//!
//! These are the validated structs [`crate::pipeline::Pipeline`] is built and
//! reconfigured with. They are separate from the TOML-deserialized schema in
//! `ergo_config`, which parses into (or convertible-to) these same shapes and
//! calls [`Config::validate`] at the boundary before anything reaches the core.
use crate::error::{ConfigError, Result};
use crate::types::Real;
pub use crate::types::StrokeDetectionType;

/// Mechanical and conversion constants for the specific machine being monitored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineSettings {
    /// Magnet count per flywheel revolution; also the cyclic-error slot count.
    pub impulses_per_revolution: u32,
    /// Flywheel moment of inertia, kg·m^2.
    pub flywheel_inertia: Real,
    /// Effective sprocket radius, meters.
    pub sprocket_radius_m: Real,
    /// Distance-conversion constant (Concept2 pace convention).
    pub concept_2_magic_number: Real,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            impulses_per_revolution: 4,
            flywheel_inertia: 0.0293,
            sprocket_radius_m: 0.045,
            concept_2_magic_number: 2.8,
        }
    }
}

/// Sensor signal conditioning and stopped-state detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSignalSettings {
    /// Enables the relative-spike debouncer.
    pub enable_debounce_filter: bool,
    /// Hard minimum accepted inter-impulse interval, milliseconds.
    pub rotation_debounce_time_min_ms: u32,
    /// No-impulse period after which the machine is considered stopped, milliseconds.
    pub rowing_stopped_threshold_period_ms: u32,
}

impl Default for SensorSignalSettings {
    fn default() -> Self {
        Self {
            enable_debounce_filter: true,
            rotation_debounce_time_min_ms: 10,
            rowing_stopped_threshold_period_ms: 2_000,
        }
    }
}

/// Drag-factor estimation bounds and windowing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragFactorSettings {
    /// Minimum acceptable R^2 for a recovery-window drag regression to be accepted.
    pub goodness_of_fit_threshold: Real,
    /// Cap on the recovery window used for a single drag estimate, milliseconds.
    pub max_drag_factor_recovery_period_ms: u32,
    /// Lower bound on accepted drag slope, x1e-6.
    pub lower_drag_factor_threshold: Real,
    /// Upper bound on accepted drag slope, x1e-6.
    pub upper_drag_factor_threshold: Real,
    /// Length of the median window over accepted drag slopes.
    pub drag_coefficients_array_length: usize,
}

impl Default for DragFactorSettings {
    fn default() -> Self {
        Self {
            goodness_of_fit_threshold: 0.97,
            max_drag_factor_recovery_period_ms: 6_000,
            lower_drag_factor_threshold: 60.0,
            upper_drag_factor_threshold: 300.0,
            drag_coefficients_array_length: 5,
        }
    }
}

/// Stroke state machine thresholds and windowing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePhaseDetectionSettings {
    pub stroke_detection_type: StrokeDetectionType,
    /// Torque above which Recovery -> Drive fires, N·m.
    pub minimum_powered_torque: Real,
    /// Torque below which Drive -> Recovery fires, N·m.
    pub minimum_drag_torque: Real,
    /// Angular-velocity slope at/below which Drive -> Recovery fires (slope criterion).
    pub minimum_recovery_slope: Real,
    /// Tolerance band around `minimum_recovery_slope`/torque consulted only for `Both`.
    pub minimum_recovery_slope_margin: Real,
    pub minimum_recovery_time_ms: u32,
    pub minimum_drive_time_ms: u32,
    /// Rolling window length for the angular-position regressions.
    pub impulse_data_array_length: usize,
    /// Per-drive handle-force vector capacity; exceeding it forces a recovery transition.
    pub drive_handle_forces_max_capacity: usize,
}

impl Default for StrokePhaseDetectionSettings {
    fn default() -> Self {
        Self {
            stroke_detection_type: StrokeDetectionType::Both,
            minimum_powered_torque: 0.5,
            minimum_drag_torque: 0.2,
            minimum_recovery_slope: 0.0,
            minimum_recovery_slope_margin: 0.05,
            minimum_recovery_time_ms: 300,
            minimum_drive_time_ms: 200,
            impulse_data_array_length: 6,
            drive_handle_forces_max_capacity: 64,
        }
    }
}

/// The full, validated configuration a [`crate::pipeline::Pipeline`] is built or
/// reconfigured with.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Config {
    pub machine: MachineSettings,
    pub sensor: SensorSignalSettings,
    pub drag: DragFactorSettings,
    pub stroke: StrokePhaseDetectionSettings,
}

impl Config {
    /// Rejects out-of-range values before they can reach the pipeline.
    ///
    /// The core never observes an invalid configuration: this is the sole
    /// boundary check, called directly here and again (wrapped in `eyre`) by the
    /// `ergo_config` crate when loading from TOML.
    pub fn validate(&self) -> Result<()> {
        if self.machine.impulses_per_revolution == 0 {
            return Err(ConfigError::ZeroMagnetCount);
        }
        if self.machine.flywheel_inertia <= 0.0 {
            return Err(ConfigError::NonPositiveInertia(
                self.machine.flywheel_inertia as f64,
            ));
        }
        if self.machine.sprocket_radius_m <= 0.0 {
            return Err(ConfigError::NonPositiveSprocketRadius(
                self.machine.sprocket_radius_m as f64,
            ));
        }
        if self.sensor.rotation_debounce_time_min_ms == 0 {
            return Err(ConfigError::ZeroDebounceTime);
        }
        if self.sensor.rowing_stopped_threshold_period_ms == 0 {
            return Err(ConfigError::ZeroStoppedThreshold);
        }
        if !(0.0..=1.0).contains(&self.drag.goodness_of_fit_threshold) {
            return Err(ConfigError::GoodnessOfFitOutOfRange(
                self.drag.goodness_of_fit_threshold as f64,
            ));
        }
        if self.drag.lower_drag_factor_threshold >= self.drag.upper_drag_factor_threshold {
            return Err(ConfigError::InvertedDragThresholds {
                lower: self.drag.lower_drag_factor_threshold as f64,
                upper: self.drag.upper_drag_factor_threshold as f64,
            });
        }
        if self.drag.drag_coefficients_array_length == 0 {
            return Err(ConfigError::ZeroDragWindow);
        }
        if self.stroke.impulse_data_array_length < 2 {
            return Err(ConfigError::ImpulseWindowTooSmall(
                self.stroke.impulse_data_array_length as u32,
            ));
        }
        if self.stroke.drive_handle_forces_max_capacity == 0 {
            return Err(ConfigError::ZeroHandleForceCapacity);
        }
        if self.stroke.minimum_recovery_slope_margin < 0.0 {
            return Err(ConfigError::NegativeSlopeMargin(
                self.stroke.minimum_recovery_slope_margin as f64,
            ));
        }
        Ok(())
    }
}
