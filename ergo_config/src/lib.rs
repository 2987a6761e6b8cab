//! TOML configuration schema for the rowing pipeline.
//!
//! [`Config`] mirrors [`ergo_core::config::Config`] field-for-field but is
//! `serde::Deserialize` and carries `#[serde(default)]` so a settings file can
//! specify only the fields it wants to override. [`Config::validate`] re-runs
//! the core's own boundary checks (so a malformed file is rejected with a
//! readable message before `TryFrom` ever touches [`ergo_core`]) and then
//! layers on checks that only make sense at the TOML surface, such as the
//! `detection` string.
use ergo_core::Real;
use ergo_core::config::{
    DragFactorSettings as CoreDrag, MachineSettings as CoreMachine,
    SensorSignalSettings as CoreSensor, StrokePhaseDetectionSettings as CoreStroke,
};
use serde::Deserialize;

/// Mirrors [`ergo_core::types::StrokeDetectionType`]; kept separate so this
/// crate does not need `ergo_core` to carry a `serde` dependency.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    Torque,
    Slope,
    #[default]
    Both,
}

impl From<DetectionMode> for ergo_core::config::StrokeDetectionType {
    fn from(m: DetectionMode) -> Self {
        use ergo_core::config::StrokeDetectionType as T;
        match m {
            DetectionMode::Torque => T::Torque,
            DetectionMode::Slope => T::Slope,
            DetectionMode::Both => T::Both,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct MachineCfg {
    pub impulses_per_revolution: u32,
    pub flywheel_inertia: Real,
    pub sprocket_radius_m: Real,
    pub concept_2_magic_number: Real,
}

impl Default for MachineCfg {
    fn default() -> Self {
        let d = CoreMachine::default();
        Self {
            impulses_per_revolution: d.impulses_per_revolution,
            flywheel_inertia: d.flywheel_inertia,
            sprocket_radius_m: d.sprocket_radius_m,
            concept_2_magic_number: d.concept_2_magic_number,
        }
    }
}

impl From<MachineCfg> for CoreMachine {
    fn from(c: MachineCfg) -> Self {
        Self {
            impulses_per_revolution: c.impulses_per_revolution,
            flywheel_inertia: c.flywheel_inertia,
            sprocket_radius_m: c.sprocket_radius_m,
            concept_2_magic_number: c.concept_2_magic_number,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SensorCfg {
    pub enable_debounce_filter: bool,
    pub rotation_debounce_time_min_ms: u32,
    pub rowing_stopped_threshold_period_ms: u32,
}

impl Default for SensorCfg {
    fn default() -> Self {
        let d = CoreSensor::default();
        Self {
            enable_debounce_filter: d.enable_debounce_filter,
            rotation_debounce_time_min_ms: d.rotation_debounce_time_min_ms,
            rowing_stopped_threshold_period_ms: d.rowing_stopped_threshold_period_ms,
        }
    }
}

impl From<SensorCfg> for CoreSensor {
    fn from(c: SensorCfg) -> Self {
        Self {
            enable_debounce_filter: c.enable_debounce_filter,
            rotation_debounce_time_min_ms: c.rotation_debounce_time_min_ms,
            rowing_stopped_threshold_period_ms: c.rowing_stopped_threshold_period_ms,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct DragCfg {
    pub goodness_of_fit_threshold: Real,
    pub max_drag_factor_recovery_period_ms: u32,
    pub lower_drag_factor_threshold: Real,
    pub upper_drag_factor_threshold: Real,
    pub drag_coefficients_array_length: usize,
}

impl Default for DragCfg {
    fn default() -> Self {
        let d = CoreDrag::default();
        Self {
            goodness_of_fit_threshold: d.goodness_of_fit_threshold,
            max_drag_factor_recovery_period_ms: d.max_drag_factor_recovery_period_ms,
            lower_drag_factor_threshold: d.lower_drag_factor_threshold,
            upper_drag_factor_threshold: d.upper_drag_factor_threshold,
            drag_coefficients_array_length: d.drag_coefficients_array_length,
        }
    }
}

impl From<DragCfg> for CoreDrag {
    fn from(c: DragCfg) -> Self {
        Self {
            goodness_of_fit_threshold: c.goodness_of_fit_threshold,
            max_drag_factor_recovery_period_ms: c.max_drag_factor_recovery_period_ms,
            lower_drag_factor_threshold: c.lower_drag_factor_threshold,
            upper_drag_factor_threshold: c.upper_drag_factor_threshold,
            drag_coefficients_array_length: c.drag_coefficients_array_length,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct StrokeCfg {
    pub detection: DetectionMode,
    pub minimum_powered_torque: Real,
    pub minimum_drag_torque: Real,
    pub minimum_recovery_slope: Real,
    pub minimum_recovery_slope_margin: Real,
    pub minimum_recovery_time_ms: u32,
    pub minimum_drive_time_ms: u32,
    pub impulse_data_array_length: usize,
    pub drive_handle_forces_max_capacity: usize,
}

impl Default for StrokeCfg {
    fn default() -> Self {
        let d = CoreStroke::default();
        Self {
            detection: DetectionMode::default(),
            minimum_powered_torque: d.minimum_powered_torque,
            minimum_drag_torque: d.minimum_drag_torque,
            minimum_recovery_slope: d.minimum_recovery_slope,
            minimum_recovery_slope_margin: d.minimum_recovery_slope_margin,
            minimum_recovery_time_ms: d.minimum_recovery_time_ms,
            minimum_drive_time_ms: d.minimum_drive_time_ms,
            impulse_data_array_length: d.impulse_data_array_length,
            drive_handle_forces_max_capacity: d.drive_handle_forces_max_capacity,
        }
    }
}

impl From<StrokeCfg> for CoreStroke {
    fn from(c: StrokeCfg) -> Self {
        Self {
            stroke_detection_type: c.detection.into(),
            minimum_powered_torque: c.minimum_powered_torque,
            minimum_drag_torque: c.minimum_drag_torque,
            minimum_recovery_slope: c.minimum_recovery_slope,
            minimum_recovery_slope_margin: c.minimum_recovery_slope_margin,
            minimum_recovery_time_ms: c.minimum_recovery_time_ms,
            minimum_drive_time_ms: c.minimum_drive_time_ms,
            impulse_data_array_length: c.impulse_data_array_length,
            drive_handle_forces_max_capacity: c.drive_handle_forces_max_capacity,
        }
    }
}

/// Top-level settings file schema, e.g.:
///
/// ```toml
/// [machine]
/// impulses_per_revolution = 4
///
/// [stroke]
/// detection = "both"
/// ```
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub machine: MachineCfg,
    pub sensor: SensorCfg,
    pub drag: DragCfg,
    pub stroke: StrokeCfg,
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.machine.impulses_per_revolution == 0 {
            eyre::bail!("machine.impulses_per_revolution must be > 0");
        }
        if self.machine.flywheel_inertia <= 0.0 {
            eyre::bail!(
                "machine.flywheel_inertia must be > 0, got {}",
                self.machine.flywheel_inertia
            );
        }
        if self.machine.sprocket_radius_m <= 0.0 {
            eyre::bail!(
                "machine.sprocket_radius_m must be > 0, got {}",
                self.machine.sprocket_radius_m
            );
        }
        if self.sensor.rotation_debounce_time_min_ms == 0 {
            eyre::bail!("sensor.rotation_debounce_time_min_ms must be > 0");
        }
        if self.sensor.rowing_stopped_threshold_period_ms == 0 {
            eyre::bail!("sensor.rowing_stopped_threshold_period_ms must be > 0");
        }
        if !(0.0..=1.0).contains(&self.drag.goodness_of_fit_threshold) {
            eyre::bail!(
                "drag.goodness_of_fit_threshold must be in [0.0, 1.0], got {}",
                self.drag.goodness_of_fit_threshold
            );
        }
        if self.drag.lower_drag_factor_threshold >= self.drag.upper_drag_factor_threshold {
            eyre::bail!(
                "drag.lower_drag_factor_threshold ({}) must be < drag.upper_drag_factor_threshold ({})",
                self.drag.lower_drag_factor_threshold,
                self.drag.upper_drag_factor_threshold
            );
        }
        if self.drag.drag_coefficients_array_length == 0 {
            eyre::bail!("drag.drag_coefficients_array_length must be > 0");
        }
        if self.stroke.impulse_data_array_length < 2 {
            eyre::bail!(
                "stroke.impulse_data_array_length must be >= 2, got {}",
                self.stroke.impulse_data_array_length
            );
        }
        if self.stroke.drive_handle_forces_max_capacity == 0 {
            eyre::bail!("stroke.drive_handle_forces_max_capacity must be > 0");
        }
        if self.stroke.minimum_recovery_slope_margin < 0.0 {
            eyre::bail!(
                "stroke.minimum_recovery_slope_margin must be >= 0.0, got {}",
                self.stroke.minimum_recovery_slope_margin
            );
        }
        Ok(())
    }
}

impl From<Config> for ergo_core::config::Config {
    fn from(c: Config) -> Self {
        Self {
            machine: c.machine.into(),
            sensor: c.sensor.into(),
            drag: c.drag.into(),
            stroke: c.stroke.into(),
        }
    }
}

/// Parses and validates a settings file, returning the `ergo_core` config
/// ready to build or reconfigure a pipeline with.
///
/// The core's own [`ergo_core::config::Config::validate`] runs again as a
/// second, load-bearing check: this function's `validate` catches the
/// TOML-surface mistakes a user is likely to make, but the core check is the
/// one the rest of the system actually relies on to never see an invalid
/// configuration.
pub fn load_toml(s: &str) -> eyre::Result<ergo_core::config::Config> {
    let parsed: Config = toml::from_str(s).map_err(|e| eyre::eyre!("parse settings: {e}"))?;
    parsed.validate()?;
    let core: ergo_core::config::Config = parsed.into();
    core.validate()
        .map_err(|e| eyre::eyre!("invalid settings: {e}"))?;
    Ok(core)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_parses_to_defaults() {
        let cfg = load_toml("").unwrap();
        assert_eq!(cfg, ergo_core::config::Config::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = load_toml(
            r#"
            [machine]
            impulses_per_revolution = 8

            [stroke]
            detection = "slope"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.machine.impulses_per_revolution, 8);
        assert_eq!(
            cfg.stroke.stroke_detection_type,
            ergo_core::config::StrokeDetectionType::Slope
        );
        assert_eq!(
            cfg.machine.flywheel_inertia,
            ergo_core::config::MachineSettings::default().flywheel_inertia
        );
    }

    #[test]
    fn unknown_detection_mode_is_rejected() {
        let err = load_toml("[stroke]\ndetection = \"sideways\"").unwrap_err();
        assert!(err.to_string().contains("parse settings"));
    }

    #[test]
    fn zero_magnet_count_is_rejected_before_reaching_the_core() {
        let err = load_toml("[machine]\nimpulses_per_revolution = 0").unwrap_err();
        assert!(err.to_string().contains("impulses_per_revolution"));
    }

    #[test]
    fn inverted_drag_thresholds_are_rejected() {
        let err = load_toml(
            r#"
            [drag]
            lower_drag_factor_threshold = 300.0
            upper_drag_factor_threshold = 60.0
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("drag_factor_threshold"));
    }
}
