//! Drive/Recovery/Stopped stroke phase state machine.
use crate::config::StrokePhaseDetectionSettings;
use crate::types::{Real, StrokeDetectionType, StrokeEvent, StrokePhase};

/// What the state machine did with one impulse, and what it needs the pipeline
/// to relay to the other components.
#[derive(Debug, Clone, Default)]
pub struct StrokeOutcome {
    pub phase: StrokePhase,
    /// A completed stroke, emitted on the Drive -> Recovery edge.
    pub event: Option<StrokeEvent>,
    /// The pipeline should call `kinematics.begin_recovery_window()`.
    pub entered_recovery: bool,
    /// The pipeline should call `kinematics.end_recovery_window()` and fold the
    /// result into the live drag coefficient before building this event's `drag_factor`.
    pub entered_drive_from_recovery: bool,
}

pub struct StrokeStateMachine {
    cfg: StrokePhaseDetectionSettings,
    phase: StrokePhase,
    phase_entered_us: u64,
    drive_start_us: u64,
    recovery_start_us: u64,
    handle_forces: Vec<Real>,
    power_samples: Vec<(Real, Real)>,
    last_recovery_duration_s: Real,
}

impl StrokeStateMachine {
    pub fn new(cfg: StrokePhaseDetectionSettings) -> Self {
        Self {
            cfg,
            phase: StrokePhase::Stopped,
            phase_entered_us: 0,
            drive_start_us: 0,
            recovery_start_us: 0,
            handle_forces: Vec::with_capacity(cfg.drive_handle_forces_max_capacity),
            power_samples: Vec::new(),
            last_recovery_duration_s: 0.0,
        }
    }

    pub fn reconfigure(&mut self, cfg: StrokePhaseDetectionSettings) {
        self.cfg = cfg;
    }

    pub fn phase(&self) -> StrokePhase {
        self.phase
    }

    pub fn handle_force_curve(&self) -> &[Real] {
        &self.handle_forces
    }

    fn drive_exit_criteria(&self, torque: Real, omega_slope: Real) -> bool {
        match self.cfg.stroke_detection_type {
            StrokeDetectionType::Torque => torque < self.cfg.minimum_drag_torque,
            StrokeDetectionType::Slope => omega_slope <= self.cfg.minimum_recovery_slope,
            StrokeDetectionType::Both => {
                let distance = torque - self.cfg.minimum_drag_torque;
                if distance.abs() <= self.cfg.minimum_recovery_slope_margin {
                    omega_slope <= self.cfg.minimum_recovery_slope
                } else {
                    distance < 0.0
                }
            }
        }
    }

    fn recovery_exit_criteria(&self, torque: Real, omega_slope: Real) -> bool {
        let torque_ok = matches!(
            self.cfg.stroke_detection_type,
            StrokeDetectionType::Torque | StrokeDetectionType::Both
        ) && torque > self.cfg.minimum_powered_torque;
        let slope_ok = matches!(
            self.cfg.stroke_detection_type,
            StrokeDetectionType::Slope | StrokeDetectionType::Both
        ) && omega_slope > 0.0;
        torque_ok || slope_ok
    }

    fn transition_to_drive(&mut self, now_us: u64) {
        self.phase = StrokePhase::Drive;
        self.phase_entered_us = now_us;
        self.drive_start_us = now_us;
        self.handle_forces.clear();
        self.power_samples.clear();
    }

    fn transition_to_recovery(&mut self, now_us: u64) {
        self.phase = StrokePhase::Recovery;
        self.phase_entered_us = now_us;
        self.recovery_start_us = now_us;
    }

    fn trapezoidal_power_integral(&self) -> Real {
        self.power_samples
            .windows(2)
            .map(|w| 0.5 * (w[0].1 + w[1].1) * (w[1].0 - w[0].0))
            .sum()
    }

    fn complete_drive(&mut self, now_us: u64, drag_factor: Real, forced: bool) -> StrokeEvent {
        let drive_duration_s = (now_us.saturating_sub(self.drive_start_us)) as Real / 1_000_000.0;
        let avg_power_w = if drive_duration_s > Real::EPSILON {
            self.trapezoidal_power_integral() / drive_duration_s
        } else {
            0.0
        };
        StrokeEvent {
            drive_duration_s,
            recovery_duration_s: self.last_recovery_duration_s,
            avg_power_w,
            drag_factor,
            handle_force_curve: self.handle_forces.clone(),
            last_stroke_time_us: now_us,
            forced,
        }
    }

    /// Advances the state machine by one accepted impulse. `omega_slope` is the
    /// slope of the angular-velocity curve itself (i.e. angular acceleration,
    /// `alpha`), not the position slope. `drag_factor` is the kinematics
    /// estimator's *current* live value, used to stamp a completed stroke
    /// event; it should reflect any `end_recovery_window` update that happened
    /// for a just-prior impulse, not this one.
    pub fn on_impulse(
        &mut self,
        now_us: u64,
        t_s: Real,
        torque: Real,
        omega: Real,
        omega_slope: Real,
        handle_force: Real,
        drag_factor: Real,
    ) -> StrokeOutcome {
        let mut outcome = StrokeOutcome {
            phase: self.phase,
            ..Default::default()
        };

        match self.phase {
            StrokePhase::Stopped => {
                self.transition_to_drive(now_us);
                outcome.phase = StrokePhase::Drive;
            }
            StrokePhase::Drive => {
                let forced = if self.handle_forces.len() < self.cfg.drive_handle_forces_max_capacity {
                    self.handle_forces.push(handle_force);
                    self.power_samples.push((t_s, torque * omega));
                    false
                } else {
                    true
                };
                let elapsed_ms = now_us.saturating_sub(self.phase_entered_us) / 1_000;
                let min_time_elapsed = elapsed_ms >= u64::from(self.cfg.minimum_drive_time_ms);
                let criteria_met = forced || (min_time_elapsed && self.drive_exit_criteria(torque, omega_slope));
                if criteria_met {
                    let event = self.complete_drive(now_us, drag_factor, forced);
                    outcome.event = Some(event);
                    outcome.entered_recovery = true;
                    self.transition_to_recovery(now_us);
                }
                outcome.phase = self.phase;
            }
            StrokePhase::Recovery => {
                let elapsed_ms = now_us.saturating_sub(self.phase_entered_us) / 1_000;
                let min_time_elapsed = elapsed_ms >= u64::from(self.cfg.minimum_recovery_time_ms);
                if min_time_elapsed && self.recovery_exit_criteria(torque, omega_slope) {
                    self.last_recovery_duration_s =
                        (now_us.saturating_sub(self.recovery_start_us)) as Real / 1_000_000.0;
                    outcome.entered_drive_from_recovery = true;
                    self.transition_to_drive(now_us);
                }
                outcome.phase = self.phase;
            }
        }

        outcome
    }

    /// Forces a transition to `Stopped`: clears the handle-force vector and
    /// resets phase timing, but preserves nothing else (drag lives in the
    /// kinematics estimator and is untouched here).
    pub fn force_stopped(&mut self, now_us: u64) {
        self.phase = StrokePhase::Stopped;
        self.phase_entered_us = now_us;
        self.handle_forces.clear();
        self.power_samples.clear();
    }

    pub fn reset(&mut self) {
        self.phase = StrokePhase::Stopped;
        self.phase_entered_us = 0;
        self.drive_start_us = 0;
        self.recovery_start_us = 0;
        self.handle_forces.clear();
        self.power_samples.clear();
        self.last_recovery_duration_s = 0.0;
    }
}
