//! Wires the conditioner, cyclic-error filter, kinematics estimator, stroke
//! state machine and metrics aggregator into the single value that owns the
//! whole rowing pipeline.
//!
//! [`Pipeline`] is total: every public method runs to completion and mutates
//! owned state, never returning an error except at the configuration
//! boundary (`new`/`configure`). There is no global or static pipeline state;
//! the host constructs one instance and passes it down.
use crate::conditioner::Conditioner;
use crate::config::Config;
use crate::cyclic_filter::CyclicErrorFilter;
use crate::error::{ConfigError, Result};
use crate::kinematics::FlywheelKinematics;
use crate::metrics::MetricsAggregator;
use crate::queue::EdgeQueue;
use crate::stroke_machine::StrokeStateMachine;
use crate::types::{Impulse, Real, RowerMetrics, StrokeEvent, StrokePhase};

const EDGE_QUEUE_CAPACITY: usize = 64;

fn default_recording_capacity(number_of_slots: u32) -> usize {
    (number_of_slots as usize * 8).max(16)
}

/// One complete rowing-ergometer numerical pipeline.
///
/// `on_edge` is the ISR-safe entry point: bounded work, no allocation, no
/// blocking. Everything downstream (`drain`/`tick`) runs on the cooperative
/// main task.
pub struct Pipeline {
    config: Config,
    pending_config: Option<Config>,

    queue: EdgeQueue,
    conditioner: Conditioner,
    cyclic_filter: CyclicErrorFilter,
    kinematics: FlywheelKinematics,
    stroke_machine: StrokeStateMachine,
    metrics: MetricsAggregator,

    accepted_count: u64,
    cumulative_time_s: Real,
    last_delta_us: u64,
    last_event: Option<StrokeEvent>,
}

impl Pipeline {
    /// Builds a pipeline from a validated configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        let n = config.machine.impulses_per_revolution;
        Self {
            queue: EdgeQueue::new(EDGE_QUEUE_CAPACITY),
            conditioner: Conditioner::new(&config.sensor),
            // Aggressiveness is fixed at full correction; not exposed in `Config`.
            cyclic_filter: CyclicErrorFilter::new(n, 1.0, default_recording_capacity(n)),
            kinematics: FlywheelKinematics::new(
                &config.machine,
                &config.drag,
                config.stroke.impulse_data_array_length,
            ),
            stroke_machine: StrokeStateMachine::new(config.stroke),
            metrics: MetricsAggregator::new(),
            accepted_count: 0,
            cumulative_time_s: 0.0,
            last_delta_us: 0,
            last_event: None,
            pending_config: None,
            config,
        }
    }

    /// ISR-safe. Conditions the edge and, if accepted, enqueues it for the
    /// main task. Never blocks; drops the impulse (with a warning) if the
    /// queue is momentarily full.
    pub fn on_edge(&mut self, timestamp_us: u64) {
        if let Some(impulse) = self.conditioner.on_edge(timestamp_us) {
            if !self.queue.push(impulse) {
                tracing::warn!(timestamp_us, "edge queue full; impulse dropped");
            }
        }
    }

    /// Drains every impulse currently queued, running each through the full
    /// pipeline. Call once per main-task iteration, before `check_stopped`.
    pub fn drain(&mut self) {
        while let Some(impulse) = self.queue.pop() {
            self.process_impulse(impulse);
        }
    }

    /// Checks the stopped-state timeout against `now_us`. Call once per
    /// main-task iteration after `drain`.
    pub fn check_stopped(&mut self, now_us: u64) {
        if self.stroke_machine.phase() != StrokePhase::Stopped && self.conditioner.is_stopped_at(now_us) {
            self.stroke_machine.force_stopped(now_us);
            self.metrics.force_stopped();
            tracing::debug!(now_us, "rowing stopped: no impulses within threshold");
        }
    }

    /// Convenience: `drain` then `check_stopped`.
    pub fn tick(&mut self, now_us: u64) {
        self.drain();
        self.check_stopped(now_us);
    }

    fn process_impulse(&mut self, impulse: Impulse) {
        let n = self.config.machine.impulses_per_revolution;
        let relative_index = (self.accepted_count % u64::from(n)) as u32;

        let clean_delta_us = self
            .cyclic_filter
            .process(self.accepted_count, impulse.delta_us as Real);
        self.cumulative_time_s += clean_delta_us / 1_000_000.0;

        let theta = self.accepted_count as Real * std::f64::consts::TAU as Real / n as Real;
        let kin = self.kinematics.on_sample(self.cumulative_time_s, theta);
        let handle_force = kin.torque / self.kinematics.sprocket_radius_m();
        let drag_factor_for_event = self.kinematics.drag_coefficient();

        let outcome = self.stroke_machine.on_impulse(
            impulse.timestamp_us,
            self.cumulative_time_s,
            kin.torque,
            kin.omega,
            kin.alpha,
            handle_force,
            drag_factor_for_event,
        );

        if outcome.entered_recovery {
            self.kinematics.begin_recovery_window();
        }
        if outcome.entered_drive_from_recovery {
            self.kinematics.end_recovery_window();
        }

        self.metrics.on_impulse(
            impulse.timestamp_us,
            relative_index,
            n,
            self.kinematics.revolution_distance_m(),
            outcome.phase,
        );
        self.metrics
            .sync_handle_force_curve(self.stroke_machine.handle_force_curve(), outcome.phase);

        if let Some(event) = outcome.event {
            self.metrics.on_stroke_event(&event);
            tracing::debug!(
                drive_duration_s = event.drive_duration_s as f64,
                forced = event.forced,
                "stroke completed"
            );
            self.last_event = Some(event);
        }

        self.last_delta_us = impulse.delta_us;
        self.accepted_count += 1;

        tracing::trace!(
            impulse = self.accepted_count,
            omega = kin.omega as f64,
            torque = kin.torque as f64,
            "impulse processed"
        );
    }

    /// Validates and stages a new configuration; it takes effect on the next
    /// [`Pipeline::reset`], not immediately.
    pub fn configure(&mut self, config: Config) -> core::result::Result<(), ConfigError> {
        config.validate()?;
        self.pending_config = Some(config);
        Ok(())
    }

    /// Clears all state. Applies any configuration staged by `configure`.
    pub fn reset(&mut self) {
        if let Some(cfg) = self.pending_config.take() {
            self.config = cfg;
        }
        let rebuilt = Self::build(self.config);
        *self = rebuilt;
    }

    pub fn snapshot(&self) -> RowerMetrics {
        self.metrics.snapshot()
    }

    pub fn last_event(&self) -> Option<&StrokeEvent> {
        self.last_event.as_ref()
    }

    pub fn rev_count(&self) -> u32 {
        self.metrics.rev_count()
    }

    pub fn stroke_count(&self) -> u16 {
        self.metrics.stroke_count()
    }

    pub fn last_impulse_time(&self) -> u64 {
        self.conditioner.last_edge_us().unwrap_or(0)
    }

    pub fn delta_time_us(&self) -> u32 {
        self.last_delta_us.min(u64::from(u32::MAX)) as u32
    }

    /// Raw drag coefficient `k` from `dω/dt = -k·ω²`.
    pub fn drag_coefficient(&self) -> Real {
        self.kinematics.drag_coefficient()
    }

    /// Conventional display drag factor (`k · 1e6`, clamped to a byte), in the
    /// same scale as the configured drag thresholds.
    pub fn drag_factor(&self) -> u8 {
        let scaled = self.kinematics.drag_coefficient() * 1e6;
        scaled.clamp(0.0, u8::MAX as Real) as u8
    }

    pub fn distance_m(&self) -> Real {
        self.metrics.snapshot().distance_m
    }

    pub fn drive_duration_s(&self) -> Real {
        self.metrics.snapshot().drive_duration_s
    }

    pub fn recovery_duration_s(&self) -> Real {
        self.metrics.snapshot().recovery_duration_s
    }

    pub fn avg_stroke_power_w(&self) -> i16 {
        let w = self.metrics.snapshot().avg_stroke_power_w;
        w.clamp(i16::MIN as Real, i16::MAX as Real) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MachineSettings, StrokeDetectionType, StrokePhaseDetectionSettings};

    fn scenario_config() -> Config {
        Config {
            machine: MachineSettings {
                impulses_per_revolution: 4,
                flywheel_inertia: 0.0293,
                ..Default::default()
            },
            stroke: StrokePhaseDetectionSettings {
                stroke_detection_type: StrokeDetectionType::Both,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Concrete scenario 1: uniform flywheel, 4 magnets, 40 impulses at
    /// exactly 100ms apart. Constant speed never crosses the torque/slope
    /// thresholds, so no stroke is ever detected and the cyclic filter stays
    /// at identity since every slot sees the same delta.
    #[test]
    fn uniform_flywheel_produces_ten_revolutions_and_no_strokes() {
        let mut p = Pipeline::new(scenario_config()).unwrap();
        let mut t = 0u64;
        for _ in 0..40 {
            t += 100_000;
            p.on_edge(t);
            p.tick(t);
        }
        assert_eq!(p.rev_count(), 10);
        assert_eq!(p.stroke_count(), 0);
    }

    #[test]
    fn reset_clears_counts_but_new_config_is_staged_not_immediate() {
        let mut p = Pipeline::new(scenario_config()).unwrap();
        let mut t = 0u64;
        for _ in 0..8 {
            t += 100_000;
            p.on_edge(t);
            p.tick(t);
        }
        assert_eq!(p.rev_count(), 2);

        let mut staged = scenario_config();
        staged.machine.impulses_per_revolution = 8;
        p.configure(staged).unwrap();
        // still using the old config until reset()
        assert_eq!(p.rev_count(), 2);

        p.reset();
        assert_eq!(p.rev_count(), 0);
        assert_eq!(p.stroke_count(), 0);
    }

    #[test]
    fn invalid_configuration_is_rejected_at_the_boundary() {
        let mut cfg = scenario_config();
        cfg.machine.impulses_per_revolution = 0;
        assert!(Pipeline::new(cfg).is_err());
    }

    #[test]
    fn stopped_after_long_gap_clears_handle_force_curve() {
        let mut p = Pipeline::new(scenario_config()).unwrap();
        p.on_edge(0);
        p.tick(0);
        p.on_edge(100_000);
        p.tick(100_000);
        // no further edges; advance time well past the stopped threshold
        p.tick(10_000_000);
        assert!(p.snapshot().handle_force_curve.is_empty());
        assert_eq!(p.snapshot().phase, StrokePhase::Stopped);
    }
}
