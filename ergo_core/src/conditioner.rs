//! Sensor signal conditioning: debounce and delta-time extraction.
use crate::config::SensorSignalSettings;
use crate::types::Impulse;

/// Timestamps falling edges, rejects reed-switch bounce, and produces clean
/// inter-impulse delta times. Runs in interrupt context via
/// [`crate::pipeline::Pipeline::on_edge`]; allocation-free and non-blocking.
#[derive(Debug, Clone)]
pub struct Conditioner {
    enable_debounce: bool,
    debounce_min_ms: u32,
    stopped_threshold_us: u64,
    last_edge_us: Option<u64>,
    last_delta_us: Option<u64>,
    raw_impulse_count: u64,
}

impl Conditioner {
    pub fn new(cfg: &SensorSignalSettings) -> Self {
        Self {
            enable_debounce: cfg.enable_debounce_filter,
            debounce_min_ms: cfg.rotation_debounce_time_min_ms,
            stopped_threshold_us: u64::from(cfg.rowing_stopped_threshold_period_ms) * 1_000,
            last_edge_us: None,
            last_delta_us: None,
            raw_impulse_count: 0,
        }
    }

    pub fn reconfigure(&mut self, cfg: &SensorSignalSettings) {
        self.enable_debounce = cfg.enable_debounce_filter;
        self.debounce_min_ms = cfg.rotation_debounce_time_min_ms;
        self.stopped_threshold_us = u64::from(cfg.rowing_stopped_threshold_period_ms) * 1_000;
    }

    /// Accepts one falling edge, returning the conditioned impulse if it is not
    /// discarded as bounce. The first edge after a reset establishes the
    /// baseline and is always accepted with `delta_us == 0`.
    pub fn on_edge(&mut self, timestamp_us: u64) -> Option<Impulse> {
        let Some(prev) = self.last_edge_us else {
            self.last_edge_us = Some(timestamp_us);
            self.raw_impulse_count += 1;
            return Some(Impulse {
                timestamp_us,
                delta_us: 0,
            });
        };
        let delta = timestamp_us.saturating_sub(prev);
        let delta_ms = delta / 1_000;
        let min_ms = u64::from(self.debounce_min_ms);

        let rejected = if self.enable_debounce {
            match self.last_delta_us {
                Some(last_delta) => delta.abs_diff(last_delta) > last_delta && delta_ms < min_ms,
                None => false,
            }
        } else {
            delta_ms < min_ms
        };
        if rejected {
            tracing::trace!(timestamp_us, delta, "impulse rejected as bounce");
            return None;
        }

        self.last_edge_us = Some(timestamp_us);
        self.last_delta_us = Some(delta);
        self.raw_impulse_count += 1;
        Some(Impulse {
            timestamp_us,
            delta_us: delta,
        })
    }

    /// `true` once `now_us` is at least `rowing_stopped_threshold_period_ms` past
    /// the last accepted edge. Checked once per main-task iteration.
    pub fn is_stopped_at(&self, now_us: u64) -> bool {
        match self.last_edge_us {
            Some(last) => now_us.saturating_sub(last) >= self.stopped_threshold_us,
            None => false,
        }
    }

    pub fn raw_impulse_count(&self) -> u64 {
        self.raw_impulse_count
    }

    pub fn last_edge_us(&self) -> Option<u64> {
        self.last_edge_us
    }

    pub fn reset(&mut self) {
        self.last_edge_us = None;
        self.last_delta_us = None;
        self.raw_impulse_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(debounce: bool, min_ms: u32) -> SensorSignalSettings {
        SensorSignalSettings {
            enable_debounce_filter: debounce,
            rotation_debounce_time_min_ms: min_ms,
            rowing_stopped_threshold_period_ms: 2_000,
        }
    }

    #[test]
    fn first_edge_establishes_baseline() {
        let mut c = Conditioner::new(&cfg(true, 10));
        let imp = c.on_edge(1_000).unwrap();
        assert_eq!(imp.delta_us, 0);
        assert_eq!(c.raw_impulse_count(), 1);
    }

    #[test]
    fn steady_state_accepted() {
        let mut c = Conditioner::new(&cfg(true, 10));
        c.on_edge(0);
        c.on_edge(100_000);
        let imp = c.on_edge(200_000).unwrap();
        assert_eq!(imp.delta_us, 100_000);
    }

    #[test]
    fn relative_spike_rejected_when_debounce_enabled() {
        let mut c = Conditioner::new(&cfg(true, 50));
        c.on_edge(0);
        c.on_edge(100_000); // establishes last_delta = 100ms
        // bounce: much shorter than previous AND below debounce floor
        assert!(c.on_edge(110_000).is_none());
    }

    #[test]
    fn short_interval_always_rejected_when_debounce_disabled() {
        let mut c = Conditioner::new(&cfg(false, 50));
        c.on_edge(0);
        assert!(c.on_edge(10_000).is_none());
        let imp = c.on_edge(100_000).unwrap();
        assert_eq!(imp.delta_us, 100_000);
    }

    #[test]
    fn rejected_edge_does_not_move_baseline() {
        let mut c = Conditioner::new(&cfg(true, 50));
        c.on_edge(0);
        c.on_edge(100_000);
        c.on_edge(110_000); // rejected bounce
        let imp = c.on_edge(200_000).unwrap();
        // delta should be measured from the last *accepted* edge (100_000), not the bounce
        assert_eq!(imp.delta_us, 100_000);
    }

    #[test]
    fn stopped_detection_uses_last_accepted_edge() {
        let mut c = Conditioner::new(&cfg(true, 10));
        c.on_edge(0);
        assert!(!c.is_stopped_at(1_000_000));
        assert!(c.is_stopped_at(2_000_001));
    }

    #[test]
    fn reset_clears_baseline() {
        let mut c = Conditioner::new(&cfg(true, 10));
        c.on_edge(0);
        c.reset();
        let imp = c.on_edge(500).unwrap();
        assert_eq!(imp.delta_us, 0);
    }
}
