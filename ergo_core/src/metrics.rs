//! Aggregates per-impulse and per-stroke updates into the externally-visible
//! [`RowerMetrics`] record. Exclusive owner of that record.
use crate::types::{Real, RowerMetrics, StrokeEvent, StrokePhase};

#[derive(Debug, Default)]
pub struct MetricsAggregator {
    metrics: RowerMetrics,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per accepted impulse. `relative_index` comes from the
    /// cyclic-error filter; a revolution has just completed when this
    /// impulse is the last slot of its group, i.e.
    /// `relative_index + 1 == impulses_per_revolution`.
    pub fn on_impulse(
        &mut self,
        now_us: u64,
        relative_index: u32,
        impulses_per_revolution: u32,
        revolution_distance_m: Real,
        phase: StrokePhase,
    ) {
        self.metrics.last_rev_time_us = now_us;
        if relative_index + 1 == impulses_per_revolution {
            self.metrics.rev_count += 1;
            self.metrics.distance_m += revolution_distance_m;
        }
        self.metrics.phase = phase;
    }

    pub fn on_stroke_event(&mut self, event: &StrokeEvent) {
        self.metrics.last_stroke_time_us = event.last_stroke_time_us;
        self.metrics.stroke_count += 1;
        self.metrics.drive_duration_s = event.drive_duration_s;
        self.metrics.recovery_duration_s = event.recovery_duration_s;
        self.metrics.avg_stroke_power_w = event.avg_power_w;
        self.metrics.drag_coefficient = event.drag_factor;
        self.metrics.handle_force_curve.clone_from(&event.handle_force_curve);
    }

    /// Mirrors the in-progress drive's handle-force vector so a snapshot taken
    /// mid-drive reflects forces accumulated so far. Outside the drive phase
    /// the vector is cleared instead: it must stay empty during recovery, and
    /// the completed curve is already preserved on the `StrokeEvent`.
    pub fn sync_handle_force_curve(&mut self, curve: &[Real], phase: StrokePhase) {
        self.metrics.handle_force_curve.clear();
        if phase == StrokePhase::Drive {
            self.metrics.handle_force_curve.extend_from_slice(curve);
        }
    }

    /// Stopped-state freeze: handle-force vector clears, drag and distance are
    /// preserved untouched.
    pub fn force_stopped(&mut self) {
        self.metrics.handle_force_curve.clear();
        self.metrics.phase = StrokePhase::Stopped;
    }

    pub fn snapshot(&self) -> RowerMetrics {
        self.metrics.clone()
    }

    pub fn rev_count(&self) -> u32 {
        self.metrics.rev_count
    }

    pub fn stroke_count(&self) -> u16 {
        self.metrics.stroke_count
    }

    pub fn reset(&mut self) {
        self.metrics = RowerMetrics::default();
    }
}
