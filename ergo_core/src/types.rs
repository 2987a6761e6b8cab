//! Pipeline-wide scalar type and the plain data records passed between stages.

/// Pipeline-wide floating point precision.
///
/// `f32` by default; enable the `f64` cargo feature for desktop-grade precision.
/// Every regression, filter, and metric in this crate is generic over nothing and
/// monomorphic over this single alias instead, so a build either runs entirely in
/// `f32` or entirely in `f64` — never a mix.
#[cfg(not(feature = "f64"))]
pub type Real = f32;

#[cfg(feature = "f64")]
pub type Real = f64;

/// One raw sensor edge as handed to [`crate::pipeline::Pipeline::on_edge`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impulse {
    /// Monotonic timestamp of this edge, microseconds.
    pub timestamp_us: u64,
    /// `timestamp_us - previous timestamp_us`, microseconds. `0` for the very first impulse.
    pub delta_us: u64,
}

/// A conditioned impulse after cyclic-error correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanSample {
    /// `absolute_index mod numberOfSlots`.
    pub relative_index: u32,
    /// Count of impulses accepted since the last reset.
    pub absolute_index: u64,
    /// Corrected delta time, microseconds (as a `Real` to carry fractional correction).
    pub corrected_delta_us: Real,
}

/// One point on the angular-position-vs-time curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicSample {
    /// Cumulative time since reset, seconds.
    pub t: Real,
    /// Cumulative angular displacement since reset, radians.
    pub theta: Real,
}

/// Which criteria the stroke state machine consults for phase transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeDetectionType {
    Torque,
    Slope,
    #[default]
    Both,
}

/// Current phase of the stroke state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokePhase {
    #[default]
    Stopped,
    Drive,
    Recovery,
}

/// Instantaneous flywheel dynamics, recomputed once per accepted impulse.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlywheelState {
    /// Angular velocity, rad/s.
    pub omega: Real,
    /// Angular acceleration, rad/s^2.
    pub alpha: Real,
    /// Goodness of fit (R^2) of the angular-position regression.
    pub r_squared: Real,
    pub phase: StrokePhase,
    /// Drag coefficient `k` in `dω/dt = -k·ω²`.
    pub drag_coefficient: Real,
    /// Instantaneous torque, N·m.
    pub torque: Real,
}

/// A completed stroke, emitted on a Drive -> Recovery transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeEvent {
    pub drive_duration_s: Real,
    pub recovery_duration_s: Real,
    pub avg_power_w: Real,
    pub drag_factor: Real,
    /// Handle-force samples (N) collected during the drive, in chronological order.
    pub handle_force_curve: Vec<Real>,
    pub last_stroke_time_us: u64,
    /// Set when the stroke ended because the handle-force capacity was exhausted
    /// rather than through a torque/slope criterion.
    pub forced: bool,
}

/// Aggregated, externally-visible rower state. Cheap to clone: a read-only snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowerMetrics {
    /// Cumulative distance, meters.
    pub distance_m: Real,
    pub last_rev_time_us: u64,
    pub rev_count: u32,
    pub last_stroke_time_us: u64,
    pub stroke_count: u16,
    pub drive_duration_s: Real,
    pub recovery_duration_s: Real,
    pub avg_stroke_power_w: Real,
    pub drag_coefficient: Real,
    /// Handle-force curve of the current (or most recently completed) drive.
    pub handle_force_curve: Vec<Real>,
    pub phase: StrokePhase,
}
