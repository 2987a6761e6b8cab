//! Flywheel kinematics: angular velocity/acceleration, torque and drag-factor
//! estimation from the angular-position curve.
use crate::config::{DragFactorSettings, MachineSettings};
use crate::regression::{OLSLinearSeries, TSLinearSeries, TSQuadraticSeries};
use crate::series::Series;
use crate::types::Real;

/// Derived instantaneous dynamics for one impulse. `phase` is not computed
/// here; [`crate::pipeline::Pipeline`] fills it in from the stroke state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicsOutput {
    pub omega: Real,
    pub alpha: Real,
    pub r_squared: Real,
    pub torque: Real,
}

/// Owns the windowed angular-position regressions and the drag-factor
/// estimator. Exclusive owner of all regression state in the pipeline.
pub struct FlywheelKinematics {
    inertia: Real,
    sprocket_radius_m: Real,
    concept_2_magic_number: Real,
    goodness_of_fit_threshold: Real,
    lower_drag_threshold: Real,
    upper_drag_threshold: Real,

    ts_linear: TSLinearSeries,
    ts_quad: TSQuadraticSeries,

    drag_recovery_ols: OLSLinearSeries,
    drag_median: Series,
    live_drag_k: Real,
    in_recovery: bool,
}

impl FlywheelKinematics {
    pub fn new(machine: &MachineSettings, drag: &DragFactorSettings, window: usize) -> Self {
        Self {
            inertia: machine.flywheel_inertia,
            sprocket_radius_m: machine.sprocket_radius_m,
            concept_2_magic_number: machine.concept_2_magic_number,
            goodness_of_fit_threshold: drag.goodness_of_fit_threshold,
            lower_drag_threshold: drag.lower_drag_factor_threshold * 1e-6,
            upper_drag_threshold: drag.upper_drag_factor_threshold * 1e-6,
            ts_linear: TSLinearSeries::new(window),
            ts_quad: TSQuadraticSeries::new(window),
            drag_recovery_ols: OLSLinearSeries::new(window.max(2)),
            drag_median: Series::new(drag.drag_coefficients_array_length),
            live_drag_k: 0.0,
            in_recovery: false,
        }
    }

    pub fn reconfigure(&mut self, machine: &MachineSettings, drag: &DragFactorSettings) {
        self.inertia = machine.flywheel_inertia;
        self.sprocket_radius_m = machine.sprocket_radius_m;
        self.concept_2_magic_number = machine.concept_2_magic_number;
        self.goodness_of_fit_threshold = drag.goodness_of_fit_threshold;
        self.lower_drag_threshold = drag.lower_drag_factor_threshold * 1e-6;
        self.upper_drag_threshold = drag.upper_drag_factor_threshold * 1e-6;
        self.drag_median = Series::new(drag.drag_coefficients_array_length);
    }

    pub fn sprocket_radius_m(&self) -> Real {
        self.sprocket_radius_m
    }

    pub fn drag_coefficient(&self) -> Real {
        self.live_drag_k
    }

    /// Distance gained by one full revolution at the current live drag factor.
    pub fn revolution_distance_m(&self) -> Real {
        if self.live_drag_k <= 0.0 || self.concept_2_magic_number <= 0.0 {
            return 0.0;
        }
        (self.live_drag_k / self.concept_2_magic_number).cbrt()
            * std::f64::consts::TAU as Real
            * self.sprocket_radius_m
    }

    /// Feeds one `(cumulative time, cumulative angular displacement)` sample
    /// and returns the resulting instantaneous dynamics. `torque` uses the
    /// live drag coefficient, so it should be read after any pending
    /// `end_recovery_window` call for this impulse.
    pub fn on_sample(&mut self, t: Real, theta: Real) -> KinematicsOutput {
        self.ts_linear.push(t, theta);
        self.ts_quad.push(t, theta);

        let (omega, alpha, r_squared) = if self.ts_quad.size() >= 3 {
            (
                self.ts_quad.first_derivative_at_position(t),
                self.ts_quad.second_derivative_at_position(t),
                self.ts_quad.goodness_of_fit(),
            )
        } else {
            (self.ts_linear.coefficient_a(), 0.0, 0.0)
        };

        if self.in_recovery && omega.abs() > Real::EPSILON {
            self.drag_recovery_ols.push(t, 1.0 / omega);
        }

        let torque = self.inertia * alpha + self.live_drag_k * omega * omega;

        KinematicsOutput {
            omega,
            alpha,
            r_squared,
            torque,
        }
    }

    pub fn begin_recovery_window(&mut self) {
        self.in_recovery = true;
        self.drag_recovery_ols.reset();
    }

    /// Ends the current recovery window, validating and (if valid) absorbing
    /// its drag-slope estimate into the live median. Returns the accepted
    /// slope, if any.
    pub fn end_recovery_window(&mut self) -> Option<Real> {
        self.in_recovery = false;
        if self.drag_recovery_ols.size() < 2 {
            return None;
        }
        let r2 = self.drag_recovery_ols.goodness_of_fit();
        let slope = self.drag_recovery_ols.slope();
        if r2 < self.goodness_of_fit_threshold {
            return None;
        }
        if slope < self.lower_drag_threshold || slope > self.upper_drag_threshold {
            return None;
        }
        self.drag_median.push(slope);
        self.live_drag_k = self.drag_median.median();
        Some(slope)
    }

    pub fn reset(&mut self) {
        self.ts_linear.reset();
        self.ts_quad.reset();
        self.drag_recovery_ols.reset();
        self.in_recovery = false;
        // drag_median / live_drag_k deliberately preserved: §7 "Stopped state:
        // ... drag is preserved".
    }
}
