//! Per-magnet cyclic error correction.
//!
//! Physical magnet spacing is never perfectly uniform, which injects periodic
//! error at the magnet-count frequency into the raw delta-time stream. This
//! filter learns one multiplicative correction per magnet slot and applies it
//! going forward, renormalized so the corrected stream's total time over a
//! revolution matches the raw stream's.
use crate::regression::OLSLinearSeries;
use crate::series::median_of;
use crate::types::Real;

const MAX_PER_UPDATE_CHANGE: Real = 0.02;
const DEVIATION_RING_LEN: usize = 5;
const DEVIATION_SIGNIFICANT: Real = 0.001;
const DEVIATION_BOOST_SCALE: Real = 0.004;
/// How much worse the clean fit must be than the raw fit before the magnet
/// pattern is considered to have shifted (e.g. remounted magnets).
const VOLATILITY_MARGIN: Real = 0.8;

#[derive(Debug, Clone, Default)]
struct DeviationRing {
    buf: std::collections::VecDeque<Real>,
}

impl DeviationRing {
    fn push(&mut self, dev: Real) {
        if self.buf.len() >= DEVIATION_RING_LEN {
            self.buf.pop_front();
        }
        self.buf.push_back(dev);
    }

    fn mean_sign(&self) -> Real {
        if self.buf.is_empty() {
            return 0.0;
        }
        let sum: Real = self
            .buf
            .iter()
            .map(|d| if *d >= 0.0 { 1.0 } else { -1.0 })
            .sum();
        sum / self.buf.len() as Real
    }

    /// Acceleration factor in `[1, 5]` for persistent, one-signed error.
    fn boost(&self) -> Real {
        if self.buf.len() < DEVIATION_RING_LEN {
            return 1.0;
        }
        let values: Vec<Real> = self.buf.iter().copied().collect();
        let median = median_of(&values);
        let mean_sign = self.mean_sign();
        if median.abs() >= DEVIATION_SIGNIFICANT && mean_sign.abs() >= 1.0 {
            1.0 + (median.abs() / DEVIATION_BOOST_SCALE).min(1.0) * mean_sign.abs() * 4.0
        } else {
            1.0
        }
    }

    fn clear(&mut self) {
        self.buf.clear();
    }
}

/// Learns and applies a per-slot multiplicative correction to raw delta times.
pub struct CyclicErrorFilter {
    n: usize,
    c: Vec<Real>,
    filter_sum: Real,
    weight_correction: Real,
    /// Learning aggressiveness `alpha`. `0.0` makes this filter an exact
    /// identity pass-through.
    aggressiveness: Real,
    learning_ols: OLSLinearSeries,
    recording: Vec<(u32, u64, Real)>,
    recording_capacity: usize,
    is_stabilized: bool,
    cursor: usize,
    slot_deviations: Vec<DeviationRing>,
    raw_ols: OLSLinearSeries,
    clean_ols: OLSLinearSeries,
    raw_cumsum: Real,
    clean_cumsum: Real,
    misaligned: bool,
}

impl CyclicErrorFilter {
    pub fn new(number_of_slots: u32, aggressiveness: Real, recording_buffer_capacity: usize) -> Self {
        let n = number_of_slots.max(1) as usize;
        Self {
            n,
            c: vec![1.0; n],
            filter_sum: n as Real,
            weight_correction: 1.0,
            aggressiveness: aggressiveness.clamp(0.0, 1.0),
            learning_ols: OLSLinearSeries::new(recording_buffer_capacity.max(2)),
            recording: Vec::with_capacity(recording_buffer_capacity.max(1)),
            recording_capacity: recording_buffer_capacity.max(1),
            is_stabilized: false,
            cursor: 0,
            slot_deviations: vec![DeviationRing::default(); n],
            raw_ols: OLSLinearSeries::new(recording_buffer_capacity.max(2)),
            clean_ols: OLSLinearSeries::new(recording_buffer_capacity.max(2)),
            raw_cumsum: 0.0,
            clean_cumsum: 0.0,
            misaligned: false,
        }
    }

    fn trustworthy(&self) -> bool {
        self.learning_ols.size() >= 2
    }

    /// `raw · c[slot mod N] · weightCorrection`.
    pub fn apply_filter(&self, slot: usize, raw: Real) -> Real {
        raw * self.c[slot % self.n] * self.weight_correction
    }

    pub fn is_potentially_misaligned(&self) -> bool {
        self.misaligned
    }

    pub fn correction(&self, slot: usize) -> Real {
        self.c[slot % self.n]
    }

    /// Feeds one raw delta, returning the corrected value. Called once per
    /// accepted impulse.
    pub fn process(&mut self, absolute_index: u64, raw_delta: Real) -> Real {
        let slot = (absolute_index % self.n as u64) as u32;
        let clean = self.apply_filter(slot as usize, raw_delta);

        self.learning_ols.push(absolute_index as Real, raw_delta);

        if !self.is_stabilized {
            if self.recording.len() < self.recording_capacity {
                self.recording.push((slot, absolute_index, raw_delta));
            }
            if self.recording.len() >= self.recording_capacity {
                self.is_stabilized = true;
                self.cursor = 0;
            }
        } else if self.trustworthy() {
            self.advance_learning_cursor();
        }

        self.raw_cumsum += raw_delta;
        self.raw_ols.push(self.raw_cumsum, raw_delta);
        self.clean_cumsum += clean;
        self.clean_ols.push(self.clean_cumsum, clean);
        if self.is_stabilized {
            self.check_misalignment();
        }

        clean
    }

    fn advance_learning_cursor(&mut self) {
        if self.recording.is_empty() {
            return;
        }
        let slope = self.learning_ols.slope();
        let intercept = self.learning_ols.intercept();
        let r_squared = self.learning_ols.goodness_of_fit();
        let (rslot, rpos, rraw) = self.recording[self.cursor];
        let perfect = slope * rpos as Real + intercept;
        self.update_filter(rslot as usize, rraw, perfect, r_squared);

        self.cursor += 1;
        if self.cursor >= self.recording.len() {
            // Restart rather than loop: reprocessing the same buffered sample
            // again would double-count a correction already learned from it.
            self.recording.clear();
            self.is_stabilized = false;
            self.cursor = 0;
        }
    }

    fn update_filter(&mut self, slot: usize, raw: Real, perfect: Real, r_squared: Real) {
        if raw.abs() < Real::EPSILON {
            return;
        }
        let old_c = self.c[slot];
        let correction = perfect / raw;
        let lower = old_c * (1.0 - MAX_PER_UPDATE_CHANGE);
        let upper = old_c * (1.0 + MAX_PER_UPDATE_CHANGE);
        let clamped = correction.clamp(lower.min(upper), lower.max(upper));
        let effective = (clamped - 1.0) * self.aggressiveness + 1.0;

        let dev = (clamped - old_c) / old_c;
        self.slot_deviations[slot].push(dev);
        let boost = self.slot_deviations[slot].boost();

        let weight = (r_squared * boost).clamp(0.0, 1.0);
        let new_c = old_c + weight * (effective - old_c);
        self.filter_sum += new_c - old_c;
        self.c[slot] = new_c;
        self.recompute_weight_correction();
    }

    fn check_misalignment(&mut self) {
        let r2_raw = self.raw_ols.goodness_of_fit();
        let r2_clean = self.clean_ols.goodness_of_fit();
        self.misaligned = r2_clean < VOLATILITY_MARGIN * r2_raw;
        if self.misaligned {
            let lag = if r2_raw > Real::EPSILON {
                (1.0 - r2_clean / r2_raw).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let decay = (0.1 + lag * 0.4).clamp(0.1, 0.5);
            for c_i in self.c.iter_mut() {
                *c_i = 1.0 + (*c_i - 1.0) * (1.0 - decay);
            }
            self.recompute_filter_sum();
        }
    }

    fn recompute_filter_sum(&mut self) {
        self.filter_sum = self.c.iter().sum();
        self.recompute_weight_correction();
    }

    fn recompute_weight_correction(&mut self) {
        self.weight_correction = if self.filter_sum.abs() > Real::EPSILON {
            self.n as Real / self.filter_sum
        } else {
            1.0
        };
    }

    /// Clears the learning buffers but preserves learned `c[]`.
    pub fn restart(&mut self) {
        self.recording.clear();
        self.is_stabilized = false;
        self.cursor = 0;
        self.learning_ols.reset();
        self.raw_ols.reset();
        self.clean_ols.reset();
        self.raw_cumsum = 0.0;
        self.clean_cumsum = 0.0;
        self.misaligned = false;
    }

    /// Full reset: learned `c[]` is discarded back to identity.
    pub fn reset(&mut self) {
        self.restart();
        for c in self.c.iter_mut() {
            *c = 1.0;
        }
        self.weight_correction = 1.0;
        self.filter_sum = self.n as Real;
        for ring in &mut self.slot_deviations {
            ring.clear();
        }
    }
}
