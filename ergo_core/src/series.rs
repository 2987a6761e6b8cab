//! Bounded rolling series: the common storage primitive behind every regression
//! and learning-state buffer in this crate.
use std::collections::VecDeque;

use crate::types::Real;

/// Median of a slice of `Real`, via a sorted copy. Returns `0.0` for an empty slice.
pub(crate) fn median_of(values: &[Real]) -> Real {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// A fixed-length FIFO ring over `Real` values.
///
/// Logical length is capped at `max_len`; pushing past capacity evicts the
/// oldest value. The backing allocation grows by doubling up to
/// `min(max_allocation_capacity, 1000)` entries, then by 10 per further
/// overflow, bounding reallocation cost on long-running, stuck-stroke sessions.
#[derive(Debug, Clone)]
pub struct Series {
    buf: VecDeque<Real>,
    max_len: usize,
    max_allocation_capacity: usize,
}

impl Series {
    pub fn new(max_len: usize) -> Self {
        Self::with_allocation_cap(max_len, 1000)
    }

    pub fn with_allocation_cap(max_len: usize, max_allocation_capacity: usize) -> Self {
        Self {
            buf: VecDeque::new(),
            max_len: max_len.max(1),
            max_allocation_capacity: max_allocation_capacity.max(1),
        }
    }

    fn grow_if_needed(&mut self) {
        if self.buf.len() < self.buf.capacity() {
            return;
        }
        let cap = self.buf.capacity().max(1);
        let growth_cap = self.max_allocation_capacity.min(1000);
        let target = if cap < growth_cap {
            (cap * 2).min(growth_cap)
        } else {
            cap + 10
        };
        self.buf.reserve(target.saturating_sub(cap));
    }

    /// Returns the evicted value, if pushing this one overran `max_len`.
    pub fn push(&mut self, value: Real) -> Option<Real> {
        let evicted = if self.buf.len() >= self.max_len {
            self.buf.pop_front()
        } else {
            None
        };
        self.grow_if_needed();
        self.buf.push_back(value);
        evicted
    }

    pub fn front(&self) -> Option<Real> {
        self.buf.front().copied()
    }

    pub fn back(&self) -> Option<Real> {
        self.buf.back().copied()
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn sum(&self) -> Real {
        self.buf.iter().sum()
    }

    pub fn average(&self) -> Real {
        if self.buf.is_empty() {
            0.0
        } else {
            self.sum() / self.buf.len() as Real
        }
    }

    pub fn median(&self) -> Real {
        let values: Vec<Real> = self.buf.iter().copied().collect();
        median_of(&values)
    }

    pub fn iter(&self) -> impl Iterator<Item = Real> + '_ {
        self.buf.iter().copied()
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_uniform_input_equals_input() {
        let mut s = Series::new(5);
        for _ in 0..5 {
            s.push(3.0);
        }
        assert!((s.average() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut s = Series::new(3);
        s.push(1.0);
        s.push(2.0);
        s.push(3.0);
        assert_eq!(s.push(4.0), Some(1.0));
        assert_eq!(s.front(), Some(2.0));
        assert_eq!(s.back(), Some(4.0));
        assert_eq!(s.size(), 3);
    }

    #[test]
    fn median_odd_and_even_length() {
        let mut s = Series::new(4);
        s.push(1.0);
        s.push(3.0);
        s.push(2.0);
        assert!((s.median() - 2.0).abs() < 1e-6);
        s.push(4.0);
        assert!((s.median() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn reset_clears_series() {
        let mut s = Series::new(4);
        s.push(1.0);
        s.reset();
        assert!(s.is_empty());
        assert_eq!(s.average(), 0.0);
    }
}
