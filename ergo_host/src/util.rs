use std::time::Duration;

use ergo_traits::Clock;

/// Sleeps until `target_us` microseconds have elapsed since `epoch`,
/// according to `clock`. Used by the demo loop to pace [`crate::sensor::SimulatedSensor`]
/// edges in real time instead of replaying them instantaneously.
pub fn pace_until(clock: &dyn Clock, epoch: std::time::Instant, target_us: u64) {
    let elapsed_ms = clock.ms_since(epoch);
    let target_ms = target_us / 1_000;
    if target_ms > elapsed_ms {
        clock.sleep(Duration::from_millis(target_ms - elapsed_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ergo_traits::MonotonicClock;

    #[test]
    fn pace_until_sleeps_at_least_the_requested_duration() {
        let clock = MonotonicClock::new();
        let epoch = clock.now();
        pace_until(&clock, epoch, 5_000);
        assert!(clock.ms_since(epoch) >= 5);
    }

    #[test]
    fn pace_until_is_a_no_op_when_already_past_target() {
        let clock = MonotonicClock::new();
        let epoch = clock.now();
        clock.sleep(Duration::from_millis(10));
        let before = clock.ms_since(epoch);
        pace_until(&clock, epoch, 1_000);
        assert!(clock.ms_since(epoch) >= before);
    }
}
