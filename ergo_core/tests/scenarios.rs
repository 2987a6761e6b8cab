//! End-to-end scenario tests against the full [`Pipeline`], covering the
//! concrete cases a reviewer would check by hand.
use ergo_core::config::{Config, MachineSettings, StrokeDetectionType, StrokePhaseDetectionSettings};
use ergo_core::pipeline::Pipeline;
use ergo_core::types::StrokePhase;
use rstest::rstest;

fn base_config(detection: StrokeDetectionType) -> Config {
    Config {
        machine: MachineSettings {
            impulses_per_revolution: 4,
            flywheel_inertia: 0.0293,
            ..Default::default()
        },
        stroke: StrokePhaseDetectionSettings {
            stroke_detection_type: detection,
            minimum_powered_torque: 0.5,
            minimum_drag_torque: 0.2,
            minimum_drive_time_ms: 100,
            minimum_recovery_time_ms: 100,
            drive_handle_forces_max_capacity: 32,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[rstest]
#[case(StrokeDetectionType::Torque)]
#[case(StrokeDetectionType::Both)]
fn drive_accelerating_then_decelerating_flywheel_eventually_produces_a_stroke(
    #[case] detection: StrokeDetectionType,
) {
    let mut p = Pipeline::new(base_config(detection)).unwrap();
    let mut t = 0u64;
    // accelerating phase: shrinking deltas -> rising omega/torque (drive)
    let mut delta_us = 200_000u64;
    for _ in 0..20 {
        t += delta_us;
        p.on_edge(t);
        p.tick(t);
        delta_us = delta_us.saturating_sub(3_000).max(40_000);
    }
    // decelerating phase: growing deltas -> falling omega, eventually negative torque (recovery)
    let mut delta_us = 60_000u64;
    for _ in 0..20 {
        t += delta_us;
        p.on_edge(t);
        p.tick(t);
        delta_us += 15_000;
    }
    assert!(p.stroke_count() >= 1, "expected at least one stroke to be detected");
}

#[test]
fn forced_recovery_when_drive_never_releases_torque() {
    let mut cfg = base_config(StrokeDetectionType::Torque);
    cfg.stroke.drive_handle_forces_max_capacity = 8;
    cfg.stroke.minimum_drive_time_ms = 50;
    let mut p = Pipeline::new(cfg).unwrap();

    let mut t = 0u64;
    // steady acceleration the whole time: torque never drops, so the only way
    // out of Drive is the handle-force capacity being exhausted.
    let mut delta_us = 200_000u64;
    for _ in 0..40 {
        t += delta_us;
        p.on_edge(t);
        p.tick(t);
        delta_us = delta_us.saturating_sub(4_000).max(30_000);
    }

    assert_eq!(p.stroke_count(), 1);
    let event = p.last_event().expect("one stroke completed");
    assert!(event.forced);
    assert_eq!(event.handle_force_curve.len(), 8);
    assert_eq!(p.snapshot().phase, StrokePhase::Recovery);
}

#[test]
fn stopped_state_timeout_preserves_drag_and_rev_count() {
    let cfg = base_config(StrokeDetectionType::Both);
    let mut p = Pipeline::new(cfg).unwrap();

    let mut t = 0u64;
    for _ in 0..12 {
        t += 100_000;
        p.on_edge(t);
        p.tick(t);
    }
    let rev_before = p.rev_count();
    let drag_before = p.drag_coefficient();

    // Stop rowing entirely for well past the stopped threshold.
    t += 10_000_000;
    p.tick(t);

    assert_eq!(p.snapshot().phase, StrokePhase::Stopped);
    assert!(p.snapshot().handle_force_curve.is_empty());
    assert_eq!(p.rev_count(), rev_before);
    assert_eq!(p.drag_coefficient(), drag_before);
}

#[rstest]
#[case(4)]
#[case(6)]
#[case(8)]
fn uniform_signal_never_produces_a_stroke_regardless_of_magnet_count(#[case] magnets: u32) {
    let mut cfg = base_config(StrokeDetectionType::Both);
    cfg.machine.impulses_per_revolution = magnets;
    let mut p = Pipeline::new(cfg).unwrap();

    let mut t = 0u64;
    for _ in 0..(magnets as usize * 10) {
        t += 100_000;
        p.on_edge(t);
        p.tick(t);
    }
    assert_eq!(p.stroke_count(), 0);
    assert_eq!(p.rev_count(), 10);
}
