use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_settings(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[machine]
impulses_per_revolution = 4
flywheel_inertia = 0.0293

[stroke]
detection = "torque"
minimum_drive_time_ms = 100
minimum_recovery_time_ms = 100
"#;
    let path = dir.path().join("settings.toml");
    fs::write(&path, toml).unwrap();
    path
}

/// Validate the JSONL schema for a simulated session's final summary line.
#[rstest]
fn simulate_summary_jsonl_schema() {
    let dir = tempdir().unwrap();
    let settings = write_settings(&dir);

    let mut cmd = Command::cargo_bin("ergo_cli").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--settings")
        .arg(&settings)
        .arg("simulate")
        .arg("--drive-edges")
        .arg("8")
        .arg("--recovery-edges")
        .arg("8")
        .arg("--cycles")
        .arg("5");

    let out = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8_lossy(&out);
    let line = stdout
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .expect("one JSONL summary line");

    let v: serde_json::Value = serde_json::from_str(line).expect("valid JSON");

    assert!(v.get("distance_m").and_then(|x| x.as_f64()).is_some());
    assert!(v.get("rev_count").and_then(|x| x.as_u64()).is_some());
    assert!(v.get("stroke_count").and_then(|x| x.as_u64()).is_some());
    assert!(v.get("avg_stroke_power_w").is_some());
    assert!(v.get("drag_coefficient").is_some());
}

/// Validate the JSONL schema for per-stroke event lines.
#[rstest]
fn simulate_per_stroke_jsonl_schema() {
    let dir = tempdir().unwrap();
    let settings = write_settings(&dir);

    let mut cmd = Command::cargo_bin("ergo_cli").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--settings")
        .arg(&settings)
        .arg("simulate")
        .arg("--drive-edges")
        .arg("10")
        .arg("--recovery-edges")
        .arg("10")
        .arg("--cycles")
        .arg("6")
        .arg("--per-stroke");

    let out = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8_lossy(&out);
    let lines: Vec<&str> = stdout
        .lines()
        .filter(|l| l.trim_start().starts_with('{'))
        .collect();

    for line in lines {
        let v: serde_json::Value = serde_json::from_str(line).expect("valid JSON");
        assert!(v.get("drive_duration_s").and_then(|x| x.as_f64()).is_some());
        assert!(
            v.get("recovery_duration_s")
                .and_then(|x| x.as_f64())
                .is_some()
        );
        assert!(v.get("avg_power_w").is_some());
        assert!(v.get("drag_factor").is_some());
        assert!(v.get("forced").and_then(|x| x.as_bool()).is_some());
    }
}
