use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_settings(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[machine]
impulses_per_revolution = 4
flywheel_inertia = 0.0293

[stroke]
detection = "both"
"#;
    let path = dir.path().join("settings.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("ergo_cli").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("self-check"));
}

#[test]
fn self_check_succeeds_with_valid_settings() {
    let dir = tempdir().unwrap();
    let settings = write_valid_settings(&dir);

    let mut cmd = Command::cargo_bin("ergo_cli").unwrap();
    cmd.arg("--settings")
        .arg(&settings)
        .arg("self-check");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("self-check OK"));
}

#[test]
fn self_check_succeeds_with_missing_settings_file() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let mut cmd = Command::cargo_bin("ergo_cli").unwrap();
    cmd.arg("--settings").arg(&missing).arg("self-check");

    cmd.assert().success();
}

#[rstest]
#[case("impulses_per_revolution = 0", 2)]
fn invalid_settings_are_rejected_with_exit_code(#[case] bad_line: &str, #[case] code: i32) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, format!("[machine]\n{bad_line}\n")).unwrap();

    let mut cmd = Command::cargo_bin("ergo_cli").unwrap();
    cmd.arg("--settings").arg(&path).arg("self-check");

    cmd.assert()
        .code(code)
        .stderr(predicate::str::contains("impulses_per_revolution"));
}

#[test]
fn simulate_runs_a_bounded_session() {
    let dir = tempdir().unwrap();
    let settings = write_valid_settings(&dir);

    let mut cmd = Command::cargo_bin("ergo_cli").unwrap();
    cmd.arg("--settings")
        .arg(&settings)
        .arg("simulate")
        .arg("--drive-edges")
        .arg("4")
        .arg("--recovery-edges")
        .arg("4")
        .arg("--cycles")
        .arg("3");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("revolutions"));
}
