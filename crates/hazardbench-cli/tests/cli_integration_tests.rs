//! CLI Integration Tests
//!
//! Tests for `hazardbench` CLI commands using `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get the CLI binary command
#[allow(deprecated)]
fn hazardbench_cmd() -> Command {
    let mut cmd = Command::cargo_bin("hazardbench").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("HAZARDBENCH_CONFIG");
    cmd
}

/// Config file with short delays so scenarios finish quickly
fn fast_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("hazardbench.toml");
    fs::write(
        &path,
        r#"
[cache]
acquire_delay_ms = 20

[queue]
budget = 3
producer_delay_ms = 5
consumer_poll_ms = 10
processing_ms = 5
drain_grace_ms = 2000

[harness]
join_timeout_ms = 3000
trials = 2
"#,
    )
    .unwrap();
    path
}

// =============================================================================
// Help & Version Tests
// =============================================================================

#[test]
fn test_help_displays_usage() {
    hazardbench_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("hazardbench CLI"))
        .stdout(predicate::str::contains("lock-order"))
        .stdout(predicate::str::contains("handoff"));
}

#[test]
fn test_version_displays_version() {
    hazardbench_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hazardbench"));
}

#[test]
fn test_invalid_command_shows_error() {
    hazardbench_cmd()
        .arg("invalid_command_xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_config_prints_defaults() {
    let temp_dir = TempDir::new().unwrap();

    hazardbench_cmd()
        .current_dir(temp_dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[queue]"))
        .stdout(predicate::str::contains("budget = 10"))
        .stdout(predicate::str::contains("acquire_delay_ms = 100"));
}

#[test]
fn test_config_reads_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = fast_config(&temp_dir);

    hazardbench_cmd()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("budget = 3"))
        .stdout(predicate::str::contains("trials = 2"));
}

#[test]
fn test_config_env_override() {
    let temp_dir = TempDir::new().unwrap();

    hazardbench_cmd()
        .current_dir(temp_dir.path())
        .env("HAZARDBENCH_QUEUE__BUDGET", "42")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("budget = 42"));
}

#[test]
fn test_missing_config_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    hazardbench_cmd()
        .arg("--config")
        .arg(temp_dir.path().join("nope.toml"))
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_invalid_config_value_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    fs::write(&path, "[queue]\nbudget = 0\n").unwrap();

    hazardbench_cmd()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("queue.budget"));
}

#[test]
fn test_invalid_log_level_fails() {
    let temp_dir = TempDir::new().unwrap();

    hazardbench_cmd()
        .current_dir(temp_dir.path())
        .args(["--log-level", "chatty", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("logging.level"));
}

// =============================================================================
// Scenario Command Tests
// =============================================================================

#[test]
fn test_handoff_reports_all_messages() {
    let temp_dir = TempDir::new().unwrap();
    let path = fast_config(&temp_dir);

    hazardbench_cmd()
        .arg("--config")
        .arg(&path)
        .arg("handoff")
        .assert()
        .success()
        .stdout(predicate::str::contains("Handoff Summary"))
        .stdout(predicate::str::contains("New Message 2"))
        .stdout(predicate::str::contains("idle"));
}

#[test]
fn test_handoff_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let path = fast_config(&temp_dir);

    let output = hazardbench_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--json", "handoff", "--budget", "2"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["producer"]["enqueued"], 2);
    assert_eq!(
        report["consumer"]["processed"],
        serde_json::json!(["New Message 0", "New Message 1"])
    );
    assert_eq!(report["residual"]["pending"], 0);
}

#[test]
fn test_handoff_logs_scenario_events_to_stderr() {
    let temp_dir = TempDir::new().unwrap();
    let path = fast_config(&temp_dir);

    hazardbench_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--log-level", "info", "handoff", "--budget", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("configuration loaded"))
        .stderr(predicate::str::contains("scenario started"))
        .stderr(predicate::str::contains("scenario finished"))
        .stdout(predicate::str::contains("scenario started").not());
}

#[test]
fn test_warn_level_silences_scenario_events() {
    let temp_dir = TempDir::new().unwrap();
    let path = fast_config(&temp_dir);

    hazardbench_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--log-level", "warn", "handoff", "--budget", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("scenario started").not());
}

#[test]
fn test_disjoint_completes() {
    let temp_dir = TempDir::new().unwrap();
    let path = fast_config(&temp_dir);

    hazardbench_cmd()
        .arg("--config")
        .arg(&path)
        .args(["disjoint", "--keys", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"));
}

#[test]
fn test_lock_order_json_counts_trials() {
    let temp_dir = TempDir::new().unwrap();
    let path = fast_config(&temp_dir);

    let output = hazardbench_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--json", "lock-order", "--trials", "2", "--timeout-ms", "300"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["trials"], 2);
    assert_eq!(report["writer"], "invalidate");
    let completed = report["completed"].as_u64().unwrap();
    let deadlocked = report["deadlocked"].as_u64().unwrap();
    assert_eq!(completed + deadlocked, 2);
}

#[test]
fn test_lock_order_strict_fails_on_deadlock() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("slow.toml");
    // Wide window between acquisitions: the circular wait is all but certain.
    fs::write(&path, "[cache]\nacquire_delay_ms = 150\n").unwrap();

    hazardbench_cmd()
        .arg("--config")
        .arg(&path)
        .args(["lock-order", "--trials", "3", "--timeout-ms", "600", "--strict"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Deadlocked"))
        .stderr(predicate::str::contains("trials deadlocked"));
}

#[test]
fn test_lock_order_rejects_zero_trials() {
    let temp_dir = TempDir::new().unwrap();

    hazardbench_cmd()
        .current_dir(temp_dir.path())
        .args(["lock-order", "--trials", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--trials"));
}
