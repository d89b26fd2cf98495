//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomobreath"))
        .args(args)
        .env("POMOBREATH_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_config_get_set_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "focus.work_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "focus.work_minutes", "45"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "focus.work_minutes"]);
    assert_eq!(stdout.trim(), "45");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_rejects_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "focus.work_minutes", "500"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "focus.nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_reset() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["config", "set", "history.keep_count", "50"]);
    let (_, _, code) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let config = run_json(dir.path(), &["config", "list"]);
    assert_eq!(config["history"]["keep_count"], 200);
}

#[test]
fn test_config_reset_single_section() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["config", "set", "history.keep_count", "50"]);
    run_cli(dir.path(), &["config", "set", "focus.work_minutes", "45"]);
    let (_, _, code) = run_cli(dir.path(), &["config", "reset", "history"]);
    assert_eq!(code, 0);

    let history = run_json(dir.path(), &["config", "list", "history"]);
    assert_eq!(history["keep_count"], 200);
    let focus = run_json(dir.path(), &["config", "list", "focus"]);
    assert_eq!(focus["work_minutes"], 45);

    let (_, _, code) = run_cli(dir.path(), &["config", "reset", "theme"]);
    assert_eq!(code, 1);
}

#[test]
fn test_task_add_deduplicates() {
    let dir = tempfile::tempdir().unwrap();
    let first = run_json(dir.path(), &["task", "add", "Write report"]);
    let second = run_json(dir.path(), &["task", "add", "write REPORT"]);
    assert_eq!(first["id"], second["id"]);

    let tasks = run_json(dir.path(), &["task", "list"]);
    assert_eq!(tasks.as_array().map(Vec::len), Some(1));

    let id = first["id"].as_str().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["task", "delete", id]);
    assert_eq!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["task", "delete", id]);
    assert_eq!(code, 1);
}

#[test]
fn test_history_and_stats_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    let history = run_json(dir.path(), &["history", "list"]);
    assert_eq!(history.as_array().map(Vec::len), Some(0));

    let stats = run_json(dir.path(), &["stats", "all"]);
    assert_eq!(stats["total_sessions"], 0);
    let stats = run_json(dir.path(), &["stats", "today"]);
    assert_eq!(stats["today_work_sessions"], 0);
}

#[test]
fn test_breathe_techniques() {
    let dir = tempfile::tempdir().unwrap();
    let list = run_json(dir.path(), &["breathe", "techniques"]);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 5);
    assert_eq!(list[0]["technique"], "energy_boost");
    assert_eq!(list[0]["seconds"], 48);
}

#[test]
fn test_plans_follow_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let plan = run_json(dir.path(), &["focus", "plan", "--work", "50", "--rounds", "3"]);
    assert_eq!(plan["phases"][0]["duration_secs"], 3000);
    assert_eq!(plan["repeat"], 3);

    let plan = run_json(dir.path(), &["breathe", "plan", "--hold", "0"]);
    assert_eq!(plan["phases"][1]["duration_secs"], 0);

    let (_, _, code) = run_cli(dir.path(), &["focus", "plan", "--work", "1"]);
    assert_eq!(code, 1);
}

#[test]
fn test_status_without_saved_session() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["focus", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("no interrupted focus session"));

    let (_, stderr, code) = run_cli(dir.path(), &["breathe", "run", "--resume"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no interrupted session"));
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("pomobreath"));
}
