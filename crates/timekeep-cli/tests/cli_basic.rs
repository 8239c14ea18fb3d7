//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary home
//! directory, so the config and database never touch the real one.

use std::path::Path;
use std::process::Command;

fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_timekeep"))
        .args(args)
        .env("HOME", home)
        .env("TIMEKEEP_ENV", "dev")
        .env_remove("TIMEKEEP_OWNER")
        .output()
        .expect("failed to execute CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_timer_lifecycle() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, stderr, code) = run_cli(home.path(), &["timer", "start", "--name", "Report"]);
    assert_eq!(code, 0, "start failed: {stderr}");
    let started: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let timer_id = started["timer_id"].as_str().unwrap().to_string();
    assert!(started["entry_id"].as_str().is_some());

    let (stdout, _, code) = run_cli(home.path(), &["timer", "pause", &timer_id]);
    assert_eq!(code, 0);
    let paused: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(paused["duration_minutes"].as_i64().is_some());

    let (stdout, _, code) = run_cli(home.path(), &["timer", "list"]);
    assert_eq!(code, 0);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["status"], "PAUSED");
    assert_eq!(rows[0]["name"], "Report");

    let (stdout, _, code) = run_cli(home.path(), &["timer", "end", &timer_id]);
    assert_eq!(code, 0);
    let ended: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(ended["already_ended"], false);

    let (stdout, _, code) = run_cli(home.path(), &["timer", "list", "--status", "ended"]);
    assert_eq!(code, 0);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
}

#[test]
fn test_timer_tagging_and_filtered_list() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(home.path(), &["timer", "start", "--name", "Design"]);
    assert_eq!(code, 0);
    let started: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let timer_id = started["timer_id"].as_str().unwrap().to_string();

    let (stdout, _, code) = run_cli(
        home.path(),
        &["timer", "tag", &timer_id, "--set", "billable,client-a"],
    );
    assert_eq!(code, 0);
    let tags: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(tags.as_array().unwrap().len(), 2);

    let (stdout, _, code) = run_cli(home.path(), &["timer", "list", "--tag", "billable"]);
    assert_eq!(code, 0);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);

    let (stdout, _, code) = run_cli(home.path(), &["timer", "list", "--tag", "nope"]);
    assert_eq!(code, 0);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(rows.as_array().unwrap().is_empty());
}

#[test]
fn test_entry_notes() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(home.path(), &["timer", "start", "--name", "Calls"]);
    assert_eq!(code, 0);
    let started: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entry_id = started["entry_id"].as_str().unwrap().to_string();

    let (stdout, _, code) = run_cli(
        home.path(),
        &["entry", "notes", &entry_id, "overran by five"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains(&entry_id));
}

#[test]
fn test_stats_breakdown_empty() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(home.path(), &["stats", "breakdown"]);
    assert_eq!(code, 0);
    let slices: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(slices.as_array().unwrap().is_empty());
}

#[test]
fn test_stats_weekly_shape() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(home.path(), &["stats", "weekly"]);
    assert_eq!(code, 0);
    let weekly: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(weekly["days"].as_array().unwrap().len(), 7);
    assert_eq!(weekly["days"][0]["day"], "Mon");
}

#[test]
fn test_config_owner_roundtrip() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(home.path(), &["config", "show"]);
    assert_eq!(code, 0);
    let config: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config["identity"]["owner"], "local");

    let (_, _, code) = run_cli(home.path(), &["config", "set-owner", "alice"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(home.path(), &["config", "show"]);
    assert_eq!(code, 0);
    let config: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config["identity"]["owner"], "alice");
}

#[test]
fn test_unknown_timer_reports_error() {
    let home = tempfile::tempdir().unwrap();

    let (_, stderr, code) = run_cli(home.path(), &["timer", "pause", "no-such-id"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}
