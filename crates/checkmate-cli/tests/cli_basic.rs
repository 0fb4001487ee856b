//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_checkmate"))
        .args(args)
        .env("CHECKMATE_DATA_DIR", data_dir)
        .env_remove("CHECKMATE_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "CLI command {args:?} failed: {stderr}");
    stdout
}

fn parse_json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_instructions_shown_once() {
    let dir = tempfile::tempdir().unwrap();
    let (_, first, _) = run_cli(dir.path(), &["timer", "status"]);
    assert!(first.contains("Welcome to Checkmate"));
    let (_, second, _) = run_cli(dir.path(), &["timer", "status"]);
    assert!(!second.contains("Welcome to Checkmate"));
}

#[test]
fn test_status_is_null_when_idle() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_cli_success(dir.path(), &["timer", "status"]);
    assert_eq!(stdout.trim(), "null");
}

#[test]
fn test_timer_start_stop_resume_reset() {
    let dir = tempfile::tempdir().unwrap();

    let started = parse_json(&run_cli_success(dir.path(), &["timer", "start", "-m", "10"]));
    assert_eq!(started["isRunning"], true);
    assert_eq!(started["isBreakTime"], false);
    assert!(started["minutes"].as_u64().unwrap() >= 9);

    let stopped = parse_json(&run_cli_success(dir.path(), &["timer", "stop"]));
    assert_eq!(stopped["isRunning"], false);

    let resumed = parse_json(&run_cli_success(dir.path(), &["timer", "start"]));
    assert_eq!(resumed["isRunning"], true);

    let reset = run_cli_success(dir.path(), &["timer", "reset"]);
    assert_eq!(reset.trim(), "null");
}

#[test]
fn test_timer_start_rejects_out_of_range_minutes() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "start", "-m", "500"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"));
}

#[test]
fn test_timer_start_rejects_out_of_range_seconds() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "start", "-s", "600"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("seconds must be between 0 and 59"));

    let (_, _, code) = run_cli(dir.path(), &["timer", "start", "-m", "1", "-s", "60"]);
    assert_ne!(code, 0);
    assert_eq!(run_cli_success(dir.path(), &["timer", "status"]).trim(), "null");

    let started = parse_json(&run_cli_success(dir.path(), &["timer", "start", "-m", "1", "-s", "59"]));
    assert_eq!(started["isRunning"], true);
}

#[test]
fn test_short_run_completes_on_tick() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_success(dir.path(), &["timer", "start", "-s", "1"]);
    std::thread::sleep(std::time::Duration::from_millis(1_200));

    let completion = parse_json(&run_cli_success(dir.path(), &["timer", "tick"]));
    assert_eq!(completion["type"], "focus");
    assert_eq!(completion["break_minutes"], 5);

    let status = parse_json(&run_cli_success(dir.path(), &["timer", "status"]));
    assert_eq!(status["suggestedBreakMinutes"], 5);

    let on_break = parse_json(&run_cli_success(dir.path(), &["timer", "break-start"]));
    assert_eq!(on_break["isBreakTime"], true);
    assert_eq!(on_break["isRunning"], true);

    // Under a minute of focus earns a break but no history entry.
    let stats = parse_json(&run_cli_success(dir.path(), &["stats", "--json"]));
    assert_eq!(stats["today"], 0);

    let after = run_cli_success(dir.path(), &["timer", "break-stop"]);
    assert_eq!(after.trim(), "null");
}

#[test]
fn test_task_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_success(dir.path(), &["task", "add", "write", "report"]);
    run_cli_success(dir.path(), &["task", "add", "review PR"]);

    let tasks = parse_json(&run_cli_success(dir.path(), &["task", "list", "--json"]));
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["text"], "write report");
    assert_eq!(tasks[1]["priority"], 2);

    run_cli_success(dir.path(), &["task", "move", "2", "1"]);
    run_cli_success(dir.path(), &["task", "toggle", "1"]);
    let tasks = parse_json(&run_cli_success(dir.path(), &["task", "list", "--json"]));
    assert_eq!(tasks[0]["text"], "review PR");
    assert_eq!(tasks[0]["completed"], true);

    run_cli_success(dir.path(), &["task", "delete", "1"]);
    let tasks = parse_json(&run_cli_success(dir.path(), &["task", "list", "--json"]));
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["priority"], 1);
}

#[test]
fn test_task_add_rejects_blank() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["task", "add", "   "]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_get_set_reset() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "timer.default_focus_minutes"]).trim(),
        "25"
    );
    run_cli_success(dir.path(), &["config", "set", "timer.default_focus_minutes", "50"]);
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "timer.default_focus_minutes"]).trim(),
        "50"
    );

    let started = parse_json(&run_cli_success(dir.path(), &["timer", "start"]));
    let remaining = started["minutes"].as_u64().unwrap() * 60 + started["seconds"].as_u64().unwrap();
    assert!((2_990..=3_000).contains(&remaining));

    run_cli_success(dir.path(), &["config", "reset"]);
    let listed = parse_json(&run_cli_success(dir.path(), &["config", "list", "--json"]));
    assert_eq!(listed["timer"]["default_focus_minutes"], 25);
    let as_toml = run_cli_success(dir.path(), &["config", "list"]);
    assert!(as_toml.contains("default_focus_minutes = 25"));

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_set_rejects_values_the_timer_cannot_use() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        dir.path(),
        &["config", "set", "timer.default_focus_minutes", "500"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("timer.default_focus_minutes"));

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.presets", "[0, 25]"]);
    assert_ne!(code, 0);

    // Rejected values never reach the file.
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "timer.default_focus_minutes"]).trim(),
        "25"
    );
    assert_eq!(
        run_cli_success(dir.path(), &["config", "set", "timer.default_focus_minutes", "45"]).trim(),
        "timer.default_focus_minutes = 45"
    );
}

#[test]
fn test_config_path_is_inside_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = run_cli_success(dir.path(), &["config", "path"]);
    assert!(path.trim().starts_with(dir.path().to_str().unwrap()));
    assert!(path.trim().ends_with("config.toml"));
}
