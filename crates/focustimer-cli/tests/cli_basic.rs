//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway config directory and
//! verify outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command with `stdin` piped in and return (code, stdout, stderr).
fn run_cli_with_input(dir: &Path, args: &[&str], stdin: &str) -> (i32, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_focustimer"))
        .args(args)
        .env("FOCUSTIMER_CONFIG_DIR", dir)
        .env_remove("FOCUSTIMER_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");

    let output = child.wait_with_output().expect("Failed to wait for CLI");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.code().unwrap_or(-1), stdout, stderr)
}

fn run_cli(dir: &Path, args: &[&str]) -> (i32, String, String) {
    run_cli_with_input(dir, args, "")
}

#[test]
fn test_config_list_is_json_with_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0, "config list failed");

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["timer"]["focus_duration"], 25);
    assert_eq!(json["timer"]["short_break_duration"], 5);
    assert_eq!(json["timer"]["long_break_duration"], 30);
    assert_eq!(json["timer"]["pomodoros_until_long_break"], 3);
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "set", "timer.focus_duration", "30"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.focus_duration"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "30");
}

#[test]
fn test_config_set_out_of_range_keeps_value() {
    let dir = tempfile::TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "timer.focus_duration", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.focus_duration"]);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "ui.nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("ui.nope"));
}

#[test]
fn test_config_reset() {
    let dir = tempfile::TempDir::new().unwrap();
    run_cli(dir.path(), &["config", "set", "ui.app_name", "Tomato"]);
    let (code, _, _) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "ui.app_name"]);
    assert_eq!(stdout.trim(), "Focus Timer");
}

#[test]
fn test_run_uses_configured_duration_and_quits() {
    let dir = tempfile::TempDir::new().unwrap();
    run_cli(dir.path(), &["config", "set", "timer.short_break_duration", "7"]);

    let (code, stdout, _) = run_cli_with_input(dir.path(), &["run", "--no-title"], "sb\nq\n");
    assert_eq!(code, 0, "run failed");
    assert!(stdout.contains("25:00"));
    assert!(stdout.contains("07:00"));
    assert!(stdout.contains("Short Break"));
}

#[test]
fn test_run_ends_on_eof() {
    let dir = tempfile::TempDir::new().unwrap();
    let (code, stdout, _) =
        run_cli_with_input(dir.path(), &["run", "--mode", "long-break", "--no-title"], "");
    assert_eq!(code, 0);
    assert!(stdout.contains("30:00"));
}

#[test]
fn test_run_set_reseeds_paused_timer_and_persists() {
    let dir = tempfile::TempDir::new().unwrap();
    let (code, stdout, _) = run_cli_with_input(
        dir.path(),
        &["run", "--no-title"],
        "set focus_duration 30\nset short_break_duration 0\nq\n",
    );
    assert_eq!(code, 0, "run failed");
    assert!(stdout.contains("30:00"));
    assert!(stdout.contains("short_break_duration must be between 1 and 120"));

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.focus_duration"]);
    assert_eq!(stdout.trim(), "30");
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.short_break_duration"]);
    assert_eq!(stdout.trim(), "5");
}
