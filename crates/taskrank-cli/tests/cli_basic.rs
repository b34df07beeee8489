//! Basic CLI E2E tests.
//!
//! Tests run the built binary against a temporary config directory and
//! score offline, so no service needs to be running.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli_in(config_dir: &Path, args: &[&str], stdin: Option<&str>) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_taskrank"))
        .args(args)
        .env("TASKRANK_CONFIG_DIR", config_dir)
        .env_remove("TASKRANK_API_URL")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    {
        let mut pipe = child.stdin.take().unwrap();
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).unwrap();
        }
    }

    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli(config_dir: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_in(config_dir, args, None)
}

fn write_tasks(dir: &Path, json: &str) -> String {
    let path = dir.join("tasks.json");
    std::fs::write(&path, json).unwrap();
    path.to_string_lossy().to_string()
}

const TASKS: &str = r#"[
    {"id": 1, "title": "Low priority chore", "estimated_hours": 8, "importance": 2, "due_date": "2099-01-01"},
    {"id": 2, "title": "Overdue report", "estimated_hours": 2, "importance": 9, "due_date": "2000-01-01"},
    {"id": 3, "title": "Quick fix", "estimated_hours": 0.5, "importance": 6},
    {"id": 4, "title": "Plan sprint", "estimated_hours": 3, "importance": 7, "dependencies": [2]}
]"#;

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["--help"]);
    assert_eq!(code, 0);
    for command in ["analyze", "suggest", "session", "config"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_analyze_offline_orders_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_tasks(dir.path(), TASKS);

    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["analyze", "--file", &file, "--offline", "--strategy", "deadline"],
    );

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("Prioritized tasks (4)"));
    let first = stdout.lines().nth(1).unwrap();
    assert!(first.contains("Overdue report"), "unexpected first row: {first}");
}

#[test]
fn test_analyze_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_tasks(dir.path(), TASKS);

    let (stdout, stderr, code) = run_cli(dir.path(), &["analyze", "-f", &file, "--offline", "--json"]);

    assert_eq!(code, 0, "stderr: {stderr}");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let tasks = parsed.as_array().unwrap();
    assert_eq!(tasks.len(), 4);
    let scores: Vec<f64> = tasks.iter().map(|t| t["score"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!(tasks[0]["breakdown"]["urgency_score"].is_number());
}

#[test]
fn test_suggest_returns_three() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_tasks(dir.path(), TASKS);

    let (stdout, stderr, code) = run_cli(dir.path(), &["suggest", "--file", &file, "--offline", "--json"]);

    assert_eq!(code, 0, "stderr: {stderr}");
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.len(), 3);
}

#[test]
fn test_empty_file_is_rejected_before_scoring() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_tasks(dir.path(), "[]");

    let (_, stderr, code) = run_cli(dir.path(), &["suggest", "--file", &file, "--offline"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("error: Add tasks first!"));
    assert!(!stderr.contains("scoring..."));
}

#[test]
fn test_cycle_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_tasks(
        dir.path(),
        r#"[{"id": 1, "title": "a", "dependencies": [2]}, {"id": 2, "title": "b", "dependencies": [1]}]"#,
    );

    let (_, stderr, code) = run_cli(dir.path(), &["analyze", "--file", &file, "--offline"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("error: Task 1 waits for itself via [1, 2, 1]"));
}

#[test]
fn test_unknown_strategy_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_tasks(dir.path(), TASKS);

    let (_, stderr, code) = run_cli(dir.path(), &["analyze", "--file", &file, "--strategy", "random"]);

    assert_ne!(code, 0);
    assert!(stderr.contains("unknown strategy"));
}

#[test]
fn test_config_get_set_and_path() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "api.timeout_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "30");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "ui.default_strategy", "deadline"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "ui.default_strategy"]);
    assert_eq!(stdout.trim(), "deadline");

    let (stdout, _, code) = run_cli(dir.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
    assert!(dir.path().join("config.toml").exists());

    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "api.timeout_secs", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("must be at least 1 second"));

    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "api.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_session_stages_and_suggests() {
    let dir = tempfile::tempdir().unwrap();
    let script = "\
add \"Write report\" --hours 2 --importance 8
add Tidy desk --hours 1 --importance 2
list
suggest
state
quit
";

    let (stdout, stderr, code) = run_cli_in(dir.path(), &["session", "--offline"], Some(script));

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("staged: 2"));
    assert!(stdout.contains("Write report  (imp 8 | 2h)"));
    assert!(stdout.contains("Suggested next (2)"));
    assert!(stdout.contains("view: success"));
}

#[test]
fn test_session_echoes_staging_changes() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_tasks(
        dir.path(),
        r#"[{"title": "Imported one", "importance": 4}, {"title": "Imported two"}]"#,
    );
    let script = format!("add Alpha --importance 3\npaste {file}\nload\nquit\n");

    let (stdout, stderr, code) = run_cli_in(dir.path(), &["session", "--offline"], Some(&script));

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("staged: 1"));
    assert!(stdout.contains("Alpha  (imp 3 | 1h)"));
    assert!(stdout.contains("staged: 3"));
    assert!(stdout.contains("Imported two  (imp 5 | 1h)"));
}

#[test]
fn test_session_reports_bad_input_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let script = "\
analyze
frobnicate
add Only task
analyze
state
";

    let (stdout, stderr, code) = run_cli_in(dir.path(), &["session", "--offline"], Some(script));

    assert_eq!(code, 0);
    assert!(stderr.contains("error: Add tasks first!"));
    assert!(stderr.contains("unknown command 'frobnicate'"));
    assert!(stdout.contains("Prioritized tasks (1)"));
    assert!(stdout.contains("view: success"));
}

#[test]
fn test_completions_generate() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("taskrank"));
}
