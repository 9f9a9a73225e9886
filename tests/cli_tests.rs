// cmdmate_core/tests/cli_tests.rs
// Drive the cmdmate binary with an isolated config and history file

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;

fn cmdmate(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cmdmate").expect("cmdmate binary must be built");
    cmd.current_dir(dir)
        .arg("--config")
        .arg(dir.join("missing-config.yaml"))
        .arg("--history-file")
        .arg(dir.join("history.json"))
        .env_remove("CMDMATE_LOG");
    cmd
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_run_prints_result() {
    let dir = tempfile::tempdir().unwrap();
    let output = cmdmate(dir.path())
        .args(["run", "mkdir", "out", "&&", "ls"])
        .assert()
        .success()
        .get_output()
        .clone();

    assert_eq!(stdout_of(&output), "Created directory: out\nout/\n");
    assert!(dir.path().join("out").is_dir());
}

#[test]
fn test_run_exit_code_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = cmdmate(dir.path())
        .args(["run", "cat", "nothing.txt"])
        .assert()
        .failure()
        .get_output()
        .clone();

    assert!(stdout_of(&output).starts_with("Error:"));
}

#[test]
fn test_run_plain_request() {
    let dir = tempfile::tempdir().unwrap();
    cmdmate(dir.path())
        .args(["run", "create file notes.txt with remember the milk"])
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join("notes.txt")).unwrap();
    assert_eq!(content, "remember the milk");
}

#[test]
fn test_history_subcommand_reads_saved_runs() {
    let dir = tempfile::tempdir().unwrap();
    cmdmate(dir.path()).args(["run", "pwd"]).assert().success();
    cmdmate(dir.path()).args(["run", "echo hi"]).assert().success();

    let output = cmdmate(dir.path())
        .args(["history", "--json"])
        .assert()
        .success()
        .get_output()
        .clone();
    let entries: Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(entries, serde_json::json!(["pwd", "echo hi"]));

    let output = cmdmate(dir.path())
        .args(["history", "--limit", "1"])
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(stdout_of(&output), "  1  echo hi\n");
}

#[test]
fn test_repl_reads_stdin_until_exit() {
    let dir = tempfile::tempdir().unwrap();
    let output = cmdmate(dir.path())
        .arg("repl")
        .write_stdin("mkdir made\nexit\n")
        .assert()
        .success()
        .get_output()
        .clone();

    let stdout = stdout_of(&output);
    assert!(stdout.contains("Created directory: made"));
    assert!(stdout.contains("Goodbye!"));
    assert!(dir.path().join("history.json").is_file());
}

#[test]
fn test_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = cmdmate(dir.path())
        .arg("version")
        .assert()
        .success()
        .get_output()
        .clone();
    assert!(stdout_of(&output).starts_with("cmdmate v"));
}
