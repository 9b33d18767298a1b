//! CLI integration tests

use std::process::Command;

fn malectl(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_malectl"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = malectl(&["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("MALE decision agent"), "Should show app name");
    assert!(stdout.contains("classify"), "Should show classify command");
    assert!(stdout.contains("score"), "Should show score command");
    assert!(stdout.contains("policy"), "Should show policy command");
    assert!(stdout.contains("weights"), "Should show weights command");
    assert!(stdout.contains("health"), "Should show health command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = malectl(&["--version"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("malectl"), "Should show binary name");
}

/// Test score subcommand help
#[test]
fn test_score_help() {
    let output = malectl(&["score", "--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Score help should succeed");
    assert!(stdout.contains("--requirement"), "Should show requirement option");
    assert!(stdout.contains("--clusters"), "Should show clusters option");
}

/// Test policy subcommands help
#[test]
fn test_policy_help() {
    let output = malectl(&["policy", "--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Policy help should succeed");
    assert!(stdout.contains("validate"), "Should show validate command");
    assert!(stdout.contains("resolve"), "Should show resolve command");
    assert!(stdout.contains("plan"), "Should show plan command");
}

/// Test policy plan requires an inventory
#[test]
fn test_policy_plan_requires_inventory() {
    let output = malectl(&["policy", "plan", "policy.json"]);

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Plan without inventory should fail");
    assert!(stderr.contains("--inventory"), "Should name the missing option");
}

/// Test format flag accepts only known values
#[test]
fn test_invalid_format() {
    let output = malectl(&["--format", "yaml", "health"]);

    assert!(!output.status.success(), "Unknown format should fail");
}

/// Test a missing input file is reported before any request
#[test]
fn test_classify_missing_file() {
    let output = malectl(&[
        "--api-url",
        "http://127.0.0.1:1",
        "classify",
        "/nonexistent/clusters.json",
    ]);

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Missing file should fail");
    assert!(
        stderr.contains("Failed to read /nonexistent/clusters.json"),
        "Should name the missing file"
    );
}

/// Test an unreachable agent fails cleanly
#[test]
fn test_unreachable_agent() {
    let output = malectl(&["--api-url", "http://127.0.0.1:1", "health"]);

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Unreachable agent should fail");
    assert!(
        stderr.contains("Failed to send request"),
        "Should report the connection failure"
    );
}
