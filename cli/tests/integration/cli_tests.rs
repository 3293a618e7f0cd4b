//! Integration tests for the CLI surface: help, version and argument errors.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn appconfig() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("appconfig"));
    cmd.env("NO_COLOR", "1").env_remove("APPCONFIG_APP");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help() {
    // arg_required_else_help shows help on stderr and exits 2
    appconfig()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Deploy and operate registered web apps"));
}

#[test]
fn test_cli_help_lists_commands() {
    let output = appconfig().arg("--help").output().expect("run appconfig");
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for command in [
        "deploy",
        "start",
        "stop",
        "maintenance",
        "cache",
        "uncache",
        "create-downloads",
        "run-script",
        "pip-freeze",
        "pip-freeze-all",
        "uninstall",
        "check",
    ] {
        assert!(help.contains(command), "missing {command} in:\n{help}");
    }
}

#[test]
fn test_version_command_shows_version() {
    appconfig()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!(
            "appconfig v",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = appconfig()
        .args(["version", "--json"])
        .output()
        .expect("run appconfig");
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

// --- Argument errors ---

#[test]
fn test_invalid_environment_is_rejected() {
    appconfig()
        .args(["deploy", "staging"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid environment 'staging'"));
}

#[test]
fn test_missing_environment_is_rejected() {
    appconfig()
        .arg("start")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<ENVIRONMENT>"));
}

#[test]
fn test_cache_takes_no_environment() {
    appconfig().args(["cache", "test"]).assert().code(2);
}
