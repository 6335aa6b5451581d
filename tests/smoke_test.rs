//! Smoke tests for the qlog CLI.

mod common;

use assert_cmd::Command;
use common::TestEnv;
use predicates::prelude::*;

fn qlog() -> Command {
    Command::new(env!("CARGO_BIN_EXE_qlog"))
}

#[test]
fn test_version_flag() {
    qlog()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("qlog"))
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_help_flag() {
    qlog()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("dispatch"))
        .stdout(predicate::str::contains("rotate"));
}

#[test]
fn test_status_on_empty_data_dir() {
    let env = TestEnv::new();
    env.qlog()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""status":"needs_creation""#));
}

#[test]
fn test_status_human() {
    let env = TestEnv::init();
    env.qlog()
        .args(["-H", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("locked vault present"));
}

#[test]
fn test_command_needing_password_without_one() {
    let env = TestEnv::init();
    env.qlog()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--password"));
}
