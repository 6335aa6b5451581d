//! Integration tests for config.kdl handling.

mod common;

use common::{PASSWORD, TestEnv};
use predicates::prelude::*;

#[test]
fn test_output_format_from_config() {
    let env = TestEnv::init();
    env.write_config("output-format \"human\"\n");
    env.qlog()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: locked vault present"));
}

#[test]
fn test_data_dir_flag_beats_env() {
    let env = TestEnv::new();
    let other = common::TempDir::new().unwrap();
    env.qlog()
        .args(["init", "--password", PASSWORD, "--data-dir"])
        .arg(other.path())
        .assert()
        .success();

    assert!(other.path().join("verification-token").exists());
    assert!(!env.data_path().join("verification-token").exists());
}

#[test]
fn test_invalid_config_is_reported() {
    let env = TestEnv::new();
    env.write_config("output-format \"yaml\"\n");
    env.qlog()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("output-format"));
}

#[test]
fn test_log_filter_env_enables_debug_logs() {
    let env = TestEnv::init();
    env.qlog()
        .env("QLOG_LOG", "qlog=debug,questlog=debug")
        .args(["show", "--password", PASSWORD])
        .assert()
        .success()
        .stderr(predicate::str::contains("resolved data directory"));
}
