//! Integration tests for vault lifecycle commands: init, show, rotate, export, import.

mod common;

use common::{PASSWORD, TestEnv};
use predicates::prelude::*;

#[test]
fn test_init_creates_artifacts() {
    let env = TestEnv::new();
    env.qlog()
        .args(["init", "--password", PASSWORD])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""location""#));

    assert!(env.data_path().join("verification-token").exists());
    assert!(env.data_path().join("encrypted-state").exists());
}

#[cfg(unix)]
#[test]
fn test_artifacts_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let env = TestEnv::init();
    for name in ["verification-token", "encrypted-state"] {
        let mode = std::fs::metadata(env.data_path().join(name))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600, "{} has mode {:o}", name, mode);
    }
}

#[test]
fn test_artifacts_do_not_contain_plaintext() {
    let env = TestEnv::init();
    env.dispatch(r#"{"type": "set_agent_name", "name": "Plaintext Detector"}"#);
    let blob = std::fs::read_to_string(env.data_path().join("encrypted-state")).unwrap();
    assert!(!blob.contains("Plaintext Detector"));
    assert_eq!(blob.split('.').count(), 3);
}

#[test]
fn test_init_twice_fails() {
    let env = TestEnv::init();
    env.qlog()
        .args(["init", "--password", "other"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_init_rejects_empty_password() {
    let env = TestEnv::new();
    env.qlog()
        .args(["init", "--password", ""])
        .assert()
        .failure();
}

#[test]
fn test_show_before_init() {
    let env = TestEnv::new();
    env.qlog()
        .args(["show", "--password", PASSWORD])
        .assert()
        .failure()
        .stderr(predicate::str::contains("qlog init"));
}

#[test]
fn test_wrong_password_is_reported_uniformly() {
    let env = TestEnv::init();
    env.qlog()
        .args(["show", "--password", "not it"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong password or corrupted data"));
}

#[test]
fn test_password_from_env() {
    let env = TestEnv::init();
    env.qlog()
        .env("QLOG_PASSWORD", PASSWORD)
        .args(["-H", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("level"));
}

#[test]
fn test_tampered_state_is_credential_failure() {
    let env = TestEnv::init();
    let path = env.data_path().join("encrypted-state");
    let blob = std::fs::read_to_string(&path).unwrap();
    let mut parts: Vec<String> = blob.split('.').map(str::to_string).collect();
    let mut ct = parts[2].clone().into_bytes();
    ct[0] = if ct[0] == b'A' { b'B' } else { b'A' };
    parts[2] = String::from_utf8(ct).unwrap();
    std::fs::write(&path, parts.join(".")).unwrap();

    env.qlog()
        .args(["show", "--password", PASSWORD])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong password or corrupted data"));
}

#[test]
fn test_rotate_password() {
    let env = TestEnv::init();
    env.dispatch(r#"{"type": "add_task", "text": "Survive rotation", "xp": 15}"#);

    env.qlog()
        .args(["rotate", "--password", PASSWORD])
        .env("QLOG_NEW_PASSWORD", "fresh secret")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""rotated":true"#));

    env.qlog()
        .args(["show", "--password", PASSWORD])
        .assert()
        .failure();
    env.qlog()
        .args(["show", "--full", "--password", "fresh secret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Survive rotation"));
}

#[test]
fn test_rotate_with_wrong_password_changes_nothing() {
    let env = TestEnv::init();
    env.qlog()
        .args(["rotate", "--password", "wrong", "--new-password", "x"])
        .assert()
        .failure();
    env.qlog()
        .args(["show", "--password", PASSWORD])
        .assert()
        .success();
}

#[test]
fn test_export_then_import_elsewhere() {
    let source = TestEnv::init();
    source.dispatch(r#"{"type": "set_agent_name", "name": "Nomad"}"#);
    let bundle = source.data_path().join("backup.json");

    source
        .qlog()
        .args(["export", "--password", PASSWORD])
        .arg(&bundle)
        .assert()
        .success();
    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&bundle).unwrap()).unwrap();
    assert!(exported["encryptedState"].is_string());
    assert!(exported["verificationData"].is_string());

    let target = TestEnv::new();
    target.qlog().arg("import").arg(&bundle).assert().success();
    assert_eq!(target.state()["agentName"], "Nomad");
}

#[test]
fn test_import_rejects_malformed_bundle() {
    let env = TestEnv::init();
    env.dispatch(r#"{"type": "set_agent_name", "name": "Untouched"}"#);
    let bad = env.data_path().join("bad.json");
    std::fs::write(&bad, r#"{"encryptedState": "x"}"#).unwrap();

    env.qlog()
        .arg("import")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Corrupt bundle"));
    assert_eq!(env.state()["agentName"], "Untouched");
}

#[test]
fn test_legacy_data_is_discarded() {
    let env = TestEnv::new();
    std::fs::write(env.data_path().join("legacy-state"), r#"{"tasks": []}"#).unwrap();
    std::fs::write(env.data_path().join("legacy-version"), "1").unwrap();

    env.qlog()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("needs_creation"));
    assert!(!env.data_path().join("legacy-state").exists());
    assert!(!env.data_path().join("legacy-version").exists());
}
