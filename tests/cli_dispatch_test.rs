//! Integration tests for `qlog dispatch` and `qlog quests`.

mod common;

use common::{PASSWORD, TestEnv};
use predicates::prelude::*;

#[test]
fn test_add_and_complete_task() {
    let env = TestEnv::init();
    let added = env.dispatch(
        r#"{"type": "add_task", "text": "Ship release", "xp": 40, "tags": ["Engineering"]}"#,
    );
    assert_eq!(added["changed"], true);
    assert_eq!(added["summary"]["openTasks"], 1);

    let id = env.state()["tasks"][0]["id"].as_str().unwrap().to_string();
    let toggled = env.dispatch(&format!(
        r#"{{"type": "toggle_task_status", "id": "{}"}}"#,
        id
    ));
    assert_eq!(toggled["summary"]["totalXp"], 40);
    assert_eq!(toggled["summary"]["streak"], 1);

    let state = env.state();
    assert_eq!(state["tasks"][0]["completed"], true);
    assert_eq!(state["skills"][0]["name"], "Engineering");
    assert_eq!(state["skills"][0]["xp"], 40);
    assert!(
        state["achievements"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a == "first-task")
    );
}

#[test]
fn test_noop_reports_no_change() {
    let env = TestEnv::init();
    let result = env.dispatch(r#"{"type": "delete_task", "id": "missing"}"#);
    assert_eq!(result["changed"], false);
    assert_eq!(result["action"], "delete_task");
}

#[test]
fn test_human_dispatch_output() {
    let env = TestEnv::init();
    env.qlog()
        .args([
            "-H",
            "dispatch",
            "--password",
            PASSWORD,
            r#"{"type": "add_reward", "name": "Coffee", "cost": 50}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("add_reward: applied"));
}

#[test]
fn test_invalid_action_json() {
    let env = TestEnv::init();
    env.qlog()
        .args(["dispatch", "--password", PASSWORD, r#"{"type": "teleport"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid action"));
    env.qlog()
        .args(["dispatch", "--password", PASSWORD, "not json"])
        .assert()
        .failure();
}

#[test]
fn test_redeem_needs_enough_xp() {
    let env = TestEnv::init();
    env.dispatch(r#"{"type": "add_reward", "name": "Movie night", "cost": 30}"#);
    let reward_id = env.state()["rewards"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let redeem = format!(r#"{{"type": "redeem_reward", "id": "{}"}}"#, reward_id);

    assert_eq!(env.dispatch(&redeem)["changed"], false);

    env.dispatch(r#"{"type": "add_task", "text": "Earn it", "xp": 35}"#);
    let task_id = env.state()["tasks"][0]["id"].as_str().unwrap().to_string();
    env.dispatch(&format!(
        r#"{{"type": "toggle_task_status", "id": "{}"}}"#,
        task_id
    ));

    let redeemed = env.dispatch(&redeem);
    assert_eq!(redeemed["changed"], true);
    assert_eq!(redeemed["summary"]["spendableXp"], 5);
}

#[test]
fn test_questline_goal_spawns_first_step() {
    let env = TestEnv::init();
    env.dispatch(
        r#"{"type": "add_goal", "name": "Learn Rust", "questline": [
            {"title": "Read the book", "xp": 30},
            {"title": "Write a CLI", "xp": 60}
        ]}"#,
    );
    let state = env.state();
    let tasks = state["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["text"], "Read the book");
    assert_eq!(tasks[0]["xp"], 30);
}

#[test]
fn test_apply_generated_quests_once_per_day() {
    let env = TestEnv::init();
    let response = r#"{"quests": [
        {"type": "complete-tasks", "description": "Finish two tasks", "target": 2, "rewardXp": 20},
        {"type": "write-journal", "description": "Write an entry", "target": 1, "rewardXp": 10}
    ]}"#;

    env.qlog()
        .args(["quests", "--password", PASSWORD, response])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""questsToday":2"#))
        .stdout(predicate::str::contains(r#""changed":true"#));

    env.qlog()
        .args(["quests", "--password", PASSWORD, response])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""changed":false"#));
}

#[test]
fn test_malformed_generated_quests() {
    let env = TestEnv::init();
    env.qlog()
        .args(["quests", "--password", PASSWORD, r#"[{"type": "sing"}]"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no usable quests"));
}

#[test]
fn test_journal_entry_advances_quest() {
    let env = TestEnv::init();
    env.qlog()
        .args([
            "quests",
            "--password",
            PASSWORD,
            r#"[{"type": "write-journal", "description": "Reflect", "target": 1, "rewardXp": 10}]"#,
        ])
        .assert()
        .success();
    env.dispatch(r#"{"type": "add_journal_entry", "text": "Good day"}"#);

    let quest = env.state()["dailyQuests"]["quests"][0].clone();
    assert_eq!(quest["current"], 1);
    let claimed = env.dispatch(&format!(
        r#"{{"type": "claim_quest_reward", "questId": "{}"}}"#,
        quest["id"].as_str().unwrap()
    ));
    assert_eq!(claimed["changed"], true);
    assert_eq!(claimed["summary"]["commonCaches"], 1);
}
