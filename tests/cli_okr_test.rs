//! Integration tests for themes, objectives, key results and day focus via CLI.

mod common;

use common::TestEnv;
use predicates::prelude::*;

// === Theme Tests ===

#[test]
fn test_theme_ids_from_initials() {
    let env = TestEnv::init();
    assert_eq!(env.theme("Health & Fitness"), "HF");
    assert_eq!(env.theme("Home Finance"), "HF2");
    assert_eq!(env.theme("Career"), "C");

    let themes = env.json(&["theme", "list"]);
    assert_eq!(themes.as_array().unwrap().len(), 3);
    assert!(env.history().contains(&"Create theme HF2".to_string()));
}

#[test]
fn test_theme_update_and_blank_name() {
    let env = TestEnv::init();
    env.theme("Career");

    let outcome = env.json(&["theme", "update", "C", "--color", "#112233"]);
    assert_eq!(outcome["value"]["color"], "#112233");
    assert_eq!(outcome["value"]["name"], "Career");

    let outcome = env.rejected(&["theme", "update", "C", "--name", " "]);
    assert_eq!(outcome["violations"][0]["ruleId"], "title-required");
}

#[test]
fn test_theme_with_tasks_cannot_be_deleted() {
    let env = TestEnv::init();
    env.theme("Career");
    let id = env.task("C", "Update CV", &[]);

    let outcome = env.rejected(&["theme", "delete", "C"]);
    assert_eq!(outcome["violations"][0]["ruleId"], "theme-has-tasks");

    env.json(&["task", "delete", &id]);
    let outcome = env.json(&["theme", "delete", "C"]);
    assert_eq!(outcome["value"], "C");
    assert!(env.json(&["theme", "list"]).as_array().unwrap().is_empty());
}

#[test]
fn test_unknown_theme_is_an_error() {
    let env = TestEnv::init();
    env.bearing()
        .args(["theme", "delete", "ZZ"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("\"error\""));
}

// === Objective Tests ===

#[test]
fn test_nested_objectives_and_key_results() {
    let env = TestEnv::init();
    env.theme("Health & Fitness");

    let outcome = env.json(&["objective", "create", "HF", "Get fit"]);
    assert_eq!(outcome["value"]["id"], "HF.O1");
    let outcome = env.json(&["objective", "create", "HF.O1", "Run a marathon"]);
    assert_eq!(outcome["value"]["id"], "HF.O1.O1");
    assert_eq!(outcome["value"]["parentId"], "HF.O1");

    let outcome = env.json(&[
        "kr", "create", "HF.O1.O1", "Weekly km", "--start", "10", "--target", "50",
    ]);
    assert_eq!(outcome["value"]["id"], "HF.O1.O1.KR1");

    let outcome = env.json(&["kr", "update", "HF.O1.O1.KR1", "--current", "30"]);
    assert_eq!(outcome["value"]["currentValue"], 30.0);
    assert_eq!(outcome["value"]["startValue"], 10.0);

    let themes = env.json(&["theme", "list"]);
    let nested = &themes[0]["objectives"][0]["objectives"][0];
    assert_eq!(nested["keyResults"][0]["currentValue"], 30.0);

    env.bearing()
        .args(["-H", "theme", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HF.O1.O1.KR1 [active] Weekly km (30 / 50, 50%)"));
}

#[test]
fn test_objective_completion_requires_closed_children() {
    let env = TestEnv::init();
    env.theme("Career");
    env.json(&["objective", "create", "C", "Get promoted"]);
    env.json(&["objective", "create", "C.O1", "Lead a project"]);
    env.json(&["kr", "create", "C.O1", "Ship features", "--target", "3"]);

    let outcome = env.rejected(&["objective", "status", "C.O1", "completed"]);
    let violations = outcome["violations"].as_array().unwrap();
    assert_eq!(violations.len(), 2);
    assert!(
        violations
            .iter()
            .all(|v| v["ruleId"] == "objective-incomplete")
    );

    env.json(&["objective", "status", "C.O1.O1", "completed"]);
    env.json(&["kr", "status", "C.O1.KR1", "archived"]);
    let outcome = env.json(&["objective", "status", "C.O1", "completed"]);
    assert_eq!(outcome["value"]["status"], "completed");

    // Reopening is always allowed
    let outcome = env.json(&["objective", "status", "C.O1", "active"]);
    assert_eq!(outcome["value"]["status"], "active");
}

#[test]
fn test_active_objective_cannot_jump_to_archived() {
    let env = TestEnv::init();
    env.theme("Career");
    env.json(&["objective", "create", "C", "Side project"]);

    let outcome = env.rejected(&["objective", "status", "C.O1", "archived"]);
    assert_eq!(outcome["violations"][0]["ruleId"], "invalid-transition");
}

#[test]
fn test_delete_objective_removes_subtree() {
    let env = TestEnv::init();
    env.theme("Career");
    env.json(&["objective", "create", "C", "Get promoted"]);
    env.json(&["objective", "create", "C.O1", "Lead a project"]);

    env.json(&["objective", "delete", "C.O1"]);
    let themes = env.json(&["theme", "list"]);
    assert!(themes[0]["objectives"].as_array().unwrap().is_empty());

    // Ids are not reused
    let outcome = env.json(&["objective", "create", "C", "Learn Rust"]);
    assert_eq!(outcome["value"]["id"], "C.O2");
}

// === Day Focus Tests ===

#[test]
fn test_day_focus_set_list_clear() {
    let env = TestEnv::init();
    env.theme("Career");

    let outcome = env.json(&[
        "focus", "set", "2026-10-19", "-t", "C", "--text", "Write the design doc",
    ]);
    assert_eq!(outcome["value"]["themeId"], "C");

    let entries = env.json(&["focus", "list", "--year", "2026"]);
    assert_eq!(entries[0]["date"], "2026-10-19");
    assert_eq!(entries[0]["text"], "Write the design doc");

    env.json(&["focus", "clear", "2026-10-19"]);
    assert!(
        env.json(&["focus", "list", "--year", "2026"])
            .as_array()
            .unwrap()
            .is_empty()
    );

    env.bearing()
        .args(["focus", "clear", "2026-10-19"])
        .assert()
        .code(1);
}

#[test]
fn test_day_focus_with_unknown_theme_is_rejected() {
    let env = TestEnv::init();
    let outcome = env.rejected(&["focus", "set", "2026-01-01", "-t", "XX"]);
    assert_eq!(outcome["violations"][0]["ruleId"], "theme-not-found");
}
