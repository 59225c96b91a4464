//! Integration tests for the lift binary.
//!
//! These tests verify end-to-end behavior including:
//! - Automatic session runs and journal logging
//! - Plan and validation output
//! - History and CSV rollup
//! - Config files and their limits

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCENARIO: &str = r#"{
    "id": "scenario",
    "name": "Scenario Day",
    "description": "Squat, rest, plank",
    "blocks": [
        {"type": "exercise", "id": "e1", "exerciseId": "back_squat",
         "sets": [{"value": 10, "weight": 45}, {"value": 10, "weight": 45}], "restBetweenSets": 30},
        {"type": "rest", "id": "r1", "duration": 60},
        {"type": "exercise", "id": "e2", "exerciseId": "plank", "sets": [{"metric": "time", "value": 5}]}
    ]
}"#;

const SUPERSET: &str = r#"{
    "id": "superset",
    "name": "Superset Day",
    "blocks": [
        {"type": "exercise", "id": "a", "exerciseId": "bench_press", "sets": [{"value": 5, "weight": 80}]},
        {"type": "group", "id": "g", "name": "Pull/Push", "rounds": 3,
         "blocks": [
            {"type": "exercise", "id": "b", "exerciseId": "pullup", "sets": [{"value": 8}]},
            {"type": "exercise", "id": "c", "exerciseId": "custom_move", "sets": [{"value": 12}]}
         ]},
        {"type": "rest", "id": "d", "duration": 90}
    ]
}"#;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("lift"))
}

fn write_workout(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write workout");
    path
}

fn journal_lines(data_dir: &Path) -> Vec<Value> {
    let content = fs::read_to_string(data_dir.join("journal/sessions.jsonl"))
        .expect("Failed to read journal");
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("journal line is JSON"))
        .collect()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Structured workout session runner"));
}

#[test]
fn test_auto_run_logs_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let workout = write_workout(temp_dir.path(), "scenario.json", SCENARIO);

    cli()
        .arg("run")
        .arg(&workout)
        .arg("--auto")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Barbell Back Squat"))
        .stdout(predicate::str::contains(
            "Demo: https://www.youtube.com/watch?v=ultWZbUMPL8",
        ))
        .stdout(predicate::str::contains("Workout finished"))
        .stdout(predicate::str::contains("3 of 3 sets logged (completed)"))
        .stdout(predicate::str::contains("Session logged"));

    let records = journal_lines(&data_dir);
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record["workout_id"], "scenario");
    assert_eq!(record["outcome"], "completed");
    assert_eq!(record["blocks"][0]["block_id"], "e1");
    assert_eq!(record["blocks"][0]["reps"], serde_json::json!([10, 10]));
    assert_eq!(record["blocks"][0]["weight"], serde_json::json!([45.0, 45.0]));
    assert_eq!(record["blocks"][1]["reps"], serde_json::json!([5]));
    assert_eq!(record["blocks"][1]["weight"], serde_json::json!([null]));
}

#[test]
fn test_dry_run_does_not_log() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let workout = write_workout(temp_dir.path(), "scenario.json", SCENARIO);

    cli()
        .arg("run")
        .arg(&workout)
        .arg("--dry-run")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(!data_dir.join("journal/sessions.jsonl").exists());
}

#[test]
fn test_plan_shows_flattened_order() {
    let temp_dir = setup_test_dir();
    let workout = write_workout(temp_dir.path(), "superset.json", SUPERSET);

    let output = cli()
        .arg("plan")
        .arg(&workout)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&output);

    let bench = stdout.find("1. Barbell Bench Press").expect("bench listed");
    let pullup = stdout.find("2. Pull-up").expect("pullup listed");
    // Unknown exercise ids fall back to the raw id
    let custom = stdout.find("3. custom_move").expect("custom listed");
    let rest = stdout.find("4. Rest 90s").expect("rest listed");
    assert!(bench < pullup && pullup < custom && custom < rest);

    assert!(stdout.contains("declares 3 rounds"));
    assert!(!stdout.contains("5. "));
}

#[test]
fn test_validate_accepts_good_workout() {
    let temp_dir = setup_test_dir();
    let workout = write_workout(temp_dir.path(), "superset.json", SUPERSET);

    cli()
        .arg("validate")
        .arg(&workout)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid (4 blocks after flattening)"));
}

#[test]
fn test_validate_rejects_broken_workout() {
    let temp_dir = setup_test_dir();
    let workout = write_workout(
        temp_dir.path(),
        "broken.json",
        r#"{"id": "b", "name": "Broken", "blocks": [
            {"type": "group", "id": "g", "rounds": 0, "blocks": []}
        ]}"#,
    );

    cli()
        .arg("validate")
        .arg(&workout)
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 1 round"))
        .stderr(predicate::str::contains("no exercise blocks"));
}

#[test]
fn test_run_refuses_invalid_workout() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let workout = write_workout(
        temp_dir.path(),
        "empty.json",
        r#"{"id": "empty", "name": "Empty", "blocks": []}"#,
    );

    cli()
        .arg("run")
        .arg(&workout)
        .arg("--auto")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no blocks"));

    assert!(!data_dir.join("journal/sessions.jsonl").exists());
}

#[test]
fn test_history_lists_sessions() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let workout = write_workout(temp_dir.path(), "superset.json", SUPERSET);

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions in the last 7 days"));

    for _ in 0..2 {
        cli()
            .arg("run")
            .arg(&workout)
            .arg("--auto")
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();
    }

    let output = cli()
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&output);
    assert_eq!(stdout.matches("Superset Day").count(), 2);
    assert!(stdout.contains("3/3 sets"));
}

#[test]
fn test_rollup_creates_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let workout = write_workout(temp_dir.path(), "scenario.json", SCENARIO);

    for _ in 0..3 {
        cli()
            .arg("run")
            .arg(&workout)
            .arg("--auto")
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();
    }

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 3 sessions"));

    let csv_path = data_dir.join("sessions.csv");
    let mut reader = csv::Reader::from_path(&csv_path).expect("CSV exists");
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "session_id");
    // 3 sessions x 3 sets
    assert_eq!(reader.records().count(), 9);

    // History still sees the archived sessions
    let output = cli()
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        String::from_utf8_lossy(&output)
            .matches("Scenario Day")
            .count(),
        3
    );
}

#[test]
fn test_rollup_with_cleanup() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let workout = write_workout(temp_dir.path(), "scenario.json", SCENARIO);

    cli()
        .arg("run")
        .arg(&workout)
        .arg("--auto")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned up 1 processed journal"));

    let leftovers: Vec<_> = fs::read_dir(data_dir.join("journal"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".processed"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_empty_rollup() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to roll up"));
}

#[test]
fn test_history_days_out_of_range_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");

    for days in ["0", "36501", "200000000000000"] {
        cli()
            .arg("history")
            .arg("--days")
            .arg(days)
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .failure()
            .stderr(predicate::str::contains("--days"));
    }

    cli()
        .arg("history")
        .arg("--days")
        .arg("36500")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();
}

#[test]
fn test_config_history_days_out_of_range_rejected() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[session]\nhistory_days = 200000000000000\n").unwrap();

    cli()
        .arg("history")
        .arg("--config")
        .arg(&config_path)
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("history_days"));
}

#[test]
fn test_init_config_writes_defaults() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("lift/config.toml");

    cli()
        .arg("init-config")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));

    let contents = fs::read_to_string(&config_path).expect("config written");
    assert!(contents.contains("[session]"));
    assert!(contents.contains("history_days = 7"));

    fs::write(&config_path, "not = [valid").unwrap();

    cli()
        .arg("init-config")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&config_path).unwrap(), "not = [valid");

    // A broken config can still be replaced
    cli()
        .arg("init-config")
        .arg("--config")
        .arg(&config_path)
        .arg("--force")
        .assert()
        .success();
    assert!(fs::read_to_string(&config_path)
        .unwrap()
        .contains("tick_interval_ms = 1000"));
}

#[test]
fn test_custom_exercises_from_config() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let workout = write_workout(temp_dir.path(), "superset.json", SUPERSET);
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[[exercises.custom]]
id = "custom_move"
name = "Sandbag Carry"
media_url = "https://example.org/sandbag-carry"

[[exercises.custom]]
id = "nameless"
name = " "
"#,
    )
    .unwrap();

    cli()
        .env_remove("RUST_LOG")
        .arg("run")
        .arg(&workout)
        .arg("--auto")
        .arg("--config")
        .arg(&config_path)
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sandbag Carry"))
        .stdout(predicate::str::contains(
            "Demo: https://example.org/sandbag-carry",
        ))
        .stderr(predicate::str::contains("Exercise 'nameless' has an empty name"));
}
