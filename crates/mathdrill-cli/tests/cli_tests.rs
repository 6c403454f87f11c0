//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mathdrill() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("mathdrill").unwrap()
}

#[test]
fn validate_single_exercise() {
    mathdrill()
        .arg("validate")
        .arg("--exercise")
        .arg("../../exercises/pythagoras.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("pythagoras-hypotenuse"))
        .stdout(predicate::str::contains("engine PYTHAGORAS"))
        .stdout(predicate::str::contains("All 1 exercise(s) valid."));
}

#[test]
fn validate_directory() {
    mathdrill()
        .arg("validate")
        .arg("--exercise")
        .arg("../../exercises")
        .assert()
        .success()
        .stdout(predicate::str::contains("angles-complementary"))
        .stdout(predicate::str::contains("isosceles-triangle"))
        .stdout(predicate::str::contains("linear-function"))
        .stdout(predicate::str::contains("inequality-interval"))
        .stdout(predicate::str::contains("All 6 exercise(s) valid."));
}

#[test]
fn validate_reports_every_field_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(
        &path,
        r#"{
            "id": "broken",
            "visual_engine": "NUMBER_LINE",
            "visual_config": { "min": 5, "max": 1 },
            "levels": { "1": { "correct_answer": "4" } }
        }"#,
    )
    .unwrap();

    mathdrill()
        .arg("validate")
        .arg("--exercise")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("[levels.1.question] : required field is missing"))
        .stdout(predicate::str::contains("[visual_config.max] : must be greater than min"))
        .stderr(predicate::str::contains("1 of 1 exercise(s) invalid"));
}

#[test]
fn validate_directory_keeps_going_after_failure() {
    let dir = TempDir::new().unwrap();
    std::fs::copy(
        "../../exercises/geometry.json",
        dir.path().join("geometry.json"),
    )
    .unwrap();
    std::fs::write(dir.path().join("syntax.json"), "{ \"id\": ").unwrap();

    mathdrill()
        .arg("validate")
        .arg("--exercise")
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("OK   "))
        .stdout(predicate::str::contains("FAIL"))
        .stderr(predicate::str::contains("1 of 2 exercise(s) invalid"));
}

#[test]
fn validate_nonexistent_file() {
    mathdrill()
        .arg("validate")
        .arg("--exercise")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL"))
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    mathdrill()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created mathdrill.toml"))
        .stdout(predicate::str::contains("Created exercises/example.json"));

    assert!(dir.path().join("mathdrill.toml").exists());
    assert!(dir.path().join("exercises/example.json").exists());

    // The generated example must itself be valid.
    mathdrill()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--exercise")
        .arg("exercises/example.json")
        .assert()
        .success();
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    mathdrill().current_dir(dir.path()).arg("init").assert().success();

    mathdrill()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("mathdrill.toml already exists, skipping."))
        .stdout(predicate::str::contains("exercises/example.json already exists, skipping."));
}

#[test]
fn generate_text_is_reproducible() {
    let run = || {
        mathdrill()
            .arg("generate")
            .arg("--exercise")
            .arg("../../exercises/angles-opposite.json")
            .arg("--seed")
            .arg("42")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    };

    let first = String::from_utf8(run()).unwrap();
    assert_eq!(first, String::from_utf8(run()).unwrap());
    assert!(first.contains("[level 1, seed 42]"));
    assert!(first.contains("Answer: "));
    assert!(first.contains("Reward: 5 xp"));
    assert!(!first.contains("{a}"));
}

#[test]
fn generate_json_evaluates_answer() {
    let output = mathdrill()
        .arg("generate")
        .arg("--exercise")
        .arg("../../exercises/pythagoras.json")
        .arg("--seed")
        .arg("7")
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let instance: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(instance["exercise_id"], "pythagoras-hypotenuse");
    assert_eq!(instance["seed"], 7);
    let k = instance["bindings"]["k"].as_f64().unwrap();
    assert_eq!(instance["correct_answer"], (5.0 * k).to_string());
    assert_eq!(instance["xp"], 10);
}

#[test]
fn generate_multiple_choice_lists_options() {
    mathdrill()
        .arg("generate")
        .arg("--exercise")
        .arg("../../exercises/angles-complementary.json")
        .arg("--level")
        .arg("2")
        .arg("--seed")
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("  1. "))
        .stdout(predicate::str::contains("  3. "))
        .stdout(predicate::str::contains("Reward: 8 xp"));
}

#[test]
fn generate_unknown_level() {
    mathdrill()
        .arg("generate")
        .arg("--exercise")
        .arg("../../exercises/geometry.json")
        .arg("--level")
        .arg("9")
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no level 9"));
}

#[test]
fn render_to_stdout() {
    mathdrill()
        .arg("render")
        .arg("--exercise")
        .arg("../../exercises/angles-complementary.json")
        .arg("--seed")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<svg"))
        .stdout(predicate::str::contains("viewBox=\"0 0 300 300\""))
        .stdout(predicate::str::contains("?"));
}

#[test]
fn render_every_engine_to_file() {
    let dir = TempDir::new().unwrap();

    for name in [
        "angles-opposite",
        "cartesian",
        "geometry",
        "number-line",
        "pythagoras",
    ] {
        let out = dir.path().join(format!("svg/{name}.svg"));
        mathdrill()
            .arg("render")
            .arg("--exercise")
            .arg(format!("../../exercises/{name}.json"))
            .arg("--seed")
            .arg("5")
            .arg("--output")
            .arg(&out)
            .assert()
            .success()
            .stderr(predicate::str::contains("Diagram written to"));

        let svg = std::fs::read_to_string(&out).unwrap();
        assert!(svg.starts_with("<svg"), "{name}: {svg}");
        assert!(svg.contains("<path") || svg.contains("<line"), "{name}: {svg}");
    }
}

#[test]
fn render_uses_configured_canvas_size() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("mathdrill.toml");
    std::fs::write(&config, "[render]\ncanvas_size = 600\n").unwrap();

    mathdrill()
        .arg("render")
        .arg("--exercise")
        .arg("../../exercises/geometry.json")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("width=\"600\""))
        .stdout(predicate::str::contains("viewBox=\"0 0 300 300\""));
}

#[test]
fn score_text_summary() {
    mathdrill()
        .arg("score")
        .arg("--subject")
        .arg("../../subjects/brevet-blanc.json")
        .arg("--answers")
        .arg("../../subjects/answers.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Brevet blanc n°1"))
        .stdout(predicate::str::contains("Points: 7/10 (3 of 5 correct)"))
        .stdout(predicate::str::contains("Mark: 14/20"))
        .stdout(predicate::str::contains("Not evaluated: 4 point(s)"));
}

#[test]
fn score_json_report() {
    let output = mathdrill()
        .arg("score")
        .arg("--subject")
        .arg("../../subjects/brevet-blanc.json")
        .arg("--answers")
        .arg("../../subjects/answers.json")
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["subject_id"], "brevet-blanc-1");
    assert_eq!(report["mark"], 14.0);
    assert_eq!(report["parts"][0]["earned"], 5.0);
    assert_eq!(report["parts"][1]["earned"], 2.0);
}

#[test]
fn score_with_html_and_save() {
    let dir = TempDir::new().unwrap();
    let sheet = dir.path().join("sheet.html");
    let results = dir.path().join("results");

    mathdrill()
        .env("MATHDRILL_RESULTS_DIR", &results)
        .arg("score")
        .arg("--subject")
        .arg("../../subjects/brevet-blanc.json")
        .arg("--answers")
        .arg("../../subjects/answers.json")
        .arg("--html")
        .arg(&sheet)
        .arg("--save")
        .assert()
        .success()
        .stderr(predicate::str::contains("Score sheet written to"))
        .stderr(predicate::str::contains("Result saved to the file store"));

    let html = std::fs::read_to_string(&sheet).unwrap();
    assert!(html.contains("14 / 20"));

    let saved: Vec<_> = std::fs::read_dir(&results).unwrap().collect();
    assert_eq!(saved.len(), 1);
}

#[test]
fn score_rejects_invalid_subject() {
    let dir = TempDir::new().unwrap();
    let subject = dir.path().join("subject.json");
    std::fs::write(
        &subject,
        r#"{ "id": "s", "title": "S", "parts": [ { "id": "p", "exercises": [ { "id": "e",
            "questions": [ { "id": "q1", "points": 2 } ] } ] } ] }"#,
    )
    .unwrap();

    mathdrill()
        .arg("score")
        .arg("--subject")
        .arg(&subject)
        .arg("--answers")
        .arg("../../subjects/answers.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("scored question has no expected answer"));
}
