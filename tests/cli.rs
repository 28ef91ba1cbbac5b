use std::fs;

use assert_cmd::Command;
use predicates::str::contains;

mod common;

use common::{TestWorkspace, sample_export};

#[test]
fn questions_lists_builtin_metadata() {
    Command::cargo_bin("survey-tidy")
        .expect("binary exists")
        .arg("questions")
        .assert()
        .success()
        .stdout(contains("DE14"))
        .stdout(contains("ParentGender"))
        .stdout(contains("RowSub"));
}

#[test]
fn tidy_writes_row_anchored_csv() {
    let ws = TestWorkspace::new();
    let input = ws.write("export.csv", &sample_export());
    let output = ws.path().join("pl1.csv");

    Command::cargo_bin("survey-tidy")
        .expect("binary exists")
        .args([
            "tidy",
            "-i",
            input.to_str().unwrap(),
            "-q",
            "PL1",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read tidy csv");
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("respondent,group,value"));
    assert!(contents.contains("PhD students"));
    assert!(contents.contains("Postdocs"));
    assert!(contents.contains("Yes, teaching relief only"));
}

#[test]
fn tidy_normalizes_duration_units_per_row() {
    let ws = TestWorkspace::new();
    let input = ws.write("export.csv", &sample_export());
    let output = ws.path().join("pl2.csv");

    Command::cargo_bin("survey-tidy")
        .expect("binary exists")
        .args([
            "tidy",
            "-i",
            input.to_str().unwrap(),
            "-q",
            "PL2",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read tidy csv");
    // 6 in the months subcolumn stays 6; weeks answers become fractional.
    assert!(contents.contains("R_1,Postdocs,6"));
    assert!(contents.contains("R_1,PhD students,2.7"));
    assert!(contents.contains("R_2,PhD students,0.9"));
}

#[test]
fn tidy_without_matching_columns_writes_nothing() {
    let ws = TestWorkspace::new();
    let input = ws.write("export.csv", &sample_export());
    let output = ws.path().join("pl10.csv");

    Command::cargo_bin("survey-tidy")
        .expect("binary exists")
        .args([
            "tidy",
            "-i",
            input.to_str().unwrap(),
            "-q",
            "PL10",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(!output.exists());
}

#[test]
fn chart_single_question_prints_json() {
    let ws = TestWorkspace::new();
    let input = ws.write("export.csv", &sample_export());

    Command::cargo_bin("survey-tidy")
        .expect("binary exists")
        .args(["chart", "-i", input.to_str().unwrap(), "-q", "DE2"])
        .assert()
        .success()
        .stdout(contains("\"kind\": \"categorical\""))
        .stdout(contains("Woman"));
}

#[test]
fn chart_all_writes_one_spec_per_question() {
    let ws = TestWorkspace::new();
    let input = ws.write("export.csv", &sample_export());
    let out_dir = ws.path().join("charts");

    Command::cargo_bin("survey-tidy")
        .expect("binary exists")
        .args([
            "chart",
            "-i",
            input.to_str().unwrap(),
            "-o",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success();

    for name in ["DE2.json", "DE14.json", "DE15.json", "PL1.json", "PL2.json", "DE23.json"] {
        assert!(out_dir.join(name).exists(), "missing {name}");
    }
    // Questions absent from the export produce no file.
    assert!(!out_dir.join("DE5.json").exists());

    let de23: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("DE23.json")).expect("read spec"))
            .expect("parse spec");
    assert_eq!(de23["data"]["kind"], "grouped");
    let x_labels = de23["data"]["x_labels"].as_array().expect("x labels");
    assert!(x_labels.iter().any(|v| v == "2020–2029"));
    assert_eq!(de23["data"]["series"][0]["name"], "Europe");
}

#[test]
fn chart_missing_input_fails() {
    Command::cargo_bin("survey-tidy")
        .expect("binary exists")
        .args(["chart", "-i", "no-such-file.csv", "-q", "DE2"])
        .assert()
        .failure()
        .stderr(contains("error"));
}
