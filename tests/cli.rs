use assert_cmd::prelude::*;
use serde_json::Value;
use std::process::Command;

fn accord() -> Command {
    let mut cmd = Command::cargo_bin("accord").expect("binary built");
    cmd.env_remove("RUST_LOG")
        .env("ACCORD_LOG_LEVEL", "warn")
        .args(["--config", "tests/fixtures/no-such-config.yaml"]);
    cmd
}

#[test]
fn normalize_prints_one_path_per_line() {
    let assert = accord()
        .args(["normalize", "/", "/html[1]/body[1]/div", ".//p"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["/html", "/html/body/div[1]", "p[1]"]);
}

#[test]
fn run_replays_native_results() {
    let assert = accord()
        .args([
            "run",
            "--job",
            "tests/fixtures/job.yaml",
            "--page",
            "tests/fixtures/page.json",
            "--native",
            "axe=tests/fixtures/axe.json",
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let report: Value = serde_json::from_str(&stdout).expect("report json");

    let acts = report["acts"].as_array().unwrap();
    assert_eq!(acts.len(), 3);
    assert_eq!(acts[1]["totals"], serde_json::json!([0, 0, 0, 0]));

    let axe = &acts[2];
    assert_eq!(axe["state"], "SUCCEEDED");
    assert_eq!(axe["totals"], serde_json::json!([0, 0, 0, 1]));
    let instance = &axe["standardResult"]["instances"][0];
    assert_eq!(instance["ruleID"], "image-alt");
    let position = instance["catalogIndex"].as_u64().expect("catalog index attached");
    assert_eq!(
        report["catalog"]["element"][position.to_string()]["pathID"],
        "/html/body/img[1]"
    );
}

#[test]
fn catalog_prints_indices() {
    let assert = accord()
        .args(["catalog", "--page", "tests/fixtures/page.json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let catalog: Value = serde_json::from_str(&stdout).expect("catalog json");
    assert!(catalog["tagName"]["img"].is_array());
    assert!(catalog["element"]["0"].is_object());
}

#[test]
fn unknown_native_checker_fails() {
    accord()
        .args([
            "run",
            "--job",
            "tests/fixtures/job.yaml",
            "--page",
            "tests/fixtures/page.json",
            "--native",
            "alfa=tests/fixtures/axe.json",
        ])
        .assert()
        .failure();
}
