//! End-to-end CLI tests against the fixtures.
//!
//! Covers exit codes and the JSON shape of `run`, `classify`, `check`,
//! `config` and `schema`.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("test")
        .join("fixtures")
}

fn config_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("config").join(name)
}

fn events_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("events").join(name)
}

/// pf-core with a pinned configuration and quiet logs.
fn pf_core() -> Command {
    let mut cmd = cargo_bin_cmd!("pf-core");
    cmd.env_remove("PF_MONITOR_PRESET")
        .env_remove("PF_LOG")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config_fixture("valid_monitor.json"))
        .arg("-q");
    cmd
}

fn stdout_json(cmd: &mut Command, code: i32) -> Value {
    let output = cmd.assert().code(code).get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is JSON")
}

// ============================================================================
// run
// ============================================================================

#[test]
fn run_clean_file_exits_zero() {
    let json = stdout_json(
        pf_core().arg("run").arg("--events").arg(events_fixture("clean.jsonl")),
        0,
    );
    assert_eq!(json["status"], "clean");
    assert_eq!(json["stats"]["events"], 2);
    assert_eq!(json["input"]["malformed"], 0);
    assert!(json["ratios"]
        .as_object()
        .unwrap()
        .contains_key("L1T/L1TStage2uGT/timing_aux/Ratios/ratio_all_algos_vs_bx"));
    assert!(json.get("histograms").is_none());
}

#[test]
fn run_with_unclassified_event_reports_anomalies() {
    let json = stdout_json(
        pf_core()
            .arg("run")
            .arg("--events")
            .arg(events_fixture("two_lumi_blocks.jsonl"))
            .arg("--histograms"),
        1,
    );
    assert_eq!(json["status"], "anomalies");
    assert_eq!(json["stats"]["unclassified"], 1);
    assert_eq!(json["stats"]["luminosity_blocks"], 2);
    assert!(json["histograms"]["histograms"]
        .as_object()
        .unwrap()
        .contains_key("L1T/L1TObjects/Timing/Prefirable"));
}

#[test]
fn run_survives_corrupt_lines() {
    let json = stdout_json(
        pf_core()
            .arg("run")
            .arg("--events")
            .arg(events_fixture("corrupt.jsonl")),
        1,
    );
    assert_eq!(json["status"], "anomalies");
    assert_eq!(json["input"]["malformed"], 2);
    assert_eq!(json["stats"]["events"], 4);
}

#[test]
fn run_reads_stdin() {
    let events = std::fs::read_to_string(events_fixture("clean.jsonl")).unwrap();
    let json = stdout_json(
        pf_core()
            .args(["run", "--events", "-"])
            .write_stdin(events),
        0,
    );
    assert_eq!(json["stats"]["events"], 2);
}

#[test]
fn run_writes_report_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("report.json");
    pf_core()
        .arg("run")
        .arg("--events")
        .arg(events_fixture("clean.jsonl"))
        .arg("--output")
        .arg(&out)
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());

    let report: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report["stats"]["prefirable"], 1);
}

#[test]
fn run_missing_event_file_is_input_error() {
    pf_core()
        .args(["run", "--events", "/nonexistent/events.jsonl"])
        .assert()
        .code(12)
        .stderr(predicate::str::contains("ERR_INPUT"));
}

#[test]
fn run_with_invalid_config_is_config_error() {
    cargo_bin_cmd!("pf-core")
        .arg("--config")
        .arg(config_fixture("invalid_monitor_bad_threshold.json"))
        .arg("-q")
        .arg("run")
        .arg("--events")
        .arg(events_fixture("clean.jsonl"))
        .assert()
        .code(11)
        .stderr(predicate::str::contains("\"status\": \"error\""));
}

// ============================================================================
// classify
// ============================================================================

#[test]
fn classify_history_reports_fired_rule() {
    let json = stdout_json(pf_core().args(["classify", "--history", "10,25,150,300"]), 0);
    assert_eq!(json["classification"]["unprefirable"], true);
    assert_eq!(json["classification"]["fired_rule"]["window"], 25);
}

#[test]
fn classify_short_history_is_an_anomaly() {
    let json = stdout_json(pf_core().args(["classify", "--history", "10,20"]), 1);
    assert_eq!(json["classification"]["unprefirable"], false);
    assert_eq!(json["classification"]["diagnostics"][0]["kind"], "short_history");
}

#[test]
fn classify_summary_is_one_line() {
    pf_core()
        .args(["-f", "summary", "classify", "--history", "3,50,150,300"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("unprefirable (1 in 3)"));
}

#[test]
fn classify_record_json() {
    let record = r#"{"current":{"bx_id":1001,"orbit":100},"history":[{"bx_id":991,"orbit":100},{"bx_id":981,"orbit":100},{"bx_id":851,"orbit":100},{"bx_id":701,"orbit":100}]}"#;
    let json = stdout_json(pf_core().args(["classify", "--record", record]), 0);
    assert_eq!(json["distances"], serde_json::json!([10, 20, 150, 300]));
    assert_eq!(json["classification"]["unprefirable"], false);
}

#[test]
fn classify_needs_one_input() {
    pf_core().arg("classify").assert().code(10);
}

// ============================================================================
// check / config / schema
// ============================================================================

#[test]
fn check_reports_source_and_monitors() {
    let json = stdout_json(pf_core().arg("check"), 0);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["source"], "CLI argument");
    assert_eq!(
        json["monitors"],
        serde_json::json!(["algo_timing", "object_timing", "jet_prefiring"])
    );
}

#[test]
fn check_missing_config_file() {
    cargo_bin_cmd!("pf-core")
        .args(["--config", "/nonexistent/monitor.json", "-q", "check"])
        .assert()
        .code(11);
}

#[test]
fn unknown_preset_is_an_argument_error() {
    pf_core().args(["--preset", "offline", "check"]).assert().code(10);
}

#[test]
fn config_show_applies_preset_under_file() {
    let json = stdout_json(pf_core().args(["--preset", "emulator", "config", "show"]), 0);
    // The fixture sets l1_jets explicitly, so the file wins over the preset.
    assert_eq!(json["config"]["sources"]["l1_jets"], "caloStage2Digis:Jet");
    assert_eq!(json["config"]["trigger_menu"]["name"], "L1Menu_Collisions2018_v2_1_0");
}

#[test]
fn config_schema_describes_monitor_json() {
    let json = stdout_json(pf_core().args(["config", "schema"]), 0);
    assert!(json["properties"]["matching"].is_object());
}

#[test]
fn schema_list_and_lookup() {
    let json = stdout_json(pf_core().args(["schema", "--list"]), 0);
    let names: Vec<&str> = json["schemas"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert!(names.contains(&"EventRecord"));

    pf_core().args(["schema", "NoSuchType"]).assert().code(10);
}
