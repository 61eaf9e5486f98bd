//! Integration tests for the `compare` subcommand
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn compare_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("benchdiff");
    cmd.arg("compare");
    for var in [
        "THRESHOLD_PERCENT",
        "NOISE_MULTIPLIER",
        "ERROR_MULTIPLIER",
        "ABS_DELTA_NS_FLOOR",
        "DELTA_MARGIN_PERCENT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_compare_markdown_report() {
    let mut cmd = compare_cmd();
    cmd.arg("-b")
        .arg(fixture("evm-opcodes-base-1.log"))
        .arg("-b")
        .arg(fixture("evm-opcodes-base-2.log"))
        .arg("-c")
        .arg(fixture("evm-opcodes-pr-1.log"))
        .arg("-c")
        .arg(fixture("evm-opcodes-pr-2.log"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("## Benchmark Comparison"))
        .stdout(predicate::str::contains(
            "Compared 4 entities: 1 regressions, 0 improvements, 1 new, 1 removed",
        ))
        .stdout(predicate::str::contains("### :warning: Regressions"))
        .stdout(predicate::str::contains("| ADD | 101.00 ns | 151.00 ns | **+49.5%** |"))
        .stdout(predicate::str::contains("| NEWOP |"))
        .stdout(predicate::str::contains("NEW"))
        .stdout(predicate::str::contains("REMOVED"));
}

#[test]
fn test_compare_discovers_runs_in_dir() {
    let mut cmd = compare_cmd();
    cmd.arg("--dir").arg(fixture(""));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("| ADD | 101.00 ns | 151.00 ns |"));
}

#[test]
fn test_compare_json_output() {
    let mut cmd = compare_cmd();
    cmd.arg("--dir").arg(fixture("")).arg("--format").arg("json");

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["summary"]["total"], 4);
    assert_eq!(parsed["summary"]["regressions"][0], "ADD");
    assert_eq!(parsed["summary"]["new"][0], "NEWOP");
    assert_eq!(parsed["summary"]["removed"][0], "OLDOP");
    assert_eq!(parsed["config"]["default_threshold_pct"], 5.0);

    let ids: Vec<&str> = parsed["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["entity_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["ADD", "NEWOP", "OLDOP", "SSTORE"]);
}

#[test]
fn test_compare_fail_on_regression() {
    let mut cmd = compare_cmd();
    cmd.arg("--dir").arg(fixture("")).arg("--fail-on-regression");

    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("### :warning: Regressions"))
        .stderr(predicate::str::contains("1 performance regression(s) detected"));
}

#[test]
fn test_compare_high_threshold_hides_regression() {
    let mut cmd = compare_cmd();
    cmd.arg("--dir")
        .arg(fixture(""))
        .arg("--threshold")
        .arg("60")
        .arg("--fail-on-regression");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No significant changes detected"));
}

#[test]
fn test_compare_threshold_from_environment() {
    let mut cmd = compare_cmd();
    cmd.env("THRESHOLD_PERCENT", "60")
        .arg("--dir")
        .arg(fixture(""))
        .arg("--fail-on-regression");

    cmd.assert().success();
}

#[test]
fn test_compare_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("benchdiff.toml");
    fs::write(&config, "default_threshold_pct = 60.0\n").unwrap();

    let mut cmd = compare_cmd();
    cmd.arg("--dir")
        .arg(fixture(""))
        .arg("--config")
        .arg(&config)
        .arg("--format")
        .arg("json");

    let output = cmd.output().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["config"]["default_threshold_pct"], 60.0);
    assert!(parsed["summary"]["regressions"].as_array().unwrap().is_empty());
}

#[test]
fn test_compare_higher_is_better_flips_groups() {
    let mut cmd = compare_cmd();
    cmd.arg("--dir")
        .arg(fixture(""))
        .arg("--direction")
        .arg("higher-is-better");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0 regressions, 1 improvements"))
        .stdout(predicate::str::contains("### :rocket: Improvements"));
}

#[test]
fn test_compare_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.md");

    let mut cmd = compare_cmd();
    cmd.arg("--dir").arg(fixture("")).arg("--output").arg(&out);
    cmd.assert().success().stdout(predicate::str::is_empty());

    let report = fs::read_to_string(&out).unwrap();
    assert!(report.starts_with("## Benchmark Comparison"));
}

#[test]
fn test_compare_no_entities_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.log");
    let pr = dir.path().join("pr.log");
    fs::write(&base, "Build succeeded.\n").unwrap();
    fs::write(&pr, "// * Summary *\nno table here\n").unwrap();

    let mut cmd = compare_cmd();
    cmd.arg("-b").arg(&base).arg("-c").arg(&pr);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No benchmark entities found"));
}

#[test]
fn test_compare_unreadable_run_is_skipped() {
    let mut cmd = compare_cmd();
    cmd.arg("-b")
        .arg(fixture("evm-opcodes-base-1.log"))
        .arg("-b")
        .arg(fixture("does-not-exist.log"))
        .arg("-c")
        .arg(fixture("evm-opcodes-pr-1.log"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("| ADD | 100.00 ns | 150.00 ns | **+50.0%** |"));
}

#[test]
fn test_compare_requires_inputs() {
    let mut cmd = compare_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("pass --base or --dir"));
}

#[test]
fn test_compare_rejects_negative_threshold() {
    let mut cmd = compare_cmd();
    cmd.arg("--dir").arg(fixture("")).arg("--threshold=-1");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("default_threshold_pct"));
}

#[test]
fn test_compare_custom_entity_column() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.log");
    let pr = dir.path().join("pr.log");
    fs::write(&base, "| Job | Mean |\n|---|---|\n| Sync | 10 ms |\n").unwrap();
    fs::write(&pr, "| Job | Mean |\n|---|---|\n| Sync | 20 ms |\n").unwrap();

    let mut cmd = compare_cmd();
    cmd.arg("-b")
        .arg(&base)
        .arg("-c")
        .arg(&pr)
        .arg("--entity-column")
        .arg("Job")
        .arg("--entity-label")
        .arg("Job");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("| Job | Base | PR |"))
        .stdout(predicate::str::contains("| Sync | 10.00 ms | 20.00 ms | **+100.0%** |"));
}
