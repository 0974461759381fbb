//! Smoke tests -- verify the binary runs against a fixture incident file.

use assert_cmd::Command;
use predicates::prelude::*;

const FIXTURE: &str = "tests/fixtures/incidents.json";

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("incident-intel").unwrap();
    cmd.env_remove("INCIDENT_INTEL_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Incident intelligence engine"));
}

#[test]
fn test_cli_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("incident-intel"));
}

#[test]
fn test_list_shows_fixture_incidents() {
    cli()
        .args(["--data", FIXTURE, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inc-oom-current"))
        .stdout(predicate::str::contains("CRASH_LOOP_BACKOFF"));
}

#[test]
fn test_insights_json_is_capped_and_ordered() {
    let output = cli()
        .args(["--data", FIXTURE, "insights", "inc-oom-current", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let insights: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let priorities: Vec<u64> = insights
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["priority"].as_u64().unwrap())
        .collect();
    assert!(!priorities.is_empty() && priorities.len() <= 8);
    assert!(priorities.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_related_ranks_same_workload_first() {
    let output = cli()
        .args(["--data", FIXTURE, "related", "inc-oom-current", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let related: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(related[0]["incident"]["id"], "inc-oom-1");
    assert_eq!(related[0]["index"], 1);
    assert_eq!(related[0]["similarityScore"], 100);
    assert_eq!(related[0]["correlationConfidence"], 95);
}

#[test]
fn test_predict_matches_weighted_factors() {
    cli()
        .args(["--data", FIXTURE, "predict", "inc-oom-current", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"probability\": 71"))
        .stdout(predicate::str::contains("\"fixId\": \"Raise memory limit\""));
}

#[test]
fn test_report_markdown_to_stdout() {
    cli()
        .args(["--data", FIXTURE, "report", "inc-oom-current"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Root Cause Analysis Report"))
        .stdout(predicate::str::contains("RCA-"))
        .stdout(predicate::str::contains("Adjust memory limits"));
}

#[test]
fn test_report_written_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .args(["--data", FIXTURE, "report", "inc-oom-current", "--format", "html", "--out"])
        .arg(dir.path())
        .assert()
        .success();

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("RCA-RCA-"));
    assert!(files[0].ends_with(".html"));
}

#[test]
fn test_unknown_incident_fails() {
    cli()
        .args(["--data", FIXTURE, "insights", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("incident not found"));
}

fn fixture_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(FIXTURE)
}

#[test]
fn test_broken_local_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("incident-intel.toml"), "[related]\nlimit = \"many\"\n").unwrap();

    cli()
        .current_dir(dir.path())
        .arg("--data")
        .arg(fixture_path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("inc-oom-current"))
        .stderr(predicate::str::contains("config file could not be loaded"))
        .stderr(predicate::str::contains("incident-intel.toml"));
}

#[test]
fn test_missing_env_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();

    cli()
        .current_dir(dir.path())
        .env("INCIDENT_INTEL_CONFIG", dir.path().join("absent.toml"))
        .arg("--data")
        .arg(fixture_path())
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("config file could not be loaded"))
        .stderr(predicate::str::contains("absent.toml"));
}

#[test]
fn test_list_json_and_related_table() {
    let output = cli()
        .args(["--data", FIXTURE, "list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let incidents: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(incidents.as_array().unwrap().len(), 7);
    assert_eq!(incidents[0]["id"], "inc-oom-current");

    cli()
        .args(["--data", FIXTURE, "related", "inc-oom-current"])
        .assert()
        .success()
        .stdout(predicate::str::contains("        95% | Same failure pattern (OOM_KILL)"));
}
