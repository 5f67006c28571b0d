//! End-to-end tests for `authwatch analyze`.
//!
//! Runs the compiled binary against temporary log files.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const SAMPLE_LOG: &str = "\
2026-01-10 09:00:00 USER=bob IP=10.0.0.5 STATUS=FAIL
2026-01-10 09:01:00 USER=bob IP=10.0.0.5 STATUS=FAIL
2026-01-10 09:02:00 USER=bob IP=10.0.0.5 STATUS=FAIL
2026-01-10 09:03:00 USER=bob IP=10.0.0.5 STATUS=FAIL
2026-01-10 09:04:00 USER=bob IP=10.0.0.5 STATUS=FAIL
2026-01-10 02:15:00 USER=admin IP=192.168.1.9 STATUS=FAIL
2026-01-10 12:00:00 USER=alice IP=10.0.0.9 STATUS=OK
";

fn authwatch(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_authwatch"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("binary should run")
}

#[test]
fn test_analyze_writes_alert_log_and_report() {
    // Given: a log with a brute-forcing IP and an off-hours admin attempt
    let dir = TempDir::new().expect("should create temp dir");
    fs::write(dir.path().join("auth.log"), SAMPLE_LOG).expect("should write log");

    // When: analysing with explicit outputs
    let output = authwatch(
        dir.path(),
        &[
            "analyze",
            "auth.log",
            "--alerts",
            "alerts.txt",
            "--report",
            "report.txt",
        ],
    );

    // Then: success, both files exist, report printed to stdout
    assert!(output.status.success(), "analyze should succeed: {output:?}");

    let alerts = fs::read_to_string(dir.path().join("alerts.txt")).expect("alert log");
    assert!(alerts.contains("SECURITY ALERT LOG"));
    assert!(alerts.contains("Total alerts: 6"));
    assert!(alerts.contains(
        "[2026-01-10 02:15:00] [CRITICAL] Connection outside business hours | Attempt on privileged account admin - "
    ));

    let report = fs::read_to_string(dir.path().join("report.txt")).expect("report");
    assert!(report.contains("1. 10.0.0.5 : 5 failures"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SECURITY REPORT - GLOBAL ANALYSIS"));
}

#[test]
fn test_analyze_json_output_no_persist() {
    let dir = TempDir::new().expect("should create temp dir");
    fs::write(dir.path().join("auth.log"), SAMPLE_LOG).expect("should write log");

    let output = authwatch(
        dir.path(),
        &["analyze", "auth.log", "--no-persist", "--output", "json"],
    );
    assert!(output.status.success(), "analyze should succeed: {output:?}");

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(parsed["summary"]["total_alerts"].as_u64(), Some(6));
    assert_eq!(parsed["summary"]["critical_alerts"].as_u64(), Some(6));
    assert_eq!(parsed["summary"]["top_ips"][0]["ip"].as_str(), Some("10.0.0.5"));

    assert!(!dir.path().join("alertes.txt").exists());
    assert!(!dir.path().join("rapport_securite.txt").exists());
}

#[test]
fn test_analyze_missing_source_exits_with_code_5() {
    let dir = TempDir::new().expect("should create temp dir");

    let output = authwatch(dir.path(), &["analyze", "missing.log"]);

    assert_eq!(output.status.code(), Some(5));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.log"), "stderr: {stderr}");
}

#[test]
fn test_explicit_missing_config_exits_with_code_2() {
    let dir = TempDir::new().expect("should create temp dir");

    let output = authwatch(dir.path(), &["-c", "absent.toml", "analyze"]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_explicit_default_named_config_must_exist() {
    // Given: no authwatch.toml in the working directory
    let dir = TempDir::new().expect("should create temp dir");
    fs::write(dir.path().join("auth.log"), SAMPLE_LOG).expect("should write log");

    // When: naming the default file explicitly
    let explicit = authwatch(
        dir.path(),
        &["-c", "authwatch.toml", "analyze", "auth.log", "--no-persist"],
    );
    let implicit = authwatch(dir.path(), &["analyze", "auth.log", "--no-persist"]);

    // Then: only the implicit lookup falls back to defaults
    assert_eq!(explicit.status.code(), Some(2));
    assert!(implicit.status.success(), "implicit default: {implicit:?}");
}

#[test]
fn test_config_file_changes_threshold() {
    let dir = TempDir::new().expect("should create temp dir");
    fs::write(dir.path().join("auth.log"), SAMPLE_LOG).expect("should write log");
    fs::write(
        dir.path().join("authwatch.toml"),
        "[detection]\nfailure_threshold = 6\n",
    )
    .expect("should write config");

    let output = authwatch(
        dir.path(),
        &["analyze", "auth.log", "--no-persist", "--output", "json"],
    );
    assert!(output.status.success(), "analyze should succeed: {output:?}");

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    // only the off-hours admin line remains suspicious
    assert_eq!(parsed["summary"]["total_alerts"].as_u64(), Some(1));
    assert_eq!(parsed["summary"]["failure_threshold"].as_u64(), Some(6));
}
