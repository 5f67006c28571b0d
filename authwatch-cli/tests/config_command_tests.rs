//! Integration tests for `authwatch config` command.
//!
//! Tests config validation and display functionality with real TOML files.

use std::fs;
use tempfile::TempDir;

use authwatch_core::config::{AuthwatchConfig, ReplayMode};

#[tokio::test]
async fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("authwatch.toml");

    let valid_config = r#"
[general]
log_level = "info"
log_format = "json"

[detection]
business_hours_start = 9
business_hours_end = 17
failure_threshold = 3
privileged_user = "root"

[monitor]
log_path = "/var/log/auth.log"
poll_interval_secs = 5
replay_mode = "tail-only"
report_interval_secs = 300
"#;

    fs::write(&config_path, valid_config).expect("should write config");

    // When: Loading the config
    let config = AuthwatchConfig::from_file(&config_path)
        .await
        .expect("valid config should load successfully");

    // Then: Every section is applied, unspecified fields keep defaults
    assert_eq!(config.detection.failure_threshold, 3);
    assert_eq!(config.detection.privileged_user, "root");
    assert_eq!(config.monitor.replay_mode, ReplayMode::TailOnly);
    assert_eq!(config.monitor.report_interval_secs, 300);
    assert_eq!(config.monitor.alert_path, "alertes.txt");
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    // Given: A malformed TOML file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");

    let malformed_config = r#"
[detection
failure_threshold = 5
"#;

    fs::write(&config_path, malformed_config).expect("should write bad config");

    // When: Loading the config
    let result = AuthwatchConfig::from_file(&config_path).await;

    // Then: Should fail
    assert!(result.is_err(), "malformed TOML should fail to load");
}

#[tokio::test]
async fn test_config_validate_missing_file() {
    // Given: A nonexistent file path
    let config_path = std::path::PathBuf::from("/nonexistent/authwatch.toml");

    // When: Loading the config
    let result = AuthwatchConfig::from_file(&config_path).await;

    // Then: Should fail
    assert!(result.is_err(), "missing file should fail to load");
}

#[tokio::test]
async fn test_config_validate_empty_file() {
    // Given: An empty config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("empty.toml");

    fs::write(&config_path, "").expect("should write empty file");

    // When: Loading the config
    let config = AuthwatchConfig::from_file(&config_path)
        .await
        .expect("empty config should use defaults");

    // Then: Defaults apply
    assert_eq!(config.detection.business_hours_start, 8);
    assert_eq!(config.detection.business_hours_end, 18);
    assert_eq!(config.detection.failure_threshold, 5);
    assert_eq!(config.monitor.replay_mode, ReplayMode::FromStart);
}

#[tokio::test]
async fn test_config_rejects_inverted_business_hours() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("authwatch.toml");

    fs::write(
        &config_path,
        "[detection]\nbusiness_hours_start = 18\nbusiness_hours_end = 8\n",
    )
    .expect("should write config");

    let err = AuthwatchConfig::from_file(&config_path)
        .await
        .expect_err("start after end must be rejected");
    assert!(err.to_string().contains("business_hours"));
}

#[tokio::test]
async fn test_config_rejects_zero_threshold() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("authwatch.toml");

    fs::write(&config_path, "[detection]\nfailure_threshold = 0\n").expect("should write config");

    let result = AuthwatchConfig::from_file(&config_path).await;
    assert!(result.is_err(), "zero threshold must be rejected");
}

#[tokio::test]
async fn test_config_show_sections_serialize() {
    // Given: A config loaded from disk
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("authwatch.toml");
    fs::write(
        &config_path,
        "[monitor]\nlog_path = \"/srv/logs/auth.log\"\nalert_path = \"\"\n",
    )
    .expect("should write config");

    let config = AuthwatchConfig::from_file(&config_path)
        .await
        .expect("config should load");

    // When: Serializing the whole config and the monitor section
    let full = toml::to_string_pretty(&config).expect("full config serializes");
    let monitor = toml::to_string_pretty(&config.monitor).expect("section serializes");

    // Then: Both reflect the file, the section omits other sections
    assert!(full.contains("[general]"));
    assert!(full.contains("[detection]"));
    assert!(full.contains("/srv/logs/auth.log"));
    assert!(monitor.contains("alert_path = \"\""));
    assert!(!monitor.contains("privileged_user"));
}

#[tokio::test]
async fn test_config_unicode_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("authwatch.toml");

    fs::write(
        &config_path,
        "[detection]\nprivileged_user = \"관리자\"\n\n[monitor]\nreport_path = \"보고서.txt\"\n",
    )
    .expect("should write config");

    let config = AuthwatchConfig::from_file(&config_path)
        .await
        .expect("unicode values should load");
    assert_eq!(config.detection.privileged_user, "관리자");
    assert_eq!(config.monitor.report_path, "보고서.txt");
}
