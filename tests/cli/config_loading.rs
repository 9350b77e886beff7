//! Configuration loading tests
//!
//! Every configuration problem is fatal before any network I/O.

use scan_smuggler::config::{load_config, ConfigError};
use std::process::Command;
use tempfile::TempDir;

#[test]
fn test_missing_file_points_to_config_gen() {
    let dir = TempDir::new().unwrap();
    let error = load_config(&dir.path().join("absent.json")).unwrap_err();

    assert!(matches!(error, ConfigError::NotFound { .. }));
    assert!(error.to_string().contains("--config-gen"));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tenable.json");
    std::fs::write(&path, "{ \"downloads\": ").unwrap();

    assert!(matches!(
        load_config(&path),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_binary_fails_on_missing_config() {
    let dir = TempDir::new().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_scan-smuggler"))
        .args(["--config", "missing.json", "--no-color"])
        .current_dir(dir.path())
        .output()
        .expect("failed to run scan-smuggler");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("FATAL"));
}
