//! Configuration generation tests
//!
//! Runs the built binary in a scratch directory.

use scan_smuggler::config::{DEFAULT_CONFIG_DOCUMENT, DEFAULT_CONFIG_FILE};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scan-smuggler"))
        .args(args)
        .arg("--no-color")
        .current_dir(dir)
        .output()
        .expect("failed to run scan-smuggler")
}

#[test]
fn test_config_gen_writes_default_document() {
    let dir = TempDir::new().unwrap();

    let output = run_in(dir.path(), &["--config-gen"]);

    assert!(output.status.success());
    let written = std::fs::read_to_string(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
    assert_eq!(written, DEFAULT_CONFIG_DOCUMENT);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Edit tenable.json"));
}

#[test]
fn test_config_gen_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join(DEFAULT_CONFIG_FILE);

    assert!(run_in(dir.path(), &["--config-gen"]).status.success());
    std::fs::write(&target, "{\"edited\": true}").unwrap();

    let second = run_in(dir.path(), &["--config-gen"]);

    assert!(!second.status.success());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "{\"edited\": true}");
    assert!(String::from_utf8_lossy(&second.stderr).contains("will NOT be overwritten"));
}

#[test]
fn test_no_mode_exits_with_usage_error() {
    let dir = TempDir::new().unwrap();

    let output = run_in(dir.path(), &[]);

    assert!(!output.status.success());
    assert!(!dir.path().join(DEFAULT_CONFIG_FILE).exists());
}
