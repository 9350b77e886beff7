//! CLI argument parsing tests

use clap::Parser;
use scan_smuggler::app::cli::{Args, RunMode};
use std::path::PathBuf;

static COMMAND_NAME: &str = "scan-smuggler";

fn args(rest: &[&str]) -> Vec<String> {
    std::iter::once(COMMAND_NAME)
        .chain(rest.iter().copied())
        .map(String::from)
        .collect()
}

#[test]
fn test_config_path_selects_transfer() {
    let parsed = Args::try_parse_from(args(&["--config", "/etc/scan-smuggler/tenable.json"])).unwrap();

    assert_eq!(
        parsed.mode(),
        Some(RunMode::Transfer(PathBuf::from(
            "/etc/scan-smuggler/tenable.json"
        )))
    );
    assert!(!parsed.config_gen);
}

#[test]
fn test_config_gen_takes_no_value() {
    assert!(Args::try_parse_from(args(&["--config-gen", "extra"])).is_err());
}

#[test]
fn test_config_requires_a_path() {
    assert!(Args::try_parse_from(args(&["--config"])).is_err());
}

#[test]
fn test_logging_flags_alone_are_rejected() {
    let error = Args::try_parse_from(args(&["--log-level", "debug"])).unwrap_err();
    assert_eq!(
        error.kind(),
        clap::error::ErrorKind::MissingRequiredArgument
    );
}

#[test]
fn test_both_modes_are_rejected() {
    let error =
        Args::try_parse_from(args(&["--config-gen", "--config", "tenable.json"])).unwrap_err();
    assert_eq!(error.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
fn test_extended_log_format_accepted() {
    let parsed = Args::try_parse_from(args(&["--config-gen", "--log-format", "ext"])).unwrap();
    assert_eq!(parsed.log_format.as_deref(), Some("ext"));
}

#[test]
fn test_version_flag() {
    let error = Args::try_parse_from(args(&["--version"])).unwrap_err();
    assert_eq!(error.kind(), clap::error::ErrorKind::DisplayVersion);
}
