//! Command line arguments
//!
//! Exactly one mode must be chosen: transfer with an existing configuration
//! file, or generate a default one. Logging options apply to both.

use clap::{ArgAction, ArgGroup, Parser};
use std::path::PathBuf;

use crate::core::version::LONG_VERSION;

#[derive(Parser, Debug, Clone)]
#[command(name = "scan-smuggler")]
#[command(about = "Transfer scan data between multiple Tenable products")]
#[command(version, long_version = LONG_VERSION)]
#[command(group(ArgGroup::new("mode").required(true).args(["config_file", "config_gen"])))]
pub struct Args {
    /// Transfer scans as described by this configuration file
    #[arg(long = "config", value_name = "tenable.json")]
    pub config_file: Option<PathBuf>,

    /// Write a default tenable.json to the current directory
    #[arg(long = "config-gen", action = ArgAction::SetTrue)]
    pub config_gen: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Force colored output
    #[arg(long = "color", action = ArgAction::SetTrue, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    pub no_color: bool,
}

/// What the process has been asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Transfer(PathBuf),
    GenerateConfig,
}

impl Args {
    pub fn mode(&self) -> Option<RunMode> {
        match (&self.config_file, self.config_gen) {
            (Some(path), false) => Some(RunMode::Transfer(path.clone())),
            (None, true) => Some(RunMode::GenerateConfig),
            _ => None,
        }
    }

    /// Log file to write, if any; `none` disables file logging
    pub fn log_file(&self) -> Option<&std::path::Path> {
        match &self.log_file {
            Some(path) if path.as_os_str().eq_ignore_ascii_case("none") => None,
            Some(path) => Some(path.as_path()),
            None => None,
        }
    }

    /// Explicit flags win; otherwise color follows whether stderr is a terminal
    pub fn use_color(&self) -> bool {
        if self.no_color {
            false
        } else if self.color {
            true
        } else {
            std::io::IsTerminal::is_terminal(&std::io::stderr())
        }
    }
}
