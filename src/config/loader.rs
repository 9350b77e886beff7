//! Loading, validation and generation of the JSON configuration file

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use super::defaults::DEFAULT_CONFIG_DOCUMENT;
use super::error::{ConfigError, ConfigResult};
use super::types::{AccountConfig, ScanSmugglerConfig};

/// Read, parse and validate a configuration file
pub fn load_config(path: &Path) -> ConfigResult<ScanSmugglerConfig> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config = parse_config(path, &contents)?;
    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parse and validate configuration text; `origin` only labels errors
pub fn parse_config(origin: &Path, contents: &str) -> ConfigResult<ScanSmugglerConfig> {
    let config: ScanSmugglerConfig =
        serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Write the default document, refusing to touch an existing file
pub fn generate_config(path: &Path) -> ConfigResult<()> {
    // create_new makes the existence check and the create a single step
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| {
            if source.kind() == std::io::ErrorKind::AlreadyExists {
                ConfigError::AlreadyExists {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Write {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

    file.write_all(DEFAULT_CONFIG_DOCUMENT.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Check enabled entries for values that would only fail later over the network
pub fn validate_config(config: &ScanSmugglerConfig) -> ConfigResult<()> {
    for source in config.downloads.tenable_io.iter().filter(|s| s.account.enabled) {
        validate_account("downloads.tenable_io", &source.account)?;
    }
    for source in config.downloads.tenable_sc.iter().filter(|s| s.account.enabled) {
        validate_account("downloads.tenable_sc", &source.account)?;
        validate_host("downloads.tenable_sc", &source.account, &source.host)?;
    }
    for directory in config.downloads.nessus_files.iter().filter(|d| d.enabled) {
        if directory.directory.trim().is_empty() {
            return Err(ConfigError::invalid(
                "downloads.nessus_files: enabled entry has an empty directory",
            ));
        }
    }
    for destination in config.uploads.tenable_io.iter().filter(|d| d.account.enabled) {
        validate_account("uploads.tenable_io", &destination.account)?;
    }
    for destination in config.uploads.tenable_sc.iter().filter(|d| d.account.enabled) {
        validate_account("uploads.tenable_sc", &destination.account)?;
        validate_host("uploads.tenable_sc", &destination.account, &destination.host)?;
    }
    if config.settings.request_timeout_secs == 0 {
        return Err(ConfigError::invalid(
            "settings.request_timeout_secs must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_account(section: &str, account: &AccountConfig) -> ConfigResult<()> {
    if account.access_key.trim().is_empty() || account.secret_key.trim().is_empty() {
        return Err(ConfigError::invalid(format!(
            "{}: account '{}' is enabled but access_key or secret_key is empty",
            section, account.id
        )));
    }
    if let Some(proxies) = &account.proxies {
        for scheme in proxies.keys() {
            if !matches!(scheme.as_str(), "http" | "https" | "all") {
                return Err(ConfigError::invalid(format!(
                    "{}: account '{}' has unsupported proxy scheme '{}' (expected http, https or all)",
                    section, account.id, scheme
                )));
            }
        }
    }
    Ok(())
}

fn validate_host(section: &str, account: &AccountConfig, host: &str) -> ConfigResult<()> {
    if host.trim().is_empty() {
        return Err(ConfigError::invalid(format!(
            "{}: account '{}' is enabled but host is empty",
            section, account.id
        )));
    }
    Ok(())
}
