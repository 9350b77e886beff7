//! Typed model of the JSON configuration document
//!
//! The document is immutable once loaded; endpoints are built from these
//! values and never mutate them.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::{
    DEFAULT_EXPORT_POLL_ATTEMPTS, DEFAULT_EXPORT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_UPLOAD_RETRY_ATTEMPTS, DEFAULT_UPLOAD_RETRY_DELAY_SECS,
};

/// Root of the configuration document
#[derive(Debug, Clone, Deserialize)]
pub struct ScanSmugglerConfig {
    pub downloads: DownloadsConfig,
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub settings: RuntimeSettings,
}

/// `downloads` section: where scan files come from
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadsConfig {
    #[serde(default)]
    pub tenable_io: Vec<TenableIoSourceConfig>,
    #[serde(default)]
    pub tenable_sc: Vec<TenableScSourceConfig>,
    pub completed_within_days: u32,
    #[serde(default)]
    pub nessus_files: Vec<StaticSourceConfig>,
}

/// `uploads` section: where scan files go
#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    #[serde(default)]
    pub tenable_io: Vec<TenableIoDestinationConfig>,
    #[serde(default)]
    pub tenable_sc: Vec<TenableScDestinationConfig>,
}

/// Fields shared by every per-account entry
#[derive(Clone, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Display label only; the access key identifies the account
    pub id: String,
    pub access_key: String,
    pub secret_key: String,
    /// Scheme to proxy address, passed to the transport verbatim
    #[serde(default)]
    pub proxies: Option<BTreeMap<String, String>>,
    #[serde(default = "default_ssl_verify")]
    pub ssl_verify: bool,
}

// Keep secrets out of debug logs
impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("enabled", &self.enabled)
            .field("id", &self.id)
            .field("access_key", &redact(&self.access_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("proxies", &self.proxies)
            .field("ssl_verify", &self.ssl_verify)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

fn default_ssl_verify() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenableIoSourceConfig {
    #[serde(flatten)]
    pub account: AccountConfig,
    /// Overrides the Tenable.io API root
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub scan_ids: Vec<ScanSelector>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenableScSourceConfig {
    #[serde(flatten)]
    pub account: AccountConfig,
    pub host: String,
    #[serde(default)]
    pub scan_ids: Vec<ScanSelector>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenableIoDestinationConfig {
    #[serde(flatten)]
    pub account: AccountConfig,
    #[serde(default)]
    pub url: Option<String>,
    pub folder_id: u64,
    /// Include imported results in dashboards (aggregate)
    #[serde(default)]
    pub dashboards: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenableScDestinationConfig {
    #[serde(flatten)]
    pub account: AccountConfig,
    pub host: String,
    pub repository_id: u64,
    /// DHCP host tracking
    #[serde(default)]
    pub dhcp: bool,
    #[serde(default)]
    pub virtual_hosts: bool,
    /// Days before hosts missing from a scan are classified as mitigated
    #[serde(default)]
    pub dead_hosts_wait: u32,
}

/// A directory of pre-existing `.nessus` files
#[derive(Debug, Clone, Deserialize)]
pub struct StaticSourceConfig {
    #[serde(default)]
    pub enabled: bool,
    pub directory: String,
}

/// Operator-configured scan identifier. Accepts JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "SelectorRepr")]
pub struct ScanSelector(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum SelectorRepr {
    Number(u64),
    Text(String),
}

impl From<SelectorRepr> for ScanSelector {
    fn from(repr: SelectorRepr) -> Self {
        match repr {
            SelectorRepr::Number(n) => ScanSelector(n.to_string()),
            SelectorRepr::Text(s) => ScanSelector(s.trim().to_string()),
        }
    }
}

impl ScanSelector {
    pub fn new(value: impl Into<String>) -> Self {
        ScanSelector(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScanSelector {
    fn from(value: &str) -> Self {
        ScanSelector(value.to_string())
    }
}

impl From<u64> for ScanSelector {
    fn from(value: u64) -> Self {
        ScanSelector(value.to_string())
    }
}

/// Optional `settings` section tuning the runtime
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Staging root; the OS temp directory when absent
    pub staging_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub export_poll_interval_secs: u64,
    pub export_poll_attempts: u32,
    pub upload_retry_attempts: usize,
    pub upload_retry_delay_secs: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            staging_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            export_poll_interval_secs: DEFAULT_EXPORT_POLL_INTERVAL_SECS,
            export_poll_attempts: DEFAULT_EXPORT_POLL_ATTEMPTS,
            upload_retry_attempts: DEFAULT_UPLOAD_RETRY_ATTEMPTS,
            upload_retry_delay_secs: DEFAULT_UPLOAD_RETRY_DELAY_SECS,
        }
    }
}

impl RuntimeSettings {
    pub fn staging_root(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn export_poll_interval(&self) -> Duration {
        Duration::from_secs(self.export_poll_interval_secs)
    }

    pub fn upload_retry_delay(&self) -> Duration {
        Duration::from_secs(self.upload_retry_delay_secs)
    }
}
