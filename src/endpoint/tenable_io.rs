//! Tenable.io adapter
//!
//! Tenable.io keeps a run history per scan, so a selector maps directly to its
//! most recent history entry. Files are exported in `.nessus` format and
//! imported through the file upload + scan import pair of calls.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::{EndpointError, EndpointResult};
use super::transport::{id_to_string, HttpSession, SessionSettings};
use super::{ScanDestination, ScanSource};
use crate::config::defaults::TENABLE_IO_URL;
use crate::config::{
    AccountConfig, RuntimeSettings, ScanSelector, TenableIoDestinationConfig,
    TenableIoSourceConfig,
};
use crate::staging::StagingArea;
use crate::transfer::origin::AccountIdentity;

const COMPLETED: &str = "completed";

/// One entry of a scan's run history
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    #[serde(alias = "history_id")]
    pub id: serde_json::Value,
    pub status: String,
    #[serde(default)]
    pub time_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct HistoryPage {
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct ExportRequested {
    file: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ExportStatus {
    status: String,
}

#[derive(Debug, Deserialize)]
struct FileUploaded {
    fileuploaded: String,
}

#[derive(Debug, Serialize)]
struct ImportRequest<'a> {
    file: &'a str,
    folder_id: u64,
}

/// Decide whether the most recent history entry may be transferred.
///
/// Eligible only when it exists, is `completed`, and finished strictly after
/// `cutoff` (Unix seconds).
pub fn check_latest_entry<'a>(
    selector: &ScanSelector,
    latest: Option<&'a HistoryEntry>,
    cutoff: i64,
) -> EndpointResult<&'a HistoryEntry> {
    let ineligible = |reason: String| EndpointError::Ineligible {
        selector: selector.to_string(),
        reason,
    };

    let entry = latest.ok_or_else(|| ineligible("scan has no history".to_string()))?;

    if !entry.status.eq_ignore_ascii_case(COMPLETED) {
        return Err(ineligible(format!(
            "most recent run is '{}', not completed",
            entry.status
        )));
    }

    match entry.time_end {
        Some(time_end) if time_end > cutoff => Ok(entry),
        Some(time_end) => Err(ineligible(format!(
            "most recent run completed at {}, before the freshness cutoff {}",
            format_timestamp(time_end),
            format_timestamp(cutoff)
        ))),
        None => Err(ineligible(
            "most recent run has no completion time".to_string(),
        )),
    }
}

fn format_timestamp(seconds: i64) -> String {
    chrono::DateTime::from_timestamp(seconds, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| seconds.to_string())
}

/// Export polling limits
#[derive(Debug, Clone)]
pub struct ExportPolling {
    pub interval: Duration,
    pub attempts: u32,
}

impl ExportPolling {
    pub fn from_settings(settings: &RuntimeSettings) -> Self {
        Self {
            interval: settings.export_poll_interval(),
            attempts: settings.export_poll_attempts.max(1),
        }
    }
}

/// Authenticated Tenable.io session
#[derive(Debug)]
pub struct TenableIo {
    session: HttpSession,
    identity: AccountIdentity,
    polling: ExportPolling,
}

impl TenableIo {
    pub fn connect(
        account: &AccountConfig,
        url: Option<&str>,
        settings: &RuntimeSettings,
    ) -> EndpointResult<Self> {
        let session = HttpSession::build(&SessionSettings {
            label: account.id.clone(),
            base_url: url.unwrap_or(TENABLE_IO_URL).to_string(),
            auth_header: "x-apikeys",
            auth_value: format!(
                "accessKey={};secretKey={}",
                account.access_key, account.secret_key
            ),
            proxies: account.proxies.clone(),
            ssl_verify: account.ssl_verify,
            timeout: settings.request_timeout(),
        })?;

        Ok(Self {
            session,
            identity: AccountIdentity::new(account.access_key.clone()),
            polling: ExportPolling::from_settings(settings),
        })
    }

    pub fn label(&self) -> &str {
        self.session.label()
    }

    pub fn identity(&self) -> &AccountIdentity {
        &self.identity
    }

    /// Most recent history entry for a scan (one page, one entry)
    pub async fn latest_history(&self, selector: &ScanSelector) -> EndpointResult<Option<HistoryEntry>> {
        let page: HistoryPage = self
            .session
            .get_json(
                &format!("history of scan {}", selector),
                &format!("/scans/{}/history", selector),
                &[("limit", "1".to_string()), ("offset", "0".to_string())],
            )
            .await?;
        Ok(page.history.into_iter().next())
    }

    /// Download the latest completed run of `selector` as `<selector>.nessus`
    pub async fn scan_download(
        &self,
        selector: &ScanSelector,
        cutoff: i64,
        staging: &StagingArea,
    ) -> EndpointResult<PathBuf> {
        let latest = self.latest_history(selector).await?;
        let entry = check_latest_entry(selector, latest.as_ref(), cutoff)?;
        let history_id = id_to_string(&entry.id);

        let file_id = self.request_export(selector, &history_id).await?;
        self.wait_for_export(selector, &file_id).await?;

        let destination = staging.path_for(selector.as_str(), "nessus");
        self.session
            .download_to::<()>(
                &format!("download of scan {}", selector),
                Method::GET,
                &format!("/scans/{}/export/{}/download", selector, file_id),
                None,
                &destination,
            )
            .await?;

        if !destination.is_file() {
            return Err(EndpointError::ExportFailed {
                selector: selector.to_string(),
                message: format!("{} was not written", destination.display()),
            });
        }
        Ok(destination)
    }

    async fn request_export(&self, selector: &ScanSelector, history_id: &str) -> EndpointResult<String> {
        let requested: ExportRequested = self
            .session
            .post_json(
                &format!("export of scan {}", selector),
                &format!("/scans/{}/export", selector),
                &[("history_id", history_id.to_string())],
                &serde_json::json!({ "format": "nessus" }),
            )
            .await?;
        Ok(id_to_string(&requested.file))
    }

    async fn wait_for_export(&self, selector: &ScanSelector, file_id: &str) -> EndpointResult<()> {
        let operation = format!("export status of scan {}", selector);
        let path = format!("/scans/{}/export/{}/status", selector, file_id);

        for attempt in 1..=self.polling.attempts {
            let status: ExportStatus = self.session.get_json(&operation, &path, &[]).await?;
            match status.status.to_ascii_lowercase().as_str() {
                "ready" => return Ok(()),
                "error" => {
                    return Err(EndpointError::ExportFailed {
                        selector: selector.to_string(),
                        message: "export reported an error".to_string(),
                    })
                }
                other => {
                    log::debug!(
                        "Export of scan {} is '{}' (check {}/{})",
                        selector,
                        other,
                        attempt,
                        self.polling.attempts
                    );
                    if attempt < self.polling.attempts {
                        tokio::time::sleep(self.polling.interval).await;
                    }
                }
            }
        }

        Err(EndpointError::ExportFailed {
            selector: selector.to_string(),
            message: format!("export not ready after {} checks", self.polling.attempts),
        })
    }

    /// Upload a `.nessus` file and import it into `folder_id`
    pub async fn scan_upload(&self, file: &Path, folder_id: u64, dashboards: bool) -> EndpointResult<()> {
        let uploaded: FileUploaded = self
            .session
            .upload_file(
                &format!("upload of {}", file.display()),
                "/file/upload",
                "Filedata",
                file,
            )
            .await?;

        let aggregate = if dashboards { "1" } else { "0" };
        let _: serde_json::Value = self
            .session
            .post_json(
                &format!("import of {}", file.display()),
                "/scans/import",
                &[("include_aggregate", aggregate.to_string())],
                &ImportRequest {
                    file: &uploaded.fileuploaded,
                    folder_id,
                },
            )
            .await?;
        Ok(())
    }
}

/// Tenable.io account configured as a download source
#[derive(Debug)]
pub struct TenableIoSource {
    client: TenableIo,
    selectors: Vec<ScanSelector>,
}

impl TenableIoSource {
    pub fn from_config(config: &TenableIoSourceConfig, settings: &RuntimeSettings) -> EndpointResult<Self> {
        Ok(Self {
            client: TenableIo::connect(&config.account, config.url.as_deref(), settings)?,
            selectors: config.scan_ids.clone(),
        })
    }
}

#[async_trait]
impl ScanSource for TenableIoSource {
    fn label(&self) -> &str {
        self.client.label()
    }

    fn identity(&self) -> &AccountIdentity {
        self.client.identity()
    }

    async fn download(&self, staging: &StagingArea, cutoff: i64) -> EndpointResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for selector in &self.selectors {
            match self.client.scan_download(selector, cutoff, staging).await {
                Ok(path) => {
                    log::info!("Downloaded scan {} from {}", selector, self.label());
                    files.push(path);
                }
                Err(e) => super::log_selector_failure(self.label(), &e),
            }
        }
        Ok(files)
    }
}

/// Tenable.io account configured as an upload destination
#[derive(Debug)]
pub struct TenableIoDestination {
    client: TenableIo,
    folder_id: u64,
    dashboards: bool,
}

impl TenableIoDestination {
    pub fn from_config(
        config: &TenableIoDestinationConfig,
        settings: &RuntimeSettings,
    ) -> EndpointResult<Self> {
        Ok(Self {
            client: TenableIo::connect(&config.account, config.url.as_deref(), settings)?,
            folder_id: config.folder_id,
            dashboards: config.dashboards,
        })
    }
}

#[async_trait]
impl ScanDestination for TenableIoDestination {
    fn label(&self) -> &str {
        self.client.label()
    }

    fn identity(&self) -> &AccountIdentity {
        self.client.identity()
    }

    async fn upload(&self, file: &Path) -> EndpointResult<()> {
        self.client
            .scan_upload(file, self.folder_id, self.dashboards)
            .await
    }
}
