//! Tenable.sc adapter
//!
//! Tenable.sc exports results rather than scans, so selectors are translated to
//! result ids by the reconciler before downloading. Each result downloads as a
//! zip archive whose `.nessus` members are extracted into the staging area.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::archive::extract_nessus_async;
use super::error::{EndpointError, EndpointResult};
use super::transport::{HttpSession, SessionSettings};
use super::{ScanDestination, ScanSource};
use crate::config::{
    AccountConfig, RuntimeSettings, ScanSelector, TenableScDestinationConfig,
    TenableScSourceConfig,
};
use crate::reconcile::{reconcile, ActiveScan, ScanCatalog, ScanResultDetails, ScanResultSummary};
use crate::staging::StagingArea;
use crate::transfer::origin::AccountIdentity;

const DETAIL_FIELDS: &str =
    "dataFormat,downloadAvailable,downloadFormat,progress,resultSource,resultType,running,status";

/// Standard Tenable.sc response wrapper. On errors `response` is often an
/// empty string, so it is decoded only after the error code is checked.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    response: serde_json::Value,
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

impl Envelope {
    fn check(&self, operation: &str) -> EndpointResult<()> {
        if self.error_code != 0 {
            return Err(EndpointError::Api {
                operation: operation.to_string(),
                code: self.error_code,
                message: self.error_msg.clone(),
            });
        }
        Ok(())
    }

    fn into_response<T: DeserializeOwned>(self, operation: &str) -> EndpointResult<T> {
        self.check(operation)?;
        serde_json::from_value(self.response).map_err(|source| EndpointError::Decode {
            operation: operation.to_string(),
            source,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Usable<T> {
    #[serde(default = "Vec::new")]
    usable: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    filename: String,
}

#[derive(Debug, Serialize)]
struct RepositoryRef {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportRequest<'a> {
    filename: &'a str,
    repository: RepositoryRef,
    dhcp_tracking: &'static str,
    scanning_virtual_hosts: &'static str,
    classify_mitigated_age: String,
}

/// Routing parameters for imports into one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub repository_id: u64,
    pub dhcp: bool,
    pub virtual_hosts: bool,
    pub dead_hosts_wait: u32,
}

impl From<&TenableScDestinationConfig> for ImportOptions {
    fn from(config: &TenableScDestinationConfig) -> Self {
        Self {
            repository_id: config.repository_id,
            dhcp: config.dhcp,
            virtual_hosts: config.virtual_hosts,
            dead_hosts_wait: config.dead_hosts_wait,
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// REST root for a configured host. A host given with a scheme is used as-is.
pub fn rest_base(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("https://") || host.starts_with("http://") {
        format!("{}/rest", host)
    } else {
        format!("https://{}/rest", host)
    }
}

/// Authenticated Tenable.sc session
#[derive(Debug)]
pub struct TenableSc {
    session: HttpSession,
    identity: AccountIdentity,
}

impl TenableSc {
    pub fn connect(account: &AccountConfig, host: &str, settings: &RuntimeSettings) -> EndpointResult<Self> {
        let session = HttpSession::build(&SessionSettings {
            label: format!("{} ({})", account.id, host),
            base_url: rest_base(host),
            auth_header: "x-apikey",
            auth_value: format!(
                "accesskey={}; secretkey={};",
                account.access_key, account.secret_key
            ),
            proxies: account.proxies.clone(),
            ssl_verify: account.ssl_verify,
            timeout: settings.request_timeout(),
        })?;

        Ok(Self {
            session,
            identity: AccountIdentity::new(account.access_key.clone()),
        })
    }

    pub fn label(&self) -> &str {
        self.session.label()
    }

    pub fn identity(&self) -> &AccountIdentity {
        &self.identity
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> EndpointResult<T> {
        let envelope: Envelope = self.session.get_json(operation, path, query).await?;
        envelope.into_response(operation)
    }

    /// Download result `result_id` and extract its `.nessus` files.
    /// The archive itself is removed afterwards.
    pub async fn download_result(&self, result_id: &str, staging: &StagingArea) -> EndpointResult<Vec<PathBuf>> {
        let operation = format!("download of scan result {}", result_id);
        let archive = staging.path_for(result_id, "zip");
        self.session
            .download_to(
                &operation,
                Method::POST,
                &format!("/scanResult/{}/download", result_id),
                Some(&serde_json::json!({ "downloadType": "v2" })),
                &archive,
            )
            .await?;

        let extracted = match staging.subdir(result_id) {
            Ok(dir) => extract_nessus_async(archive.clone(), dir).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = tokio::fs::remove_file(&archive).await {
            log::warn!("Unable to delete {}: {}", archive.display(), e);
        }

        let files = extracted?;
        if files.is_empty() {
            return Err(EndpointError::ExportFailed {
                selector: result_id.to_string(),
                message: "archive contained no .nessus files".to_string(),
            });
        }
        Ok(files)
    }

    /// Upload a `.nessus` file and import it into a repository
    pub async fn import_file(&self, file: &Path, options: &ImportOptions) -> EndpointResult<()> {
        let operation = format!("upload of {}", file.display());
        let uploaded: Envelope = self
            .session
            .upload_file(&operation, "/file/upload", "Filedata", file)
            .await?;
        let uploaded: UploadedFile = uploaded.into_response(&operation)?;

        let operation = format!("import of {}", file.display());
        let imported: Envelope = self
            .session
            .post_json(
                &operation,
                "/scanResult/import",
                &[],
                &ImportRequest {
                    filename: &uploaded.filename,
                    repository: RepositoryRef {
                        id: options.repository_id.to_string(),
                    },
                    dhcp_tracking: flag(options.dhcp),
                    scanning_virtual_hosts: flag(options.virtual_hosts),
                    classify_mitigated_age: options.dead_hosts_wait.to_string(),
                },
            )
            .await?;
        imported.check(&operation)
    }
}

#[async_trait]
impl ScanCatalog for TenableSc {
    async fn active_scans(&self) -> EndpointResult<Vec<ActiveScan>> {
        let listing: Usable<ActiveScan> = self
            .get("list of scans", "/scan", &[("fields", "id,name".to_string())])
            .await?;
        Ok(listing.usable)
    }

    async fn scan_results_since(&self, start: i64) -> EndpointResult<Vec<ScanResultSummary>> {
        let end = chrono::Utc::now().timestamp().max(start);
        let listing: Usable<ScanResultSummary> = self
            .get(
                "list of scan results",
                "/scanResult",
                &[
                    ("fields", "id,name".to_string()),
                    ("startTime", start.to_string()),
                    ("endTime", end.to_string()),
                ],
            )
            .await?;
        Ok(listing.usable)
    }

    async fn scan_result_details(&self, result_id: &str) -> EndpointResult<ScanResultDetails> {
        self.get(
            &format!("details of scan result {}", result_id),
            &format!("/scanResult/{}", result_id),
            &[("fields", DETAIL_FIELDS.to_string())],
        )
        .await
    }
}

/// Tenable.sc instance configured as a download source
#[derive(Debug)]
pub struct TenableScSource {
    client: TenableSc,
    selectors: Vec<ScanSelector>,
}

impl TenableScSource {
    pub fn from_config(config: &TenableScSourceConfig, settings: &RuntimeSettings) -> EndpointResult<Self> {
        Ok(Self {
            client: TenableSc::connect(&config.account, &config.host, settings)?,
            selectors: config.scan_ids.clone(),
        })
    }
}

#[async_trait]
impl ScanSource for TenableScSource {
    fn label(&self) -> &str {
        self.client.label()
    }

    fn identity(&self) -> &AccountIdentity {
        self.client.identity()
    }

    async fn download(&self, staging: &StagingArea, cutoff: i64) -> EndpointResult<Vec<PathBuf>> {
        let result_ids = reconcile(&self.client, &self.selectors, cutoff).await?;
        log::info!(
            "{}: {} eligible scan results",
            self.label(),
            result_ids.len()
        );

        let mut files = Vec::new();
        for result_id in &result_ids {
            match self.client.download_result(result_id, staging).await {
                Ok(extracted) => {
                    log::info!(
                        "Downloaded scan result {} from {} ({} files)",
                        result_id,
                        self.label(),
                        extracted.len()
                    );
                    files.extend(extracted);
                }
                Err(e) => super::log_selector_failure(self.label(), &e),
            }
        }
        Ok(files)
    }
}

/// Tenable.sc repository configured as an upload destination
#[derive(Debug)]
pub struct TenableScDestination {
    client: TenableSc,
    options: ImportOptions,
}

impl TenableScDestination {
    pub fn from_config(
        config: &TenableScDestinationConfig,
        settings: &RuntimeSettings,
    ) -> EndpointResult<Self> {
        Ok(Self {
            client: TenableSc::connect(&config.account, &config.host, settings)?,
            options: ImportOptions::from(config),
        })
    }
}

#[async_trait]
impl ScanDestination for TenableScDestination {
    fn label(&self) -> &str {
        self.client.label()
    }

    fn identity(&self) -> &AccountIdentity {
        self.client.identity()
    }

    async fn upload(&self, file: &Path) -> EndpointResult<()> {
        self.client.import_file(file, &self.options).await
    }
}
