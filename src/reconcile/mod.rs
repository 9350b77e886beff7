//! Result Reconciler
//!
//! Tenable.sc keeps scheduled scans and their completed results as separate
//! entities with no foreign key between them. Results are correlated to the
//! configured scans by name and then filtered on their detail records.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use crate::config::ScanSelector;
use crate::endpoint::error::EndpointResult;

/// A usable scheduled scan
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActiveScan {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
}

/// A usable scan result, as listed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanResultSummary {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub status: String,
}

/// Fields of a scan result's detail record that decide eligibility
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanResultDetails {
    pub status: String,
    pub progress: Progress,
    pub running: String,
    pub result_source: String,
    pub result_type: String,
    pub data_format: String,
    pub download_format: String,
    pub download_available: String,
}

impl ScanResultDetails {
    /// First failed predicate, or `None` when the result can be transferred
    pub fn ineligibility(&self) -> Option<String> {
        let checks: [(bool, &str, &str); 8] = [
            (self.status == "Completed", "status", &self.status),
            (
                self.progress.status == "Completed",
                "progress status",
                &self.progress.status,
            ),
            (self.running == "false", "running", &self.running),
            (
                self.result_source == "internal",
                "result source",
                &self.result_source,
            ),
            (
                matches!(self.result_type.as_str(), "active" | "agents"),
                "result type",
                &self.result_type,
            ),
            (
                matches!(self.data_format.as_str(), "IPv4" | "agent"),
                "data format",
                &self.data_format,
            ),
            (
                self.download_format == "v2",
                "download format",
                &self.download_format,
            ),
            (
                self.download_available == "true",
                "download available",
                &self.download_available,
            ),
        ];

        checks
            .iter()
            .find(|(passed, _, _)| !passed)
            .map(|(_, field, value)| format!("{} is '{}'", field, value))
    }

    pub fn is_eligible(&self) -> bool {
        self.ineligibility().is_none()
    }
}

/// Read-only view of a product that lists scans and results separately
#[async_trait]
pub trait ScanCatalog: Send + Sync {
    async fn active_scans(&self) -> EndpointResult<Vec<ActiveScan>>;

    /// Results whose start time is at or after `start` (Unix seconds)
    async fn scan_results_since(&self, start: i64) -> EndpointResult<Vec<ScanResultSummary>>;

    async fn scan_result_details(&self, result_id: &str) -> EndpointResult<ScanResultDetails>;
}

/// Map selectors to eligible result ids.
///
/// Both listings are fetched once. A listing failure is returned; a failed
/// detail lookup only drops that result. The output is de-duplicated and
/// keeps first-seen order.
pub async fn reconcile<C: ScanCatalog + ?Sized>(
    catalog: &C,
    selectors: &[ScanSelector],
    cutoff: i64,
) -> EndpointResult<Vec<String>> {
    let active = catalog.active_scans().await?;
    let results = catalog.scan_results_since(cutoff).await?;
    log::debug!(
        "Reconciling {} selectors against {} active scans and {} results",
        selectors.len(),
        active.len(),
        results.len()
    );

    let mut eligible = Vec::new();
    let mut attributed: HashMap<String, ScanSelector> = HashMap::new();
    let mut verdicts: HashMap<String, bool> = HashMap::new();

    for selector in selectors {
        let scans: Vec<&ActiveScan> = active
            .iter()
            .filter(|scan| scan.id == selector.as_str())
            .collect();
        if scans.is_empty() {
            log::debug!("No active scan matches selector {}", selector);
        }

        for scan in scans {
            let others = namesakes(&active, scan);
            if !others.is_empty() {
                log::warn!(
                    "Scan {} shares the name '{}' with active scan(s) {}; its results are matched by name only",
                    selector,
                    scan.name,
                    others
                        .iter()
                        .map(|other| other.id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }

            let same_named: Vec<&ScanResultSummary> =
                results.iter().filter(|r| r.name == scan.name).collect();
            if same_named.len() > 1 {
                log::info!(
                    "{} results named '{}' found for scan {}; checking each",
                    same_named.len(),
                    scan.name,
                    selector
                );
            }

            for result in same_named {
                let passed = match verdicts.get(&result.id) {
                    Some(passed) => *passed,
                    None => {
                        let passed = check_result(catalog, result).await;
                        verdicts.insert(result.id.clone(), passed);
                        passed
                    }
                };
                if !passed {
                    continue;
                }

                match attributed.get(&result.id) {
                    Some(first) if first != selector => log::warn!(
                        "Scan result {} ('{}') matches both scan {} and scan {} by name; transferring it once",
                        result.id,
                        result.name,
                        first,
                        selector
                    ),
                    Some(_) => {}
                    None => {
                        attributed.insert(result.id.clone(), selector.clone());
                        eligible.push(result.id.clone());
                    }
                }
            }
        }
    }

    Ok(eligible)
}

/// Other active scans carrying the same name as `scan`
fn namesakes<'a>(active: &'a [ActiveScan], scan: &ActiveScan) -> Vec<&'a ActiveScan> {
    active
        .iter()
        .filter(|other| other.name == scan.name && other.id != scan.id)
        .collect()
}

async fn check_result<C: ScanCatalog + ?Sized>(catalog: &C, result: &ScanResultSummary) -> bool {
    match catalog.scan_result_details(&result.id).await {
        Ok(details) => match details.ineligibility() {
            None => true,
            Some(reason) => {
                log::info!("Scan result {} skipped: {}", result.id, reason);
                false
            }
        },
        Err(e) => {
            log::warn!("Unable to check scan result {}: {}", result.id, e);
            false
        }
    }
}

/// Tenable.sc sends ids as strings; accept numbers as well
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Number(n) => n.to_string(),
        Id::Text(s) => s,
    })
}
