//! Transfer Orchestrator
//!
//! Drives one run through its phases:
//! `LoadConfig -> Download -> StageStatic -> Upload -> Cleanup -> Done`.
//!
//! Sources download concurrently, each into its own staging area. The origin
//! registry is complete before the first upload starts. Destinations then
//! upload concurrently, one file at a time each, skipping files that came from
//! their own account. Files downloaded in this run are always deleted at the
//! end, whatever the upload outcome; static files are never touched.

use futures::future::join_all;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::TransferResult;
use super::origin::{is_loopback, Origin, OriginRegistry};
use super::plan::TransferPlan;
use crate::config::ScanSmugglerConfig;
use crate::core::cleanup::Cleanup;
use crate::core::retry::{retry_async, RetryPolicy};
use crate::core::time::{freshness_cutoff, SystemTimeProvider, TimeProvider};
use crate::endpoint::{EndpointError, ScanDestination, ScanSource};
use crate::staging::{remove_staged_files, StagingStore};

const NESSUS_GLOB: &str = "*.nessus";

/// Pipeline state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    LoadConfig,
    Download,
    StageStatic,
    Upload,
    Cleanup,
    Done,
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferPhase::LoadConfig => "load config",
            TransferPhase::Download => "download",
            TransferPhase::StageStatic => "stage static files",
            TransferPhase::Upload => "upload",
            TransferPhase::Cleanup => "cleanup",
            TransferPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// How the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Upload and cleanup ran
    Completed,
    /// Nothing was downloaded or staged; upload and cleanup were skipped
    NothingToUpload,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSummary {
    pub downloaded: usize,
    pub static_files: usize,
    pub source_failures: usize,
    pub uploaded: usize,
    pub upload_failures: usize,
    pub skipped_loopback: usize,
    pub removed: usize,
    pub cleanup_failures: usize,
    pub outcome: TransferOutcome,
}

impl Default for TransferSummary {
    fn default() -> Self {
        Self {
            downloaded: 0,
            static_files: 0,
            source_failures: 0,
            uploaded: 0,
            upload_failures: 0,
            skipped_loopback: 0,
            removed: 0,
            cleanup_failures: 0,
            outcome: TransferOutcome::Completed,
        }
    }
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.outcome == TransferOutcome::NothingToUpload {
            return write!(
                f,
                "No files to upload ({} source failures)",
                self.source_failures
            );
        }
        write!(
            f,
            "Downloaded {}, static {}, uploaded {}, upload failures {}, loop-back skipped {}, removed {}",
            self.downloaded,
            self.static_files,
            self.uploaded,
            self.upload_failures,
            self.skipped_loopback,
            self.removed
        )?;
        if self.cleanup_failures > 0 {
            write!(f, ", cleanup failures {}", self.cleanup_failures)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct UploadTally {
    uploaded: usize,
    failed: usize,
    skipped_loopback: usize,
}

/// Runs transfer plans against a staging store
pub struct TransferOrchestrator {
    staging: StagingStore,
    completed_within_days: u32,
    time: Arc<dyn TimeProvider>,
    upload_retry: RetryPolicy,
    phase: TransferPhase,
}

impl TransferOrchestrator {
    pub fn new(staging: StagingStore, completed_within_days: u32) -> Self {
        Self {
            staging,
            completed_within_days,
            time: Arc::new(SystemTimeProvider),
            upload_retry: RetryPolicy::once(),
            phase: TransferPhase::LoadConfig,
        }
    }

    /// Orchestrator for a loaded configuration, with a fresh staging store
    pub fn from_config(config: &ScanSmugglerConfig) -> TransferResult<Self> {
        let settings = &config.settings;
        let staging = StagingStore::create(&settings.staging_root())?;
        Ok(Self::new(staging, config.downloads.completed_within_days).with_upload_retry(
            RetryPolicy::with_attempts(
                settings.upload_retry_attempts,
                settings.upload_retry_delay(),
            ),
        ))
    }

    pub fn with_time_provider(mut self, time: Arc<dyn TimeProvider>) -> Self {
        self.time = time;
        self
    }

    pub fn with_upload_retry(mut self, policy: RetryPolicy) -> Self {
        self.upload_retry = policy;
        self
    }

    pub fn phase(&self) -> TransferPhase {
        self.phase
    }

    pub fn staging(&self) -> &StagingStore {
        &self.staging
    }

    fn enter(&mut self, phase: TransferPhase) {
        log::debug!("Transfer phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Execute the plan. Per-file and per-endpoint failures are logged and
    /// counted, never returned.
    pub async fn run(&mut self, plan: &TransferPlan) -> TransferSummary {
        let mut summary = TransferSummary::default();
        let mut registry = OriginRegistry::new();

        self.enter(TransferPhase::Download);
        let cutoff = freshness_cutoff(self.time.as_ref(), self.completed_within_days);
        log::info!(
            "Downloading scans completed within {} days from {} sources",
            self.completed_within_days,
            plan.sources.len()
        );
        self.download_all(&plan.sources, cutoff, &mut registry, &mut summary)
            .await;

        self.enter(TransferPhase::StageStatic);
        let static_files = collect_static_files(&plan.static_dirs);
        summary.static_files = static_files.len();
        registry.register(Origin::Static, static_files);

        if registry.is_empty() {
            log::info!("No files to upload");
            // only empty directories remain
            self.staging.cleanup();
            summary.outcome = TransferOutcome::NothingToUpload;
            self.enter(TransferPhase::Done);
            return summary;
        }

        self.enter(TransferPhase::Upload);
        log_registry(&registry);
        let tallies = join_all(
            plan.destinations
                .iter()
                .map(|destination| self.upload_to(destination.as_ref(), &registry)),
        )
        .await;
        for tally in tallies {
            summary.uploaded += tally.uploaded;
            summary.upload_failures += tally.failed;
            summary.skipped_loopback += tally.skipped_loopback;
        }

        self.enter(TransferPhase::Cleanup);
        let report = remove_staged_files(registry.downloaded_files());
        summary.removed = report.removed;
        summary.cleanup_failures = report.failed.len();
        self.staging.cleanup();

        self.enter(TransferPhase::Done);
        log::info!("{}", summary);
        summary
    }

    async fn download_all(
        &self,
        sources: &[Box<dyn ScanSource>],
        cutoff: i64,
        registry: &mut OriginRegistry,
        summary: &mut TransferSummary,
    ) {
        let staging = &self.staging;
        let downloads = sources.iter().enumerate().map(|(index, source)| async move {
            let outcome = match staging.area(&format!("source-{}", index + 1)) {
                Ok(area) => source.download(&area, cutoff).await,
                Err(e) => Err(EndpointError::from(e)),
            };
            (source, outcome)
        });

        // barrier: every source finishes before the registry is used
        for (source, outcome) in join_all(downloads).await {
            match outcome {
                Ok(files) => {
                    log::info!("{}: {} files downloaded", source.label(), files.len());
                    summary.downloaded += files.len();
                    registry.register(Origin::Account(source.identity().clone()), files);
                }
                Err(e) => {
                    log::warn!("{}: download failed: {}", source.label(), e);
                    summary.source_failures += 1;
                }
            }
        }
    }

    async fn upload_to(&self, destination: &dyn ScanDestination, registry: &OriginRegistry) -> UploadTally {
        let mut tally = UploadTally::default();
        let operation = format!("upload to {}", destination.label());

        for (origin, files) in registry.iter() {
            if is_loopback(origin, destination.identity()) {
                log::info!(
                    "{}: skipping {} files downloaded from the same account",
                    destination.label(),
                    files.len()
                );
                tally.skipped_loopback += files.len();
                continue;
            }

            for file in files {
                let result =
                    retry_async(&operation, self.upload_retry.clone(), || destination.upload(file))
                        .await;
                match result {
                    Ok(()) => {
                        log::info!("Uploaded {} to {}", file.display(), destination.label());
                        tally.uploaded += 1;
                    }
                    Err(e) => {
                        log::warn!(
                            "Upload of {} to {} failed: {}",
                            file.display(),
                            destination.label(),
                            e
                        );
                        tally.failed += 1;
                    }
                }
            }
        }
        tally
    }
}

fn log_registry(registry: &OriginRegistry) {
    for (origin, files) in registry.iter() {
        log::info!("{} files from {}", files.len(), origin);
        for file in files {
            log::debug!("  {}", file.display());
        }
    }
}

/// All `*.nessus` files directly inside each directory
pub fn collect_static_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        files.extend(nessus_files_in(dir));
    }
    files
}

fn nessus_files_in(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        log::warn!("Static directory {} does not exist", dir.display());
        return Vec::new();
    }

    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        NESSUS_GLOB
    );
    match glob::glob(&pattern) {
        Ok(paths) => {
            let mut found: Vec<PathBuf> = paths
                .filter_map(|entry| match entry {
                    Ok(path) => Some(path),
                    Err(e) => {
                        log::warn!("Unable to read {}: {}", e.path().display(), e);
                        None
                    }
                })
                .filter(|path| path.is_file())
                .collect();
            found.sort();
            log::info!("{} static files in {}", found.len(), dir.display());
            found
        }
        Err(e) => {
            log::warn!("Invalid static directory {}: {}", dir.display(), e);
            Vec::new()
        }
    }
}
