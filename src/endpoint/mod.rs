//! Endpoint Adapters
//!
//! One adapter per Tenable product. Both expose the same two capabilities to
//! the orchestrator: download eligible scan files into a staging area, and
//! upload a file with the destination's routing parameters.

pub mod archive;
pub mod error;
pub mod tenable_io;
pub mod tenable_sc;
pub mod transport;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::staging::StagingArea;
use crate::transfer::origin::AccountIdentity;

pub use error::{EndpointError, EndpointResult};
pub use tenable_io::{TenableIo, TenableIoDestination, TenableIoSource};
pub use tenable_sc::{TenableSc, TenableScDestination, TenableScSource};

/// A configured account that scan files are downloaded from
#[async_trait]
pub trait ScanSource: Send + Sync {
    /// Display label from the configuration
    fn label(&self) -> &str;

    /// Account the downloaded files are attributed to
    fn identity(&self) -> &AccountIdentity;

    /// Download every eligible scan into `staging`.
    ///
    /// Failures for a single selector are logged and skipped; an `Err` means
    /// the source as a whole could not be processed.
    async fn download(&self, staging: &StagingArea, cutoff: i64) -> EndpointResult<Vec<PathBuf>>;
}

/// A configured account that scan files are imported into
#[async_trait]
pub trait ScanDestination: Send + Sync {
    fn label(&self) -> &str;

    fn identity(&self) -> &AccountIdentity;

    async fn upload(&self, file: &Path) -> EndpointResult<()>;
}

/// Skips are expected and logged quietly; everything else is a warning
pub(crate) fn log_selector_failure(label: &str, error: &EndpointError) {
    if error.is_skip() {
        log::info!("{}: {}", label, error);
    } else {
        log::warn!("{}: {}", label, error);
    }
}
