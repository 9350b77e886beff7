//! Transfer plan: the enabled endpoints of one run, ready to use

use std::path::PathBuf;

use crate::config::ScanSmugglerConfig;
use crate::endpoint::{
    EndpointResult, ScanDestination, ScanSource, TenableIoDestination, TenableIoSource,
    TenableScDestination, TenableScSource,
};

/// Sources, static directories and destinations taking part in a run
#[derive(Default)]
pub struct TransferPlan {
    pub sources: Vec<Box<dyn ScanSource>>,
    pub static_dirs: Vec<PathBuf>,
    pub destinations: Vec<Box<dyn ScanDestination>>,
}

impl TransferPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Box<dyn ScanSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dirs.push(dir.into());
        self
    }

    pub fn with_destination(mut self, destination: Box<dyn ScanDestination>) -> Self {
        self.destinations.push(destination);
        self
    }

    /// Build endpoints for every enabled entry. An endpoint whose client cannot
    /// be built is logged and left out; the rest of the run proceeds.
    pub fn from_config(config: &ScanSmugglerConfig) -> Self {
        let settings = &config.settings;
        let mut plan = TransferPlan::new();

        for entry in config.downloads.tenable_io.iter().filter(|e| e.account.enabled) {
            if let Some(source) = built(&entry.account.id, TenableIoSource::from_config(entry, settings)) {
                plan.sources.push(Box::new(source));
            }
        }
        for entry in config.downloads.tenable_sc.iter().filter(|e| e.account.enabled) {
            if let Some(source) = built(&entry.account.id, TenableScSource::from_config(entry, settings)) {
                plan.sources.push(Box::new(source));
            }
        }

        plan.static_dirs = config
            .downloads
            .nessus_files
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| PathBuf::from(&entry.directory))
            .collect();

        for entry in config.uploads.tenable_io.iter().filter(|e| e.account.enabled) {
            if let Some(destination) =
                built(&entry.account.id, TenableIoDestination::from_config(entry, settings))
            {
                plan.destinations.push(Box::new(destination));
            }
        }
        for entry in config.uploads.tenable_sc.iter().filter(|e| e.account.enabled) {
            if let Some(destination) =
                built(&entry.account.id, TenableScDestination::from_config(entry, settings))
            {
                plan.destinations.push(Box::new(destination));
            }
        }

        log::debug!(
            "Plan: {} sources, {} static directories, {} destinations",
            plan.sources.len(),
            plan.static_dirs.len(),
            plan.destinations.len()
        );
        plan
    }
}

fn built<T>(label: &str, result: EndpointResult<T>) -> Option<T> {
    match result {
        Ok(endpoint) => Some(endpoint),
        Err(e) => {
            log::warn!("{}: endpoint disabled for this run: {}", label, e);
            None
        }
    }
}
