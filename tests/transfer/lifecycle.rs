//! Lifecycle tests
//!
//! Staging, deletion after the upload phase, and isolation of failures.

use scan_smuggler::core::retry::RetryPolicy;
use scan_smuggler::core::time::MockTimeProvider;
use scan_smuggler::staging::StagingStore;
use scan_smuggler::transfer::{TransferOrchestrator, TransferOutcome, TransferPhase, TransferPlan};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::common::{write_nessus, FakeDestination, FakeSource};

#[tokio::test]
async fn test_downloaded_files_removed_even_when_uploads_fail() {
    let root = TempDir::new().unwrap();
    let static_dir = TempDir::new().unwrap();
    let kept = write_nessus(static_dir.path(), "kept.nessus");
    let staging = StagingStore::create(root.path()).unwrap();
    let run_dir = staging.run_dir().to_path_buf();

    let destination = FakeDestination::new("dest", "key-b").rejecting("1.nessus");
    let log = destination.log();

    let plan = TransferPlan::new()
        .with_source(Box::new(FakeSource::new("src", "key-a", &["1", "2"])))
        .with_static_dir(static_dir.path())
        .with_destination(Box::new(destination));

    let mut orchestrator = TransferOrchestrator::new(staging, 1);
    let summary = orchestrator.run(&plan).await;

    let log = log.lock().unwrap();
    assert_eq!(log.attempts.len(), 3);
    assert_eq!(log.accepted_names(), vec!["2.nessus", "kept.nessus"]);
    for attempted in &log.attempts {
        if attempted != &kept {
            assert!(!attempted.exists(), "{} not removed", attempted.display());
        }
    }

    assert!(kept.exists());
    assert!(!run_dir.exists());
    assert_eq!(summary.upload_failures, 1);
    assert_eq!(summary.uploaded, 2);
    assert_eq!(summary.removed, 2);
    assert_eq!(summary.cleanup_failures, 0);
    assert_eq!(orchestrator.phase(), TransferPhase::Done);
}

#[tokio::test]
async fn test_nothing_to_upload_skips_upload_phase() {
    let root = TempDir::new().unwrap();
    let empty_static = TempDir::new().unwrap();
    let staging = StagingStore::create(root.path()).unwrap();

    let destination = FakeDestination::new("dest", "key-b");
    let log = destination.log();

    let plan = TransferPlan::new()
        .with_source(Box::new(FakeSource::new("src", "key-a", &[])))
        .with_static_dir(empty_static.path())
        .with_destination(Box::new(destination));

    let summary = TransferOrchestrator::new(staging, 1).run(&plan).await;

    assert_eq!(summary.outcome, TransferOutcome::NothingToUpload);
    assert!(log.lock().unwrap().attempts.is_empty());
    assert_eq!(summary.to_string(), "No files to upload (0 source failures)");
}

#[tokio::test]
async fn test_failing_source_does_not_stop_the_run() {
    let root = TempDir::new().unwrap();
    let staging = StagingStore::create(root.path()).unwrap();

    let destination = FakeDestination::new("dest", "key-c");
    let log = destination.log();

    let plan = TransferPlan::new()
        .with_source(Box::new(FakeSource::failing("broken", "key-a")))
        .with_source(Box::new(FakeSource::new("healthy", "key-b", &["9"])))
        .with_destination(Box::new(destination));

    let summary = TransferOrchestrator::new(staging, 1).run(&plan).await;

    assert_eq!(log.lock().unwrap().accepted_names(), vec!["9.nessus"]);
    assert_eq!(summary.source_failures, 1);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.outcome, TransferOutcome::Completed);
}

#[tokio::test]
async fn test_sources_receive_freshness_cutoff() {
    let root = TempDir::new().unwrap();
    let staging = StagingStore::create(root.path()).unwrap();

    let source = FakeSource::new("src", "key-a", &[]);
    let cutoffs = source.cutoffs();
    let plan = TransferPlan::new().with_source(Box::new(source));

    TransferOrchestrator::new(staging, 2)
        .with_time_provider(Arc::new(MockTimeProvider::at_unix(1_700_000_000)))
        .run(&plan)
        .await;

    assert_eq!(*cutoffs.lock().unwrap(), vec![1_700_000_000 - 2 * 86_400]);
}

#[tokio::test]
async fn test_upload_retry_policy_applies_per_file() {
    let root = TempDir::new().unwrap();
    let staging = StagingStore::create(root.path()).unwrap();

    let destination = FakeDestination::new("dest", "key-b").rejecting("1.nessus");
    let log = destination.log();

    let plan = TransferPlan::new()
        .with_source(Box::new(FakeSource::new("src", "key-a", &["1", "2"])))
        .with_destination(Box::new(destination));

    let summary = TransferOrchestrator::new(staging, 1)
        .with_upload_retry(RetryPolicy::with_attempts(3, Duration::ZERO))
        .run(&plan)
        .await;

    let log = log.lock().unwrap();
    let rejected_attempts = log
        .attempts
        .iter()
        .filter(|p| p.ends_with("1.nessus"))
        .count();
    assert_eq!(rejected_attempts, 3);
    assert_eq!(log.accepted_names(), vec!["2.nessus"]);
    assert_eq!(summary.upload_failures, 1);
}

#[tokio::test]
async fn test_no_destinations_still_cleans_up() {
    let root = TempDir::new().unwrap();
    let staging = StagingStore::create(root.path()).unwrap();
    let run_dir = staging.run_dir().to_path_buf();

    let plan = TransferPlan::new().with_source(Box::new(FakeSource::new("src", "key-a", &["5"])));

    let summary = TransferOrchestrator::new(staging, 1).run(&plan).await;

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.uploaded, 0);
    assert_eq!(summary.removed, 1);
    assert!(!run_dir.exists());
}
