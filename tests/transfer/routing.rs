//! Routing tests
//!
//! Which destination receives which file.

use scan_smuggler::staging::StagingStore;
use scan_smuggler::transfer::{TransferOrchestrator, TransferOutcome, TransferPlan};
use tempfile::TempDir;

use crate::common::{write_nessus, FakeDestination, FakeSource};

#[tokio::test]
async fn test_destinations_never_receive_their_own_files() {
    let root = TempDir::new().unwrap();
    let staging = StagingStore::create(root.path()).unwrap();

    let to_a = FakeDestination::new("dest-a", "key-a");
    let to_b = FakeDestination::new("dest-b", "key-b");
    let to_c = FakeDestination::new("dest-c", "key-c");
    let (log_a, log_b, log_c) = (to_a.log(), to_b.log(), to_c.log());

    let plan = TransferPlan::new()
        .with_source(Box::new(FakeSource::new("src-a", "key-a", &["1", "2"])))
        .with_source(Box::new(FakeSource::new("src-b", "key-b", &["3"])))
        .with_destination(Box::new(to_a))
        .with_destination(Box::new(to_b))
        .with_destination(Box::new(to_c));

    let summary = TransferOrchestrator::new(staging, 1).run(&plan).await;

    assert_eq!(log_a.lock().unwrap().accepted_names(), vec!["3.nessus"]);
    assert_eq!(
        log_b.lock().unwrap().accepted_names(),
        vec!["1.nessus", "2.nessus"]
    );
    assert_eq!(
        log_c.lock().unwrap().accepted_names(),
        vec!["1.nessus", "2.nessus", "3.nessus"]
    );

    assert_eq!(summary.outcome, TransferOutcome::Completed);
    assert_eq!(summary.downloaded, 3);
    assert_eq!(summary.uploaded, 6);
    assert_eq!(summary.skipped_loopback, 3);
    assert_eq!(summary.upload_failures, 0);
}

#[tokio::test]
async fn test_static_files_reach_every_destination() {
    let root = TempDir::new().unwrap();
    let static_dir = TempDir::new().unwrap();
    write_nessus(static_dir.path(), "archived.nessus");
    let staging = StagingStore::create(root.path()).unwrap();

    // an access key that happens to look like a reserved word is still just an account
    let odd = FakeDestination::new("dest-odd", "static_file");
    let plain = FakeDestination::new("dest-plain", "key-z");
    let (odd_log, plain_log) = (odd.log(), plain.log());

    let plan = TransferPlan::new()
        .with_static_dir(static_dir.path())
        .with_destination(Box::new(odd))
        .with_destination(Box::new(plain));

    let summary = TransferOrchestrator::new(staging, 1).run(&plan).await;

    assert_eq!(odd_log.lock().unwrap().accepted_names(), vec!["archived.nessus"]);
    assert_eq!(
        plain_log.lock().unwrap().accepted_names(),
        vec!["archived.nessus"]
    );
    assert_eq!(summary.static_files, 1);
    assert_eq!(summary.skipped_loopback, 0);
}

#[tokio::test]
async fn test_equal_scan_ids_on_different_accounts_do_not_collide() {
    let root = TempDir::new().unwrap();
    let staging = StagingStore::create(root.path()).unwrap();

    let destination = FakeDestination::new("dest", "key-c");
    let log = destination.log();

    let plan = TransferPlan::new()
        .with_source(Box::new(FakeSource::new("src-a", "key-a", &["100"])))
        .with_source(Box::new(FakeSource::new("src-b", "key-b", &["100"])))
        .with_destination(Box::new(destination));

    let summary = TransferOrchestrator::new(staging, 1).run(&plan).await;

    let log = log.lock().unwrap();
    assert_eq!(log.accepted.len(), 2);
    assert_ne!(log.accepted[0], log.accepted[1]);
    assert_eq!(summary.uploaded, 2);
}

#[tokio::test]
async fn test_two_sources_sharing_an_account_share_an_origin() {
    let root = TempDir::new().unwrap();
    let staging = StagingStore::create(root.path()).unwrap();

    let same_account = FakeDestination::new("dest-a", "key-a");
    let log = same_account.log();

    let plan = TransferPlan::new()
        .with_source(Box::new(FakeSource::new("src-a1", "key-a", &["1"])))
        .with_source(Box::new(FakeSource::new("src-a2", "key-a", &["2"])))
        .with_destination(Box::new(same_account));

    let summary = TransferOrchestrator::new(staging, 1).run(&plan).await;

    assert!(log.lock().unwrap().attempts.is_empty());
    assert_eq!(summary.skipped_loopback, 2);
    assert_eq!(summary.removed, 2);
}
