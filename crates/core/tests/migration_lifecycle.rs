//! Migration controller integration tests.
//!
//! These tests drive full migration runs against a SQLite store:
//! idle -> running -> completed | stopped

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use reelforge_core::{
    testing::{fixtures, ManualClock, MockTranscodeWorker},
    Clock, ItemProcessor, MediaStore, MigrationConfig, MigrationController, MigrationError,
    MigrationOptions, MigrationState, ProcessingStatus, ProcessorConfig, SqliteMediaStore,
    TranscodeError, TranscodeWorker,
};

/// Test helper to create all dependencies for migration tests.
struct TestHarness {
    store: Arc<SqliteMediaStore>,
    worker: Arc<MockTranscodeWorker>,
    controller: Arc<MigrationController>,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let store = Arc::new(SqliteMediaStore::new(&db_path).expect("Failed to create store"));
        let worker = Arc::new(MockTranscodeWorker::new());
        let processor = Arc::new(ItemProcessor::new(
            ProcessorConfig::default(),
            Arc::clone(&store) as Arc<dyn MediaStore>,
            Arc::clone(&worker) as Arc<dyn TranscodeWorker>,
        ));
        let controller = Arc::new(MigrationController::new(
            MigrationConfig::default(),
            processor,
            Arc::new(ManualClock::new()) as Arc<dyn Clock>,
        ));

        Self {
            store,
            worker,
            controller,
            _temp_dir: temp_dir,
        }
    }
}

#[tokio::test]
async fn test_stop_after_third_item() {
    let h = TestHarness::new();
    let items = fixtures::seed_pending(h.store.as_ref(), 5);
    h.worker
        .fail_media(&items[2].id, TranscodeError::rejected(500, "encoder crashed"))
        .await;

    let controller = Arc::downgrade(&h.controller);
    let third = items[2].id.clone();
    h.worker
        .set_invoke_hook(move |media_id| {
            if media_id == third {
                if let Some(controller) = controller.upgrade() {
                    controller.stop();
                }
            }
        })
        .await;

    let started = h.controller.start(MigrationOptions::default()).await.unwrap();
    assert_eq!(started.total_eligible, 5);

    let done = h.controller.wait().await;
    assert_eq!(done.state, MigrationState::Stopped);
    assert_eq!(done.processed_count, 3);
    assert_eq!(done.completed_count, 2);
    assert_eq!(done.error_count, 1);
    assert!(done.processed_count < done.total_eligible);

    let statuses: Vec<ProcessingStatus> = items
        .iter()
        .map(|i| h.store.get(&i.id).unwrap().unwrap().status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            ProcessingStatus::Completed,
            ProcessingStatus::Completed,
            ProcessingStatus::Failed,
            ProcessingStatus::Pending,
            ProcessingStatus::Pending,
        ]
    );
}

#[tokio::test]
async fn test_mixed_catalog_migration() {
    let h = TestHarness::new();
    let pending = fixtures::seed_pending(h.store.as_ref(), 2);
    let failed = fixtures::seed_failed(h.store.as_ref(), 10, "old failure");
    let stale = fixtures::seed_completed(h.store.as_ref(), 11, "gif");
    let current = fixtures::seed_completed(h.store.as_ref(), 12, "webp");

    let run = h.controller.start(MigrationOptions::default()).await.unwrap();
    assert_eq!(run.total_eligible, 4);

    let done = h.controller.wait().await;
    assert_eq!(done.state, MigrationState::Completed);
    assert_eq!(done.completed_count, 4);

    for id in [&pending[0].id, &pending[1].id, &failed.id, &stale.id] {
        let item = h.store.get(id).unwrap().unwrap();
        assert_eq!(item.status, ProcessingStatus::Completed);
        assert_eq!(item.artifacts.format.as_deref(), Some("webp"));
    }

    // Untouched.
    assert_eq!(h.store.get(&current.id).unwrap().unwrap(), current);
    let invoked: Vec<String> = h
        .worker
        .recorded_invocations()
        .await
        .into_iter()
        .map(|c| c.request.media_id)
        .collect();
    assert!(!invoked.contains(&current.id));
}

#[tokio::test]
async fn test_second_start_rejected_while_running() {
    let h = TestHarness::new();
    fixtures::seed_pending(h.store.as_ref(), 2);
    h.worker.set_latency(Duration::from_millis(30)).await;

    h.controller.start(MigrationOptions::default()).await.unwrap();
    let before = h.controller.status();

    let err = h
        .controller
        .start(MigrationOptions::default().with_target_format("gif"))
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::AlreadyRunning));

    let after = h.controller.status();
    assert_eq!(after.total_eligible, before.total_eligible);
    assert_eq!(after.processed_count, before.processed_count);
    assert_eq!(after.target_format.as_deref(), Some("webp"));

    assert_eq!(h.controller.wait().await.state, MigrationState::Completed);
}

#[tokio::test]
async fn test_status_snapshot_is_stable_after_completion() {
    let h = TestHarness::new();
    fixtures::seed_pending(h.store.as_ref(), 3);

    h.controller.start(MigrationOptions::default()).await.unwrap();
    let done = h.controller.wait().await;

    for _ in 0..5 {
        assert_eq!(h.controller.status(), done);
    }
}
