//! Item processor and batch scheduler integration tests.
//!
//! These tests run against a SQLite store on disk and verify the item
//! lifecycle: pending -> processing -> completed | failed (-> processing on retry)

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use reelforge_core::{
    testing::{fixtures, ManualClock, MockTranscodeWorker},
    BatchReport, BatchScheduler, Clock, ItemProcessor, MediaStore, ProcessingStatus,
    ProcessorConfig, ProcessorError, SchedulerConfig, SqliteMediaStore, TranscodeError,
    TranscodeWorker,
};

/// Test helper to create all dependencies for processing tests.
struct TestHarness {
    store: Arc<SqliteMediaStore>,
    worker: Arc<MockTranscodeWorker>,
    clock: Arc<ManualClock>,
    processor: Arc<ItemProcessor>,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(ProcessorConfig::default())
    }

    fn with_config(config: ProcessorConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let store = Arc::new(SqliteMediaStore::new(&db_path).expect("Failed to create store"));
        let worker = Arc::new(MockTranscodeWorker::new());
        let clock = Arc::new(ManualClock::new());
        let processor = Arc::new(ItemProcessor::new(
            config,
            Arc::clone(&store) as Arc<dyn MediaStore>,
            Arc::clone(&worker) as Arc<dyn TranscodeWorker>,
        ));

        Self {
            store,
            worker,
            clock,
            processor,
            _temp_dir: temp_dir,
        }
    }

    fn scheduler(&self) -> BatchScheduler {
        BatchScheduler::new(
            SchedulerConfig {
                pacing_ms: 2000,
                ..Default::default()
            },
            Arc::clone(&self.processor),
            Arc::clone(&self.clock) as Arc<dyn Clock>,
        )
    }

    fn status(&self, id: &str) -> ProcessingStatus {
        self.store
            .get(id)
            .expect("store read")
            .expect("item exists")
            .status
    }
}

#[tokio::test]
async fn test_batch_of_three_from_ten_pending() {
    let h = TestHarness::new();
    let items = fixtures::seed_pending(h.store.as_ref(), 10);

    let report = h.scheduler().run_batch(3).await.unwrap();
    assert_eq!(
        report,
        BatchReport {
            processed: 3,
            succeeded: 3,
            failed: 0
        }
    );

    for item in &items[..3] {
        assert_eq!(h.status(&item.id), ProcessingStatus::Completed);
    }
    for item in &items[3..] {
        assert_eq!(h.status(&item.id), ProcessingStatus::Pending);
    }
    assert_eq!(h.store.get_pending(100).unwrap().len(), 7);
}

#[tokio::test]
async fn test_consecutive_batches_drain_queue_in_order() {
    let h = TestHarness::new();
    let items = fixtures::seed_pending(h.store.as_ref(), 5);
    let scheduler = h.scheduler();

    assert_eq!(scheduler.run_batch(2).await.unwrap().processed, 2);
    assert_eq!(scheduler.run_batch(2).await.unwrap().processed, 2);
    assert_eq!(scheduler.run_batch(2).await.unwrap().processed, 1);
    assert_eq!(scheduler.run_batch(2).await.unwrap().processed, 0);

    let order: Vec<String> = h
        .worker
        .recorded_invocations()
        .await
        .into_iter()
        .map(|c| c.request.media_id)
        .collect();
    let expected: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
    assert_eq!(order, expected);
}

#[tokio::test]
async fn test_failed_item_leaves_queue_and_can_be_retried() {
    let h = TestHarness::new();
    let items = fixtures::seed_pending(h.store.as_ref(), 3);
    h.worker
        .fail_source(&items[0].source_url, TranscodeError::rejected(415, "unsupported codec"))
        .await;

    let report = h.scheduler().run_batch(3).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded, 2);

    let failed = h.store.get(&items[0].id).unwrap().unwrap();
    assert_eq!(failed.status, ProcessingStatus::Failed);
    assert!(failed.last_error.as_deref().unwrap().contains("unsupported codec"));

    // Failed items are not pending, so the next batch has nothing to do.
    assert_eq!(h.scheduler().run_batch(3).await.unwrap().processed, 0);

    h.worker.clear_failures().await;
    let outcome = h.processor.retry_item(&items[0].id).await.unwrap();
    assert!(outcome.success);
    assert_eq!(h.status(&items[0].id), ProcessingStatus::Completed);
}

#[tokio::test]
async fn test_retry_on_completed_item_is_rejected() {
    let h = TestHarness::new();
    let item = fixtures::seed_completed(h.store.as_ref(), 0, "webp");

    let result = h.processor.retry_item(&item.id).await;
    assert!(matches!(result, Err(ProcessorError::InvalidState { .. })));

    let stored = h.store.get(&item.id).unwrap().unwrap();
    assert_eq!(stored, item);
    assert_eq!(h.worker.invocation_count().await, 0);
}

#[tokio::test]
async fn test_timeout_never_leaves_item_processing() {
    let h = TestHarness::with_config(ProcessorConfig {
        item_timeout_ms: 30,
        ..Default::default()
    });
    h.worker.set_latency(Duration::from_secs(5)).await;
    let items = fixtures::seed_pending(h.store.as_ref(), 2);

    let report = h.scheduler().run_batch(2).await.unwrap();
    assert_eq!(report.failed, 2);

    for item in &items {
        let stored = h.store.get(&item.id).unwrap().unwrap();
        assert_eq!(stored.status, ProcessingStatus::Failed);
        assert!(stored.last_error.unwrap().contains("timed out"));
    }
}

#[tokio::test]
async fn test_recovery_after_restart() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let stuck_id = {
        let store = SqliteMediaStore::new(&db_path).unwrap();
        let item = fixtures::seed_pending(&store, 1).remove(0);
        store
            .update_status(&item.id, reelforge_core::StatusUpdate::processing())
            .unwrap();
        item.id
    };

    // Reopen as a fresh process would.
    let store = Arc::new(SqliteMediaStore::new(&db_path).unwrap());
    let processor = ItemProcessor::new(
        ProcessorConfig::default(),
        Arc::clone(&store) as Arc<dyn MediaStore>,
        Arc::new(MockTranscodeWorker::new()) as Arc<dyn TranscodeWorker>,
    );

    assert_eq!(processor.recover_interrupted().unwrap(), 1);
    assert_eq!(
        store.get(&stuck_id).unwrap().unwrap().status,
        ProcessingStatus::Failed
    );

    let outcome = processor.retry_item(&stuck_id).await.unwrap();
    assert!(outcome.success);
}
