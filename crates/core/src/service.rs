//! Caller-facing processing API.
//!
//! Thin facade used by the HTTP layer (and any other front end) so callers
//! never reach into the processor or the migration controller directly.

use std::sync::Arc;

use tracing::warn;

use crate::media::MediaStore;
use crate::migration::{MigrationController, MigrationError, MigrationOptions, MigrationRun};
use crate::processor::{BatchReport, BatchScheduler, ItemProcessor, ProcessorError};

/// Status string reported for items the store does not know about.
pub const UNKNOWN_STATUS: &str = "unknown";

/// Entry point for UI and CLI layers.
#[derive(Clone)]
pub struct ProcessingService {
    store: Arc<dyn MediaStore>,
    processor: Arc<ItemProcessor>,
    scheduler: Arc<BatchScheduler>,
    migration: Arc<MigrationController>,
}

impl ProcessingService {
    pub fn new(
        store: Arc<dyn MediaStore>,
        processor: Arc<ItemProcessor>,
        scheduler: Arc<BatchScheduler>,
        migration: Arc<MigrationController>,
    ) -> Self {
        Self {
            store,
            processor,
            scheduler,
            migration,
        }
    }

    pub fn store(&self) -> &Arc<dyn MediaStore> {
        &self.store
    }

    pub fn processor(&self) -> &Arc<ItemProcessor> {
        &self.processor
    }

    pub fn scheduler(&self) -> &Arc<BatchScheduler> {
        &self.scheduler
    }

    pub fn migration(&self) -> &Arc<MigrationController> {
        &self.migration
    }

    /// Start a catalog migration.
    pub async fn start_migration(
        &self,
        options: MigrationOptions,
    ) -> Result<MigrationRun, MigrationError> {
        self.migration.start(options).await
    }

    /// Ask the running migration to stop at the next item boundary.
    pub fn stop_migration(&self) {
        self.migration.stop();
    }

    pub fn get_migration_status(&self) -> MigrationRun {
        self.migration.status()
    }

    /// Process one item now. `Ok(false)` means the worker failed for it.
    pub async fn process_single_video(&self, media_id: &str) -> Result<bool, ProcessorError> {
        let outcome = self.processor.process_by_id(media_id).await?;
        Ok(outcome.success)
    }

    /// Retry a failed item. `Ok(false)` means the worker failed again.
    pub async fn retry_failed_processing(&self, media_id: &str) -> Result<bool, ProcessorError> {
        let outcome = self.processor.retry_item(media_id).await?;
        Ok(outcome.success)
    }

    /// Run one batch over pending items.
    pub async fn run_batch(&self, max_items: usize) -> Result<BatchReport, ProcessorError> {
        self.scheduler.run_batch(max_items).await
    }

    /// Processing status of an item, or `"unknown"` if it cannot be found.
    pub fn get_processing_status(&self, media_id: &str) -> String {
        match self.store.get(media_id) {
            Ok(Some(item)) => item.status.to_string(),
            Ok(None) => UNKNOWN_STATUS.to_string(),
            Err(e) => {
                warn!(media_id, "Could not read processing status: {}", e);
                UNKNOWN_STATUS.to_string()
            }
        }
    }
}
