//! Item processor: drives one media item through its status lifecycle.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::media::{
    DerivedArtifacts, MediaFilter, MediaItem, MediaStore, ProcessingStatus, StatusUpdate,
};
use crate::metrics;
use crate::worker::{TranscodeError, TranscodeOptions, TranscodeRequest, TranscodeWorker};

use super::config::ProcessorConfig;
use super::types::{ProcessOutcome, ProcessorError};

/// Releases an in-flight claim when dropped.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    media_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut set = self.set.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.media_id);
    }
}

/// Drives items through `Pending/Failed -> Processing -> Completed/Failed`.
///
/// `Processing` is persisted before the worker is called. Worker failures,
/// including timeouts, are recorded on the item and returned as an
/// unsuccessful [`ProcessOutcome`]; only store failures surface as errors.
pub struct ItemProcessor {
    config: ProcessorConfig,
    store: Arc<dyn MediaStore>,
    worker: Arc<dyn TranscodeWorker>,
    in_flight: Mutex<HashSet<String>>,
}

impl ItemProcessor {
    pub fn new(
        config: ProcessorConfig,
        store: Arc<dyn MediaStore>,
        worker: Arc<dyn TranscodeWorker>,
    ) -> Self {
        Self {
            config,
            store,
            worker,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn MediaStore> {
        &self.store
    }

    /// Worker options used when the caller does not supply any.
    pub fn default_options(&self) -> TranscodeOptions {
        self.config.default_options()
    }

    /// Whether the item is currently being processed by this processor.
    pub fn is_in_flight(&self, media_id: &str) -> bool {
        let set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        set.contains(media_id)
    }

    /// Process an item that is `Pending` or `Failed`.
    pub async fn process_item(
        &self,
        item: &MediaItem,
        options: &TranscodeOptions,
    ) -> Result<ProcessOutcome, ProcessorError> {
        if !item.status.can_start_processing() {
            return Err(ProcessorError::InvalidState {
                media_id: item.id.clone(),
                expected: "pending or failed".to_string(),
                actual: item.status,
            });
        }

        self.run_lifecycle(item, options, StatusUpdate::processing())
            .await
    }

    /// Load an item and process it with the default options.
    pub async fn process_by_id(&self, media_id: &str) -> Result<ProcessOutcome, ProcessorError> {
        let item = self.load(media_id)?;
        let options = self.default_options();
        self.process_item(&item, &options).await
    }

    /// Re-run a `Failed` item.
    ///
    /// Rejected without touching the item if it is not `Failed` or has
    /// used up `max_retries`.
    pub async fn retry_item(&self, media_id: &str) -> Result<ProcessOutcome, ProcessorError> {
        let item = self.load(media_id)?;

        if item.status != ProcessingStatus::Failed {
            return Err(ProcessorError::InvalidState {
                media_id: item.id,
                expected: "failed".to_string(),
                actual: item.status,
            });
        }

        let max_retries = self.config.max_retries;
        if max_retries > 0 && item.retry_count >= max_retries {
            return Err(ProcessorError::RetryLimitExceeded {
                media_id: item.id,
                retry_count: item.retry_count,
                max_retries,
            });
        }

        info!(
            media_id = %item.id,
            retry = item.retry_count + 1,
            "Retrying failed media item"
        );
        metrics::RETRY_ATTEMPTS.inc();

        let options = self.default_options();
        self.run_lifecycle(&item, &options, StatusUpdate::retrying())
            .await
    }

    /// Regenerate artifacts for a `Completed` item without leaving `Completed`.
    ///
    /// On failure the existing artifacts stay and `last_error` records the cause.
    pub async fn refresh_artifacts(
        &self,
        item: &MediaItem,
        options: &TranscodeOptions,
    ) -> Result<ProcessOutcome, ProcessorError> {
        if item.status != ProcessingStatus::Completed {
            return Err(ProcessorError::InvalidState {
                media_id: item.id.clone(),
                expected: "completed".to_string(),
                actual: item.status,
            });
        }

        let _guard = self.claim(&item.id)?;
        let started = Instant::now();
        let result = self.invoke_worker(item, options).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(artifacts) => {
                self.store
                    .update_status(&item.id, StatusUpdate::completed(artifacts.clone()))?;
                Self::observe("refreshed", duration_ms);
                debug!(media_id = %item.id, "Artifacts refreshed");
                Ok(ProcessOutcome {
                    media_id: item.id.clone(),
                    success: true,
                    artifacts: Some(artifacts),
                    error: None,
                    duration_ms,
                })
            }
            Err(e) => {
                let cause = e.to_string();
                self.store
                    .update_status(&item.id, StatusUpdate::refresh_failed(cause.clone()))?;
                Self::observe("refresh_failed", duration_ms);
                let retryable = Self::observe_failure(&e);
                warn!(media_id = %item.id, error = %cause, retryable, "Artifact refresh failed");
                Ok(ProcessOutcome {
                    media_id: item.id.clone(),
                    success: false,
                    artifacts: None,
                    error: Some(cause),
                    duration_ms,
                })
            }
        }
    }

    /// Mark items left in `Processing` by a previous process as `Failed`.
    ///
    /// Returns the number of items recovered.
    pub fn recover_interrupted(&self) -> Result<usize, ProcessorError> {
        let filter = MediaFilter::new()
            .with_status(ProcessingStatus::Processing)
            .with_limit(i64::MAX);
        let stuck = self.store.list(&filter)?;

        let mut recovered = 0;
        for item in stuck {
            if self.is_in_flight(&item.id) {
                continue;
            }
            self.store.update_status(
                &item.id,
                StatusUpdate::failed("interrupted: processing did not finish before shutdown"),
            )?;
            info!(media_id = %item.id, "Recovered interrupted media item");
            recovered += 1;
        }

        Ok(recovered)
    }

    fn load(&self, media_id: &str) -> Result<MediaItem, ProcessorError> {
        self.store
            .get(media_id)?
            .ok_or_else(|| ProcessorError::NotFound(media_id.to_string()))
    }

    fn claim(&self, media_id: &str) -> Result<InFlightGuard<'_>, ProcessorError> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(media_id.to_string()) {
            return Err(ProcessorError::InFlight(media_id.to_string()));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            media_id: media_id.to_string(),
        })
    }

    async fn run_lifecycle(
        &self,
        item: &MediaItem,
        options: &TranscodeOptions,
        start: StatusUpdate,
    ) -> Result<ProcessOutcome, ProcessorError> {
        let _guard = self.claim(&item.id)?;

        self.store.update_status(&item.id, start)?;
        debug!(media_id = %item.id, "Media item marked processing");

        let started = Instant::now();
        let result = self.invoke_worker(item, options).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(artifacts) => {
                self.store
                    .update_status(&item.id, StatusUpdate::completed(artifacts.clone()))?;
                Self::observe("completed", duration_ms);
                info!(media_id = %item.id, duration_ms, "Media item completed");
                Ok(ProcessOutcome {
                    media_id: item.id.clone(),
                    success: true,
                    artifacts: Some(artifacts),
                    error: None,
                    duration_ms,
                })
            }
            Err(e) => {
                let cause = e.to_string();
                self.store
                    .update_status(&item.id, StatusUpdate::failed(cause.clone()))?;
                Self::observe("failed", duration_ms);
                let retryable = Self::observe_failure(&e);
                warn!(media_id = %item.id, error = %cause, retryable, "Media item failed");
                Ok(ProcessOutcome {
                    media_id: item.id.clone(),
                    success: false,
                    artifacts: None,
                    error: Some(cause),
                    duration_ms,
                })
            }
        }
    }

    async fn invoke_worker(
        &self,
        item: &MediaItem,
        options: &TranscodeOptions,
    ) -> Result<DerivedArtifacts, TranscodeError> {
        let request = TranscodeRequest {
            media_id: item.id.clone(),
            source_url: item.source_url.clone(),
            options: options.clone(),
        };

        let timeout = Duration::from_millis(self.config.item_timeout_ms);
        match tokio::time::timeout(timeout, self.worker.invoke(request)).await {
            Ok(Ok(output)) => Ok(output.into_artifacts(&options.target_format)),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                metrics::WORKER_TIMEOUTS.inc();
                Err(TranscodeError::Timeout {
                    timeout_ms: self.config.item_timeout_ms,
                })
            }
        }
    }

    /// Count a worker failure by kind; returns whether it is retryable.
    fn observe_failure(error: &TranscodeError) -> bool {
        let retryable = error.is_retryable();
        let kind = if retryable { "retryable" } else { "permanent" };
        metrics::WORKER_FAILURES.with_label_values(&[kind]).inc();
        retryable
    }

    fn observe(result: &str, duration_ms: u64) {
        metrics::ITEMS_PROCESSED.with_label_values(&[result]).inc();
        metrics::ITEM_DURATION
            .with_label_values(&[result])
            .observe(duration_ms as f64 / 1000.0);
    }
}
