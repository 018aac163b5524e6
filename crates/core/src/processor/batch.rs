//! Batch scheduler: bounded, sequential runs over pending items.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::metrics;
use crate::pacing::{Clock, Pacer};

use super::config::SchedulerConfig;
use super::item::ItemProcessor;
use super::types::{BatchReport, ProcessorError};

/// Runs pending items through the [`ItemProcessor`] in bounded batches.
///
/// Items in a batch are processed one at a time, oldest first, with the
/// pacer enforcing a minimum gap between them. Only one batch runs at a time
/// per scheduler.
pub struct BatchScheduler {
    config: SchedulerConfig,
    processor: Arc<ItemProcessor>,
    pacer: Arc<Pacer>,
    batch_lock: Arc<Mutex<()>>,

    // Background loop state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl BatchScheduler {
    pub fn new(
        config: SchedulerConfig,
        processor: Arc<ItemProcessor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let pacer = Arc::new(Pacer::new(
            clock,
            Duration::from_millis(config.pacing_ms),
        ));

        Self {
            config,
            processor,
            pacer,
            batch_lock: Arc::new(Mutex::new(())),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            handle: std::sync::Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Whether the background loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Process up to `max_items` pending items, oldest first.
    ///
    /// Worker failures are counted in the report. The batch aborts with an
    /// error only when the status store is unavailable; items already
    /// processed keep their persisted status.
    pub async fn run_batch(&self, max_items: usize) -> Result<BatchReport, ProcessorError> {
        Self::execute(&self.processor, &self.pacer, &self.batch_lock, max_items).await
    }

    /// Start the background loop (no-op if already running).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Batch scheduler already running");
            return;
        }

        let running = Arc::clone(&self.running);
        let processor = Arc::clone(&self.processor);
        let pacer = Arc::clone(&self.pacer);
        let batch_lock = Arc::clone(&self.batch_lock);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            info!(
                batch_size = config.batch_size,
                poll_interval_ms = config.poll_interval_ms,
                "Batch loop started"
            );
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Batch loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        match Self::execute(&processor, &pacer, &batch_lock, config.batch_size).await {
                            Ok(report) if report.processed > 0 => {
                                info!(
                                    processed = report.processed,
                                    succeeded = report.succeeded,
                                    failed = report.failed,
                                    "Background batch finished"
                                );
                            }
                            Ok(_) => {}
                            Err(e) => warn!("Background batch aborted: {}", e),
                        }
                    }
                }
            }
            info!("Batch loop stopped");
        });
        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    /// Signal the background loop to stop after its current batch.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("Stopping batch loop");
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for the background loop to exit, including any batch in flight.
    pub async fn wait(&self) {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Batch loop task failed: {}", e);
            }
        }
    }

    async fn execute(
        processor: &ItemProcessor,
        pacer: &Pacer,
        batch_lock: &Mutex<()>,
        max_items: usize,
    ) -> Result<BatchReport, ProcessorError> {
        let _batch = batch_lock.lock().await;

        let items = match processor.store().get_pending(max_items) {
            Ok(items) => items,
            Err(e) => {
                metrics::BATCHES_RUN.with_label_values(&["aborted"]).inc();
                error!("Batch aborted, could not load pending items: {}", e);
                return Err(e.into());
            }
        };

        let mut report = BatchReport::default();
        if items.is_empty() {
            debug!("No pending items");
            metrics::BATCHES_RUN.with_label_values(&["ok"]).inc();
            return Ok(report);
        }

        info!(count = items.len(), max_items, "Starting batch");
        pacer.reset();
        let options = processor.default_options();

        for item in &items {
            pacer.ready().await;

            match processor.process_item(item, &options).await {
                Ok(outcome) => report.record(outcome.success),
                Err(e) if e.is_store_unavailable() => {
                    metrics::BATCHES_RUN.with_label_values(&["aborted"]).inc();
                    error!(
                        media_id = %item.id,
                        processed = report.processed,
                        "Batch aborted: {}", e
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(media_id = %item.id, "Skipping item in batch: {}", e);
                    report.record(false);
                }
            }
            pacer.mark_done();
        }

        metrics::BATCHES_RUN.with_label_values(&["ok"]).inc();
        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            "Batch finished"
        );
        Ok(report)
    }
}
