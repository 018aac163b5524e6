//! Migration run controller.
//!
//! One run at a time walks the eligible part of the catalog, snapshotted at
//! start, and regenerates artifacts item by item. Progress is published
//! through a `watch` channel: the run loop is the only writer, readers take
//! a cheap clone of the latest snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::media::{MediaItem, ProcessingStatus};
use crate::metrics;
use crate::pacing::{Clock, Pacer};
use crate::processor::{ItemProcessor, ProcessorError};
use crate::worker::TranscodeOptions;

use super::config::MigrationConfig;
use super::progress::{estimate_seconds_remaining, percent_complete};
use super::types::{is_eligible, MigrationError, MigrationOptions, MigrationRun, MigrationState};

/// Everything the spawned run loop owns.
struct RunContext {
    processor: Arc<ItemProcessor>,
    clock: Arc<dyn Clock>,
    pacer: Pacer,
    snapshot_tx: Arc<watch::Sender<MigrationRun>>,
    running: Arc<AtomicBool>,
    token: CancellationToken,
    options: TranscodeOptions,
    per_item_estimate: Duration,
    started: Instant,
}

/// Drives catalog migrations.
///
/// Owned by the hosting service and shared by reference; there is no global
/// run state.
pub struct MigrationController {
    config: MigrationConfig,
    processor: Arc<ItemProcessor>,
    clock: Arc<dyn Clock>,

    // Runtime state
    running: Arc<AtomicBool>,
    snapshot_tx: Arc<watch::Sender<MigrationRun>>,
    cancel: Mutex<Option<CancellationToken>>,
    handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl MigrationController {
    pub fn new(
        config: MigrationConfig,
        processor: Arc<ItemProcessor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(MigrationRun::default());

        Self {
            config,
            processor,
            clock,
            running: Arc::new(AtomicBool::new(false)),
            snapshot_tx: Arc::new(snapshot_tx),
            cancel: Mutex::new(None),
            handle: tokio::sync::Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start a run over every eligible item.
    ///
    /// Fails with [`MigrationError::AlreadyRunning`] without touching the
    /// current run. If the catalog cannot be scanned the run is recorded as
    /// `Stopped` with the cause and the error is returned.
    pub async fn start(&self, options: MigrationOptions) -> Result<MigrationRun, MigrationError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Migration already running");
            return Err(MigrationError::AlreadyRunning);
        }

        // Installed before the scan so a stop issued while scanning is kept.
        let token = CancellationToken::new();
        *self.cancel.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());

        let options = options.resolve(&self.config);
        let now = Utc::now();

        let items = match self.processor.store().list_all() {
            Ok(items) => items,
            Err(e) => {
                error!("Migration aborted, could not scan catalog: {}", e);
                self.snapshot_tx.send_replace(MigrationRun {
                    state: MigrationState::Stopped,
                    started_at: Some(now),
                    finished_at: Some(now),
                    target_format: Some(options.target_format.clone()),
                    last_error: Some(e.to_string()),
                    ..Default::default()
                });
                metrics::MIGRATION_RUNS
                    .with_label_values(&[MigrationState::Stopped.as_str()])
                    .inc();
                self.running.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        let eligible: Vec<MediaItem> = items
            .into_iter()
            .filter(|item| is_eligible(item, &options))
            .collect();
        let total = eligible.len();
        let per_item_estimate = Duration::from_secs(self.config.per_item_estimate_secs);

        let run = MigrationRun {
            state: MigrationState::Running,
            is_running: true,
            total_eligible: total,
            started_at: Some(now),
            estimated_seconds_remaining: Some(estimate_seconds_remaining(
                Duration::ZERO,
                0,
                total,
                per_item_estimate,
            )),
            percent_complete: 0.0,
            target_format: Some(options.target_format.clone()),
            ..Default::default()
        };
        self.snapshot_tx.send_replace(run.clone());

        info!(
            total_eligible = total,
            target_format = %options.target_format,
            "Migration started"
        );
        metrics::MIGRATION_RUNNING.set(1);
        metrics::MIGRATION_REMAINING.set(total as i64);

        let ctx = RunContext {
            processor: Arc::clone(&self.processor),
            clock: Arc::clone(&self.clock),
            pacer: Pacer::new(
                Arc::clone(&self.clock),
                Duration::from_millis(self.config.pacing_ms),
            ),
            snapshot_tx: Arc::clone(&self.snapshot_tx),
            running: Arc::clone(&self.running),
            token,
            options,
            per_item_estimate,
            started: self.clock.now(),
        };

        let handle = tokio::spawn(Self::run_loop(ctx, eligible));
        *self.handle.lock().await = Some(handle);

        Ok(run)
    }

    /// Ask the current run to stop at the next item boundary.
    ///
    /// The item in progress is allowed to finish. Returns `false` if no run
    /// was in progress.
    pub fn stop(&self) -> bool {
        if !self.is_running() {
            debug!("Stop requested with no migration running");
            return false;
        }

        if let Some(token) = self
            .cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            info!("Migration stop requested");
            token.cancel();
        }
        true
    }

    /// Snapshot of the current or last run.
    pub fn status(&self) -> MigrationRun {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<MigrationRun> {
        self.snapshot_tx.subscribe()
    }

    /// Wait for the current run (if any) to finish and return its final snapshot.
    pub async fn wait(&self) -> MigrationRun {
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Migration task failed: {}", e);
                let mut run = self.status();
                if run.state == MigrationState::Running {
                    run.state = MigrationState::Stopped;
                    run.is_running = false;
                    run.current_item = None;
                    run.finished_at = Some(Utc::now());
                    run.last_error = Some(format!("migration task failed: {}", e));
                    self.snapshot_tx.send_replace(run);
                }
                metrics::MIGRATION_RUNNING.set(0);
                self.running.store(false, Ordering::SeqCst);
            }
        }
        self.status()
    }

    async fn run_loop(ctx: RunContext, items: Vec<MediaItem>) {
        let mut run = ctx.snapshot_tx.borrow().clone();

        if ctx.token.is_cancelled() {
            info!("Migration stopped before the first item");
            Self::finish(&ctx, run, MigrationState::Stopped);
            return;
        }

        for item in &items {
            tokio::select! {
                biased;
                _ = ctx.token.cancelled() => {
                    info!(
                        processed = run.processed_count,
                        total = run.total_eligible,
                        "Migration stopped"
                    );
                    Self::finish(&ctx, run, MigrationState::Stopped);
                    return;
                }
                _ = ctx.pacer.ready() => {}
            }

            run.current_item = Some(item.id.clone());
            ctx.snapshot_tx.send_replace(run.clone());

            let result = Self::migrate_item(&ctx, item).await;
            ctx.pacer.mark_done();
            match result {
                Ok(true) => run.completed_count += 1,
                Ok(false) => run.error_count += 1,
                Err(e) if e.is_store_unavailable() => {
                    error!(media_id = %item.id, "Migration aborted: {}", e);
                    run.last_error = Some(e.to_string());
                    Self::finish(&ctx, run, MigrationState::Stopped);
                    return;
                }
                Err(e) => {
                    warn!(media_id = %item.id, "Migration could not process item: {}", e);
                    run.error_count += 1;
                }
            }

            run.processed_count += 1;
            run.current_item = None;
            run.percent_complete = percent_complete(run.processed_count, run.total_eligible);
            run.estimated_seconds_remaining = Some(estimate_seconds_remaining(
                ctx.clock.elapsed_since(ctx.started),
                run.processed_count,
                run.total_eligible,
                ctx.per_item_estimate,
            ));
            metrics::MIGRATION_REMAINING.set(run.remaining() as i64);
            ctx.snapshot_tx.send_replace(run.clone());
        }

        info!(
            completed = run.completed_count,
            errors = run.error_count,
            "Migration completed"
        );
        Self::finish(&ctx, run, MigrationState::Completed);
    }

    /// Process one item; `Ok(false)` means the worker failed for it.
    async fn migrate_item(ctx: &RunContext, snapshot: &MediaItem) -> Result<bool, ProcessorError> {
        // The eligible set is fixed at start; the item itself may have moved on.
        let item = ctx
            .processor
            .store()
            .get(&snapshot.id)?
            .ok_or_else(|| ProcessorError::NotFound(snapshot.id.clone()))?;

        if !is_eligible(&item, &ctx.options) {
            if item.status == ProcessingStatus::Processing {
                return Err(ProcessorError::InFlight(item.id));
            }
            debug!(media_id = %item.id, "Item already up to date");
            return Ok(true);
        }

        let outcome = if item.status == ProcessingStatus::Completed {
            ctx.processor.refresh_artifacts(&item, &ctx.options).await?
        } else {
            ctx.processor.process_item(&item, &ctx.options).await?
        };
        Ok(outcome.success)
    }

    fn finish(ctx: &RunContext, mut run: MigrationRun, state: MigrationState) {
        run.state = state;
        run.is_running = false;
        run.current_item = None;
        run.finished_at = Some(Utc::now());
        if state == MigrationState::Completed {
            run.estimated_seconds_remaining = Some(0);
            run.percent_complete = 100.0;
        }
        ctx.snapshot_tx.send_replace(run);

        metrics::MIGRATION_RUNS
            .with_label_values(&[state.as_str()])
            .inc();
        metrics::MIGRATION_RUNNING.set(0);
        ctx.running.store(false, Ordering::SeqCst);
    }
}
