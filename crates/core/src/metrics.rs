//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Item processing (per-item results, worker latency, retries)
//! - Batch scheduling
//! - Catalog migration runs

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Item Processing
// =============================================================================

/// Items processed total by result.
pub static ITEMS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_items_processed_total", "Total media items processed"),
        &["result"], // "completed", "failed", "refreshed", "refresh_failed"
    )
    .unwrap()
});

/// Worker call duration in seconds.
pub static ITEM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelforge_item_duration_seconds",
            "Duration of transcode worker calls",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

/// Worker timeouts.
pub static WORKER_TIMEOUTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelforge_worker_timeouts_total",
        "Transcode worker calls that exceeded the bounded wait",
    )
    .unwrap()
});

/// Worker failures by whether a later attempt could succeed.
pub static WORKER_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelforge_worker_failures_total",
            "Transcode worker failures",
        ),
        &["kind"], // "retryable", "permanent"
    )
    .unwrap()
});

/// Manual retries accepted.
pub static RETRY_ATTEMPTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelforge_retry_attempts_total",
        "Retries of failed media items",
    )
    .unwrap()
});

// =============================================================================
// Batch Scheduler
// =============================================================================

/// Batches run total.
pub static BATCHES_RUN: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_batches_total", "Total batches run"),
        &["result"], // "ok", "aborted"
    )
    .unwrap()
});

// =============================================================================
// Migration
// =============================================================================

/// Migration runs by final state.
pub static MIGRATION_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_migration_runs_total", "Migration runs by final state"),
        &["state"], // "completed", "stopped"
    )
    .unwrap()
});

/// Whether a migration is currently running.
pub static MIGRATION_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelforge_migration_running",
        "Whether a migration run is in progress (1 = running)",
    )
    .unwrap()
});

/// Items left in the current migration run.
pub static MIGRATION_REMAINING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelforge_migration_remaining_items",
        "Eligible items not yet processed in the current run",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ITEMS_PROCESSED.clone()),
        Box::new(ITEM_DURATION.clone()),
        Box::new(WORKER_TIMEOUTS.clone()),
        Box::new(WORKER_FAILURES.clone()),
        Box::new(RETRY_ATTEMPTS.clone()),
        Box::new(BATCHES_RUN.clone()),
        Box::new(MIGRATION_RUNS.clone()),
        Box::new(MIGRATION_RUNNING.clone()),
        Box::new(MIGRATION_REMAINING.clone()),
    ]
}
