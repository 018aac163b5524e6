//! Types for the processor module.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media::{DerivedArtifacts, ProcessingStatus, StoreError};

/// Errors that abort a processing request.
///
/// Worker failures are not errors here: they are recorded on the item and
/// reported through [`ProcessOutcome`].
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Media item not found.
    #[error("media item not found: {0}")]
    NotFound(String),

    /// The item is not in a status this operation accepts.
    #[error("invalid status for {media_id}: expected {expected}, got {actual}")]
    InvalidState {
        media_id: String,
        expected: String,
        actual: ProcessingStatus,
    },

    /// The item has used up its retries.
    #[error("retry limit reached for {media_id}: {retry_count} of {max_retries}")]
    RetryLimitExceeded {
        media_id: String,
        retry_count: u32,
        max_retries: u32,
    },

    /// Another request is already processing this item.
    #[error("media item already being processed: {0}")]
    InFlight(String),

    /// Status store failure.
    #[error("status store error: {0}")]
    Store(#[from] StoreError),
}

impl ProcessorError {
    /// Whether this error means the store itself is unusable.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, ProcessorError::Store(StoreError::Unavailable(_)))
    }
}

/// Result of driving one item through the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    /// Media item ID.
    pub media_id: String,
    /// Whether the worker produced artifacts.
    pub success: bool,
    /// Artifacts persisted on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<DerivedArtifacts>,
    /// Failure cause recorded on the item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Worker call duration in milliseconds.
    pub duration_ms: u64,
}

/// Aggregate result of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn record(&mut self, success: bool) {
        self.processed += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}
