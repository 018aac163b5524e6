//! Status store trait and query types.

use std::fmt;

use super::{CreateMediaRequest, MediaItem, ProcessingStatus, StatusUpdate};

/// Error type for status store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Media item not found.
    NotFound(String),
    /// Store cannot be reached or failed to execute the operation.
    Unavailable(String),
    /// The write would break the status lifecycle.
    InvalidTransition {
        media_id: String,
        from: ProcessingStatus,
        to: ProcessingStatus,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Media item not found: {}", id),
            StoreError::Unavailable(msg) => write!(f, "Status store unavailable: {}", msg),
            StoreError::InvalidTransition { media_id, from, to } => write!(
                f,
                "Invalid status transition for {}: {} -> {}",
                media_id, from, to
            ),
        }
    }
}

impl std::error::Error for StoreError {}

/// Filter for querying media items.
#[derive(Debug, Clone, Default)]
pub struct MediaFilter {
    /// Filter by processing status.
    pub status: Option<ProcessingStatus>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl MediaFilter {
    pub fn new() -> Self {
        Self {
            status: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: ProcessingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Durable record of each media item's processing state.
///
/// Results are always ordered by creation time, oldest first.
pub trait MediaStore: Send + Sync {
    /// Register a new item in `Pending`.
    fn create(&self, request: CreateMediaRequest) -> Result<MediaItem, StoreError>;

    /// Get an item by ID.
    fn get(&self, id: &str) -> Result<Option<MediaItem>, StoreError>;

    /// Up to `limit` pending items, oldest first.
    fn get_pending(&self, limit: usize) -> Result<Vec<MediaItem>, StoreError>;

    /// Every item in the catalog, oldest first.
    fn list_all(&self) -> Result<Vec<MediaItem>, StoreError>;

    /// Items matching the filter.
    fn list(&self, filter: &MediaFilter) -> Result<Vec<MediaItem>, StoreError>;

    /// Count items matching the filter.
    fn count(&self, filter: &MediaFilter) -> Result<i64, StoreError>;

    /// Persist a status change. Rejects writes that break the lifecycle.
    fn update_status(&self, id: &str, update: StatusUpdate) -> Result<MediaItem, StoreError>;
}
