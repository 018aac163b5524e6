//! Media item types and the processing status lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing status of a media item.
///
/// Lifecycle: `Pending -> Processing -> {Completed, Failed}`, with
/// `Failed -> Processing` for retries. `Completed -> Completed` is allowed so
/// artifacts can be regenerated in place without leaving the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// Stable lowercase name, used in the database and over the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    /// Parse a status from its stable name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProcessingStatus::Pending),
            "processing" => Some(ProcessingStatus::Processing),
            "completed" => Some(ProcessingStatus::Completed),
            "failed" => Some(ProcessingStatus::Failed),
            _ => None,
        }
    }

    /// Whether the item may be handed to the worker from this status.
    pub fn can_start_processing(&self) -> bool {
        matches!(self, ProcessingStatus::Pending | ProcessingStatus::Failed)
    }

    /// Whether a transition from `self` to `next` respects the lifecycle.
    pub fn can_transition_to(&self, next: ProcessingStatus) -> bool {
        use ProcessingStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Failed, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Completed, Completed)
        )
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browsing artifacts derived from the source video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedArtifacts {
    /// Static thumbnail image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Animated preview clip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    /// Format the artifacts were generated in (e.g. "webp", "gif").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl DerivedArtifacts {
    /// Whether these artifacts satisfy a request for the given format and kinds.
    pub fn satisfies(&self, target_format: &str, needs_static: bool, needs_animated: bool) -> bool {
        let format_ok = self
            .format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case(target_format));
        let static_ok = !needs_static || self.thumbnail_url.is_some();
        let animated_ok = !needs_animated || self.preview_url.is_some();
        format_ok && static_ok && animated_ok
    }
}

/// An uploaded source video and its processing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Unique identifier (UUID).
    pub id: String,
    /// Where the worker fetches the source video from.
    pub source_url: String,
    /// Optional human readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Artifacts produced so far.
    pub artifacts: DerivedArtifacts,
    /// Current processing status.
    pub status: ProcessingStatus,
    /// Cause of the last failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Number of manual retries performed.
    pub retry_count: u32,
    /// When the item was registered.
    pub created_at: DateTime<Utc>,
    /// When the item was last modified.
    pub updated_at: DateTime<Utc>,
}

/// Request to register a new media item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMediaRequest {
    pub source_url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// A status write against the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    /// Status to persist.
    pub status: ProcessingStatus,
    /// Replacement artifacts. `None` keeps the stored ones.
    pub artifacts: Option<DerivedArtifacts>,
    /// New `last_error` value. `None` clears it.
    pub last_error: Option<String>,
    /// Increment `retry_count` as part of this write.
    pub count_retry: bool,
}

impl StatusUpdate {
    /// Mark the item as handed to the worker.
    pub fn processing() -> Self {
        Self {
            status: ProcessingStatus::Processing,
            artifacts: None,
            last_error: None,
            count_retry: false,
        }
    }

    /// Mark the item as handed to the worker as part of a retry.
    pub fn retrying() -> Self {
        Self {
            count_retry: true,
            ..Self::processing()
        }
    }

    /// Persist successful output.
    pub fn completed(artifacts: DerivedArtifacts) -> Self {
        Self {
            status: ProcessingStatus::Completed,
            artifacts: Some(artifacts),
            last_error: None,
            count_retry: false,
        }
    }

    /// Persist a failure.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ProcessingStatus::Failed,
            artifacts: None,
            last_error: Some(error.into()),
            count_retry: false,
        }
    }

    /// Record a failed in-place refresh; the item keeps its artifacts.
    pub fn refresh_failed(error: impl Into<String>) -> Self {
        Self {
            status: ProcessingStatus::Completed,
            artifacts: None,
            last_error: Some(error.into()),
            count_retry: false,
        }
    }
}
