//! Types for catalog migrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media::{MediaItem, ProcessingStatus, StoreError};
use crate::worker::TranscodeOptions;

use super::config::MigrationConfig;

/// Lifecycle state of the migration controller.
///
/// `Idle` is initial; `Completed` and `Stopped` are re-enterable via a new start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    #[default]
    Idle,
    Running,
    Completed,
    Stopped,
}

impl MigrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationState::Idle => "idle",
            MigrationState::Running => "running",
            MigrationState::Completed => "completed",
            MigrationState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for starting a migration. Unset fields fall back to config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOptions {
    #[serde(default)]
    pub target_format: Option<String>,
    #[serde(default)]
    pub generate_static: Option<bool>,
    #[serde(default)]
    pub generate_animated: Option<bool>,
}

impl MigrationOptions {
    pub fn with_target_format(mut self, format: impl Into<String>) -> Self {
        self.target_format = Some(format.into());
        self
    }

    /// Worker options for this run.
    pub fn resolve(&self, config: &MigrationConfig) -> TranscodeOptions {
        TranscodeOptions {
            generate_static: self.generate_static.unwrap_or(true),
            generate_animated: self.generate_animated.unwrap_or(true),
            target_format: self
                .target_format
                .clone()
                .unwrap_or_else(|| config.default_target_format.clone()),
        }
    }
}

/// Whether a migration with `options` should touch this item.
///
/// Items already in `Processing` belong to someone else and are skipped.
pub fn is_eligible(item: &MediaItem, options: &TranscodeOptions) -> bool {
    item.status != ProcessingStatus::Processing
        && !item.artifacts.satisfies(
            &options.target_format,
            options.generate_static,
            options.generate_animated,
        )
}

/// Read-only snapshot of the current (or last) migration run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationRun {
    pub state: MigrationState,
    pub is_running: bool,
    pub total_eligible: usize,
    pub processed_count: usize,
    pub completed_count: usize,
    pub error_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_seconds_remaining: Option<u64>,
    pub percent_complete: f64,
    /// Item currently with the worker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_format: Option<String>,
    /// Why the run was aborted, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl MigrationRun {
    /// Items not yet processed.
    pub fn remaining(&self) -> usize {
        self.total_eligible.saturating_sub(self.processed_count)
    }
}

/// Errors returned by [`super::MigrationController::start`].
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A run is already in progress.
    #[error("a migration is already running")]
    AlreadyRunning,

    /// The eligible set could not be computed.
    #[error("could not scan catalog: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::DerivedArtifacts;

    fn item(status: ProcessingStatus, format: Option<&str>) -> MediaItem {
        let now = Utc::now();
        MediaItem {
            id: "m".to_string(),
            source_url: "https://uploads/m.mp4".to_string(),
            title: None,
            artifacts: DerivedArtifacts {
                thumbnail_url: format.map(|f| format!("https://cdn/t.{}", f)),
                preview_url: format.map(|f| format!("https://cdn/p.{}", f)),
                format: format.map(str::to_string),
            },
            status,
            last_error: None,
            retry_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_eligibility() {
        let webp = TranscodeOptions::default();

        assert!(is_eligible(&item(ProcessingStatus::Pending, None), &webp));
        assert!(is_eligible(&item(ProcessingStatus::Failed, None), &webp));
        assert!(is_eligible(&item(ProcessingStatus::Completed, Some("gif")), &webp));
        assert!(!is_eligible(&item(ProcessingStatus::Completed, Some("webp")), &webp));
        assert!(!is_eligible(&item(ProcessingStatus::Processing, None), &webp));
    }

    #[test]
    fn test_missing_kind_is_eligible() {
        let mut partial = item(ProcessingStatus::Completed, Some("webp"));
        partial.artifacts.preview_url = None;

        assert!(is_eligible(&partial, &TranscodeOptions::default()));

        let static_only = TranscodeOptions {
            generate_animated: false,
            ..Default::default()
        };
        assert!(!is_eligible(&partial, &static_only));
    }

    #[test]
    fn test_options_resolve_defaults() {
        let config = MigrationConfig {
            default_target_format: "avif".to_string(),
            ..Default::default()
        };
        let resolved = MigrationOptions::default().resolve(&config);
        assert_eq!(resolved.target_format, "avif");
        assert!(resolved.generate_static);
        assert!(resolved.generate_animated);

        let resolved = MigrationOptions::default()
            .with_target_format("gif")
            .resolve(&config);
        assert_eq!(resolved.target_format, "gif");
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&MigrationState::Stopped).unwrap();
        assert_eq!(json, "\"stopped\"");
    }
}
