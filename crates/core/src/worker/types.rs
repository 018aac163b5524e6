//! Request and response types for the transcode worker.

use serde::{Deserialize, Serialize};

use crate::media::DerivedArtifacts;

/// Which artifacts to generate and in what format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeOptions {
    /// Generate a static thumbnail.
    pub generate_static: bool,
    /// Generate an animated preview.
    pub generate_animated: bool,
    /// Output format for the artifacts (e.g. "webp").
    pub target_format: String,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            generate_static: true,
            generate_animated: true,
            target_format: "webp".to_string(),
        }
    }
}

impl TranscodeOptions {
    pub fn with_target_format(mut self, target_format: impl Into<String>) -> Self {
        self.target_format = target_format.into();
        self
    }
}

/// A single invocation of the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeRequest {
    pub media_id: String,
    pub source_url: String,
    #[serde(flatten)]
    pub options: TranscodeOptions,
}

/// What the worker produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeOutput {
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl TranscodeOutput {
    /// Convert into stored artifacts tagged with the format they were made in.
    pub fn into_artifacts(self, format: &str) -> DerivedArtifacts {
        DerivedArtifacts {
            thumbnail_url: self.thumbnail_url,
            preview_url: self.preview_url,
            format: Some(format.to_string()),
        }
    }
}
