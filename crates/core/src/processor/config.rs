//! Processor and scheduler configuration.

use serde::{Deserialize, Serialize};

use crate::worker::TranscodeOptions;

/// Configuration for the item processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Bounded wait for a single worker call (milliseconds).
    /// A call that does not resolve in time marks the item Failed.
    #[serde(default = "default_item_timeout")]
    pub item_timeout_ms: u64,

    /// Maximum manual retries per item (0 = unlimited).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Generate a static thumbnail by default.
    #[serde(default = "default_true")]
    pub generate_static: bool,

    /// Generate an animated preview by default.
    #[serde(default = "default_true")]
    pub generate_animated: bool,

    /// Default artifact format.
    #[serde(default = "default_target_format")]
    pub target_format: String,
}

fn default_item_timeout() -> u64 {
    300_000 // 5 minutes
}

fn default_max_retries() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_target_format() -> String {
    "webp".to_string()
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            item_timeout_ms: default_item_timeout(),
            max_retries: default_max_retries(),
            generate_static: true,
            generate_animated: true,
            target_format: default_target_format(),
        }
    }
}

impl ProcessorConfig {
    /// Worker options used outside of migrations.
    pub fn default_options(&self) -> TranscodeOptions {
        TranscodeOptions {
            generate_static: self.generate_static,
            generate_animated: self.generate_animated,
            target_format: self.target_format.clone(),
        }
    }
}

/// Configuration for the batch scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Run batches automatically in the background.
    #[serde(default)]
    pub enabled: bool,

    /// How often the background loop runs a batch (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Maximum items per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Minimum delay between two items (milliseconds).
    #[serde(default = "default_pacing")]
    pub pacing_ms: u64,
}

fn default_poll_interval() -> u64 {
    30_000 // 30 seconds
}

fn default_batch_size() -> usize {
    5
}

fn default_pacing() -> u64 {
    2000 // 2 seconds
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_ms: default_poll_interval(),
            batch_size: default_batch_size(),
            pacing_ms: default_pacing(),
        }
    }
}
