//! Migration configuration.

use serde::{Deserialize, Serialize};

/// Configuration for catalog migrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Minimum delay between two items (milliseconds).
    #[serde(default = "default_pacing")]
    pub pacing_ms: u64,

    /// Per-item estimate used for the ETA before any item has finished.
    #[serde(default = "default_per_item_estimate")]
    pub per_item_estimate_secs: u64,

    /// Target format when a start request does not name one.
    #[serde(default = "default_target_format")]
    pub default_target_format: String,
}

fn default_pacing() -> u64 {
    2000 // 2 seconds
}

fn default_per_item_estimate() -> u64 {
    30
}

fn default_target_format() -> String {
    "webp".to_string()
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing(),
            per_item_estimate_secs: default_per_item_estimate(),
            default_target_format: default_target_format(),
        }
    }
}
