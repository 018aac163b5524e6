//! Configuration for the transcode worker client.

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP transcode worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Base URL of the worker service (e.g. "http://localhost:9400").
    #[serde(default = "default_url")]
    pub url: String,

    /// Bearer token sent with each request.
    #[serde(default)]
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://127.0.0.1:9400".to_string()
}

fn default_timeout() -> u64 {
    300
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_key: None,
            timeout_secs: default_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkerConfig::default();
        assert_eq!(config.url, "http://127.0.0.1:9400");
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: WorkerConfig = toml::from_str(
            r#"
            url = "http://worker:8000"
            api_key = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.url, "http://worker:8000");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 300);
    }
}
