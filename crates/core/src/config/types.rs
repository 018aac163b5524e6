use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::migration::MigrationConfig;
use crate::processor::{ProcessorConfig, SchedulerConfig};
use crate::worker::WorkerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reelforge.db")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub worker: SanitizedWorkerConfig,
    pub processor: ProcessorConfig,
    pub scheduler: SchedulerConfig,
    pub migration: MigrationConfig,
}

/// Sanitized worker config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedWorkerConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            worker: SanitizedWorkerConfig {
                url: config.worker.url.clone(),
                api_key_configured: config
                    .worker
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                timeout_secs: config.worker.timeout_secs,
            },
            processor: config.processor.clone(),
            scheduler: config.scheduler.clone(),
            migration: config.migration.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "reelforge.db");
        assert_eq!(config.scheduler.batch_size, 5);
        assert!(!config.scheduler.enabled);
        assert_eq!(config.processor.max_retries, 3);
        assert_eq!(config.migration.default_target_format, "webp");
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
path = "/data/media.sqlite"

[worker]
url = "http://transcoder:9400"
api_key = "secret"
timeout_secs = 120

[processor]
item_timeout_ms = 60000
max_retries = 0
target_format = "avif"

[scheduler]
enabled = true
poll_interval_ms = 10000
batch_size = 20
pacing_ms = 500

[migration]
pacing_ms = 1000
per_item_estimate_secs = 45
default_target_format = "avif"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path.to_str().unwrap(), "/data/media.sqlite");
        assert_eq!(config.worker.url, "http://transcoder:9400");
        assert_eq!(config.worker.timeout_secs, 120);
        assert_eq!(config.processor.item_timeout_ms, 60_000);
        assert_eq!(config.processor.max_retries, 0);
        assert_eq!(config.processor.target_format, "avif");
        assert!(config.processor.generate_animated);
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.batch_size, 20);
        assert_eq!(config.migration.per_item_estimate_secs, 45);
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let mut config = Config::default();
        config.worker.api_key = Some("super-secret".to_string());

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.worker.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
    }

    #[test]
    fn test_sanitized_config_without_api_key() {
        let sanitized = SanitizedConfig::from(&Config::default());
        assert!(!sanitized.worker.api_key_configured);
        assert_eq!(sanitized.server.port, 8080);
        assert_eq!(sanitized.database.path.to_str().unwrap(), "reelforge.db");
    }
}
