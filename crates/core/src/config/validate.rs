use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Worker URL is set
/// - Item timeout and batch size are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.worker.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "worker.url cannot be empty".to_string(),
        ));
    }

    if config.processor.item_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "processor.item_timeout_ms cannot be 0".to_string(),
        ));
    }

    if config.scheduler.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.batch_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}
