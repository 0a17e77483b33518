use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - cycle.concurrent_count is at least 1
/// - Configured source/sink/notifier URLs are not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.cycle.concurrent_count == 0 {
        return Err(ConfigError::ValidationError(
            "cycle.concurrent_count must be at least 1".to_string(),
        ));
    }

    if let Some(ref source) = config.source {
        if source.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "source.url cannot be empty".to_string(),
            ));
        }
    }

    if let Some(ref sink) = config.sink {
        if sink.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "sink.url cannot be empty".to_string(),
            ));
        }
        if sink.accept_statuses.is_empty() {
            return Err(ConfigError::ValidationError(
                "sink.accept_statuses cannot be empty".to_string(),
            ));
        }
    }

    if let Some(ref url) = config.notifier.webhook_url {
        if url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "notifier.webhook_url cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
