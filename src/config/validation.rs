use crate::config::types::{Config, CrawlerConfig, LoggingConfig, RetryConfig};
use crate::ConfigError;
use tracing_subscriber::EnvFilter;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_workers < 1 || config.max_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and 100, got {}",
            config.max_workers
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.robots_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "robots_agent cannot be empty".to_string(),
        ));
    }

    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry and session configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.total > 20 {
        return Err(ConfigError::Validation(format!(
            "retry total must be <= 20, got {}",
            config.total
        )));
    }

    if !config.backoff_factor.is_finite() || config.backoff_factor < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_factor must be a non-negative number, got {}",
            config.backoff_factor
        )));
    }

    if let Some(code) = config
        .status_forcelist
        .iter()
        .find(|code| !(100..=599).contains(*code))
    {
        return Err(ConfigError::Validation(format!(
            "status_forcelist contains invalid HTTP status {}",
            code
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.pool_size < 1 {
        return Err(ConfigError::Validation(
            "pool_size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates logging configuration
fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    EnvFilter::try_new(&config.level).map_err(|e| {
        ConfigError::Validation(format!("Invalid log level '{}': {}", config.level, e))
    })?;
    Ok(())
}
