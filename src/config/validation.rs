use crate::config::types::{Config, HarvestConfig, OutputConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_harvest_config(&config.harvest)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the remote endpoint settings
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    validate_path("listing-path", &config.listing_path)?;
    validate_path("detail-path", &config.detail_path)?;
    validate_path("custom-card-path", &config.custom_card_path)?;

    if config.listing_filter.starts_with('?') {
        return Err(ConfigError::Validation(
            "listing-filter must not include the leading '?'".to_string(),
        ));
    }

    Ok(())
}

/// Validates worker pool and request settings
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if let Some(workers) = config.workers {
        if !(1..=256).contains(&workers) {
            return Err(ConfigError::Validation(format!(
                "workers must be between 1 and 256, got {}",
                workers
            )));
        }
    }

    if config.queue_capacity == Some(0) {
        return Err(ConfigError::Validation(
            "queue-capacity must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_path.is_empty() {
        return Err(ConfigError::Validation(
            "results-path cannot be empty".to_string(),
        ));
    }

    if let Some(pending) = config.snapshot_path() {
        if pending == config.results_path {
            return Err(ConfigError::Validation(
                "pending-path must differ from results-path".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates a site path: non-empty, rooted, no query or fragment
fn validate_path(key: &str, path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{} must start with '/', got '{}'",
            key, path
        )));
    }

    if path.contains('?') || path.contains('#') {
        return Err(ConfigError::Validation(format!(
            "{} cannot contain a query or fragment, got '{}'",
            key, path
        )));
    }

    Ok(())
}
