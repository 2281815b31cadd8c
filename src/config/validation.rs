//! Configuration validation.
//!
//! Returns all validation errors, not just the first. Serde handles syntax;
//! this pass checks value ranges and cross-field requirements.

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("pool.count must be at least 1")]
    EmptyPool,
    #[error("listener.port must not be 0")]
    InvalidPort,
    #[error("rate_limit.requests_per_second must be a positive number, got {0}")]
    InvalidRate(f64),
    #[error("rate_limit.burst_size must be at least 1")]
    ZeroBurst,
    #[error("upstream.{0} must not be empty")]
    EmptyHost(&'static str),
    #[error("upstream.stats_path_marker must not be empty")]
    EmptyPathMarker,
    #[error("upstream.scheme must be \"http\" or \"https\", got {0:?}")]
    UnsupportedScheme(String),
    #[error("observability.log_format must be \"pretty\" or \"json\", got {0:?}")]
    UnknownLogFormat(String),
    #[error("security.enforce_api_key requires security.api_key")]
    MissingApiKey,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.pool.count == 0 {
        errors.push(ValidationError::EmptyPool);
    }
    if config.listener.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }

    let rps = config.rate_limit.requests_per_second;
    if !(rps.is_finite() && rps > 0.0) {
        errors.push(ValidationError::InvalidRate(rps));
    }
    if config.rate_limit.burst_size == 0 {
        errors.push(ValidationError::ZeroBurst);
    }

    if config.upstream.stats_host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost("stats_host"));
    }
    if config.upstream.www_host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost("www_host"));
    }
    if config.upstream.stats_path_marker.is_empty() {
        errors.push(ValidationError::EmptyPathMarker);
    }
    if !matches!(config.upstream.scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::UnsupportedScheme(config.upstream.scheme.clone()));
    }

    if config.observability.format().is_none() {
        errors.push(ValidationError::UnknownLogFormat(
            config.observability.log_format.clone(),
        ));
    }

    if config.security.enforce_api_key && config.security.api_key.is_none() {
        errors.push(ValidationError::MissingApiKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
