//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, backoff ordered)
//! - Check that the admin URL is a usable HTTP base URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SyncConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the engine

use url::Url;

use crate::config::schema::SyncConfig;

/// A single configuration validation failure.
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    InvalidAdminUrl(String),
    UnsupportedScheme(String),
    ZeroTimeout(&'static str),
    BackoffBaseAboveCeiling { base_ms: u64, max_ms: u64 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidAdminUrl(url) => {
                write!(f, "admin.url is not a valid URL: {}", url)
            }
            ValidationError::UnsupportedScheme(scheme) => {
                write!(f, "admin.url scheme must be http or https, got {}", scheme)
            }
            ValidationError::ZeroTimeout(field) => {
                write!(f, "{} must be greater than zero", field)
            }
            ValidationError::BackoffBaseAboveCeiling { base_ms, max_ms } => {
                write!(
                    f,
                    "backoff.base_ms ({}) exceeds backoff.max_ms ({})",
                    base_ms, max_ms
                )
            }
        }
    }
}

/// Validate a sync configuration, collecting every error.
pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.admin.url) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
            }
        }
        Err(_) => errors.push(ValidationError::InvalidAdminUrl(config.admin.url.clone())),
    }

    if config.admin.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("admin.connect_timeout_ms"));
    }
    if config.admin.request_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("admin.request_timeout_ms"));
    }
    if config.poll.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("poll.timeout_secs"));
    }
    if config.backoff.base_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("backoff.base_ms"));
    }
    if config.backoff.base_ms > config.backoff.max_ms {
        errors.push(ValidationError::BackoffBaseAboveCeiling {
            base_ms: config.backoff.base_ms,
            max_ms: config.backoff.max_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
