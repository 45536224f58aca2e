//! Configuration loading from disk.
//!
//! The admin address may be injected through the environment (container
//! deployments rarely bake it into the file); everything else comes from
//! the TOML file, with validation running on the merged result.

use std::env;
use std::fs;
use std::path::Path;

use crate::config::schema::SyncConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `admin.url` from the config file.
pub const ADMIN_URL_ENV: &str = "GATEWAY_SYNC_ADMIN_URL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed ({} error(s)): ", errors.len())?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from a TOML file, apply environment overrides, and
/// validate the result.
pub fn load_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: SyncConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    if let Ok(url) = env::var(ADMIN_URL_ENV) {
        if !url.is_empty() {
            tracing::info!(url = %url, "admin URL overridden from {}", ADMIN_URL_ENV);
            config.admin.url = url;
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
