//! Configuration loading from disk and the process environment.

use std::fs;
use std::net::{AddrParseError, IpAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming a file that holds the base address.
pub const BASE_ADDRESS_FILE_ENV: &str = "IPV6_FILE";
/// Environment variable holding the base address literally.
pub const BASE_ADDRESS_ENV: &str = "IPV6";
/// Environment variable holding the upstream API key.
pub const API_KEY_ENV: &str = "BUNGIE_API_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no base address configured (set {BASE_ADDRESS_FILE_ENV} or {BASE_ADDRESS_ENV})")]
    MissingBaseAddress,
    #[error("invalid base address {value:?}: {source}")]
    InvalidBaseAddress {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a configuration from a TOML file. Not validated yet: the
/// environment and CLI still get to fill in and override values.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment values onto `config`.
///
/// `lookup` is usually `|key| std::env::var(key).ok()`.
pub fn apply_environment<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(BASE_ADDRESS_FILE_ENV) {
        config.pool.base_address = Some(read_base_address(Path::new(&path))?);
    } else if let Some(value) = lookup(BASE_ADDRESS_ENV) {
        config.pool.base_address = Some(parse_base_address(&value)?);
    }

    if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.is_empty()) {
        config.security.api_key = Some(key);
    }

    Ok(())
}

/// Read the base address from a file, ignoring surrounding whitespace.
pub fn read_base_address(path: &Path) -> Result<IpAddr, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_base_address(&content)
}

fn parse_base_address(value: &str) -> Result<IpAddr, ConfigError> {
    let trimmed = value.trim();
    trimmed
        .parse()
        .map_err(|source| ConfigError::InvalidBaseAddress {
            value: trimmed.to_string(),
            source,
        })
}

/// Final gate before startup: the pool needs a base address and the
/// config must pass semantic validation.
pub fn finalize(config: ProxyConfig) -> Result<ProxyConfig, ConfigError> {
    if config.pool.base_address.is_none() {
        return Err(ConfigError::MissingBaseAddress);
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
