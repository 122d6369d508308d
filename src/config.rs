// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::codec::MAX_FIELD_VALUE;
use crate::reader::ReadMode;

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown log format: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Strict (default) or lenient handling of truncated containers
    pub read_mode: ReadMode,
    /// Default tracing filter when `RUST_LOG` is not set
    pub log_level: String,
    pub log_format: LogFormat,
    /// Largest single payload accepted on decode and append
    pub max_payload_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_mode: ReadMode::Strict,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            max_payload_size: MAX_FIELD_VALUE,
        }
    }
}

impl Config {
    pub const ENV_READ_MODE: &'static str = "SHADER_CONTAINER_READ_MODE";
    pub const ENV_LOG_LEVEL: &'static str = "SHADER_CONTAINER_LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &'static str = "SHADER_CONTAINER_LOG_FORMAT";
    pub const ENV_MAX_PAYLOAD_SIZE: &'static str = "SHADER_CONTAINER_MAX_PAYLOAD_SIZE";

    /// Load from an optional TOML file, apply environment overrides, validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply overrides looked up by environment variable name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(Self::ENV_READ_MODE) {
            self.read_mode = value.parse().map_err(ConfigError::Invalid)?;
        }
        if let Some(value) = lookup(Self::ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = lookup(Self::ENV_LOG_FORMAT) {
            self.log_format = value.parse().map_err(ConfigError::Invalid)?;
        }
        if let Some(value) = lookup(Self::ENV_MAX_PAYLOAD_SIZE) {
            self.max_payload_size = value.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{} must be an unsigned integer, got {value:?}",
                    Self::ENV_MAX_PAYLOAD_SIZE
                ))
            })?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level cannot be empty".to_string()));
        }

        if self.max_payload_size == 0 || self.max_payload_size > MAX_FIELD_VALUE {
            return Err(ConfigError::Invalid(format!(
                "max_payload_size must be between 1 and {MAX_FIELD_VALUE}"
            )));
        }

        Ok(())
    }
}
