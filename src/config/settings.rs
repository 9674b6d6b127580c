//! Configuration settings for Cadence.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub recurrence: RecurrenceConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("cadence.toml"),
            dirs::config_dir()
                .map(|p| p.join("cadence/config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".cadence/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn validate(&self) -> Result<()> {
        if self.recurrence.horizon_months == 0 {
            return Err(
                ConfigError::Invalid("recurrence.horizon_months must be > 0".to_string()).into(),
            );
        }
        if self.recurrence.monthly_iteration_limit == 0 {
            return Err(ConfigError::Invalid(
                "recurrence.monthly_iteration_limit must be > 0".to_string(),
            )
            .into());
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(
                ConfigError::Invalid("storage.data_dir must not be empty".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Expand the data directory path.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let expanded = shellexpand::tilde(&self.storage.data_dir);
        Ok(PathBuf::from(expanded.as_ref()))
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `occurrences.json`
    pub data_dir: String,
    /// Write the store to disk after each change
    pub persist: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.cadence".to_string(),
            persist: true,
        }
    }
}

/// Recurrence evaluation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceConfig {
    /// Months after the anchor that bound a rule with no until-date
    pub horizon_months: u32,
    /// Maximum monthly steps examined per materialization
    pub monthly_iteration_limit: usize,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            horizon_months: 12,
            monthly_iteration_limit: crate::recurrence::DEFAULT_MONTHLY_ITERATION_LIMIT,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON log lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
