//! Configuration management and validation.
//!
//! Provides configuration structures for the database connection, the
//! lock-contention retry policy, schema model overrides and the parse queue
//! worker. Configuration is layered: defaults, an optional TOML file, the
//! environment, then CLI overrides.

use crate::constants::{
    self, APP_DIR_NAME, DB_PATH_ENV, DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DB_FILE,
    DEFAULT_RECENT_MESSAGE_LIMIT, DEFAULT_TEMP_PREFIX,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub retry: RetryConfig,
    pub schema: SchemaConfig,
    pub queue: QueueConfig,
}

/// SQLite location and lock wait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path
    pub path: PathBuf,

    /// Bounded wait for lock acquisition before SQLite reports busy
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Retry policy applied to every storage write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first
    pub max_attempts: u32,

    /// Sleep before the first retry; doubles each time
    pub initial_backoff_ms: u64,

    /// Cap for a single sleep
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: constants::retry::MAX_ATTEMPTS,
            initial_backoff_ms: constants::retry::INITIAL_BACKOFF_MS,
            max_backoff_ms: constants::retry::MAX_BACKOFF_MS,
        }
    }
}

/// Optional replacements for the embedded schema documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub model_path: Option<PathBuf>,
    pub region_codes_path: Option<PathBuf>,
}

/// Parse queue worker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Number of item messages kept in a drain report
    pub recent_message_limit: usize,

    /// Prefix for the scoped extraction directory
    pub temp_prefix: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            recent_message_limit: DEFAULT_RECENT_MESSAGE_LIMIT,
            temp_prefix: DEFAULT_TEMP_PREFIX.to_string(),
        }
    }
}

/// `<data dir>/tm-results/meets.db`, or `./meets.db` when no data dir exists
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(DEFAULT_DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

impl Config {
    /// Default location of the configuration file
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join("config.toml"))
            .ok_or_else(|| Error::configuration("Could not determine user config directory"))
    }

    /// Read a TOML configuration file; missing sections take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load with layered configuration (defaults -> file -> environment)
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(db_path) = std::env::var(DB_PATH_ENV) {
            if !db_path.trim().is_empty() {
                debug!("Database path overridden by {}: {}", DB_PATH_ENV, db_path);
                config.database.path = PathBuf::from(db_path);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database.path = path.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(Error::configuration("Database path must not be empty"));
        }
        if self.database.busy_timeout_ms == 0 {
            return Err(Error::configuration(
                "database.busy_timeout_ms must be greater than zero",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::configuration(
                "retry.max_attempts must be at least 1",
            ));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(Error::configuration(format!(
                "retry.initial_backoff_ms ({}) exceeds retry.max_backoff_ms ({})",
                self.retry.initial_backoff_ms, self.retry.max_backoff_ms
            )));
        }
        if self.queue.temp_prefix.contains(['/', '\\']) {
            return Err(Error::configuration(
                "queue.temp_prefix must not contain path separators",
            ));
        }
        Ok(())
    }
}
