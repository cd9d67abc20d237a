//! Session configuration parsing and validation.
//!
//! Every key is optional; an absent `--config` flag yields
//! [`SessionConfig::default`].

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

fn default_backlog() -> u32 {
    5
}

fn default_max_line_bytes() -> usize {
    1_048_576
}

fn default_connect_attempts() -> u32 {
    1
}

fn default_connect_backoff_ms() -> u64 {
    100
}

/// Tunables shared by the listener and connector endpoints.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct SessionConfig {
    /// Pending-connection queue depth passed to `listen(2)`.
    #[serde(default = "default_backlog")]
    pub backlog: u32,
    /// Longest line the connector will buffer before failing.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
    /// Connect attempts made by a standalone connector.
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    /// Delay before the second attempt; doubled after each failure.
    #[serde(default = "default_connect_backoff_ms")]
    pub connect_backoff_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backlog: default_backlog(),
            max_line_bytes: default_max_line_bytes(),
            connect_attempts: default_connect_attempts(),
            connect_backoff_ms: default_connect_backoff_ms(),
        }
    }
}

impl SessionConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Initial delay between connect attempts.
    #[must_use]
    pub fn connect_backoff(&self) -> Duration {
        Duration::from_millis(self.connect_backoff_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.backlog == 0 {
            return Err(AppError::Config("backlog must be greater than zero".into()));
        }

        if self.max_line_bytes == 0 {
            return Err(AppError::Config(
                "max_line_bytes must be greater than zero".into(),
            ));
        }

        if self.connect_attempts == 0 {
            return Err(AppError::Config(
                "connect_attempts must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
