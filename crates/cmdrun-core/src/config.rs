//! Configuration loaded from a TOML file
//!
//! ```toml
//! [lifecycle]
//! timeout_secs = 86400
//!
//! [storage]
//! database = ".cmdrun/cmdrun.db"
//!
//! [logging]
//! profile = "development"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{CmdRunError, Result};
use crate::logging_facility::Profile;

/// Default age after which an unfinished run is reported as timed out (one day)
pub const DEFAULT_TIMEOUT_SECS: u64 = 86_400;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lifecycle: LifecycleConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Seconds after `start_date` at which an open run becomes "Timeout"
    pub timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LifecycleConfig {
    pub fn timeout(&self) -> chrono::Duration {
        i64::try_from(self.timeout_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(".cmdrun").join("cmdrun.db"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub profile: Profile,
}

impl Config {
    /// Load configuration from `path`; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the file cannot be read or parsed, or holds
    /// out-of-range values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| CmdRunError::InvalidConfig {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml(&content)
    }

    /// # Errors
    ///
    /// `InvalidConfig` on malformed TOML or out-of-range values.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| CmdRunError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.lifecycle.timeout_secs == 0 {
            return Err(CmdRunError::InvalidConfig {
                reason: "lifecycle.timeout_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
