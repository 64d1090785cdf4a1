//! Driver configuration, loadable from a TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::driver::DrainConfig;

/// Error type for configuration loading.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML content.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for a wallet driver session.
///
/// The timeouts feed the output drainer; slow test environments can raise
/// the quiescence window at the cost of per-command latency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Path to the wallet binary, if not supplied by the test framework.
    pub wallet_binary: Option<PathBuf>,
    /// Network selector passed as the first wallet argument.
    pub network: String,
    /// Bounded wait for the first chunk of a response, in milliseconds.
    pub read_timeout_ms: u64,
    /// Quiescence window that ends a response, in milliseconds.
    pub quiescence_window_ms: u64,
    /// Read buffer size per attempt, in bytes.
    pub chunk_size: usize,
    /// Directory for the stderr and transcript capture files.
    /// Defaults to the system temp directory when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            wallet_binary: None,
            network: default_network(),
            read_timeout_ms: default_read_timeout_ms(),
            quiescence_window_ms: default_quiescence_window_ms(),
            chunk_size: default_chunk_size(),
            log_dir: None,
        }
    }
}

fn default_network() -> String {
    "regtest".to_string()
}

fn default_read_timeout_ms() -> u64 {
    30_000
}

fn default_quiescence_window_ms() -> u64 {
    100
}

fn default_chunk_size() -> usize {
    1 << 20
}

impl DriverConfig {
    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Build the drain configuration from the timeout fields.
    #[must_use]
    pub fn drain_config(&self) -> DrainConfig {
        DrainConfig {
            first_read_timeout: Duration::from_millis(self.read_timeout_ms),
            quiescence_window: Duration::from_millis(self.quiescence_window_ms),
            chunk_size: self.chunk_size,
        }
    }

    /// Directory used for the diagnostic capture files.
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
