//! Server configuration via `docket.toml`
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Command-line flags of `docket-server` override the file.

use docket_primitives::RetryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "docket.toml";

/// Errors loading or writing the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("Failed to access config file '{path}': {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File contents are not a valid configuration
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Configuration could not be encoded
    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

/// Server configuration loaded from `docket.toml`.
///
/// # Example
///
/// ```toml
/// host = "127.0.0.1"
/// port = 8787
/// cors_origins = ["http://localhost:5173"]
/// snapshot_path = "docket.snapshot.json"
/// seed_on_start = true
///
/// [retry]
/// max_attempts = 4
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Snapshot file loaded on start and written on shutdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
    /// Write collection seed data before serving
    #[serde(default = "default_seed_on_start")]
    pub seed_on_start: bool,
    /// CAS retry policy for every collection
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_seed_on_start() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            snapshot_path: None,
            seed_on_start: default_seed_on_start(),
            retry: RetryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// `host:port`
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# docket server configuration

# Address and port to listen on
host = "127.0.0.1"
port = 8787

# Allowed CORS origins. Empty allows any origin.
cors_origins = []

# Snapshot file. Loaded on start, written on graceful shutdown.
# Leave unset to keep data in memory only.
# snapshot_path = "docket.snapshot.json"

# Write seed data (the "General" chat board) before serving
seed_on_start = true

# CAS retry policy. The defaults make 4 attempts with no delay.
[retry]
max_attempts = 4
base_delay_ms = 0
max_delay_ms = 0
jitter = false
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
