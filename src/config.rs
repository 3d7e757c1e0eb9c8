//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Configuration files (TOML)
//! - Defaults

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub record: RecordConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format (json, table)
    #[serde(default = "default_format")]
    pub format: String,
}

/// Record file handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Persist the record file after a successful apply
    #[serde(default = "default_write_back")]
    pub write_back: bool,

    /// Directory for exported lifecycle graphs
    pub export_dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_format() -> String {
    "table".to_string()
}

fn default_write_back() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            write_back: default_write_back(),
            export_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;

        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./config.toml
    /// 2. ~/.utxo-lifecycle/config.toml
    /// 3. /etc/utxo-lifecycle/config.toml
    pub fn load() -> Result<Self> {
        let mut paths = vec![PathBuf::from("config.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".utxo-lifecycle").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/utxo-lifecycle/config.toml"));

        for path in paths {
            if path.exists() {
                tracing::info!("Loading config from {:?}", path);
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Directory lifecycle graphs are exported to
    pub fn export_directory(&self) -> PathBuf {
        self.record
            .export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
