// src/config.rs

//! Store configuration loaded from TOML.
//!
//! ```toml
//! root_dir = "data"
//!
//! [write]
//! policy = "copy"   # replace | copy | rename
//! indent = 2        # or a literal string such as "\t"
//!
//! [logging]
//! target = "jsonfs"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::options::WriteOptions;

/// Failure to load a [`StoreConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root configuration for a [`JsonStore`](crate::JsonStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory every store key is resolved against
    #[serde(default = "defaults::root_dir")]
    pub root_dir: PathBuf,

    /// Default options for writes through the store
    #[serde(default)]
    pub write: WriteOptions,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StoreConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!("{}. Using defaults.", e);
            Self::default()
        })
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: defaults::root_dir(),
            write: WriteOptions::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `log` target used by the store's observer
    #[serde(default = "defaults::log_target")]
    pub target: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: defaults::log_target(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn root_dir() -> PathBuf {
        PathBuf::from("data")
    }

    pub fn log_target() -> String {
        crate::observer::DEFAULT_TARGET.to_string()
    }
}
