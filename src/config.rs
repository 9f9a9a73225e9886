//! Configuration for cmdmate
//!
//! Loaded from `~/.cmdmate/config.yaml` when present. Every field has a
//! default, so a partial file (or none at all) is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const APP_DIR: &str = ".cmdmate";

/// Directory holding cmdmate's config and history
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

/// Location of the config file
pub fn default_config_path() -> PathBuf {
    app_dir().join("config.yaml")
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history: HistoryConfig,
    pub host: HostConfig,
    pub display: DisplayConfig,
    pub sessions: SessionConfig,
}

/// History persistence settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Backing file; `None` keeps history in memory only
    pub file: Option<PathBuf>,
    /// Entries made available for interactive recall on load
    pub recall_limit: usize,
    /// Entries printed by the `history` built-in
    pub show_limit: usize,
    /// Flush after this many new records (0 = only on exit)
    pub autosave_every: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file: Some(app_dir().join("history.json")),
            recall_limit: 50,
            show_limit: 20,
            autosave_every: 0,
        }
    }
}

/// Host-command fallback settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Wall-clock bound for a host command, in seconds
    pub timeout_secs: u64,
    /// Shell used to run host commands (defaults to the platform shell)
    pub shell: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            shell: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width used to lay out `ls` columns
    pub columns: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { columns: 80 }
    }
}

/// Limits for the session registry
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions kept before the least recently used one is evicted
    pub max_sessions: usize,
    /// Idle time after which a session expires, in seconds
    pub idle_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: 64,
            idle_ttl_secs: 3600,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);

        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Configuration with history kept in memory only (useful for testing)
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.history.file = None;
        config
    }
}
