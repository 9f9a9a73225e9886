//! Error types for cmdmate_core
//!
//! Built-in handlers return `CommandError`; the table renders it as a
//! user-facing string carrying [`ERROR_MARKER`], so nothing propagates past a
//! single segment.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Marker that identifies a failed segment result.
pub const ERROR_MARKER: &str = "Error:";

/// Returns true when a result string signals failure.
pub fn is_failure(result: &str) -> bool {
    result.contains(ERROR_MARKER)
}

/// Render an error message the way every failed handler reports it
pub fn render_error(message: impl std::fmt::Display) -> String {
    format!("{} {}", ERROR_MARKER, message)
}

#[derive(Debug, Error)]
pub enum CommandError {
    /// Wrong or missing arguments to a built-in
    #[error("{0}")]
    Usage(String),

    /// Missing file, wrong file kind and similar lookups
    #[error("{0}")]
    Resource(String),

    /// I/O failure with the operation that triggered it
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Host command exceeded its wall-clock bound
    #[error("Command timed out after {0}s")]
    Timeout(u64),
}

impl CommandError {
    pub fn usage(message: impl Into<String>) -> Self {
        CommandError::Usage(message.into())
    }

    pub fn resource(message: impl Into<String>) -> Self {
        CommandError::Resource(message.into())
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        CommandError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type CommandResult = Result<String, CommandError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to access history file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("history file {path:?} is not a JSON list of strings: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
