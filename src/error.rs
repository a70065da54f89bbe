//! Error types for PPLX
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for PPLX operations
///
/// Session storage surfaces four distinct kinds to its callers: a missing
/// record, an I/O failure, an unparseable record, and invalid input. The
/// remaining variants cover configuration, the remote API, and the
/// interactive terminal.
#[derive(Error, Debug)]
pub enum PplxError {
    /// Record id or short id does not exist
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Filesystem failure (directory creation, read, write, rename, delete)
    #[error("IO error while {operation} {path}: {source}")]
    Io {
        /// What was being attempted
        operation: &'static str,
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A record exists but its content is not a valid session
    #[error("Failed to parse session file {path}: {message}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Invalid user input (for example an empty search query)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote completion API errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Line editor errors in interactive mode
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl PplxError {
    /// Build an `Io` error for the given operation and path
    pub fn io(operation: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a `Parse` error for the given path
    pub fn parse(path: impl AsRef<Path>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Returns true when this is a `NotFound` error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for PPLX operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation. Callers that
/// need to branch on the failure kind use `downcast_ref::<PplxError>()`.
pub type Result<T> = anyhow::Result<T>;

/// Returns true if `err` wraps a `PplxError::NotFound`
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<PplxError>()
        .map(PplxError::is_not_found)
        .unwrap_or(false)
}
