//! Error types and Result aliases for the viewer.
//!
//! This module defines the error hierarchy used throughout the crate.
//! Parse and watch errors are recorded where they happen and never reach
//! the query side; a lookup of an unknown resource is an empty result, not
//! an error.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for viewer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Source file parse error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// File watching error.
    #[error("watch error: {0}")]
    Watch(#[from] WatchError),

    /// Server/API error.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors produced while turning a source file into facts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The file could not be read.
    #[error("failed to read '{path}': {reason}")]
    Io { path: String, reason: String },

    /// The file content is not valid RDF syntax.
    #[error("invalid syntax in '{path}': {reason}")]
    Syntax { path: String, reason: String },

    /// The parse workers were not available to take the job.
    #[error("parse worker pool error: {0}")]
    WorkerPool(String),
}

/// File watching errors.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Failed to register or release a watch on a path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// The notification backend could not be created.
    #[error("failed to initialise watcher: {0}")]
    Init(String),
}

/// Server/API errors.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {address}: {reason}")]
    BindFailed { address: String, reason: String },

    /// Request handling error.
    #[error("request error: {0}")]
    Request(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl ParseError {
    /// Create a read error for `path`.
    pub fn io(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a syntax error for `path`.
    pub fn syntax(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        Self::Syntax {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl WatchError {
    /// Create a watch failure for `path`.
    pub fn failed(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        Self::WatchFailed {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}
