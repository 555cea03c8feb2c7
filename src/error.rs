//! Error types for the timeflow library.

use std::path::PathBuf;

use thiserror::Error;

/// Every failure a store, storage, or advisor operation can report.
#[derive(Error, Debug)]
pub enum TimeflowError {
    /// Input rejected before any state changed
    #[error("Invalid input for field '{field}': {reason}")]
    Validation { field: String, reason: String },
    /// Task not found for the given ID
    #[error("Task with ID {id} not found")]
    TaskNotFound { id: u64 },
    /// Log not found for the given ID
    #[error("Log with ID {id} not found")]
    LogNotFound { id: u64 },
    /// Malformed calendar day or month string
    #[error("Invalid date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },
    /// Reading or writing the state file failed
    #[error("Storage error at path '{path}': {source}")]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Terminal input or output failed
    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// State could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The estimate advisor failed or had nothing to work with
    #[error("Could not get a suggestion: {0}")]
    RemoteSuggestion(String),
    /// Configuration file or environment problems
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl TimeflowError {
    /// Creates a validation error for `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a date parsing error for `input`.
    pub fn invalid_date(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDate {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Wraps an I/O failure with the path it happened at.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// True for the not-found family, which callers often want to report
    /// differently from validation failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound { .. } | Self::LogNotFound { .. })
    }
}

/// Result type alias for timeflow operations
pub type Result<T> = std::result::Result<T, TimeflowError>;
