//! Core error types for focushub-core.
//!
//! Nothing in this crate is fatal: the gateway degrades every backend failure
//! to an empty/`None`/`false` result, so these types mostly surface from input
//! validation, configuration handling and the internals of the gateway.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focushub-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Backend-related errors
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The timer needs a Tokio runtime to drive its tick
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while talking to the hosted backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// No endpoint or credential configured; callers take the offline branch.
    #[error("Backend not configured")]
    Unavailable,

    /// The backend rejected or failed the query.
    #[error("{operation} on '{table}' failed: {message}")]
    OperationFailed {
        table: String,
        operation: String,
        message: String,
    },

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status returned by the backend
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered with no rows where one was expected
    #[error("Backend returned no rows")]
    EmptyResponse,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Home/config directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Input validation errors. Raised before any state mutation or network call.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Task or note title is blank after trimming
    #[error("Title must not be empty")]
    EmptyTitle,

    /// Focus duration must be at least one minute
    #[error("Focus duration must be greater than zero")]
    InvalidDuration,

    /// No task with this id in the collection
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// Clock time not in HH:MM form
    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<tokio::runtime::TryCurrentError> for CoreError {
    fn from(err: tokio::runtime::TryCurrentError) -> Self {
        CoreError::Runtime(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
