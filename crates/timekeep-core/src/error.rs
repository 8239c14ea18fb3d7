//! Core error types for timekeep-core.
//!
//! This module defines the error taxonomy used across the library.
//! Validation failures are rejected before any state changes, missing
//! records map to `NotFound`, and transient store problems surface as
//! `Store` so callers can roll back optimistic edits and retry.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for timekeep-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// Strict-semantics conflict (e.g. finalizing an already-ended timer)
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Transient store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Validation errors.
///
/// Raised before any optimistic projection or store write happens.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Name is empty after trimming
    #[error("Timer name must not be empty")]
    EmptyName,

    /// Name exceeds the maximum length
    #[error("Timer name exceeds {max} characters (got {len})")]
    NameTooLong { len: usize, max: usize },

    /// Tag exceeds the maximum length
    #[error("Tag '{tag}' exceeds {max} characters")]
    TagTooLong { tag: String, max: usize },
}

/// Lookup errors for timers and entries.
#[derive(Error, Debug)]
pub enum NotFoundError {
    /// No timer with this id for the owner
    #[error("Timer not found: {0}")]
    Timer(String),

    /// No time entry with this id for the owner
    #[error("Time entry not found: {0}")]
    Entry(String),
}

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// In-process store mutex was poisoned by a panicking thread
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration parse errors
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration serialize errors
    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl CoreError {
    /// True for errors worth retrying after a pull (transient I/O).
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Store(_))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
