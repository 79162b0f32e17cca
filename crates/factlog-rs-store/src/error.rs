//! Error types for the activity store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while opening, writing, or querying the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store location could not be created or written.
    #[error("failed to initialize store at {}: {message}", path.display())]
    StorageInit { path: PathBuf, message: String },
    /// Access type outside of write/open/close.
    #[error("invalid access type: {0:?} (expected one of write, open, close)")]
    InvalidAccessType(String),
    /// Cursor point does not fit the storage column.
    #[error("invalid file point: {0}")]
    InvalidPoint(u64),
    /// Query limit must be positive.
    #[error("limit must be greater than zero")]
    InvalidLimit,
    /// Glob pattern failed to parse.
    #[error("invalid glob pattern {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },
    /// Existing store has an unreadable schema or data.
    #[error("store at {} is unreadable: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },
    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
