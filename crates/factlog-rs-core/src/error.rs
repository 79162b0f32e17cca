//! Error types for the search pipeline.

use factlog_rs_store::StoreError;
use thiserror::Error;

/// Errors returned while searching or writing results.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Writing output failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
