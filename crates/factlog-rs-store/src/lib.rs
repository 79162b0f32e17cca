//! Append-only file activity log backed by SQLite.
//!
//! This crate owns the access record schema, the query builder that turns a
//! [`QueryFilter`] into SQL, and the store handle used to append records and
//! stream them back most-recent-first.

mod error;
mod model;
mod paths;
pub mod query;
mod store;

/// Error type returned by store and query operations.
pub use error::StoreError;
/// Record and result models.
pub use model::{AccessInfo, AccessType, NewAccessRecord, StoreInfo};
/// Path canonicalization applied to recorded paths.
pub use paths::normalize_path;
/// Query filter and compiled SQL form.
pub use query::{CompiledQuery, PageCursor, QueryFilter, escape_glob};
/// Store handle and lazy result iterator.
pub use store::{AccessLog, ActivityStore, SCHEMA_VERSION};
