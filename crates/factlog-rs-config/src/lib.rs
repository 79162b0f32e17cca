//! Configuration models and loading for FactLog.
//!
//! This crate resolves the per-user configuration directory, owns the
//! `factlog.json5` schema, and decides where the activity store lives.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Per-user directory layout.
pub use loader::ConfigPaths;
/// Configuration schema models.
pub use model::*;
