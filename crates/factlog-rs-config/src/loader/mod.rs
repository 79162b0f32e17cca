//! Config file discovery, validation, and store path resolution.
//!
//! The config file is optional; a missing file yields defaults. Values are
//! parsed as JSON5, checked against the schema, then decoded into
//! `FactlogConfig`.

mod paths;
mod schema;


use crate::{ConfigError, FactlogConfig};
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub use paths::ConfigPaths;

impl FactlogConfig {
    /// Load the config file from `paths`, falling back to defaults when absent.
    pub fn load(paths: &ConfigPaths) -> Result<Self, ConfigError> {
        let path = paths.config_file();
        if !path.exists() {
            debug!("config file not found; using defaults (path={})", path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(path)
    }

    /// Load a config from an explicit path.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value: Value = json5::from_str(&contents)?;
        config_from_value(value)
    }

    /// Load a config from JSON5 contents.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value)
    }

    /// Validate semantic constraints not covered by the schema.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.list.limit == 0 {
            return Err(ConfigError::Invalid(
                "list.limit must be greater than zero".to_string(),
            ));
        }
        if matches!(self.store.path.as_deref(), Some(path) if path.trim().is_empty()) {
            return Err(ConfigError::Invalid("store.path must not be empty".to_string()));
        }
        Ok(())
    }

    /// Store file for this config.
    ///
    /// Uses `store.path` when set, resolved against the config directory and
    /// with a leading `~` expanded; otherwise the default data location.
    pub fn store_path(&self, paths: &ConfigPaths) -> PathBuf {
        match self.store.path.as_deref() {
            Some(path) => paths.resolve_path(path),
            None => paths.default_store_path(),
        }
    }
}

/// Validate a raw value, decode it, and apply semantic checks.
fn config_from_value(value: Value) -> Result<FactlogConfig, ConfigError> {
    schema::validate_config_schema(&value)?;
    let config: FactlogConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
