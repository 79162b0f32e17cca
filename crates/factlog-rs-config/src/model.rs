//! Configuration schema for FactLog.

use serde::{Deserialize, Serialize};

/// Root of `factlog.json5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FactlogConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub list: ListConfig,
}

/// Activity store location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Store file; relative paths resolve against the config directory.
    #[serde(default)]
    pub path: Option<String>,
}

/// Defaults for the `list` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    #[serde(default = "default_list_limit")]
    pub limit: usize,
    /// Collapse repeated records of one file.
    #[serde(default = "default_true")]
    pub unique: bool,
    /// Keep files that no longer exist.
    #[serde(default)]
    pub include_missing: bool,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            limit: default_list_limit(),
            unique: true,
            include_missing: false,
        }
    }
}

fn default_list_limit() -> usize {
    50
}

fn default_true() -> bool {
    true
}
