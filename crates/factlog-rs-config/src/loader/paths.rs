//! Per-user directory layout.

use crate::ConfigError;
use directories::{ProjectDirs, UserDirs};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Application name used to derive the config directory.
const APP_NAME: &str = "FactLog";
/// Config filename inside the config directory.
const DEFAULT_CONFIG_FILE: &str = "factlog.json5";
/// Data directory inside the config directory.
const DEFAULT_DATA_DIR: &str = "data";
/// Store filename inside the data directory.
const DEFAULT_STORE_FILE: &str = "db.sqlite";

/// Locations derived from the per-user config directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    config_dir: PathBuf,
}

impl ConfigPaths {
    /// Resolve the platform config directory
    /// (`$XDG_CONFIG_HOME/factlog`, `~/Library/Application Support/FactLog`,
    /// or `%APPDATA%\FactLog\config`).
    pub fn resolve() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("", "", APP_NAME).ok_or(ConfigError::NoConfigDir)?;
        let paths = Self::from_dir(dirs.config_dir());
        debug!("resolved config directory: {}", paths.config_dir.display());
        Ok(paths)
    }

    /// Use `config_dir` instead of the platform default.
    pub fn from_dir(config_dir: impl AsRef<Path>) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(DEFAULT_CONFIG_FILE)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.config_dir.join(DEFAULT_DATA_DIR)
    }

    pub fn default_store_path(&self) -> PathBuf {
        self.data_dir().join(DEFAULT_STORE_FILE)
    }

    /// Create the data directory if needed and return it.
    pub fn ensure_data_dir(&self) -> Result<PathBuf, ConfigError> {
        let data_dir = self.data_dir();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
            debug!("created data directory: {}", data_dir.display());
        }
        Ok(data_dir)
    }

    /// Expand `~` and anchor relative paths at the config directory.
    pub(crate) fn resolve_path(&self, path: &str) -> PathBuf {
        let expanded = expand_home(path);
        if expanded.is_absolute() {
            expanded
        } else {
            self.config_dir.join(expanded)
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with(['/', '\\']) => &rest[1..],
        _ => return PathBuf::from(path),
    };
    match UserDirs::new() {
        Some(dirs) if rest.is_empty() => dirs.home_dir().to_path_buf(),
        Some(dirs) => dirs.home_dir().join(rest),
        None => PathBuf::from(path),
    }
}
