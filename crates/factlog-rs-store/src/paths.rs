//! Path canonicalization for stored file paths.

use crate::StoreError;
use log::debug;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` to the absolute form used as the storage key.
///
/// Relative paths are resolved against the current working directory.
/// Existing paths are canonicalized; for missing paths the nearest existing
/// ancestor is canonicalized and the remaining components are appended, so a
/// file keeps the same key before and after it is created.
pub fn normalize_path(path: &Path) -> Result<PathBuf, StoreError> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    let absolute = lexical_absolute(path)?;
    for ancestor in absolute.ancestors().skip(1) {
        let Ok(canonical) = ancestor.canonicalize() else {
            continue;
        };
        let Ok(rest) = absolute.strip_prefix(ancestor) else {
            continue;
        };
        debug!(
            "normalized missing path (path={}, ancestor={})",
            absolute.display(),
            canonical.display()
        );
        return Ok(canonical.join(rest));
    }
    Ok(absolute)
}

/// Make `path` absolute and fold `.` and `..` components without touching
/// the filesystem.
fn lexical_absolute(path: &Path) -> Result<PathBuf, StoreError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => (),
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}
