use std::fs;
use std::path::{Path, PathBuf};

/// Create `root/relative` with `content`, including missing parent
/// directories, and return its canonical path.
pub fn touch(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(&path, content).expect("write file");
    canonical(&path)
}

/// Canonical form of an existing path, as a string the store would record.
pub fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().expect("canonicalize")
}
