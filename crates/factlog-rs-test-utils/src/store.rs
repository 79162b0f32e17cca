use factlog_rs_store::{AccessType, ActivityStore, NewAccessRecord};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::files::{canonical, touch};

/// Activity store living in its own temporary directory.
///
/// The directory also serves as a scratch root for files that tests record.
pub struct TempStore {
    dir: TempDir,
    store: ActivityStore,
}

impl TempStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ActivityStore::open(dir.path().join("data").join("db.sqlite"))
            .expect("open store");
        Self { dir, store }
    }

    pub fn store(&self) -> &ActivityStore {
        &self.store
    }

    /// Canonical scratch directory for test files.
    pub fn root(&self) -> PathBuf {
        canonical(self.dir.path())
    }

    /// Create a file under the scratch root and return its canonical path.
    pub fn touch(&self, relative: &str, content: &str) -> PathBuf {
        touch(&self.root(), relative, content)
    }

    pub fn record(&self, path: impl AsRef<Path>, access_type: AccessType) {
        self.store
            .append(NewAccessRecord::new(path, access_type))
            .expect("append");
    }

    pub fn record_at(&self, path: impl AsRef<Path>, access_type: AccessType, point: u64) {
        self.store
            .append(NewAccessRecord::new(path, access_type).with_point(point))
            .expect("append");
    }
}

impl Default for TempStore {
    fn default() -> Self {
        Self::new()
    }
}
