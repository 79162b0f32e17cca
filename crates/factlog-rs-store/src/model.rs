//! Access record models shared by the store, query builder, and callers.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Kind of file activity being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// File was saved.
    Write,
    /// File was opened.
    Open,
    /// File was closed.
    Close,
}

impl AccessType {
    /// All access types in storage order.
    pub const ALL: [AccessType; 3] = [AccessType::Write, AccessType::Open, AccessType::Close];

    /// Lowercase name used on the command line and in output.
    pub fn as_str(self) -> &'static str {
        match self {
            AccessType::Write => "write",
            AccessType::Open => "open",
            AccessType::Close => "close",
        }
    }

    /// Integer stored in the `access_type` column.
    pub(crate) fn code(self) -> i64 {
        match self {
            AccessType::Write => 0,
            AccessType::Open => 1,
            AccessType::Close => 2,
        }
    }

    /// Decode a stored integer.
    pub(crate) fn from_code(code: i64) -> Result<Self, StoreError> {
        match code {
            0 => Ok(AccessType::Write),
            1 => Ok(AccessType::Open),
            2 => Ok(AccessType::Close),
            other => Err(StoreError::InvalidAccessType(other.to_string())),
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessType {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AccessType::ALL
            .into_iter()
            .find(|access_type| access_type.as_str() == value)
            .ok_or_else(|| StoreError::InvalidAccessType(value.to_string()))
    }
}

/// Record passed to [`crate::ActivityStore::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessRecord {
    /// Path as given by the caller; canonicalized on append.
    pub file_path: PathBuf,
    /// Kind of activity.
    pub access_type: AccessType,
    /// Cursor offset within the file.
    pub file_point: Option<u64>,
    /// Existence snapshot; probed on append when unset.
    pub file_exists: Option<bool>,
    /// Originating program (editor, pager, ...).
    pub program: Option<String>,
}

impl NewAccessRecord {
    /// Create a record with no point, program, or explicit existence flag.
    pub fn new(file_path: impl AsRef<Path>, access_type: AccessType) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            access_type,
            file_point: None,
            file_exists: None,
            program: None,
        }
    }

    /// Attach a cursor offset.
    pub fn with_point(mut self, point: u64) -> Self {
        self.file_point = Some(point);
        self
    }

    /// Override the existence probe.
    pub fn with_exists(mut self, exists: bool) -> Self {
        self.file_exists = Some(exists);
        self
    }

    /// Attach the originating program name.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }
}

/// A single query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessInfo {
    /// Canonical path as stored.
    pub path: String,
    /// Path shown to the user; rewritten by relative scoping.
    pub showpath: String,
    /// Cursor offset at the time of access.
    pub point: Option<u64>,
    /// Time the record was stored.
    pub recorded: DateTime<Utc>,
    /// Kind of activity.
    pub access_type: AccessType,
}

/// Metadata written once when the store is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInfo {
    /// Location of the store file.
    pub path: PathBuf,
    /// Version of the application that created the store.
    pub factlog_version: String,
    /// Schema version stamp.
    pub schema_version: String,
    /// Creation time.
    pub created: DateTime<Utc>,
}
