//! SQLite-backed activity store.

use crate::error::StoreError;
use crate::model::{AccessInfo, AccessType, NewAccessRecord, StoreInfo};
use crate::paths::normalize_path;
use crate::query::{GLOB_FUNCTION, PageCursor, QueryFilter, compile_glob, compile_search};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Error as SqlError, params, params_from_iter};
use std::collections::VecDeque;
use std::fs;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Schema version stamped into new stores.
pub const SCHEMA_VERSION: &str = "0.1.dev1";

const SCHEMA: &str = include_str!("schema.sql");
/// Upper bound on rows fetched per connection.
const MAX_PAGE_SIZE: usize = 256;
/// How long a writer waits for another process holding the lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to an access log file.
///
/// The handle only holds the location; every operation opens its own
/// connection and drops it before returning.
#[derive(Debug, Clone)]
pub struct ActivityStore {
    path: PathBuf,
}

impl ActivityStore {
    /// Open the store at `path`, creating it with schema and metadata when
    /// absent. An existing store is left untouched apart from a schema probe.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        if store.path.exists() {
            store.check_schema()?;
            debug!("opened activity store (path={})", store.path.display());
        } else {
            store.initialize()?;
            info!("created activity store (path={})", store.path.display());
        }
        Ok(store)
    }

    /// Location of the store file.
    pub fn location(&self) -> &Path {
        &self.path
    }

    /// Append a single access record.
    pub fn append(&self, record: NewAccessRecord) -> Result<(), StoreError> {
        let file_path = normalize_path(&record.file_path)?;
        let file_exists = record.file_exists.unwrap_or_else(|| file_path.exists());
        let file_point = record
            .file_point
            .map(|point| i64::try_from(point).map_err(|_| StoreError::InvalidPoint(point)))
            .transpose()?;
        let file_path = file_path.to_string_lossy().into_owned();

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO access_log \
             (file_path, file_point, file_exists, access_type, program, recorded) \
             VALUES (?1, ?2, ?3, ?4, ?5, \
             MAX(?6, COALESCE((SELECT MAX(recorded) FROM access_log), 0) + 1))",
            params![
                file_path,
                file_point,
                file_exists,
                record.access_type.code(),
                record.program,
                Utc::now().timestamp_micros(),
            ],
        )?;
        debug!(
            "recorded access (path={}, type={}, point={:?}, exists={})",
            file_path, record.access_type, file_point, file_exists
        );
        Ok(())
    }

    /// Stream records matching `filter`, most recent first.
    pub fn query(&self, filter: &QueryFilter) -> Result<AccessLog, StoreError> {
        filter.validate()?;
        debug!(
            "querying access log (limit={}, unique={}, include={}, exclude={})",
            filter.limit,
            filter.unique,
            filter.include_glob.len(),
            filter.exclude_glob.len()
        );
        Ok(AccessLog::new(self.clone(), filter.clone()))
    }

    /// Read the metadata row written at creation.
    pub fn info(&self) -> Result<StoreInfo, StoreError> {
        let conn = self.connect()?;
        let (factlog_version, schema_version, created) = conn.query_row(
            "SELECT factlog_version, schema_version, created FROM factlog_info LIMIT 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?;
        Ok(StoreInfo {
            path: self.path.clone(),
            factlog_version,
            schema_version,
            created: self.timestamp(created)?,
        })
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Create the file, schema, and metadata row in one transaction.
    fn initialize(&self) -> Result<(), StoreError> {
        let init_error = |message: String| StoreError::StorageInit {
            path: self.path.clone(),
            message,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| init_error(err.to_string()))?;
            }
        }
        let mut conn = self.connect().map_err(|err| init_error(err.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|err| init_error(err.to_string()))?;
        tx.execute_batch(SCHEMA)
            .map_err(|err| init_error(err.to_string()))?;
        tx.execute(
            "INSERT INTO factlog_info (factlog_version, schema_version, created) \
             VALUES (?1, ?2, ?3)",
            params![
                env!("CARGO_PKG_VERSION"),
                SCHEMA_VERSION,
                Utc::now().timestamp_micros()
            ],
        )
        .map_err(|err| init_error(err.to_string()))?;
        tx.commit().map_err(|err| init_error(err.to_string()))?;
        Ok(())
    }

    /// Fail early when an existing file is not a readable store.
    fn check_schema(&self) -> Result<(), StoreError> {
        let corrupt = |err: rusqlite::Error| StoreError::Corrupt {
            path: self.path.clone(),
            message: err.to_string(),
        };
        let conn = self.connect()?;
        let schema_version: String = conn
            .query_row(
                "SELECT schema_version FROM factlog_info LIMIT 1",
                [],
                |row| row.get(0),
            )
            .map_err(corrupt)?;
        conn.prepare(
            "SELECT id, file_path, file_point, file_exists, access_type, program, recorded \
             FROM access_log LIMIT 0",
        )
        .map_err(corrupt)?;
        debug!(
            "store schema ok (path={}, schema_version={})",
            self.path.display(),
            schema_version
        );
        Ok(())
    }

    /// Newest row id; later pages of a listing never look past it.
    fn newest_id(conn: &Connection) -> Result<i64, StoreError> {
        Ok(conn.query_row("SELECT COALESCE(MAX(id), 0) FROM access_log", [], |row| {
            row.get(0)
        })?)
    }

    /// Fetch one page of results following `after`, pinning the snapshot on
    /// the first call.
    fn fetch_page(
        &self,
        filter: &QueryFilter,
        snapshot: &mut Option<i64>,
        after: Option<PageCursor>,
        page_limit: usize,
    ) -> Result<Vec<(PageCursor, AccessInfo)>, StoreError> {
        let conn = self.connect()?;
        register_glob_function(&conn)?;
        let newest = match *snapshot {
            Some(id) => id,
            None => {
                let id = Self::newest_id(&conn)?;
                debug!("pinned listing snapshot (max_id={id})");
                *snapshot = Some(id);
                id
            }
        };
        let compiled = compile_search(filter, newest, after, page_limit);
        let mut stmt = conn.prepare(&compiled.sql)?;
        let rows = stmt.query_map(params_from_iter(compiled.params.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut page = Vec::new();
        for row in rows {
            let (id, path, point, recorded, access_type) = row?;
            let info = AccessInfo {
                showpath: path.clone(),
                path,
                point: point.and_then(|point| u64::try_from(point).ok()),
                recorded: self.timestamp(recorded)?,
                access_type: AccessType::from_code(access_type)?,
            };
            page.push((PageCursor { recorded, id }, info));
        }
        Ok(page)
    }

    fn timestamp(&self, micros: i64) -> Result<DateTime<Utc>, StoreError> {
        DateTime::from_timestamp_micros(micros).ok_or_else(|| StoreError::Corrupt {
            path: self.path.clone(),
            message: format!("timestamp out of range: {micros}"),
        })
    }
}

/// Register the `globset`-backed path matcher used by compiled searches.
///
/// The compiled pattern is cached per statement argument, so each pattern is
/// parsed once per query rather than once per row.
fn register_glob_function(conn: &Connection) -> Result<(), StoreError> {
    type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
    conn.create_scalar_function(
        GLOB_FUNCTION,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let matcher = ctx.get_or_create_aux(0, |pattern| -> Result<_, BoxError> {
                Ok(compile_glob(pattern.as_str()?)?)
            })?;
            let path = ctx
                .get_raw(1)
                .as_str()
                .map_err(|err| SqlError::UserFunctionError(err.into()))?;
            Ok(matcher.is_match(path))
        },
    )?;
    Ok(())
}

/// Lazy, single-pass sequence of query results.
///
/// Rows are fetched page by page; each page opens and releases its own
/// connection. The first page pins the newest row id and later pages never
/// look past it, so the listing reads as one snapshot even while other
/// processes keep appending. Once exhausted, or after an error, the sequence
/// stays empty.
#[derive(Debug)]
pub struct AccessLog {
    store: ActivityStore,
    filter: QueryFilter,
    snapshot: Option<i64>,
    page_size: usize,
    remaining: usize,
    cursor: Option<PageCursor>,
    buffer: VecDeque<AccessInfo>,
    exhausted: bool,
}

impl AccessLog {
    fn new(store: ActivityStore, filter: QueryFilter) -> Self {
        Self {
            store,
            page_size: filter.limit.min(MAX_PAGE_SIZE),
            remaining: filter.limit,
            filter,
            snapshot: None,
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fill(&mut self) -> Result<(), StoreError> {
        let page_limit = self.page_size.min(self.remaining);
        let page = self
            .store
            .fetch_page(&self.filter, &mut self.snapshot, self.cursor, page_limit)?;
        if page.len() < page_limit {
            self.exhausted = true;
        }
        if let Some((cursor, _)) = page.last() {
            self.cursor = Some(*cursor);
        }
        self.buffer.extend(page.into_iter().map(|(_, info)| info));
        Ok(())
    }
}

impl Iterator for AccessLog {
    type Item = Result<AccessInfo, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fill() {
                self.exhausted = true;
                self.remaining = 0;
                return Some(Err(err));
            }
        }
        let info = self.buffer.pop_front()?;
        self.remaining -= 1;
        Some(Ok(info))
    }
}

impl FusedIterator for AccessLog {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn paths(log: AccessLog) -> Vec<String> {
        log.map(|info| info.expect("row").path).collect()
    }

    #[test]
    fn open_creates_parent_directories_and_metadata() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("data").join("db.sqlite");
        let store = ActivityStore::open(&path).expect("open");
        assert!(path.exists());

        let info = store.info().expect("info");
        assert_eq!(info.schema_version, SCHEMA_VERSION);
        assert_eq!(info.factlog_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.path, path);
    }

    #[test]
    fn reopen_keeps_existing_rows() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("db.sqlite");
        let store = ActivityStore::open(&path).expect("open");
        store
            .append(NewAccessRecord::new("/factlog/a", AccessType::Write))
            .expect("append");
        let created = store.info().expect("info").created;

        let store = ActivityStore::open(&path).expect("reopen");
        assert_eq!(store.info().expect("info").created, created);
        let rows = paths(store.query(&QueryFilter::new(10)).expect("query"));
        assert_eq!(rows, vec!["/factlog/a".to_string()]);
    }

    #[test]
    fn open_rejects_non_store_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("db.sqlite");
        fs::write(&path, "definitely not sqlite\n".repeat(64)).expect("write");
        let err = ActivityStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }), "{err}");
    }

    #[test]
    fn open_reports_unwritable_location() {
        let dir = tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").expect("write");
        let err = ActivityStore::open(blocker.join("db.sqlite")).unwrap_err();
        assert!(matches!(err, StoreError::StorageInit { .. }), "{err}");
    }

    #[test]
    fn recorded_is_strictly_increasing() {
        let dir = tempdir().expect("tempdir");
        let store = ActivityStore::open(dir.path().join("db.sqlite")).expect("open");
        for _ in 0..5 {
            store
                .append(NewAccessRecord::new("/factlog/same", AccessType::Write))
                .expect("append");
        }
        let mut filter = QueryFilter::new(10);
        filter.unique = false;
        let recorded: Vec<_> = store
            .query(&filter)
            .expect("query")
            .map(|info| info.expect("row").recorded)
            .collect();
        assert_eq!(recorded.len(), 5);
        assert!(recorded.windows(2).all(|pair| pair[0] > pair[1]));
    }

    #[test]
    fn pages_continue_after_cursor() {
        let dir = tempdir().expect("tempdir");
        let store = ActivityStore::open(dir.path().join("db.sqlite")).expect("open");
        let count = MAX_PAGE_SIZE + 10;
        for index in 0..count {
            store
                .append(NewAccessRecord::new(
                    format!("/factlog/{index:04}"),
                    AccessType::Open,
                ))
                .expect("append");
        }
        let rows = paths(store.query(&QueryFilter::new(usize::MAX)).expect("query"));
        assert_eq!(rows.len(), count);
        assert_eq!(rows[0], format!("/factlog/{:04}", count - 1));
        assert_eq!(rows[count - 1], "/factlog/0000");
    }

    #[test]
    fn listing_ignores_rows_appended_between_pages() {
        let dir = tempdir().expect("tempdir");
        let store = ActivityStore::open(dir.path().join("db.sqlite")).expect("open");
        let count = MAX_PAGE_SIZE + 44;
        for index in 0..count {
            store
                .append(NewAccessRecord::new(
                    format!("/factlog/{index:03}"),
                    AccessType::Write,
                ))
                .expect("append");
        }

        let mut log = store.query(&QueryFilter::new(1000)).expect("query");
        let first: Vec<String> = log
            .by_ref()
            .take(MAX_PAGE_SIZE)
            .map(|info| info.expect("row").path)
            .collect();
        store
            .append(NewAccessRecord::new("/factlog/000", AccessType::Close))
            .expect("append");
        let rest = paths(log);

        assert_eq!(first.len() + rest.len(), count);
        assert_eq!(rest.last().map(String::as_str), Some("/factlog/000"));

        let fresh = paths(store.query(&QueryFilter::new(1000)).expect("query"));
        assert_eq!(fresh.len(), count);
        assert_eq!(fresh[0], "/factlog/000");
    }

    #[test]
    fn query_rejects_zero_limit() {
        let dir = tempdir().expect("tempdir");
        let store = ActivityStore::open(dir.path().join("db.sqlite")).expect("open");
        assert!(matches!(
            store.query(&QueryFilter::new(0)),
            Err(StoreError::InvalidLimit)
        ));
    }
}
