//! Query builder translating a [`QueryFilter`] into SQL.
//!
//! Compilation is pure: it never touches a connection, which keeps the SQL
//! shape testable on its own. Results are always ordered by `recorded`
//! descending with `id` as a tiebreaker, and pages are resumed with a
//! keyset [`PageCursor`] on that same ordering. Every page is bounded by the
//! same snapshot id so rows appended mid-listing never reshuffle it.
//!
//! Path patterns go through [`GLOB_FUNCTION`], a SQL function backed by
//! `globset`, so validation and matching share one syntax: `*`, `?`,
//! `[...]`, `[!...]` and `{a,b}`. Backslash is an ordinary character;
//! metacharacters are quoted with bracket classes (see [`escape_glob`]).

use crate::StoreError;
use crate::model::AccessType;
use globset::{GlobBuilder, GlobMatcher};
use rusqlite::types::Value;

/// Columns produced by every compiled search, in row-decoding order.
pub(crate) const SEARCH_COLUMNS: &str = "id, file_path, file_point, recorded, access_type";

/// Name of the SQL function matching `file_path` against a pattern.
pub(crate) const GLOB_FUNCTION: &str = "factlog_glob";

/// Compile a path pattern the way queries match it.
pub(crate) fn compile_glob(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(pattern)
        .backslash_escape(false)
        .build()?
        .compile_matcher())
}

/// Filter applied to the access log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    /// Maximum number of rows returned.
    pub limit: usize,
    /// Allowed access types; empty means any.
    pub access_types: Vec<AccessType>,
    /// Required existence snapshot; `None` means any.
    pub exists: Option<bool>,
    /// Allowed originating programs; empty means any.
    pub programs: Vec<String>,
    /// Path must match at least one of these patterns; empty means any.
    pub include_glob: Vec<String>,
    /// Path must match none of these patterns.
    pub exclude_glob: Vec<String>,
    /// Collapse records sharing a path into the latest one.
    pub unique: bool,
}

impl QueryFilter {
    /// Create an unrestricted, deduplicating filter returning up to `limit` rows.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            access_types: Vec::new(),
            exists: None,
            programs: Vec::new(),
            include_glob: Vec::new(),
            exclude_glob: Vec::new(),
            unique: true,
        }
    }

    /// Check the limit and parse every glob pattern.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.limit == 0 {
            return Err(StoreError::InvalidLimit);
        }
        for pattern in self.include_glob.iter().chain(&self.exclude_glob) {
            compile_glob(pattern).map_err(|err| StoreError::InvalidGlob {
                pattern: pattern.clone(),
                message: err.kind().to_string(),
            })?;
        }
        Ok(())
    }
}

/// Position of the last row handed out; the next page starts after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// `recorded` of the last row.
    pub recorded: i64,
    /// `id` of the last row.
    pub id: i64,
}

/// SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Compile one page of a search.
///
/// Only rows with `id <= snapshot` are considered, before grouping, so a
/// path recorded again while a listing is in progress keeps its place.
/// `after` restricts the page to rows strictly older than the cursor and
/// `page_limit` becomes the SQL `LIMIT`.
pub fn compile_search(
    filter: &QueryFilter,
    snapshot: i64,
    after: Option<PageCursor>,
    page_limit: usize,
) -> CompiledQuery {
    let mut params = vec![Value::Integer(snapshot)];
    let mut conditions = vec!["id <= ?".to_string()];
    conditions.extend(filter_conditions(filter, &mut params));

    let mut sql = if filter.unique {
        let inner_where = where_clause(&conditions);
        let mut outer = vec!["latest = 1".to_string()];
        outer.extend(cursor_condition(after, &mut params));
        format!(
            "SELECT {SEARCH_COLUMNS} FROM (\
             SELECT {SEARCH_COLUMNS}, ROW_NUMBER() OVER \
             (PARTITION BY file_path ORDER BY recorded DESC, id DESC) AS latest \
             FROM access_log {inner_where}) \
             {}",
            where_clause(&outer)
        )
    } else {
        conditions.extend(cursor_condition(after, &mut params));
        format!(
            "SELECT {SEARCH_COLUMNS} FROM access_log {}",
            where_clause(&conditions)
        )
    };
    sql.push_str("ORDER BY recorded DESC, id DESC LIMIT ?");
    params.push(Value::Integer(
        i64::try_from(page_limit).unwrap_or(i64::MAX),
    ));
    CompiledQuery { sql, params }
}

/// Escape glob metacharacters so `literal` only matches itself.
pub fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for ch in literal.chars() {
        match ch {
            '*' | '?' | '[' | ']' | '{' | '}' => {
                escaped.push('[');
                escaped.push(ch);
                escaped.push(']');
            }
            other => escaped.push(other),
        }
    }
    escaped
}

/// Build the filter predicates, pushing their parameters in order.
fn filter_conditions(filter: &QueryFilter, params: &mut Vec<Value>) -> Vec<String> {
    let mut conditions = Vec::new();
    if !filter.access_types.is_empty() {
        conditions.push(format!(
            "access_type IN ({})",
            placeholders(filter.access_types.len())
        ));
        params.extend(
            filter
                .access_types
                .iter()
                .map(|access_type| Value::Integer(access_type.code())),
        );
    }
    if let Some(exists) = filter.exists {
        conditions.push("file_exists = ?".to_string());
        params.push(Value::Integer(i64::from(exists)));
    }
    if !filter.programs.is_empty() {
        conditions.push(format!(
            "program IN ({})",
            placeholders(filter.programs.len())
        ));
        params.extend(filter.programs.iter().cloned().map(Value::Text));
    }
    if !filter.include_glob.is_empty() {
        let any = vec![format!("{GLOB_FUNCTION}(?, file_path)"); filter.include_glob.len()]
            .join(" OR ");
        conditions.push(format!("({any})"));
        params.extend(filter.include_glob.iter().cloned().map(Value::Text));
    }
    for pattern in &filter.exclude_glob {
        conditions.push(format!("NOT {GLOB_FUNCTION}(?, file_path)"));
        params.push(Value::Text(pattern.clone()));
    }
    conditions
}

fn cursor_condition(after: Option<PageCursor>, params: &mut Vec<Value>) -> Option<String> {
    let cursor = after?;
    params.push(Value::Integer(cursor.recorded));
    params.push(Value::Integer(cursor.recorded));
    params.push(Value::Integer(cursor.id));
    Some("(recorded < ? OR (recorded = ? AND id < ?))".to_string())
}

/// `WHERE a AND b ` with a trailing space, or nothing.
fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {} ", conditions.join(" AND "))
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
