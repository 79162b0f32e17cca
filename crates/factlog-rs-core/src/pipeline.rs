//! Search pipeline turning a [`SearchRequest`] into filtered results.
//!
//! Preparation runs as an ordered list of stages over [`SearchPlan`]. Each
//! stage takes the plan and returns it refined, so the order is visible in
//! one place and every stage can be exercised on its own. Once the plan is
//! ready the store is queried and the row stages (existence, relative
//! rewrite, truncation) run lazily while results are pulled.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use factlog_rs_store::{
    AccessInfo, AccessLog, AccessType, ActivityStore, QueryFilter, escape_glob, normalize_path,
};
use log::debug;

use crate::error::SearchError;
use crate::text::{remove_prefix, with_trailing_separator};

/// Structured listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Maximum number of results; must be positive.
    pub limit: usize,
    /// Allowed access types; empty means any.
    pub access_types: Vec<AccessType>,
    /// Required existence snapshot taken at record time.
    pub exists: Option<bool>,
    /// Allowed originating programs; empty means any.
    pub programs: Vec<String>,
    /// Path must match at least one pattern; empty means any.
    pub include_glob: Vec<String>,
    /// Path must match none of these patterns.
    pub exclude_glob: Vec<String>,
    /// Collapse records of one path into the latest.
    pub unique: bool,
    /// Drop results whose path is gone at search time.
    pub only_existing: bool,
    /// Restrict results to these directories.
    pub under: Vec<PathBuf>,
    /// Show paths relative to the matching `under` directory.
    pub relative: bool,
}

impl SearchRequest {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            access_types: Vec::new(),
            exists: None,
            programs: Vec::new(),
            include_glob: Vec::new(),
            exclude_glob: Vec::new(),
            unique: true,
            only_existing: true,
            under: Vec::new(),
            relative: false,
        }
    }
}

/// Request plus everything derived from it before the store is queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPlan {
    pub request: SearchRequest,
    /// Absolute `under` directories, each ending with a separator.
    pub prefixes: Vec<String>,
    /// Filter handed to the store.
    pub filter: QueryFilter,
}

impl SearchPlan {
    fn new(request: SearchRequest) -> Self {
        let filter = QueryFilter::new(request.limit);
        Self {
            request,
            prefixes: Vec::new(),
            filter,
        }
    }

    /// Whether relative display paths are produced.
    pub fn rewrites_paths(&self) -> bool {
        self.request.relative && !self.prefixes.is_empty()
    }

    /// Whether rows may be dropped after the store hands them out.
    pub fn has_row_filters(&self) -> bool {
        self.request.only_existing || self.rewrites_paths()
    }
}

type Stage = fn(SearchPlan) -> Result<SearchPlan, SearchError>;

/// Preparation stages, in execution order.
const STAGES: &[(&str, Stage)] = &[
    ("validate", validate),
    ("scope", expand_scope),
    ("filter", build_filter),
];

/// Run the preparation stages for `request`.
pub fn plan(request: SearchRequest) -> Result<SearchPlan, SearchError> {
    STAGES
        .iter()
        .try_fold(SearchPlan::new(request), |plan, (name, stage)| {
            debug!("search stage (name={name})");
            stage(plan)
        })
}

/// Search `store` for `request`.
///
/// Results are produced lazily, most recent first, and hold at most
/// `request.limit` entries.
pub fn search(store: &ActivityStore, request: SearchRequest) -> Result<SearchResults, SearchError> {
    let plan = plan(request)?;
    let rows = store.query(&plan.filter)?;
    Ok(SearchResults::new(plan, rows))
}

fn validate(plan: SearchPlan) -> Result<SearchPlan, SearchError> {
    let request = &plan.request;
    let mut probe = QueryFilter::new(request.limit);
    probe.include_glob = request.include_glob.clone();
    probe.exclude_glob = request.exclude_glob.clone();
    probe.validate()?;
    Ok(plan)
}

/// Resolve `under` directories into prefixes and matching include globs.
fn expand_scope(mut plan: SearchPlan) -> Result<SearchPlan, SearchError> {
    for root in &plan.request.under {
        let absolute = normalize_path(root)?;
        let prefix = with_trailing_separator(absolute.to_string_lossy().into_owned());
        debug!("search scope (under={prefix})");
        plan.prefixes.push(prefix);
    }
    Ok(plan)
}

fn build_filter(mut plan: SearchPlan) -> Result<SearchPlan, SearchError> {
    let request = &plan.request;
    let limit = if plan.has_row_filters() {
        usize::MAX
    } else {
        request.limit
    };
    let mut include_glob = request.include_glob.clone();
    include_glob.extend(
        plan.prefixes
            .iter()
            .map(|prefix| format!("{}*", escape_glob(prefix))),
    );
    plan.filter = QueryFilter {
        limit,
        access_types: request.access_types.clone(),
        exists: request.exists,
        programs: request.programs.clone(),
        include_glob,
        exclude_glob: request.exclude_glob.clone(),
        unique: request.unique,
    };
    Ok(plan)
}

/// Lazy, single-pass search results.
///
/// An error from the store ends the sequence after it is reported.
#[derive(Debug)]
pub struct SearchResults {
    plan: SearchPlan,
    rows: AccessLog,
    seen: HashSet<String>,
    remaining: usize,
}

impl SearchResults {
    fn new(plan: SearchPlan, rows: AccessLog) -> Self {
        let remaining = plan.request.limit;
        Self {
            plan,
            rows,
            seen: HashSet::new(),
            remaining,
        }
    }

    fn keep_existing(&self, info: &AccessInfo) -> bool {
        if !self.plan.request.only_existing || Path::new(&info.path).exists() {
            return true;
        }
        debug!("skipping missing file (path={})", info.path);
        false
    }

    /// Rewrite the display path and drop repeats of an earlier one.
    fn relativize(&mut self, mut info: AccessInfo) -> Option<AccessInfo> {
        if !self.plan.rewrites_paths() {
            return Some(info);
        }
        info.showpath = remove_prefix(&self.plan.prefixes, &info.path).to_string();
        if self.seen.insert(info.showpath.clone()) {
            Some(info)
        } else {
            None
        }
    }
}

impl Iterator for SearchResults {
    type Item = Result<AccessInfo, SearchError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            let info = match self.rows.next()? {
                Ok(info) => info,
                Err(err) => {
                    self.remaining = 0;
                    return Some(Err(err.into()));
                }
            };
            if !self.keep_existing(&info) {
                continue;
            }
            if let Some(info) = self.relativize(info) {
                self.remaining -= 1;
                return Some(Ok(info));
            }
        }
        None
    }
}

impl std::iter::FusedIterator for SearchResults {}
