//! Append/query integration tests against a real store file.

use factlog_rs_store::{
    AccessInfo, AccessType, ActivityStore, NewAccessRecord, QueryFilter, StoreError,
};
use pretty_assertions::assert_eq;
use tempfile::{TempDir, tempdir};

/// Open a fresh store inside a temporary directory.
fn temp_store() -> (TempDir, ActivityStore) {
    let dir = tempdir().expect("tempdir");
    let store = ActivityStore::open(dir.path().join("db.sqlite")).expect("open store");
    (dir, store)
}

fn dummy(index: usize) -> String {
    format!("/DUMMY/PATH/{index:02}")
}

fn search(store: &ActivityStore, filter: &QueryFilter) -> Vec<AccessInfo> {
    store
        .query(filter)
        .expect("query")
        .collect::<Result<Vec<_>, _>>()
        .expect("rows")
}

fn search_paths(store: &ActivityStore, filter: &QueryFilter) -> Vec<String> {
    search(store, filter)
        .into_iter()
        .map(|info| info.path)
        .collect()
}

fn record(store: &ActivityStore, path: &str, access_type: AccessType) {
    store
        .append(NewAccessRecord::new(path, access_type))
        .expect("append");
}

#[test]
fn record_and_search_most_recent_first() {
    let (_dir, store) = temp_store();
    record(&store, &dummy(0), AccessType::Write);
    record(&store, &dummy(1), AccessType::Open);
    record(&store, &dummy(2), AccessType::Close);

    let rows = search(&store, &QueryFilter::new(10));
    assert_eq!(
        rows.iter().map(|info| info.path.clone()).collect::<Vec<_>>(),
        vec![dummy(2), dummy(1), dummy(0)]
    );
    assert_eq!(
        rows.iter().map(|info| info.access_type).collect::<Vec<_>>(),
        vec![AccessType::Close, AccessType::Open, AccessType::Write]
    );
    assert!(rows.iter().all(|info| info.showpath == info.path));
}

#[test]
fn record_file_point_round_trips() {
    let (_dir, store) = temp_store();
    store
        .append(NewAccessRecord::new(dummy(0), AccessType::Write).with_point(23))
        .expect("append");

    let rows = search(&store, &QueryFilter::new(10));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].path, dummy(0));
    assert_eq!(rows[0].access_type, AccessType::Write);
    assert_eq!(rows[0].point, Some(23));
}

#[test]
fn search_by_access_type() {
    let (_dir, store) = temp_store();
    record(&store, &dummy(0), AccessType::Write);
    record(&store, &dummy(1), AccessType::Open);
    record(&store, &dummy(2), AccessType::Close);

    for (access_type, expected) in [
        (AccessType::Write, dummy(0)),
        (AccessType::Open, dummy(1)),
        (AccessType::Close, dummy(2)),
    ] {
        let mut filter = QueryFilter::new(10);
        filter.access_types = vec![access_type];
        assert_eq!(search_paths(&store, &filter), vec![expected]);
    }

    let mut filter = QueryFilter::new(10);
    filter.access_types = vec![AccessType::Write, AccessType::Close];
    assert_eq!(search_paths(&store, &filter), vec![dummy(2), dummy(0)]);
}

#[test]
fn unique_keeps_latest_record() {
    let (_dir, store) = temp_store();
    for _ in 0..3 {
        record(&store, &dummy(0), AccessType::Write);
    }

    let mut all = QueryFilter::new(10);
    all.unique = false;
    let every = search(&store, &all);
    assert_eq!(every.len(), 3);
    assert!(every.iter().all(|info| info.path == dummy(0)));

    let rows = search(&store, &QueryFilter::new(10));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].recorded, every[0].recorded);
}

#[test]
fn unique_reports_type_and_point_of_latest_row() {
    let (_dir, store) = temp_store();
    store
        .append(NewAccessRecord::new(dummy(0), AccessType::Open).with_point(1))
        .expect("append");
    store
        .append(NewAccessRecord::new(dummy(0), AccessType::Write).with_point(40))
        .expect("append");
    store
        .append(NewAccessRecord::new(dummy(0), AccessType::Close).with_point(7))
        .expect("append");

    let rows = search(&store, &QueryFilter::new(10));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].access_type, AccessType::Close);
    assert_eq!(rows[0].point, Some(7));

    let mut writes = QueryFilter::new(10);
    writes.access_types = vec![AccessType::Write];
    let rows = search(&store, &writes);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].point, Some(40));
}

#[test]
fn non_unique_orders_newest_first() {
    let (_dir, store) = temp_store();
    record(&store, &dummy(0), AccessType::Open);
    record(&store, &dummy(1), AccessType::Open);
    record(&store, &dummy(0), AccessType::Close);

    let mut filter = QueryFilter::new(10);
    filter.unique = false;
    let rows = search(&store, &filter);
    assert_eq!(
        rows.iter()
            .map(|info| (info.path.clone(), info.access_type))
            .collect::<Vec<_>>(),
        vec![
            (dummy(0), AccessType::Close),
            (dummy(1), AccessType::Open),
            (dummy(0), AccessType::Open),
        ]
    );
}

#[test]
fn include_globs_or_exclude_globs_and() {
    let (_dir, store) = temp_store();
    record(&store, "/a/x.py", AccessType::Write);
    record(&store, "/a/x.el", AccessType::Write);
    record(&store, "/b/y.py", AccessType::Write);

    let mut filter = QueryFilter::new(10);
    filter.include_glob = vec!["*.py".to_string(), "*.el".to_string()];
    filter.exclude_glob = vec!["/b/*".to_string()];
    assert_eq!(
        search_paths(&store, &filter),
        vec!["/a/x.el".to_string(), "/a/x.py".to_string()]
    );
}

#[test]
fn glob_alternation_negation_and_literal_braces() {
    let (_dir, store) = temp_store();
    for path in ["/a/x.py", "/a/x.el", "/a/{odd", "/a/y.c"] {
        record(&store, path, AccessType::Write);
    }

    let mut filter = QueryFilter::new(10);
    filter.include_glob = vec!["*.{py,el}".to_string()];
    assert_eq!(
        search_paths(&store, &filter),
        vec!["/a/x.el".to_string(), "/a/x.py".to_string()]
    );

    filter.include_glob = vec!["/a/?.[!c]*".to_string()];
    assert_eq!(
        search_paths(&store, &filter),
        vec!["/a/x.el".to_string(), "/a/x.py".to_string()]
    );

    filter.include_glob = vec!["/a/[{]odd".to_string()];
    assert_eq!(search_paths(&store, &filter), vec!["/a/{odd".to_string()]);

    filter.include_glob = vec!["/a/{odd".to_string()];
    assert!(matches!(
        store.query(&filter),
        Err(StoreError::InvalidGlob { ref pattern, .. }) if pattern == "/a/{odd"
    ));

    let mut filter = QueryFilter::new(10);
    filter.exclude_glob = vec!["*.{py,el}".to_string(), "*[{]*".to_string()];
    assert_eq!(search_paths(&store, &filter), vec!["/a/y.c".to_string()]);
}

#[test]
fn complex_glob_combination() {
    let (_dir, store) = temp_store();
    let root_a: Vec<String> = (0..3).map(|i| format!("/DUMMY/ROOT-A/{i:02}")).collect();
    let root_b: Vec<String> = (0..5).map(|i| format!("/DUMMY/ROOT-B/{i:02}")).collect();
    for path in root_a.iter().chain(&root_b) {
        record(&store, path, AccessType::Write);
    }

    let mut filter = QueryFilter::new(10);
    filter.include_glob = vec!["*DUMMY*".to_string(), "*ROOT*".to_string()];
    filter.exclude_glob = vec!["*ROOT-B*".to_string(), "*0".to_string()];
    assert_eq!(
        search_paths(&store, &filter),
        vec![root_a[2].clone(), root_a[1].clone()]
    );
}

#[test]
fn limit_applies_after_filtering() {
    let (_dir, store) = temp_store();
    record(&store, "/a/old.py", AccessType::Write);
    record(&store, "/a/skip.el", AccessType::Write);
    record(&store, "/a/new.py", AccessType::Write);
    record(&store, "/a/skip2.el", AccessType::Write);

    let mut filter = QueryFilter::new(1);
    filter.include_glob = vec!["*.py".to_string()];
    assert_eq!(search_paths(&store, &filter), vec!["/a/new.py".to_string()]);
}

#[test]
fn search_by_existence_snapshot() {
    let (_dir, store) = temp_store();
    store
        .append(NewAccessRecord::new(dummy(0), AccessType::Write).with_exists(true))
        .expect("append");
    store
        .append(NewAccessRecord::new(dummy(1), AccessType::Write).with_exists(false))
        .expect("append");

    assert_eq!(search(&store, &QueryFilter::new(10)).len(), 2);

    let mut filter = QueryFilter::new(10);
    filter.exists = Some(true);
    assert_eq!(search_paths(&store, &filter), vec![dummy(0)]);
    filter.exists = Some(false);
    assert_eq!(search_paths(&store, &filter), vec![dummy(1)]);
}

#[test]
fn existence_is_probed_when_not_given() {
    let (dir, store) = temp_store();
    let present = dir.path().join("present.txt");
    std::fs::write(&present, "content").expect("write");
    record(&store, &present.to_string_lossy(), AccessType::Open);
    record(&store, &dummy(0), AccessType::Open);

    let mut filter = QueryFilter::new(10);
    filter.exists = Some(true);
    let rows = search_paths(&store, &filter);
    assert_eq!(
        rows,
        vec![
            present
                .canonicalize()
                .expect("canonical")
                .to_string_lossy()
                .into_owned()
        ]
    );
}

#[test]
fn search_by_program() {
    let (_dir, store) = temp_store();
    store
        .append(NewAccessRecord::new(dummy(0), AccessType::Write).with_program("emacs"))
        .expect("append");
    store
        .append(NewAccessRecord::new(dummy(1), AccessType::Write).with_program("less"))
        .expect("append");

    let mut filter = QueryFilter::new(10);
    filter.programs = vec!["emacs".to_string()];
    assert_eq!(search_paths(&store, &filter), vec![dummy(0)]);
    filter.programs = vec!["less".to_string()];
    assert_eq!(search_paths(&store, &filter), vec![dummy(1)]);
    filter.programs = vec!["emacs".to_string(), "less".to_string()];
    assert_eq!(search_paths(&store, &filter), vec![dummy(1), dummy(0)]);
    filter.programs = vec!["vim".to_string()];
    assert!(search_paths(&store, &filter).is_empty());
}

#[test]
fn relative_paths_are_stored_absolute() {
    let (_dir, store) = temp_store();
    record(&store, "factlog-relative-missing.txt", AccessType::Open);

    let rows = search_paths(&store, &QueryFilter::new(10));
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with('/'), "{}", rows[0]);
    assert!(rows[0].ends_with("/factlog-relative-missing.txt"));
}
