//! Successful generate -> load runs.

use crate::{column_index, generate_stream, identity_ids, load_args, DB};
use bench_core::ColumnValue;
use chbench::loadtest::load_into;
use loadtest_populate_clickhouse::MemoryStore;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

/// Every metric row's `tags_id` must be the id of its in-table primary tag.
async fn assert_rows_reference_identities(store: &MemoryStore, table: &str, primary: &str) {
    let ids = identity_ids(store, primary).await;
    let key = column_index(store, table, primary).await;
    let tags_id = column_index(store, table, "tags_id").await;

    for row in store.rows(DB, table).await {
        let value = row[key].as_str().unwrap();
        assert_eq!(Some(ids[value]), row[tags_id].as_u32(), "{table} row for {value}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_devops_shared_cache() {
    let dir = TempDir::new().unwrap();
    let (path, generated) = generate_stream(
        dir.path(),
        &["--scale", "5", "--timestamp-end", "2016-01-01T00:01:00Z"],
    );
    assert_eq!(generated, 30);

    let store = MemoryStore::new();
    let args = load_args(
        &path,
        &["--workers", "3", "--batch-size", "4", "--in-table-tag", "--log-batches"],
    );
    let metrics = load_into(&args, Arc::new(store.clone())).await.unwrap();

    assert_eq!(metrics.rows_loaded, 30);
    assert_eq!(metrics.values_loaded, 300);
    assert_eq!(metrics.batch_count, 8);

    let ids = identity_ids(&store, "hostname").await;
    assert_eq!(ids.len(), 5);
    let unique: HashSet<u32> = ids.values().copied().collect();
    assert_eq!(unique, (1..=5).collect::<HashSet<u32>>());

    assert_eq!(store.rows(DB, "cpu").await.len(), 30);
    assert_rows_reference_identities(&store, "cpu", "hostname").await;
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_events_private_cache() {
    let dir = TempDir::new().unwrap();
    let (path, generated) = generate_stream(
        dir.path(),
        &[
            "--use-case",
            "events",
            "--scale",
            "6",
            "--timestamp-end",
            "2016-01-01T00:00:30Z",
            "--user-pool",
            "20",
            "--tenant-pool",
            "3",
        ],
    );
    // Two measurements per session per instant.
    assert_eq!(generated, 36);

    let store = MemoryStore::new();
    let args = load_args(
        &path,
        &[
            "--workers",
            "4",
            "--batch-size",
            "5",
            "--cache-scope",
            "private",
            "--in-table-tag",
        ],
    );
    let metrics = load_into(&args, Arc::new(store.clone())).await.unwrap();
    assert_eq!(metrics.rows_loaded, 36);

    // One identity per session, ids unique across the private caches.
    let ids = identity_ids(&store, "session_id").await;
    assert_eq!(ids.len(), 6);
    let unique: HashSet<u32> = ids.values().copied().collect();
    assert_eq!(unique.len(), 6);

    let identities = store.rows(DB, "tags").await;
    let map = column_index(&store, "tags", "properties_map").await;
    let json = column_index(&store, "tags", "properties_json").await;
    let timestamp = column_index(&store, "tags", "timestamp").await;
    for row in &identities {
        assert!(matches!(&row[map], ColumnValue::Map(m) if !m.is_empty()));
        assert!(row[json].as_str().unwrap().starts_with('{'));
        assert!(matches!(row[timestamp], ColumnValue::Int64(_)));
    }

    let readings = store.rows(DB, "readings").await;
    let diagnostics = store.rows(DB, "diagnostics").await;
    assert_eq!(readings.len() + diagnostics.len(), 36);
    assert_rows_reference_identities(&store, "readings", "session_id").await;
    assert_rows_reference_identities(&store, "diagnostics", "session_id").await;
}

#[tokio::test]
async fn test_count_only_run_leaves_store_untouched() {
    let dir = TempDir::new().unwrap();
    let (path, _) = generate_stream(
        dir.path(),
        &["--scale", "2", "--timestamp-end", "2016-01-01T00:00:20Z"],
    );

    let store = MemoryStore::new();
    let args = load_args(&path, &["--do-load", "false", "--workers", "2"]);
    let metrics = load_into(&args, Arc::new(store.clone())).await.unwrap();

    assert_eq!(metrics.rows_loaded, 4);
    assert_eq!(metrics.values_loaded, 40);
    assert_eq!(store.database_names().await, vec!["default"]);
    assert_eq!(store.insert_batches().await, 0);
}

#[tokio::test]
async fn test_drop_existing_recreates_database() {
    let dir = TempDir::new().unwrap();
    let (path, _) = generate_stream(
        dir.path(),
        &["--scale", "3", "--timestamp-end", "2016-01-01T00:00:10Z"],
    );
    let store = MemoryStore::new();

    let args = load_args(&path, &[]);
    load_into(&args, Arc::new(store.clone())).await.unwrap();
    tokio_test::assert_err!(load_into(&args, Arc::new(store.clone())).await);

    let args = load_args(&path, &["--drop-existing"]);
    load_into(&args, Arc::new(store.clone())).await.unwrap();
    assert_eq!(store.rows(DB, "tags").await.len(), 3);
    assert_eq!(store.rows(DB, "cpu").await.len(), 3);
}
