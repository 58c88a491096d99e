//! Runs that must abort.

use crate::{generate_stream, load_args};
use chbench::loadtest::load_into;
use loadtest_populate_clickhouse::MemoryStore;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_malformed_stream_aborts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.txt");
    std::fs::write(
        &path,
        "tags,hostname string\ncpu,usage_user\n\n\
         tags,hostname=host_0\ncpu,1451606400000000000,12.5\n\
         tags,hostname=host_1\n",
    )
    .unwrap();

    let store = MemoryStore::new();
    let result = load_into(&load_args(&path, &[]), Arc::new(store)).await;
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Failed to decode input"), "{message}");
}

#[tokio::test]
async fn test_unparseable_field_aborts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad_value.txt");
    std::fs::write(
        &path,
        "tags,hostname string\ncpu,usage_user\n\n\
         tags,hostname=host_0\ncpu,1451606400000000000,busy\n",
    )
    .unwrap();

    let store = MemoryStore::new();
    let result = load_into(&load_args(&path, &[]), Arc::new(store.clone())).await;
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("usage_user"), "{message}");
    assert!(store.rows("benchmark", "cpu").await.is_empty());
}

#[tokio::test]
async fn test_identity_insert_failure_aborts() {
    let dir = TempDir::new().unwrap();
    let (path, _) = generate_stream(
        dir.path(),
        &["--scale", "2", "--timestamp-end", "2016-01-01T00:00:10Z"],
    );

    let store = MemoryStore::new();
    store.fail_inserts_into("tags").await;
    let result = load_into(&load_args(&path, &["--workers", "2"]), Arc::new(store.clone())).await;
    tokio_test::assert_err!(result);
    assert!(store.rows("benchmark", "cpu").await.is_empty());
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test]
async fn test_unknown_cache_scope_rejected() {
    let dir = TempDir::new().unwrap();
    let (path, _) = generate_stream(
        dir.path(),
        &["--scale", "1", "--timestamp-end", "2016-01-01T00:00:10Z"],
    );
    let args = load_args(&path, &["--cache-scope", "global"]);
    let result = load_into(&args, Arc::new(MemoryStore::new())).await;
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("unknown access mode"), "{message}");
}
