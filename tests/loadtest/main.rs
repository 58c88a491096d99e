//! Load testing integration tests.
//!
//! These tests run the generate -> stream -> load workflow against the
//! in-memory store. Each test:
//! 1. Generates a deterministic stream (fixed seed) into a temporary file
//! 2. Loads it with a pool of workers
//! 3. Checks the identity table, the metric tables and the run metrics

mod failures;
mod pipeline;

use bench_core::ColumnValue;
use chbench::loadtest::{generate_into, GenerateArgs};
use clap::Parser;
use loadtest_populate_clickhouse::{LoadArgs, MemoryStore};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const SEED: u64 = 42;
pub const DB: &str = "benchmark";

#[derive(Parser, Debug)]
struct GenerateCli {
    #[command(flatten)]
    args: GenerateArgs,
}

#[derive(Parser, Debug)]
struct LoadCli {
    #[command(flatten)]
    args: LoadArgs,
}

/// Generate a stream into `dir` and return its path and row count.
pub fn generate_stream(dir: &Path, extra: &[&str]) -> (PathBuf, u64) {
    let path = dir.join("stream.txt");
    let seed = SEED.to_string();
    let mut argv = vec!["generate", "--seed", seed.as_str()];
    argv.extend_from_slice(extra);
    let cli = GenerateCli::try_parse_from(argv).unwrap();

    let file = File::create(&path).unwrap();
    let rows = generate_into(&cli.args, BufWriter::new(file)).unwrap();
    (path, rows)
}

/// Load arguments reading `input`.
pub fn load_args(input: &Path, extra: &[&str]) -> LoadArgs {
    let input = input.to_str().unwrap();
    let mut argv = vec!["load", "--input", input];
    argv.extend_from_slice(extra);
    LoadCli::try_parse_from(argv).unwrap().args
}

/// Index of `column` in `table`.
pub async fn column_index(store: &MemoryStore, table: &str, column: &str) -> usize {
    store
        .columns(DB, table)
        .await
        .unwrap()
        .iter()
        .position(|c| c == column)
        .unwrap()
}

/// Primary tag value to surrogate id, read back from the identity table.
pub async fn identity_ids(store: &MemoryStore, primary: &str) -> HashMap<String, u32> {
    let key = column_index(store, "tags", primary).await;
    let id = column_index(store, "tags", "id").await;
    store
        .rows(DB, "tags")
        .await
        .iter()
        .map(|row| {
            let value = match &row[key] {
                ColumnValue::String(s) => s.clone(),
                other => panic!("Expected string primary tag, got {other:?}"),
            };
            (value, row[id].as_u32().unwrap())
        })
        .collect()
}
