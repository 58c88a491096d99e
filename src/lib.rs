//! chbench library
//!
//! Command handlers behind the `chbench` binary: a deterministic generator
//! writing the interchange stream, and a loader reading it into a normalised
//! ClickHouse schema with a pool of workers.
//!
//! # Crates
//!
//! - `bench_core` - interchange types, header and stream format
//! - `loadtest_generator` - simulated entities and use cases
//! - `loadtest_populate_clickhouse` - schema builder, tag identity cache and
//!   batch processor
//!
//! # CLI Usage
//!
//! ```bash
//! # Write one simulated day of 100 hosts to a file
//! chbench generate --use-case devops --scale 100 -o devops.txt
//!
//! # Load it with 4 workers sharing one tag cache
//! chbench load -i devops.txt --workers 4 --cache-scope shared
//! ```

pub mod config;
pub mod loadtest;
