//! ClickHouse loader for the chbench load harness.
//!
//! Reads rows in the interchange format and writes them into a normalised
//! ClickHouse schema: one identity table holding every distinct tag set,
//! keyed by a surrogate id, and one metric table per measurement whose rows
//! reference that id through `tags_id`.
//!
//! # Architecture
//!
//! ```text
//!  Header ──► LoadSchema ──► DatabaseCreator (CREATE DATABASE / TABLE)
//!                 │
//!   TableBatch ──►│ Processor (one per worker)
//!                 │   ├─ decode tags and fields
//!                 │   ├─ TagCache::resolve ──► identity table insert
//!                 │   └─ bulk insert into the metric table
//!                 ▼
//!        ColumnStoreDriver (MemoryStore in-process)
//! ```
//!
//! Workers either share one [`TagCache`] or own one each, selected by
//! [`CacheScope`].

pub mod args;
pub mod config;
pub mod creator;
pub mod driver;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod processor;
pub mod schema;
pub mod tag_cache;

pub use args::{ClickhouseArgs, LoadArgs};
pub use config::{CacheScope, ClickhouseConfig};
pub use creator::DatabaseCreator;
pub use driver::{ColumnStoreDriver, StoreConnector, StoreRow};
pub use error::{ConfigError, LoaderError, StoreError};
pub use memory::MemoryStore;
pub use metrics::LoadMetrics;
pub use processor::{Processor, TableBatch};
pub use schema::LoadSchema;
pub use tag_cache::TagCache;
