//! Core types for the chbench load harness.
//!
//! This crate provides the types shared by the generator and the loader:
//!
//! - [`SerializedType`] - Type tags declared in the interchange header
//! - [`ColumnKind`] - Storage kind of a column after reserved-name overrides
//! - [`ColumnValue`] - Native column values produced by coercion
//! - [`SampleValue`] - Values produced by the generator before rendering
//! - [`Header`] - Tag keys/types and per-table field columns
//! - [`Row`] / [`InsertData`] - One sample and its dual-string rendering
//!
//! # Architecture
//!
//! ```text
//! loadtest-generator ──► Row ──► InsertData { tags, fields } ──► stream
//!                                                                  │
//! loadtest-populate-clickhouse ◄── (table, InsertData) ◄───────────┘
//!        │
//!        └── ColumnKind::coerce ──► ColumnValue ──► column store
//! ```
//!
//! # Example
//!
//! ```rust
//! use bench_core::{ColumnKind, ColumnValue, SerializedType};
//!
//! let kind = ColumnKind::resolve("usage_user", SerializedType::Float64);
//! assert_eq!(kind.coerce("58.5").unwrap(), ColumnValue::Float64(58.5));
//! assert_eq!(kind.coerce("").unwrap(), ColumnValue::Null);
//! ```

pub mod error;
pub mod header;
pub mod inline;
pub mod row;
pub mod stream;
pub mod types;

pub use error::{CoerceError, InterchangeError};
pub use header::{Header, TableColumns};
pub use inline::{decode_inline, encode_inline, InlineKind, InlinePayload};
pub use row::{split_fields, split_tag_values, InsertData, Row, SampleValue};
pub use stream::{InterchangeReader, InterchangeWriter};
pub use types::{
    ColumnKind, ColumnValue, SerializedType, PROPERTIES_JSON_COLUMN, PROPERTIES_MAP_COLUMN,
};
