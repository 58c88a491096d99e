//! Error types for the ClickHouse loader.

use bench_core::{CoerceError, InterchangeError};
use thiserror::Error;

/// Errors raised at the column-store driver boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Connection could not be established or was lost.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Database does not exist.
    #[error("Unknown database: {0}")]
    UnknownDatabase(String),

    /// Database already exists.
    #[error("Database already exists: {0}")]
    DatabaseExists(String),

    /// Table does not exist in the connected database.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Table already exists in the connected database.
    #[error("Table already exists: {0}")]
    TableExists(String),

    /// Statement was rejected.
    #[error("Statement failed: {0}")]
    Statement(String),

    /// Bulk insert was rejected.
    #[error("Insert into '{table}' failed: {reason}")]
    Insert { table: String, reason: String },
}

/// Errors in the loader setup. Fatal before any row is processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Cache scope other than `private` or `shared`.
    #[error("unknown access mode '{0}' (expected one of: private, shared)")]
    UnknownAccessMode(String),

    /// Header tag names and tag types differ in length.
    #[error("wrong number of tag names ({names}) and tag types ({types})")]
    TagCountMismatch { names: usize, types: usize },

    /// Header declares no tags, so there is no primary tag to identify rows.
    #[error("header declares no tags")]
    NoTags,

    /// Header declares no measurement tables.
    #[error("header declares no tables")]
    NoTables,
}

/// Errors that abort a load run.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Setup error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store connectivity, DDL or DML error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Malformed interchange row or header.
    #[error("Decode error: {0}")]
    Interchange(#[from] InterchangeError),

    /// Unparseable literal for a column.
    #[error("Coercion error in column '{column}': {source}")]
    Coerce {
        column: String,
        #[source]
        source: CoerceError,
    },

    /// Row names a table the header does not declare.
    #[error("Table '{0}' not declared in header")]
    UnknownTable(String),

    /// Row's field count differs from the table's declared field columns.
    #[error("Table '{table}' expects {expected} fields, row has {actual}")]
    FieldCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// Primary tag value had no surrogate id after allocation.
    #[error("No surrogate id for primary tag value '{0}'")]
    Unresolved(String),

    /// Operation not allowed in the processor's current state.
    #[error("Processor is {0}")]
    InvalidState(&'static str),
}
