//! Column-store driver boundary.
//!
//! The loader talks to the target store only through these traits. A wire
//! client plugs in by implementing [`StoreConnector`] and
//! [`ColumnStoreDriver`]; [`crate::memory::MemoryStore`] is the in-process
//! implementation.

use crate::error::StoreError;
use async_trait::async_trait;
use bench_core::ColumnValue;

/// Values of one row, positionally matching an insert's column list.
pub type StoreRow = Vec<ColumnValue>;

/// An open session on one database of the store.
///
/// A session is used by a single worker at a time.
#[async_trait]
pub trait ColumnStoreDriver: Send + Sync {
    /// Run a DDL or DML statement.
    async fn exec(&self, sql: &str) -> Result<(), StoreError>;

    /// Run a query with positional `?` parameters.
    async fn query(&self, sql: &str, params: &[ColumnValue]) -> Result<Vec<StoreRow>, StoreError>;

    /// Insert `rows` into `table` as one batch. `columns` names every value
    /// position. Returns the number of rows written.
    async fn bulk_insert(
        &self,
        table: &str,
        columns: &[String],
        rows: Vec<StoreRow>,
    ) -> Result<u64, StoreError>;

    /// Release the session.
    async fn close(&self) -> Result<(), StoreError>;
}

/// Opens sessions on the store.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Connect to `database`, or to the server's default database when `None`.
    async fn connect(
        &self,
        database: Option<&str>,
    ) -> Result<Box<dyn ColumnStoreDriver>, StoreError>;
}
