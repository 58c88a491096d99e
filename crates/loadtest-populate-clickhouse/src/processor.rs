//! Batch processor: decodes interchange rows and writes them to the store.
//!
//! Lifecycle:
//!
//! ```text
//! Uninitialized ──init──► Ready ──process_batch──► Ready
//!                           │                        │ (error)
//!                           └────────close───────► Closed
//! ```
//!
//! `Closed` is terminal. A failed batch closes the processor: the run is
//! expected to abort and be restarted against a recreated database.

use crate::config::{CacheScope, ClickhouseConfig};
use crate::driver::{ColumnStoreDriver, StoreConnector, StoreRow};
use crate::error::LoaderError;
use crate::schema::{LoadSchema, MetricTable, TAGS_ID_POSITION};
use crate::tag_cache::{IdentityStore, NewIdentity, TagCache, TagValues};
use async_trait::async_trait;
use bench_core::{split_fields, split_tag_values, ColumnKind, ColumnValue, InsertData};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Rendering of the `time` column.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f %z";

/// Rows accumulated per table until the next flush.
///
/// Rows of one table keep their arrival order.
#[derive(Debug, Default)]
pub struct TableBatch {
    tables: BTreeMap<String, Vec<InsertData>>,
    rows: usize,
}

impl TableBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: impl Into<String>, data: InsertData) {
        self.tables.entry(table.into()).or_default().push(data);
        self.rows += 1;
    }

    /// Total rows across tables.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &[InsertData])> {
        self.tables
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }
}

struct Session {
    driver: Box<dyn ColumnStoreDriver>,
    cache: Arc<TagCache>,
}

enum State {
    Uninitialized,
    /// `session` is `None` when loading is disabled.
    Ready { session: Option<Session> },
    Closed,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready { .. } => "ready",
            Self::Closed => "closed",
        }
    }
}

/// Per-worker processor. Owns one store session.
pub struct Processor {
    config: Arc<ClickhouseConfig>,
    schema: Arc<LoadSchema>,
    do_load: bool,
    worker: usize,
    workers: usize,
    state: State,
}

impl Processor {
    /// Create a processor. With `do_load` false rows are decoded and counted
    /// but nothing is written.
    pub fn new(config: Arc<ClickhouseConfig>, schema: Arc<LoadSchema>, do_load: bool) -> Self {
        Self {
            config,
            schema,
            do_load,
            worker: 0,
            workers: 1,
            state: State::Uninitialized,
        }
    }

    /// Position of this processor in a pool of `workers`. Selects the id
    /// sequence of a private cache.
    pub fn with_worker(mut self, worker: usize, workers: usize) -> Self {
        self.worker = worker;
        self.workers = workers;
        self
    }

    /// Name of the current lifecycle state.
    pub fn state(&self) -> &'static str {
        self.state.name()
    }

    /// Open a session on the configured database and select the cache.
    ///
    /// `shared` is used for [`CacheScope::Shared`]; a private scope gets a
    /// fresh cache owned by this processor, allocating from the id sequence
    /// of its worker position.
    pub async fn init(
        &mut self,
        connector: &dyn StoreConnector,
        scope: CacheScope,
        shared: &Arc<TagCache>,
    ) -> Result<(), LoaderError> {
        if !matches!(self.state, State::Uninitialized) {
            return Err(LoaderError::InvalidState(self.state.name()));
        }

        let session = if self.do_load {
            let driver = connector.connect(Some(&self.config.db_name)).await?;
            let cache = match scope {
                CacheScope::Shared => Arc::clone(shared),
                CacheScope::Private => {
                    Arc::new(TagCache::partitioned(self.worker, self.workers))
                }
            };
            debug!(
                "Processor connected to '{}' with {} tag cache",
                self.config.db_name, scope
            );
            Some(Session { driver, cache })
        } else {
            None
        };

        self.state = State::Ready { session };
        Ok(())
    }

    /// Write every table of `batch` and return `(values, rows)` processed.
    ///
    /// Values exclude the sample time. On error the processor is closed.
    pub async fn process_batch(&mut self, batch: TableBatch) -> Result<(u64, u64), LoaderError> {
        let result = match &self.state {
            State::Ready { session } => {
                self.write_batch(session.as_ref(), &batch).await
            }
            other => return Err(LoaderError::InvalidState(other.name())),
        };

        if result.is_err() {
            if let Err(e) = self.close().await {
                warn!("Failed to close processor after error: {}", e);
            }
        }
        result
    }

    async fn write_batch(
        &self,
        session: Option<&Session>,
        batch: &TableBatch,
    ) -> Result<(u64, u64), LoaderError> {
        let mut values = 0u64;
        let mut rows = 0u64;

        for (table, table_rows) in batch.tables() {
            rows += table_rows.len() as u64;
            let Some(session) = session else {
                values += self.count_values(table, table_rows)?;
                continue;
            };

            let start = Instant::now();
            values += self.write_table(session, table, table_rows).await?;

            if self.config.log_batches {
                let took = start.elapsed();
                let rate = if took.as_secs_f64() > 0.0 {
                    table_rows.len() as f64 / took.as_secs_f64()
                } else {
                    0.0
                };
                info!(
                    "BATCH: batchsize {} row rate {:.2}/sec (took {:?})",
                    table_rows.len(),
                    rate,
                    took
                );
            }
        }

        Ok((values, rows))
    }

    /// Decode without writing; returns the value count.
    fn count_values(&self, table: &str, rows: &[InsertData]) -> Result<u64, LoaderError> {
        let metric = self.metric_table(table)?;
        let mut values = 0;
        for row in rows {
            split_tag_values(&row.tags, self.schema.tag_count())?;
            let (_, fields) = split_fields(&row.fields)?;
            check_field_count(metric, fields.len())?;
            values += fields.len() as u64;
        }
        Ok(values)
    }

    async fn write_table(
        &self,
        session: &Session,
        table: &str,
        rows: &[InsertData],
    ) -> Result<u64, LoaderError> {
        let metric = self.metric_table(table)?;
        let tag_count = self.schema.tag_count();

        let mut tag_rows: Vec<TagValues<'_>> = Vec::with_capacity(rows.len());
        let mut data_rows: Vec<StoreRow> = Vec::with_capacity(rows.len());
        let mut values = 0u64;

        for row in rows {
            let tags = split_tag_values(&row.tags, tag_count)?;
            let (time, fields) = split_fields(&row.fields)?;
            check_field_count(metric, fields.len())?;
            values += fields.len() as u64;

            let mut data = Vec::with_capacity(metric.columns.len());
            data.push(ColumnValue::Date(time.date_naive()));
            data.push(ColumnValue::DateTime(time));
            data.push(ColumnValue::String(time.format(TIME_FORMAT).to_string()));
            data.push(ColumnValue::Null);
            if self.schema.in_table_tag() {
                let kind = self.schema.tag_kinds()[0];
                data.push(coerce_column(self.schema.primary_tag(), kind, tags[0])?);
            }
            for ((name, kind), raw) in metric.fields.iter().zip(&metric.field_kinds).zip(fields) {
                data.push(coerce_column(name, *kind, raw)?);
            }

            tag_rows.push(tags);
            data_rows.push(data);
        }

        let writer = IdentityWriter {
            driver: session.driver.as_ref(),
            schema: &self.schema,
        };
        let ids = session.cache.resolve(&tag_rows, &writer).await?;
        for (data, id) in data_rows.iter_mut().zip(ids) {
            data[TAGS_ID_POSITION] = ColumnValue::UInt32(id);
        }

        session
            .driver
            .bulk_insert(table, &metric.columns, data_rows)
            .await?;
        Ok(values)
    }

    fn metric_table(&self, table: &str) -> Result<&MetricTable, LoaderError> {
        self.schema
            .table(table)
            .ok_or_else(|| LoaderError::UnknownTable(table.to_string()))
    }

    /// Release the store session. Further calls fail.
    pub async fn close(&mut self) -> Result<(), LoaderError> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Ready {
                session: Some(session),
            } => {
                session.driver.close().await?;
                Ok(())
            }
            State::Ready { session: None } | State::Uninitialized => Ok(()),
            State::Closed => Err(LoaderError::InvalidState("closed")),
        }
    }
}

fn check_field_count(metric: &MetricTable, actual: usize) -> Result<(), LoaderError> {
    if actual != metric.fields.len() {
        return Err(LoaderError::FieldCountMismatch {
            table: metric.name.clone(),
            expected: metric.fields.len(),
            actual,
        });
    }
    Ok(())
}

/// Coerce a literal, filling the default of non-nullable column types.
fn coerce_column(column: &str, kind: ColumnKind, raw: &str) -> Result<ColumnValue, LoaderError> {
    let value = kind
        .coerce(raw)
        .map_err(|source| LoaderError::Coerce {
            column: column.to_string(),
            source,
        })?;
    Ok(match (value, kind) {
        (ColumnValue::Null, ColumnKind::Map) => ColumnValue::Map(BTreeMap::new()),
        (ColumnValue::Null, ColumnKind::Text) => ColumnValue::String(String::new()),
        (value, _) => value,
    })
}

/// Persists new identity rows through a worker's session.
struct IdentityWriter<'a> {
    driver: &'a dyn ColumnStoreDriver,
    schema: &'a LoadSchema,
}

impl IdentityWriter<'_> {
    fn identity_row(
        &self,
        identity: &NewIdentity<'_>,
        now: DateTime<Utc>,
    ) -> Result<StoreRow, LoaderError> {
        let mut row = Vec::with_capacity(self.schema.identity_columns().len());
        row.push(ColumnValue::Date(now.date_naive()));
        row.push(ColumnValue::DateTime(now));
        row.push(ColumnValue::UInt32(identity.id));

        let keys = self.schema.header().tag_keys();
        for ((key, kind), raw) in keys.iter().zip(self.schema.tag_kinds()).zip(identity.tags) {
            row.push(coerce_column(key, *kind, raw)?);
        }
        Ok(row)
    }
}

#[async_trait]
impl IdentityStore for IdentityWriter<'_> {
    async fn persist(&self, identities: &[NewIdentity<'_>]) -> Result<(), LoaderError> {
        let now = Utc::now();
        let rows = identities
            .iter()
            .map(|identity| self.identity_row(identity, now))
            .collect::<Result<Vec<_>, _>>()?;

        self.driver
            .bulk_insert(
                self.schema.identity_table(),
                self.schema.identity_columns(),
                rows,
            )
            .await?;
        Ok(())
    }
}
