//! In-memory column store.
//!
//! Understands the statements the loader issues: `CREATE DATABASE`,
//! `DROP DATABASE [IF EXISTS]`, `CREATE TABLE name (...)` and the
//! `system.databases` lookup. Inserts are checked against the column list of
//! the table's DDL. Failures can be injected per table or for every new
//! connection.

use crate::driver::{ColumnStoreDriver, StoreConnector, StoreRow};
use crate::error::StoreError;
use async_trait::async_trait;
use bench_core::ColumnValue;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Database a session uses when none is requested.
pub const DEFAULT_DATABASE: &str = "default";

const DATABASE_ENGINE: &str = "Atomic";

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    ddl: String,
    columns: Vec<String>,
    rows: Vec<StoreRow>,
}

#[derive(Debug, Default)]
struct MemoryState {
    databases: BTreeMap<String, BTreeMap<String, MemoryTable>>,
    failing_tables: HashSet<String>,
    refuse_connections: bool,
    insert_batches: u64,
}

/// Shared handle to an in-memory store. Clones see the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    open_sessions: Arc<AtomicUsize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store holding only the default database.
    pub fn new() -> Self {
        let mut state = MemoryState::default();
        state
            .databases
            .insert(DEFAULT_DATABASE.to_string(), BTreeMap::new());
        Self {
            state: Arc::new(Mutex::new(state)),
            open_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every following insert into `table` fail.
    pub async fn fail_inserts_into(&self, table: &str) {
        self.state
            .lock()
            .await
            .failing_tables
            .insert(table.to_string());
    }

    /// Make every following connection attempt fail.
    pub async fn refuse_connections(&self, refuse: bool) {
        self.state.lock().await.refuse_connections = refuse;
    }

    /// Remove injected failures.
    pub async fn clear_failures(&self) {
        let mut state = self.state.lock().await;
        state.failing_tables.clear();
        state.refuse_connections = false;
    }

    pub async fn database_names(&self) -> Vec<String> {
        self.state.lock().await.databases.keys().cloned().collect()
    }

    pub async fn table_names(&self, database: &str) -> Vec<String> {
        self.state
            .lock()
            .await
            .databases
            .get(database)
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// DDL text a table was created with.
    pub async fn ddl(&self, database: &str, table: &str) -> Option<String> {
        self.with_table(database, table, |t| t.ddl.clone()).await
    }

    /// Column names parsed from a table's DDL.
    pub async fn columns(&self, database: &str, table: &str) -> Option<Vec<String>> {
        self.with_table(database, table, |t| t.columns.clone()).await
    }

    /// Rows inserted into a table, in insert order.
    pub async fn rows(&self, database: &str, table: &str) -> Vec<StoreRow> {
        self.with_table(database, table, |t| t.rows.clone())
            .await
            .unwrap_or_default()
    }

    /// Number of successful bulk inserts.
    pub async fn insert_batches(&self) -> u64 {
        self.state.lock().await.insert_batches
    }

    /// Sessions connected and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    async fn with_table<T>(
        &self,
        database: &str,
        table: &str,
        f: impl FnOnce(&MemoryTable) -> T,
    ) -> Option<T> {
        let state = self.state.lock().await;
        state
            .databases
            .get(database)
            .and_then(|tables| tables.get(table))
            .map(f)
    }
}

#[async_trait]
impl StoreConnector for MemoryStore {
    async fn connect(
        &self,
        database: Option<&str>,
    ) -> Result<Box<dyn ColumnStoreDriver>, StoreError> {
        let database = database.unwrap_or(DEFAULT_DATABASE);
        {
            let state = self.state.lock().await;
            if state.refuse_connections {
                return Err(StoreError::Connection(format!(
                    "connection to '{database}' refused"
                )));
            }
            if !state.databases.contains_key(database) {
                return Err(StoreError::UnknownDatabase(database.to_string()));
            }
        }

        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        debug!("Opened in-memory session on '{}'", database);
        Ok(Box::new(MemorySession {
            store: self.clone(),
            database: database.to_string(),
            closed: AtomicBool::new(false),
        }))
    }
}

/// One session on a [`MemoryStore`] database.
pub struct MemorySession {
    store: MemoryStore,
    database: String,
    closed: AtomicBool,
}

impl MemorySession {
    fn release(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.store.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("session is closed".to_string()));
        }
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl ColumnStoreDriver for MemorySession {
    async fn exec(&self, sql: &str) -> Result<(), StoreError> {
        self.ensure_open()?;
        let sql = sql.trim().trim_end_matches(';').trim();
        let mut state = self.store.state.lock().await;

        if let Some(rest) = strip_keyword(sql, "DROP DATABASE IF EXISTS") {
            state.databases.remove(identifier(rest));
            return Ok(());
        }
        if let Some(rest) = strip_keyword(sql, "DROP DATABASE") {
            let name = identifier(rest);
            return match state.databases.remove(name) {
                Some(_) => Ok(()),
                None => Err(StoreError::UnknownDatabase(name.to_string())),
            };
        }
        if let Some(rest) = strip_keyword(sql, "CREATE DATABASE") {
            let name = identifier(rest);
            if state.databases.contains_key(name) {
                return Err(StoreError::DatabaseExists(name.to_string()));
            }
            state.databases.insert(name.to_string(), BTreeMap::new());
            return Ok(());
        }
        if let Some(rest) = strip_keyword(sql, "CREATE TABLE") {
            let (name, columns) = parse_table_definition(rest)?;
            let tables = state
                .databases
                .get_mut(&self.database)
                .ok_or_else(|| StoreError::UnknownDatabase(self.database.clone()))?;
            if tables.contains_key(&name) {
                return Err(StoreError::TableExists(name));
            }
            tables.insert(
                name,
                MemoryTable {
                    ddl: sql.to_string(),
                    columns,
                    rows: Vec::new(),
                },
            );
            return Ok(());
        }

        Err(StoreError::Statement(format!("unsupported statement: {sql}")))
    }

    async fn query(&self, sql: &str, params: &[ColumnValue]) -> Result<Vec<StoreRow>, StoreError> {
        self.ensure_open()?;
        if !sql.contains("system.databases") {
            return Err(StoreError::Statement(format!("unsupported query: {sql}")));
        }

        let wanted = params.first().and_then(ColumnValue::as_str);
        let state = self.store.state.lock().await;
        Ok(state
            .databases
            .keys()
            .filter(|name| wanted.map_or(true, |wanted| wanted == name.as_str()))
            .map(|name| {
                vec![
                    ColumnValue::String(name.clone()),
                    ColumnValue::String(DATABASE_ENGINE.to_string()),
                ]
            })
            .collect())
    }

    async fn bulk_insert(
        &self,
        table: &str,
        columns: &[String],
        rows: Vec<StoreRow>,
    ) -> Result<u64, StoreError> {
        self.ensure_open()?;
        let mut state = self.store.state.lock().await;
        if state.failing_tables.contains(table) {
            return Err(StoreError::Insert {
                table: table.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        let target = state
            .databases
            .get_mut(&self.database)
            .ok_or_else(|| StoreError::UnknownDatabase(self.database.clone()))?
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;

        if target.columns != columns {
            return Err(StoreError::Insert {
                table: table.to_string(),
                reason: format!(
                    "column list [{}] does not match table columns [{}]",
                    columns.join(", "),
                    target.columns.join(", ")
                ),
            });
        }
        if let Some(bad) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(StoreError::Insert {
                table: table.to_string(),
                reason: format!("row has {} values for {} columns", bad.len(), columns.len()),
            });
        }

        let written = rows.len() as u64;
        target.rows.extend(rows);
        state.insert_batches += 1;
        Ok(written)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.release();
        Ok(())
    }
}

/// Strip a leading keyword sequence, ignoring ASCII case.
fn strip_keyword<'a>(sql: &'a str, keyword: &str) -> Option<&'a str> {
    let head = sql.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &sql[keyword.len()..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim_start())
}

/// First identifier of `text`.
fn identifier(text: &str) -> &str {
    text.split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
}

/// Parse `name (col type, ...) ENGINE ...` into the table name and its columns.
fn parse_table_definition(text: &str) -> Result<(String, Vec<String>), StoreError> {
    let malformed = || StoreError::Statement(format!("malformed table definition: {text}"));

    let open = text.find('(').ok_or_else(malformed)?;
    let name = text[..open].trim();
    if name.is_empty() {
        return Err(malformed());
    }

    let body = &text[open + 1..];
    let mut depth = 0usize;
    let mut end = None;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => {
                end = Some(i);
                break;
            }
            ')' => depth -= 1,
            _ => {}
        }
    }
    let body = &body[..end.ok_or_else(malformed)?];

    let columns = split_top_level(body)
        .into_iter()
        .filter_map(|definition| definition.split_whitespace().next())
        .map(str::to_string)
        .collect();
    Ok((name.to_string(), columns))
}

/// Split on commas outside parentheses.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
