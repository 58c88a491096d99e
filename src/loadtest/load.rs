//! Load command handler: read an interchange stream and load it with a pool
//! of processors.
//!
//! ```text
//! reader (blocking task) ──► per-worker channel ──► Processor ──► store
//! ```
//!
//! With a shared cache scope full batches go to workers round-robin. With a
//! private scope each row goes to the worker chosen by hashing its primary tag
//! value, so every value is cached and persisted by exactly one worker.

use super::logging::mask_connection_password;
use anyhow::Context;
use bench_core::{split_tag_values, Header, InterchangeReader};
use loadtest_populate_clickhouse::{
    CacheScope, ClickhouseConfig, DatabaseCreator, LoadArgs, LoadMetrics, LoadSchema,
    LoaderError, MemoryStore, Processor, StoreConnector, TableBatch, TagCache,
};
use std::collections::hash_map::DefaultHasher;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Batches in flight per worker.
const CHANNEL_DEPTH: usize = 4;

/// Open the input file, or stdin when none is given.
fn open_input(input: Option<&Path>) -> anyhow::Result<InterchangeReader<Box<dyn BufRead + Send>>> {
    let source: Box<dyn BufRead + Send> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };
    Ok(InterchangeReader::new(source))
}

/// Worker index for a row under private cache scope.
fn route(tags: &str, workers: usize) -> Result<usize, bench_core::InterchangeError> {
    let values = split_tag_values(tags, 1)?;
    let mut hasher = DefaultHasher::new();
    values[0].hash(&mut hasher);
    Ok((hasher.finish() % workers as u64) as usize)
}

/// Read rows and hand batches to workers. Returns the number of rows read.
fn dispatch<R: BufRead>(
    mut reader: InterchangeReader<R>,
    senders: Vec<mpsc::Sender<TableBatch>>,
    scope: CacheScope,
    batch_size: usize,
) -> anyhow::Result<u64> {
    let workers = senders.len();
    let mut pending: Vec<TableBatch> = (0..workers).map(|_| TableBatch::new()).collect();
    let mut next_worker = 0;
    let mut rows = 0u64;

    let send = |worker: usize, batch: TableBatch| -> anyhow::Result<()> {
        senders[worker]
            .blocking_send(batch)
            .map_err(|_| anyhow::anyhow!("Worker {worker} stopped before the input ended"))
    };

    while let Some((table, data)) = reader.read_row().context("Failed to decode input")? {
        rows += 1;
        let worker = match scope {
            CacheScope::Shared => next_worker,
            CacheScope::Private => route(&data.tags, workers).context("Failed to route row")?,
        };
        pending[worker].push(table, data);

        if pending[worker].len() >= batch_size {
            send(worker, std::mem::take(&mut pending[worker]))?;
            if scope == CacheScope::Shared {
                next_worker = (next_worker + 1) % workers;
            }
        }
    }

    for (worker, batch) in pending.into_iter().enumerate() {
        if !batch.is_empty() {
            send(worker, batch)?;
        }
    }
    Ok(rows)
}

/// Drain one worker's channel through its processor.
async fn run_worker(
    id: usize,
    mut processor: Processor,
    mut batches: mpsc::Receiver<TableBatch>,
) -> Result<LoadMetrics, LoaderError> {
    let start = Instant::now();
    let mut metrics = LoadMetrics::default();

    while let Some(batch) = batches.recv().await {
        let (values, rows) = processor.process_batch(batch).await?;
        metrics.record(values, rows);
        tracing::debug!("Worker {} loaded {} rows ({} values)", id, rows, values);
    }

    processor.close().await?;
    metrics.total_duration = start.elapsed();
    Ok(metrics)
}

/// Prepare the target database for `schema`.
async fn prepare_database(
    config: &Arc<ClickhouseConfig>,
    connector: &Arc<dyn StoreConnector>,
    schema: &LoadSchema,
    drop_existing: bool,
) -> anyhow::Result<()> {
    let creator = DatabaseCreator::new(Arc::clone(config), Arc::clone(connector));
    let name = &config.db_name;

    if creator.database_exists(name).await? {
        if !drop_existing {
            anyhow::bail!("Database '{name}' already exists (use --drop-existing to recreate it)");
        }
        creator.remove_database(name).await?;
    }
    creator
        .create_database(name, schema)
        .await
        .with_context(|| format!("Failed to create database '{name}'"))?;
    Ok(())
}

/// Load the stream named by `args` into the store behind `connector`.
pub async fn load_into(
    args: &LoadArgs,
    connector: Arc<dyn StoreConnector>,
) -> anyhow::Result<LoadMetrics> {
    let scope = args.cache_scope()?;
    if args.workers == 0 || args.batch_size == 0 {
        anyhow::bail!("--workers and --batch-size must be at least 1");
    }
    let config = Arc::new(args.clickhouse.to_config());

    let input = args.input.clone();
    let (reader, header): (_, Header) = tokio::task::spawn_blocking(move || {
        let mut reader = open_input(input.as_deref())?;
        let header = reader.read_header().context("Failed to read stream header")?;
        anyhow::Ok((reader, header))
    })
    .await
    .context("Header reader panicked")??;

    let schema = Arc::new(
        LoadSchema::new(header, config.identity_table.clone(), config.in_table_tag)
            .context("Invalid stream header")?,
    );
    tracing::info!(
        "Loading {} tables into {} with {} workers (batch size {}, {} tag cache)",
        schema.header().tables().len(),
        mask_connection_password(&config.connection_string(Some(&config.db_name))),
        args.workers,
        args.batch_size,
        scope
    );

    if args.do_load {
        prepare_database(&config, &connector, &schema, args.drop_existing).await?;
    }

    let start = Instant::now();
    let shared = Arc::new(TagCache::new());
    let mut senders = Vec::with_capacity(args.workers);
    let mut handles = Vec::with_capacity(args.workers);
    for id in 0..args.workers {
        let mut processor = Processor::new(Arc::clone(&config), Arc::clone(&schema), args.do_load)
            .with_worker(id, args.workers);
        processor
            .init(connector.as_ref(), scope, &shared)
            .await
            .with_context(|| format!("Failed to start worker {id}"))?;

        let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
        senders.push(tx);
        handles.push(tokio::spawn(run_worker(id, processor, rx)));
    }

    let batch_size = args.batch_size;
    let reader_handle =
        tokio::task::spawn_blocking(move || dispatch(reader, senders, scope, batch_size));

    let mut metrics = LoadMetrics::default();
    let mut worker_error = None;
    for (id, handle) in handles.into_iter().enumerate() {
        match handle.await.context("Worker panicked")? {
            Ok(worker) => metrics.merge(&worker),
            Err(e) => {
                tracing::error!("Worker {} failed: {}", id, e);
                worker_error.get_or_insert(e);
            }
        }
    }
    let read = reader_handle.await.context("Input reader panicked")?;

    // A worker failure also stops the reader; report the cause.
    if let Some(e) = worker_error {
        return Err(anyhow::Error::new(e).context("Load aborted"));
    }
    let rows_read = read?;
    metrics.total_duration = start.elapsed();

    if rows_read != metrics.rows_loaded {
        tracing::warn!(
            "Read {} rows but processed {}",
            rows_read,
            metrics.rows_loaded
        );
    }
    if scope == CacheScope::Shared && args.do_load {
        tracing::info!("Tag cache holds {} identities", shared.len().await);
    }
    Ok(metrics)
}

/// Run the load command against an in-process store.
pub async fn run_load(args: LoadArgs) -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let metrics = load_into(&args, Arc::new(store.clone())).await?;

    tracing::info!(
        "Loaded {} rows ({} values) in {} batches in {:?}: {:.2} rows/sec, {:.2} values/sec",
        metrics.rows_loaded,
        metrics.values_loaded,
        metrics.batch_count,
        metrics.total_duration,
        metrics.rows_per_second(),
        metrics.values_per_second()
    );
    if args.do_load {
        let db = &args.clickhouse.db_name;
        for table in store.table_names(db).await {
            tracing::info!("{}.{}: {} rows", db, table, store.rows(db, &table).await.len());
        }
    }

    // Single JSON line for scripts
    println!("{}", serde_json::to_string(&metrics)?);
    Ok(())
}
