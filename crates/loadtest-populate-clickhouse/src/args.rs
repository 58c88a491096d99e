//! CLI argument definitions for the ClickHouse loader.

use crate::config::{CacheScope, ClickhouseConfig, DEFAULT_IDENTITY_TABLE};
use crate::error::ConfigError;
use clap::Args;
use std::path::PathBuf;

/// ClickHouse connection and table layout arguments.
#[derive(Args, Clone, Debug)]
pub struct ClickhouseArgs {
    /// ClickHouse host
    #[arg(long, env = "CLICKHOUSE_HOST", default_value = "localhost")]
    pub host: String,

    /// ClickHouse user
    #[arg(long, env = "CLICKHOUSE_USER", default_value = "default")]
    pub user: String,

    /// ClickHouse password
    #[arg(long, env = "CLICKHOUSE_PASSWORD", default_value = "")]
    pub password: String,

    /// Database to create and load into
    #[arg(long, default_value = "benchmark")]
    pub db_name: String,

    /// Store the primary tag in every metric table, next to tags_id
    #[arg(long)]
    pub in_table_tag: bool,

    /// Log timing of every flushed batch
    #[arg(long)]
    pub log_batches: bool,

    /// Debug level (DDL statements are logged when > 0)
    #[arg(long, default_value = "0")]
    pub debug: u8,

    /// Name of the table holding one row per primary tag value
    #[arg(long, default_value = DEFAULT_IDENTITY_TABLE)]
    pub identity_table: String,
}

impl ClickhouseArgs {
    pub fn to_config(&self) -> ClickhouseConfig {
        ClickhouseConfig {
            host: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            db_name: self.db_name.clone(),
            in_table_tag: self.in_table_tag,
            log_batches: self.log_batches,
            debug: self.debug,
            identity_table: self.identity_table.clone(),
        }
    }
}

/// Load run arguments.
#[derive(Args, Clone, Debug)]
pub struct LoadArgs {
    /// Interchange stream to load (stdin when absent)
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(long, default_value = "1")]
    pub workers: usize,

    /// Rows per flushed batch
    #[arg(long, default_value = "10000")]
    pub batch_size: usize,

    /// Tag identity cache scope: shared (one cache for all workers) or
    /// private (one per worker, rows routed to workers by primary tag)
    #[arg(long, default_value = "shared")]
    pub cache_scope: String,

    /// Write to the store; when false rows are only decoded and counted
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub do_load: bool,

    /// Drop the database first if it already exists
    #[arg(long)]
    pub drop_existing: bool,

    #[command(flatten)]
    pub clickhouse: ClickhouseArgs,
}

impl LoadArgs {
    pub fn cache_scope(&self) -> Result<CacheScope, ConfigError> {
        self.cache_scope.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        load: LoadArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["test"]).unwrap();
        assert_eq!(cli.load.workers, 1);
        assert_eq!(cli.load.batch_size, 10000);
        assert!(cli.load.do_load);
        assert_eq!(cli.load.cache_scope().unwrap(), CacheScope::Shared);
        assert_eq!(cli.load.clickhouse.identity_table, "tags");
    }

    #[test]
    fn test_to_config() {
        let cli = TestCli::try_parse_from([
            "test",
            "--db-name",
            "bench",
            "--in-table-tag",
            "--do-load",
            "false",
            "--cache-scope",
            "private",
        ])
        .unwrap();
        let config = cli.load.clickhouse.to_config();
        assert_eq!(config.db_name, "bench");
        assert!(config.in_table_tag);
        assert!(!cli.load.do_load);
        assert_eq!(cli.load.cache_scope().unwrap(), CacheScope::Private);
    }

    #[test]
    fn test_unknown_cache_scope() {
        let cli = TestCli::try_parse_from(["test", "--cache-scope", "global"]).unwrap();
        assert!(matches!(
            cli.load.cache_scope(),
            Err(ConfigError::UnknownAccessMode(_))
        ));
    }
}
