//! Database administration: existence check, drop, and schema creation.

use crate::config::ClickhouseConfig;
use crate::driver::{ColumnStoreDriver, StoreConnector};
use crate::error::LoaderError;
use crate::schema::LoadSchema;
use bench_core::ColumnValue;
use std::sync::Arc;
use tracing::{debug, info};

/// Creates and removes the benchmark database.
pub struct DatabaseCreator {
    config: Arc<ClickhouseConfig>,
    connector: Arc<dyn StoreConnector>,
}

impl DatabaseCreator {
    pub fn new(config: Arc<ClickhouseConfig>, connector: Arc<dyn StoreConnector>) -> Self {
        Self { config, connector }
    }

    /// Whether `name` exists on the server.
    pub async fn database_exists(&self, name: &str) -> Result<bool, LoaderError> {
        let session = self.connector.connect(None).await?;
        let result = session
            .query(
                "SELECT name, engine FROM system.databases WHERE name = ?",
                &[ColumnValue::String(name.to_string())],
            )
            .await;
        session.close().await?;

        let rows = result?;
        Ok(rows
            .iter()
            .any(|row| row.first().and_then(ColumnValue::as_str) == Some(name)))
    }

    /// Drop `name` if it exists.
    pub async fn remove_database(&self, name: &str) -> Result<(), LoaderError> {
        let session = self.connector.connect(None).await?;
        let result = session
            .exec(&format!("DROP DATABASE IF EXISTS {name}"))
            .await;
        session.close().await?;
        result?;
        info!("Dropped database '{}'", name);
        Ok(())
    }

    /// Create `name` with its identity table and one table per measurement.
    pub async fn create_database(&self, name: &str, schema: &LoadSchema) -> Result<(), LoaderError> {
        let admin = self.connector.connect(None).await?;
        let created = admin.exec(&format!("CREATE DATABASE {name}")).await;
        admin.close().await?;
        created?;

        let session = self.connector.connect(Some(name)).await?;
        let result = self.create_tables(session.as_ref(), schema).await;
        session.close().await?;
        result?;

        info!(
            "Created database '{}' with identity table '{}' and {} metric tables",
            name,
            schema.identity_table(),
            schema.header().tables().len()
        );
        Ok(())
    }

    async fn create_tables(
        &self,
        session: &dyn ColumnStoreDriver,
        schema: &LoadSchema,
    ) -> Result<(), LoaderError> {
        let identity = schema.identity_ddl()?;
        if self.config.debug > 0 {
            debug!("{}", identity);
        }
        session.exec(&identity).await?;

        for (table, ddl) in schema.metric_ddls() {
            if self.config.debug > 0 {
                debug!("{}", ddl);
            }
            session.exec(&ddl).await?;
            debug!("Created table '{}'", table);
        }
        Ok(())
    }
}
