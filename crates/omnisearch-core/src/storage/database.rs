//! SQLite connection pool for the search index
//!
//! Opening a [`Database`] always brings the schema up to date, so every
//! repository built on its pool can assume the current tables exist.

use crate::config::StorageConfig;
use crate::storage::migrations;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::PathBuf;
use std::str::FromStr;

/// Where the index is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    /// Private to the pool; dropped with it
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub location: DatabaseLocation,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: DatabaseLocation::File(path.into()),
            max_connections: 5,
        }
    }

    /// A memory database must stay on one connection or each would see its own copy
    pub fn memory() -> Self {
        Self {
            location: DatabaseLocation::Memory,
            max_connections: 1,
        }
    }

    /// Build from the `[storage]` section, falling back to [`default_database_path`]
    pub fn from_storage_config(storage: &StorageConfig) -> Self {
        let path = storage
            .database_path
            .clone()
            .unwrap_or_else(default_database_path);
        Self::file(path).max_connections(storage.max_connections)
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions> {
        let options = match &self.location {
            DatabaseLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")?,
            DatabaseLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
        };
        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true))
    }
}

/// `<data dir>/omnisearch/omnisearch.db`, or the working directory when the
/// platform has no data dir
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("omnisearch"))
        .unwrap_or_default()
        .join("omnisearch.db")
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and migrate; parent directories of a file database are created
    pub async fn open(config: DatabaseConfig) -> Result<Self> {
        if let DatabaseLocation::File(ref path) = config.location {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options()?)
            .await
            .with_context(|| format!("Failed to connect to database: {:?}", config.location))?;

        migrations::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self> {
        Self::open(DatabaseConfig::memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migration_status(&self) -> Result<migrations::MigrationStatus> {
        migrations::migration_status(&self.pool)
            .await
            .context("Failed to check migration status")
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}
