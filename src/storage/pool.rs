use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::{migrate::MigrateDatabase, Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::domain::{RcaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Sqlite,
    #[cfg(feature = "postgres")]
    Postgres,
}

/// Connection settings for the warehouse-backed metric store adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub database_type: DatabaseType,
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    2
}
fn default_connection_timeout() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_type: DatabaseType::Sqlite,
            url: "sqlite::memory:".to_string(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_secs: default_connection_timeout(),
        }
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(RcaError::Config("database url cannot be empty".into()));
        }
        if self.max_connections == 0 {
            return Err(RcaError::Config("max_connections must be > 0".into()));
        }
        if self.min_connections > self.max_connections {
            return Err(RcaError::Config(
                "min_connections cannot exceed max_connections".into(),
            ));
        }
        Ok(())
    }
}

/// SQLite-backed connection pool for the warehouse metric store adapter.
#[derive(Clone)]
pub struct SqlitePool {
    pool: Pool<Sqlite>,
}

impl SqlitePool {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        config.validate()?;
        info!(url = %config.url, "connecting warehouse pool");

        if !config.url.contains(":memory:") && !Sqlite::database_exists(&config.url).await.unwrap_or(false)
        {
            Sqlite::create_database(&config.url)
                .await
                .map_err(|e| RcaError::Internal(format!("failed to create database: {e}")))?;
        }

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| RcaError::Config(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(config.connection_timeout_secs))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_with(options)
            .await
            .map_err(|e| RcaError::UpstreamUnavailable(format!("warehouse connect failed: {e}")))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
