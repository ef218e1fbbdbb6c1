//! Database lifecycle and table creation.

use crate::config::DatabaseConfig;
use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use super::Database;

impl Database {
    /// Connect to the queue database.
    ///
    /// The database file must already exist. Every failure here is fatal to the run.
    ///
    /// Record tasks wait up to `acquire_timeout_secs` for the shared connection,
    /// however long the statements ahead of them take.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!(
            "sqlite:{}",
            config.path.display()
        ))
        .map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to parse database path: {}",
                e
            )))
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to connect to database {}: {}",
                    config.path.display(),
                    e
                )))
            })?;

        tracing::debug!(
            path = %config.path.display(),
            max_connections = config.max_connections,
            acquire_timeout_secs = config.acquire_timeout_secs,
            "Connected to queue database"
        );

        Ok(Self { pool })
    }

    /// Create the queue, attachment and phase tables if they are missing
    pub async fn create_schema(&self) -> Result<()> {
        let statements = [
            (
                "eventoutm1",
                r#"
                CREATE TABLE IF NOT EXISTS eventoutm1 (
                    evsysseq TEXT,
                    evtype TEXT,
                    evtime TEXT,
                    evfields TEXT
                )
                "#,
            ),
            (
                "sysattachmem1",
                r#"
                CREATE TABLE IF NOT EXISTS sysattachmem1 (
                    topic TEXT NOT NULL,
                    filename TEXT NOT NULL,
                    "UID" TEXT NOT NULL,
                    segment INTEGER NOT NULL,
                    "DATA" BLOB NOT NULL,
                    compressed TEXT,
                    "SIZE" INTEGER,
                    compressed_size INTEGER,
                    sysmodtime TEXT NOT NULL
                )
                "#,
            ),
            (
                "ocmlm1",
                r#"
                CREATE TABLE IF NOT EXISTS ocmlm1 (
                    "NUMBER" TEXT PRIMARY KEY,
                    phase_num TEXT
                )
                "#,
            ),
        ];

        for (table, sql) in statements {
            sqlx::query(sql).execute(&self.pool).await.map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to create {} table: {}",
                    table, e
                )))
            })?;
        }

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sysattachmem1_topic ON sysattachmem1(topic, sysmodtime)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to create sysattachmem1 index: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Close the database connection pool. Later queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
