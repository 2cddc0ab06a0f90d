//! SQLite connection pools for the chat store.
//!
//! One writer connection serializes every INSERT/UPDATE/DELETE (SQLite allows a
//! single writer), while a read-only pool serves lookups concurrently. WAL mode
//! lets readers proceed during a write. Foreign keys are on so message rows
//! cascade with their chat.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use chatsearch_types::config::StorageConfig;

#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open a pool at `database_url` with default pool sizing.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        Self::connect(&StorageConfig {
            database_url: database_url.to_string(),
            ..StorageConfig::default()
        })
        .await
    }

    /// Open the writer, migrate the schema, then open the reader pool.
    ///
    /// The reader is opened after migrating so it never sees a half-built schema.
    pub async fn connect(config: &StorageConfig) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs))
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(config.read_connections.max(1))
            .connect_with(options.read_only(true))
            .await?;

        tracing::info!(
            url = %config.database_url,
            read_connections = config.read_connections.max(1),
            "SQLite chat database ready"
        );

        Ok(Self { reader, writer })
    }
}
