// SQLite Connection Pool Setup

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crawlq_core::{QueueError, Result};

/// Create a SQLite connection pool with WAL mode and sane timeouts.
///
/// A single connection is enough: backlog access is one dispatcher plus
/// producers whose writes SQLite serializes anyway, and it keeps
/// `sqlite::memory:` databases coherent across the pool.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| QueueError::Storage(e.to_string()))?
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| QueueError::Storage(e.to_string()))?;

    Ok(pool)
}
