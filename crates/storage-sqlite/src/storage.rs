// SQLite Storage Implementation

use async_trait::async_trait;
use sqlx::types::chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crawlq_core::port::Storage;
use crawlq_core::{QueueError, Result};

// Helper to convert sqlx::Error to QueueError with the database detail kept
fn map_sqlx_error(err: sqlx::Error) -> QueueError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                QueueError::Storage(format!("database error [{}]: {}", code, db_err.message()))
            } else {
                QueueError::Storage(format!("database error: {}", db_err.message()))
            }
        }
        _ => QueueError::Storage(err.to_string()),
    }
}

/// [`Storage`] backend persisting the backlog in a SQLite database.
///
/// FIFO order comes from the autoincrement id; the pop is a single
/// `DELETE ... RETURNING`, atomic with respect to concurrent producers.
/// Same drop-newest-on-full capacity policy as the in-memory backend
/// (`max_size` 0 = unbounded).
pub struct SqliteStorage {
    pool: SqlitePool,
    max_size: usize,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool, max_size: usize) -> Self {
        Self { pool, max_size }
    }

    pub fn unbounded(pool: SqlitePool) -> Self {
        Self::new(pool, 0)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        crate::run_migrations(&self.pool).await
    }

    async fn add_request(&self, payload: &[u8]) -> Result<()> {
        // Capacity check and insert share one transaction so a burst of
        // producers cannot overshoot the bound
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        if self.max_size > 0 {
            let size: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM requests")
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            if size as usize >= self.max_size {
                debug!(max_size = self.max_size, "Backlog full, payload dropped");
                return Ok(());
            }
        }

        sqlx::query("INSERT INTO requests (payload, enqueued_at) VALUES (?, ?)")
            .bind(payload)
            .bind(Utc::now().timestamp_millis())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_request(&self) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as(
            "DELETE FROM requests WHERE id = (SELECT MIN(id) FROM requests) RETURNING payload",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(payload,)| payload))
    }

    async fn queue_size(&self) -> Result<usize> {
        let size: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM requests")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(size as usize)
    }
}
