// In-Memory Bounded FIFO Storage

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{QueueError, Result};
use crate::port::Storage;

/// Capacity used when a queue is built without an explicit storage
pub const DEFAULT_MAX_SIZE: usize = 100_000;

/// Default [`Storage`] implementation holding the backlog in memory.
///
/// A ring buffer guarded by a single mutex; all four operations serialize on
/// it. Once `max_size` is reached, `add_request` discards the new payload
/// and still returns `Ok(())` (drop-newest-on-full backpressure). Dropped
/// counts are observable via [`dropped`](Self::dropped).
pub struct InMemoryStorage {
    max_size: usize,
    items: Mutex<VecDeque<Vec<u8>>>,
    dropped: AtomicU64,
}

impl InMemoryStorage {
    /// Create a storage bounded at `max_size` items (0 = unbounded)
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            items: Mutex::new(VecDeque::new()),
            dropped: AtomicU64::new(0),
        }
    }

    /// Create a storage with no capacity bound
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Number of payloads discarded by the capacity policy
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, VecDeque<Vec<u8>>>> {
        self.items
            .lock()
            .map_err(|_| QueueError::Storage("storage lock poisoned".to_string()))
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn init(&self) -> Result<()> {
        // State is ready at construction; kept for the contract
        Ok(())
    }

    async fn add_request(&self, payload: &[u8]) -> Result<()> {
        let mut items = self.lock()?;
        // Discard payloads once the size limit is reached
        if self.max_size > 0 && items.len() >= self.max_size {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(max_size = self.max_size, "Backlog full, payload dropped");
            return Ok(());
        }
        items.push_back(payload.to_vec());
        Ok(())
    }

    async fn get_request(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.pop_front())
    }

    async fn queue_size(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
}
