// Storage Port (Interface)

use crate::error::Result;
use async_trait::async_trait;

/// Backend interface holding the backlog of serialized requests.
///
/// Implementations must preserve FIFO order: `get_request` returns payloads
/// in `add_request` call order, and no payload is duplicated or lost under
/// any interleaving of concurrent producers against the single dispatcher
/// consumer.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Prepare internal state. Called once at queue construction, before any
    /// other method; safe to call again (idempotent).
    async fn init(&self) -> Result<()>;

    /// Append a serialized request at the tail of the backlog.
    ///
    /// Safe for concurrent invocation from multiple producers. A backend
    /// with a capacity policy MAY silently discard the payload once full;
    /// that is backpressure, not a failure, and is reported as `Ok(())`.
    /// Callers needing confirmation must check `queue_size`.
    async fn add_request(&self, payload: &[u8]) -> Result<()>;

    /// Remove and return the head payload, or `Ok(None)` when the backlog
    /// is empty (empty is not an error).
    ///
    /// Safe to call concurrently with `add_request`; at most one concurrent
    /// caller of `get_request` is assumed (the dispatcher). The returned
    /// buffer is owned by the caller; implementations must not hand out
    /// references into reusable internal buffers.
    async fn get_request(&self) -> Result<Option<Vec<u8>>>;

    /// Current item count.
    ///
    /// May race benignly with concurrent `add_request`/`get_request`; used
    /// as a heuristic signal only, never as a correctness gate outside the
    /// backend's own critical section.
    async fn queue_size(&self) -> Result<usize>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::QueueError;
    use crate::storage::InMemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Storage that serves a number of items normally, then fails every
    /// subsequent `get_request`. For exercising the dispatcher's defensive
    /// stop path.
    pub struct FailingStorage {
        inner: InMemoryStorage,
        successes_left: AtomicUsize,
    }

    impl FailingStorage {
        pub fn new(successes: usize) -> Self {
            Self {
                inner: InMemoryStorage::unbounded(),
                successes_left: AtomicUsize::new(successes),
            }
        }
    }

    #[async_trait]
    impl Storage for FailingStorage {
        async fn init(&self) -> Result<()> {
            self.inner.init().await
        }

        async fn add_request(&self, payload: &[u8]) -> Result<()> {
            self.inner.add_request(payload).await
        }

        async fn get_request(&self) -> Result<Option<Vec<u8>>> {
            let left = self.successes_left.load(Ordering::SeqCst);
            if left == 0 {
                return Err(QueueError::Storage("injected pop failure".to_string()));
            }
            self.successes_left.store(left - 1, Ordering::SeqCst);
            self.inner.get_request().await
        }

        async fn queue_size(&self) -> Result<usize> {
            self.inner.queue_size().await
        }
    }

    /// Storage whose `init` always fails, for constructor error propagation
    /// tests.
    pub struct BrokenInitStorage;

    #[async_trait]
    impl Storage for BrokenInitStorage {
        async fn init(&self) -> Result<()> {
            Err(QueueError::Storage("init failed".to_string()))
        }

        async fn add_request(&self, _payload: &[u8]) -> Result<()> {
            Ok(())
        }

        async fn get_request(&self) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn queue_size(&self) -> Result<usize> {
            Ok(0)
        }
    }
}
