// Queue Metrics
// Dispatch failures are absorbed, not surfaced; these counters make them
// observable without changing run's success-only contract.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters exposed by [`Queue::metrics`](crate::Queue::metrics).
#[derive(Debug, Default)]
pub struct QueueMetrics {
    dispatched: AtomicU64,
    decode_failures: AtomicU64,
    storage_errors: AtomicU64,
}

impl QueueMetrics {
    /// Items handed to a worker
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Payloads discarded because decoding failed or yielded nothing
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    /// Backlog pops that failed and stopped the dispatcher
    pub fn storage_errors(&self) -> u64 {
        self.storage_errors.load(Ordering::Relaxed)
    }

    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_storage_error(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }
}
