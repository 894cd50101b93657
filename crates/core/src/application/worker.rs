// Worker - receive/execute loop

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_channel::Receiver;
use tokio::sync::Notify;
use tracing::debug;

use crate::domain::CrawlRequest;
use crate::port::RequestExecutor;

/// One member of the queue's worker pool.
///
/// Pulls decoded requests off the hand-off until it closes and drains, then
/// exits. Each worker processes sequentially; the pool processes in
/// parallel.
pub(crate) struct Worker {
    id: usize,
    handoff: Receiver<CrawlRequest>,
    executor: Arc<dyn RequestExecutor>,
    in_flight: Arc<AtomicUsize>,
    wake: Arc<Notify>,
}

impl Worker {
    pub(crate) fn new(
        id: usize,
        handoff: Receiver<CrawlRequest>,
        executor: Arc<dyn RequestExecutor>,
        in_flight: Arc<AtomicUsize>,
        wake: Arc<Notify>,
    ) -> Self {
        Self {
            id,
            handoff,
            executor,
            in_flight,
            wake,
        }
    }

    pub(crate) async fn run(self) {
        debug!(worker_id = self.id, "Worker started");

        while let Ok(request) = self.handoff.recv().await {
            // Execution errors are the executor's business, never the queue's
            self.executor.execute(request).await;

            // Decrement only after execute returns: follow-up enqueues made
            // during execution happen-before the dispatcher can observe zero
            // in flight
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.wake.notify_one();
        }

        // Hand-off closed and drained
        debug!(worker_id = self.id, "Worker stopped");
    }
}
