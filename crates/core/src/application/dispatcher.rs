// Dispatcher - single consumer of the backlog

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_channel::Sender;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::application::QueueMetrics;
use crate::domain::CrawlRequest;
use crate::port::{RequestExecutor, Storage};

/// The single routine popping serialized requests off the backlog, decoding
/// them and handing them to whichever worker is free.
///
/// Holds the only [`Sender`] of the hand-off: when `run` returns, the
/// hand-off closes, workers drain whatever is buffered and exit.
pub(crate) struct Dispatcher {
    handoff: Sender<CrawlRequest>,
    storage: Arc<dyn Storage>,
    executor: Arc<dyn RequestExecutor>,
    in_flight: Arc<AtomicUsize>,
    wake: Arc<Notify>,
    metrics: Arc<QueueMetrics>,
}

impl Dispatcher {
    pub(crate) fn new(
        handoff: Sender<CrawlRequest>,
        storage: Arc<dyn Storage>,
        executor: Arc<dyn RequestExecutor>,
        in_flight: Arc<AtomicUsize>,
        wake: Arc<Notify>,
        metrics: Arc<QueueMetrics>,
    ) -> Self {
        Self {
            handoff,
            storage,
            executor,
            in_flight,
            wake,
            metrics,
        }
    }

    pub(crate) async fn run(self) {
        debug!("Dispatcher started");

        loop {
            if self.backlog_empty().await {
                if self.in_flight.load(Ordering::SeqCst) == 0 {
                    // Nothing queued, buffered or executing is left to
                    // produce more work
                    debug!("Backlog exhausted, finishing");
                    break;
                }
                // Arm before re-checking so a wake between the check and the
                // await is not lost
                let woken = self.wake.notified();
                if !self.backlog_empty().await
                    || self.in_flight.load(Ordering::SeqCst) == 0
                {
                    continue;
                }
                woken.await;
                continue;
            }

            let payload = match self.storage.get_request().await {
                Ok(Some(payload)) => payload,
                Ok(None) => {
                    // Raced the emptiness check; with a single consumer this
                    // is unexpected, so stop dispatching
                    self.metrics.record_storage_error();
                    warn!("Backlog reported items but yielded none, stopping dispatch");
                    break;
                }
                Err(e) => {
                    self.metrics.record_storage_error();
                    warn!(error = %e, "Backlog pop failed, stopping dispatch");
                    break;
                }
            };

            let request = match self.executor.decode(&payload) {
                Ok(Some(request)) => request,
                Ok(None) => {
                    self.metrics.record_decode_failure();
                    debug!("Decoder yielded no request, payload discarded");
                    continue;
                }
                Err(e) => {
                    self.metrics.record_decode_failure();
                    debug!(error = %e, "Undecodable payload discarded");
                    continue;
                }
            };

            // An item counts as in flight from the moment it is committed to
            // the hand-off; see Worker for the matching decrement
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            if self.handoff.send(request).await.is_err() {
                // Every receiver is gone; nothing will execute this item
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                warn!("Hand-off closed with items remaining, stopping dispatch");
                break;
            }
            self.metrics.record_dispatched();
        }

        debug!("Dispatcher stopped");
    }

    async fn backlog_empty(&self) -> bool {
        self.storage
            .queue_size()
            .await
            .map(|size| size == 0)
            .unwrap_or(true)
    }
}
