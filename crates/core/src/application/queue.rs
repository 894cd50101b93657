// Queue - construction, enqueue helpers and the run loop

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{error, info};

use super::dispatcher::Dispatcher;
use super::worker::Worker;
use crate::application::QueueMetrics;
use crate::domain::CrawlRequest;
use crate::error::{QueueError, Result};
use crate::port::{RequestExecutor, Storage};
use crate::storage::InMemoryStorage;

/// Hand-off slot count: one decoded request at a time moves from the
/// dispatcher to whichever worker is free
const HANDOFF_CAPACITY: usize = 1;

/// A bounded, pluggable request queue feeding a pool of concurrent workers.
///
/// Producers enqueue through [`add_url`](Self::add_url) and
/// [`add_request`](Self::add_request), including executors enqueuing
/// follow-up work from inside [`run`](Self::run). `run` drains the backlog
/// through the worker pool and returns once nothing queued or in flight
/// remains.
pub struct Queue {
    workers: usize,
    storage: Arc<dyn Storage>,
    in_flight: Arc<AtomicUsize>,
    wake: Arc<Notify>,
    metrics: Arc<QueueMetrics>,
    started: AtomicBool,
}

impl Queue {
    /// Create a queue over `storage`, or over a default-capacity
    /// [`InMemoryStorage`] when none is given. Calls [`Storage::init`] and
    /// propagates its error.
    ///
    /// # Errors
    /// - `QueueError::Validation` if `workers` is zero
    /// - whatever `Storage::init` returns
    pub async fn new(workers: usize, storage: Option<Arc<dyn Storage>>) -> Result<Self> {
        if workers == 0 {
            return Err(QueueError::Validation(
                "worker count must be at least 1".to_string(),
            ));
        }
        let storage = storage.unwrap_or_else(|| Arc::new(InMemoryStorage::default()));
        storage.init().await?;
        Ok(Self {
            workers,
            storage,
            in_flight: Arc::new(AtomicUsize::new(0)),
            wake: Arc::new(Notify::new()),
            metrics: Arc::new(QueueMetrics::default()),
            started: AtomicBool::new(false),
        })
    }

    /// Parse `url`, build a default-GET request and enqueue it.
    ///
    /// # Errors
    /// - `QueueError::InvalidUrl` if parsing fails
    /// - serialization / storage errors from the enqueue itself
    pub async fn add_url(&self, url: &str) -> Result<()> {
        let request = CrawlRequest::from_url(url)?;
        self.add_request(request).await
    }

    /// Serialize an already-built request and enqueue it.
    ///
    /// A storage capacity policy may silently discard the payload and still
    /// report success (see [`Storage::add_request`]). Check
    /// [`size`](Self::size) when confirmation matters.
    pub async fn add_request(&self, request: CrawlRequest) -> Result<()> {
        let payload = request.to_bytes()?;
        self.storage.add_request(&payload).await?;
        self.wake.notify_one();
        Ok(())
    }

    /// Current backlog size
    pub async fn size(&self) -> Result<usize> {
        self.storage.queue_size().await
    }

    /// Whether the backlog is empty; a size error reads as "empty" (soft
    /// heuristic, not a correctness gate)
    pub async fn is_empty(&self) -> bool {
        self.size().await.map(|size| size == 0).unwrap_or(true)
    }

    /// Counters for the failures `run` absorbs
    pub fn metrics(&self) -> &QueueMetrics {
        &self.metrics
    }

    /// Start the worker pool and the dispatcher, block until the backlog is
    /// exhausted and every in-flight request has finished, then join all
    /// routines.
    ///
    /// Internal dispatch failures are absorbed (observable via
    /// [`metrics`](Self::metrics)); `run` itself only fails when called a
    /// second time.
    ///
    /// # Errors
    /// - `QueueError::InvalidState` on a repeated call
    pub async fn run(&self, executor: Arc<dyn RequestExecutor>) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(QueueError::InvalidState(
                "run may only be called once per queue".to_string(),
            ));
        }

        let (handoff_tx, handoff_rx) = async_channel::bounded(HANDOFF_CAPACITY);
        let mut tasks = JoinSet::new();

        for worker_id in 0..self.workers {
            let worker = Worker::new(
                worker_id,
                handoff_rx.clone(),
                Arc::clone(&executor),
                Arc::clone(&self.in_flight),
                Arc::clone(&self.wake),
            );
            tasks.spawn(async move { worker.run().await });
        }
        drop(handoff_rx);

        let dispatcher = Dispatcher::new(
            handoff_tx,
            Arc::clone(&self.storage),
            executor,
            Arc::clone(&self.in_flight),
            Arc::clone(&self.wake),
            Arc::clone(&self.metrics),
        );
        tasks.spawn(async move { dispatcher.run().await });

        info!(workers = self.workers, "Queue started");

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Queue task panicked");
            }
        }

        info!(
            dispatched = self.metrics.dispatched(),
            "Queue drained and stopped"
        );
        Ok(())
    }
}
