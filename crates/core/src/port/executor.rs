// Request Executor Port
// Abstraction over whatever actually performs a crawl request

use crate::domain::CrawlRequest;
use crate::error::Result;
use async_trait::async_trait;

/// Collaborator that decodes and performs crawl requests.
///
/// The queue treats execution as fire-and-forget: whatever `execute` does
/// about transport failures, retries or rate limits is its own business and
/// is never surfaced to the queue. An executor may call back into the queue
/// to enqueue follow-up requests discovered while executing.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Decode a serialized payload into a request.
    ///
    /// Returning `Err` or `Ok(None)` makes the dispatcher discard the
    /// payload and move on. The default implementation reads the JSON wire
    /// form produced by [`CrawlRequest::to_bytes`].
    fn decode(&self, payload: &[u8]) -> Result<Option<CrawlRequest>> {
        Ok(Some(CrawlRequest::from_bytes(payload)?))
    }

    /// Perform the request. Errors are not surfaced to the queue.
    async fn execute(&self, request: CrawlRequest);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::application::Queue;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Executor that records every visited URL and can enqueue follow-up
    /// requests the first time a given URL is executed.
    #[derive(Default)]
    pub struct RecordingExecutor {
        visited: Mutex<Vec<String>>,
        follow_ups: Mutex<HashMap<String, Vec<CrawlRequest>>>,
        queue: Mutex<Option<Arc<Queue>>>,
    }

    impl RecordingExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Attach the queue that follow-up requests are enqueued into
        pub fn attach(&self, queue: Arc<Queue>) {
            *self.queue.lock().unwrap() = Some(queue);
        }

        /// Enqueue `request` when `url` is executed (consumed on first hit)
        pub fn follow_up(&self, url: impl Into<String>, request: CrawlRequest) {
            self.follow_ups
                .lock()
                .unwrap()
                .entry(url.into())
                .or_default()
                .push(request);
        }

        pub fn visited(&self) -> Vec<String> {
            self.visited.lock().unwrap().clone()
        }

        pub fn visit_count(&self) -> usize {
            self.visited.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RequestExecutor for RecordingExecutor {
        async fn execute(&self, request: CrawlRequest) {
            self.visited.lock().unwrap().push(request.url.clone());

            let pending = self.follow_ups.lock().unwrap().remove(&request.url);
            let queue = self.queue.lock().unwrap().clone();
            if let (Some(pending), Some(queue)) = (pending, queue) {
                for follow_up in pending {
                    let _ = queue.add_request(follow_up).await;
                }
            }
        }
    }
}
