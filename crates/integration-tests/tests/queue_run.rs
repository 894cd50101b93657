// Queue Run Behavior Tests
// Termination, re-enqueue-during-execution, and the failure-absorption
// contract of run

use std::sync::Arc;
use std::time::Duration;

use crawlq_core::port::executor::mocks::RecordingExecutor;
use crawlq_core::port::storage::mocks::FailingStorage;
use crawlq_core::port::Storage;
use crawlq_core::{CrawlRequest, InMemoryStorage, Queue};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// run must terminate on its own; a hang is a failure, not a stuck CI job
async fn run_to_completion(queue: &Queue, executor: Arc<RecordingExecutor>) {
    tokio::time::timeout(Duration::from_secs(30), queue.run(executor))
        .await
        .expect("queue.run did not terminate")
        .expect("queue.run returned an error");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn finite_backlog_terminates_with_each_item_executed_once() {
    init_tracing();
    let queue = Arc::new(Queue::new(4, None).await.unwrap());
    for i in 0..20 {
        queue
            .add_url(&format!("http://example.test/page/{i}"))
            .await
            .unwrap();
    }

    let executor = Arc::new(RecordingExecutor::new());
    run_to_completion(&queue, executor.clone()).await;

    let mut visited = executor.visited();
    visited.sort();
    visited.dedup();
    assert_eq!(visited.len(), 20, "every URL visited exactly once");
    assert_eq!(queue.size().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_workers_three_urls_scenario() {
    init_tracing();
    let queue = Arc::new(Queue::new(2, None).await.unwrap());
    for url in ["http://a", "http://b", "http://c"] {
        queue.add_url(url).await.unwrap();
    }

    let executor = Arc::new(RecordingExecutor::new());
    run_to_completion(&queue, executor.clone()).await;

    let mut visited = executor.visited();
    visited.sort();
    assert_eq!(visited, vec!["http://a/", "http://b/", "http://c/"]);
    assert_eq!(queue.metrics().dispatched(), 3);
    assert_eq!(queue.size().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn follow_up_enqueued_during_execution_is_drained_before_finishing() {
    init_tracing();
    let queue = Arc::new(Queue::new(2, None).await.unwrap());
    queue.add_url("http://seed.test/").await.unwrap();

    let executor = Arc::new(RecordingExecutor::new());
    executor.attach(queue.clone());
    executor.follow_up(
        "http://seed.test/",
        CrawlRequest::from_url("http://seed.test/found").unwrap(),
    );

    run_to_completion(&queue, executor.clone()).await;

    let mut visited = executor.visited();
    visited.sort();
    assert_eq!(
        visited,
        vec!["http://seed.test/", "http://seed.test/found"]
    );
    assert_eq!(queue.size().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn chained_follow_ups_drain_transitively() {
    init_tracing();
    let queue = Arc::new(Queue::new(3, None).await.unwrap());
    queue.add_url("http://chain.test/1").await.unwrap();

    let executor = Arc::new(RecordingExecutor::new());
    executor.attach(queue.clone());
    for i in 1..5 {
        executor.follow_up(
            format!("http://chain.test/{i}"),
            CrawlRequest::from_url(&format!("http://chain.test/{}", i + 1)).unwrap(),
        );
    }

    run_to_completion(&queue, executor.clone()).await;
    assert_eq!(executor.visit_count(), 5);
}

#[tokio::test]
async fn capacity_two_drops_the_third_url() {
    init_tracing();
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new(2));
    let queue = Arc::new(Queue::new(1, Some(storage)).await.unwrap());

    for url in ["http://a", "http://b", "http://c"] {
        queue.add_url(url).await.unwrap();
    }
    assert_eq!(queue.size().await.unwrap(), 2);

    let executor = Arc::new(RecordingExecutor::new());
    run_to_completion(&queue, executor.clone()).await;

    let mut visited = executor.visited();
    visited.sort();
    // Drop-newest: the third URL never made it into the backlog
    assert_eq!(visited, vec!["http://a/", "http://b/"]);
}

#[tokio::test]
async fn undecodable_payload_is_discarded_and_counted() {
    init_tracing();
    let storage = Arc::new(InMemoryStorage::unbounded());
    let queue = Arc::new(
        Queue::new(2, Some(storage.clone() as Arc<dyn Storage>))
            .await
            .unwrap(),
    );

    queue.add_url("http://ok.test/1").await.unwrap();
    storage.add_request(b"definitely not json").await.unwrap();
    queue.add_url("http://ok.test/2").await.unwrap();

    let executor = Arc::new(RecordingExecutor::new());
    run_to_completion(&queue, executor.clone()).await;

    assert_eq!(executor.visit_count(), 2);
    assert_eq!(queue.metrics().decode_failures(), 1);
    assert_eq!(queue.metrics().dispatched(), 2);
    assert_eq!(queue.size().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn storage_failure_stops_dispatch_without_hanging_run() {
    init_tracing();
    // First pop succeeds, every later pop errors
    let storage: Arc<dyn Storage> = Arc::new(FailingStorage::new(1));
    let queue = Arc::new(Queue::new(2, Some(storage)).await.unwrap());

    for url in ["http://a", "http://b", "http://c"] {
        queue.add_url(url).await.unwrap();
    }

    let executor = Arc::new(RecordingExecutor::new());
    run_to_completion(&queue, executor.clone()).await;

    // One item made it out before the defensive stop; run still returned
    assert_eq!(executor.visit_count(), 1);
    assert_eq!(queue.metrics().storage_errors(), 1);
    assert_eq!(queue.size().await.unwrap(), 2);
}

#[tokio::test]
async fn empty_backlog_finishes_immediately() {
    init_tracing();
    let queue = Arc::new(Queue::new(3, None).await.unwrap());
    let executor = Arc::new(RecordingExecutor::new());
    run_to_completion(&queue, executor.clone()).await;
    assert_eq!(executor.visit_count(), 0);
}
