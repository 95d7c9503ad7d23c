//! Lifecycle and shutdown tests: requeue order, idempotence, backpressure

use super::support::{eventually, Gate, Recorder, TestStore};
use crate::consumer::{CloseReport, ConsumerConfig, ConsumerState, Processor, RelayConsumer};
use crate::store::MemoryQueueStore;
use std::sync::Arc;
use std::time::Duration;

fn consumer(
    store: &Arc<TestStore>,
    processor: Arc<dyn Processor>,
    config: ConsumerConfig,
) -> Arc<RelayConsumer> {
    let consumer = RelayConsumer::builder()
        .config(config.empty_wait(Duration::from_secs(3600)))
        .store(store.clone())
        .shared_processor(processor)
        .build()
        .unwrap();
    Arc::new(consumer)
}

/// Close in the background and release the gate once draining has begun,
/// so the in-flight entry finishes only after the dispatcher is told to stop
async fn close_while_blocked(consumer: &Arc<RelayConsumer>, gate: &Gate) -> CloseReport {
    let mut state = consumer.subscribe_state();
    let closing = tokio::spawn({
        let consumer = consumer.clone();
        async move { consumer.close().await }
    });
    state
        .wait_for(|s| *s == ConsumerState::Draining)
        .await
        .unwrap();
    gate.release(1);
    closing.await.unwrap()
}

#[tokio::test]
async fn test_buffered_entries_return_in_head_order() {
    let store = TestStore::new(
        MemoryQueueStore::new().with_queue("a", ["e1", "e2", "e3", "e4", "e5"]),
    );
    let (gate, mut started) = Gate::new();
    let consumer = consumer(
        &store,
        gate.clone(),
        ConsumerConfig::new(["a"]).pop_batch_size(5).cache_size(10),
    );

    assert!(consumer.start().await);
    assert_eq!(started.recv().await.unwrap(), "e1");
    eventually("four buffered entries", || consumer.stats().buffered == 4).await;

    let report = close_while_blocked(&consumer, &gate).await;
    assert_eq!(report, CloseReport { requeued: 4, failed: 0 });
    assert_eq!(gate.finished(), vec!["e1"]);
    assert_eq!(store.texts("a"), vec!["e2", "e3", "e4", "e5"]);
    assert_eq!(consumer.state(), ConsumerState::Stopped);
}

#[tokio::test]
async fn test_buffered_entries_return_in_tail_order() {
    let store = TestStore::new(MemoryQueueStore::new().with_queue("b", ["1", "2", "3", "4"]));
    let (gate, mut started) = Gate::new();
    let consumer = consumer(
        &store,
        gate.clone(),
        ConsumerConfig::new(["-b"]).pop_batch_size(4),
    );

    consumer.start().await;
    assert_eq!(started.recv().await.unwrap(), "4");
    eventually("three buffered entries", || consumer.stats().buffered == 3).await;

    let report = close_while_blocked(&consumer, &gate).await;
    assert_eq!(report.requeued, 3);
    // The next tail pop sees 3, 2, 1 again
    assert_eq!(store.texts("b"), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_blocked_batch_remainder_is_requeued_after_buffer() {
    let items: Vec<String> = (1..=8).map(|i| i.to_string()).collect();
    let store = TestStore::new(MemoryQueueStore::new().with_queue("a", items));
    let (gate, mut started) = Gate::new();
    let consumer = consumer(
        &store,
        gate.clone(),
        ConsumerConfig::new(["a"]).pop_batch_size(8).cache_size(2),
    );

    consumer.start().await;
    assert_eq!(started.recv().await.unwrap(), "1");
    eventually("a full buffer", || consumer.stats().buffered == 2).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    // Backpressure: the buffer never grows past its capacity
    assert_eq!(consumer.stats().buffered, 2);
    assert_eq!(store.pop_count(), 1);

    let report = close_while_blocked(&consumer, &gate).await;
    assert_eq!(report.requeued, 7);
    assert_eq!(
        store.texts("a"),
        vec!["2", "3", "4", "5", "6", "7", "8"]
    );
    assert_eq!(consumer.stats().requeued, 7);
}

#[tokio::test]
async fn test_concurrent_close_calls_share_one_shutdown() {
    let store = TestStore::new(MemoryQueueStore::new().with_queue("a", ["1", "2", "3"]));
    let (gate, mut started) = Gate::new();
    let consumer = consumer(&store, gate.clone(), ConsumerConfig::new(["a"]));

    consumer.start().await;
    started.recv().await.unwrap();

    let mut state = consumer.subscribe_state();
    let first = tokio::spawn({
        let consumer = consumer.clone();
        async move { consumer.close().await }
    });
    let second = tokio::spawn({
        let consumer = consumer.clone();
        async move { consumer.close().await }
    });
    state
        .wait_for(|s| *s == ConsumerState::Draining)
        .await
        .unwrap();
    gate.release(1);

    let (first, second) = tokio::join!(first, second);
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first, second);
    assert_eq!(first.requeued, 2);
    assert_eq!(consumer.close().await, first);
    assert_eq!(store.texts("a"), vec!["2", "3"]);
}

#[tokio::test]
async fn test_close_before_start_stops_immediately() {
    let store = TestStore::new(MemoryQueueStore::new().with_queue("a", ["1"]));
    let consumer = consumer(&store, Recorder::new(), ConsumerConfig::new(["a"]));

    assert_eq!(consumer.state(), ConsumerState::Idle);
    assert_eq!(consumer.close().await, CloseReport::default());
    assert_eq!(consumer.state(), ConsumerState::Stopped);
    assert!(!consumer.start().await);
    assert_eq!(store.pop_count(), 0);
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let store = TestStore::new(MemoryQueueStore::new());
    let consumer = consumer(&store, Recorder::new(), ConsumerConfig::new(["a", "b"]));

    assert!(consumer.start().await);
    assert!(!consumer.start().await);
    assert_eq!(consumer.state(), ConsumerState::Running);

    // One fetcher: one empty cycle over two queues
    eventually("one empty cycle", || store.pop_count() == 2).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.pop_count(), 2);

    consumer.close().await;
    assert!(!consumer.start().await);
}

#[tokio::test]
async fn test_requeue_failures_are_counted_and_shutdown_completes() {
    let store = TestStore::new(MemoryQueueStore::new().with_queue("a", ["1", "2", "3"]));
    let (gate, mut started) = Gate::new();
    let consumer = consumer(&store, gate.clone(), ConsumerConfig::new(["a"]));

    consumer.start().await;
    started.recv().await.unwrap();
    eventually("two buffered entries", || consumer.stats().buffered == 2).await;
    store.fail_pushes(true);

    let report = close_while_blocked(&consumer, &gate).await;
    assert_eq!(report, CloseReport { requeued: 0, failed: 2 });
    assert!(!report.is_clean());
    assert_eq!(consumer.state(), ConsumerState::Stopped);
    assert_eq!(consumer.stats().requeue_failures, 2);
}

#[tokio::test]
async fn test_close_with_empty_buffer_requeues_nothing() {
    let store = TestStore::new(MemoryQueueStore::new().with_queue("a", ["1", "2"]));
    let recorder = Recorder::new();
    let consumer = consumer(&store, recorder.clone(), ConsumerConfig::new(["a"]));

    consumer.start().await;
    eventually("both entries processed", || recorder.count() == 2).await;

    let report = consumer.close().await;
    assert_eq!(report, CloseReport::default());
    assert!(store.texts("a").is_empty());
    assert_eq!(recorder.payloads(), vec!["1", "2"]);
}

#[tokio::test]
async fn test_dropping_running_consumer_stops_polling() {
    let store = TestStore::new(MemoryQueueStore::new());
    let consumer = RelayConsumer::builder()
        .config(ConsumerConfig::new(["a"]).empty_wait(Duration::from_millis(10)))
        .store(store.clone())
        .processor(crate::consumer::processor_fn(|_| {
            Ok(crate::consumer::Disposition::Consumed)
        }))
        .build()
        .unwrap();

    consumer.start().await;
    eventually("a few polls", || store.pop_count() >= 2).await;
    drop(consumer);

    tokio::time::sleep(Duration::from_millis(30)).await;
    let polls = store.pop_count();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.pop_count(), polls);
}

#[tokio::test]
async fn test_cancelled_close_keeps_shutting_down_without_loss() {
    let store = TestStore::new(MemoryQueueStore::new().with_queue("a", ["e1", "e2", "e3", "e4"]));
    let (gate, mut started) = Gate::new();
    let consumer = consumer(&store, gate.clone(), ConsumerConfig::new(["a"]).pop_batch_size(4));
    let mut state = consumer.subscribe_state();

    consumer.start().await;
    assert_eq!(started.recv().await.unwrap(), "e1");
    eventually("three buffered entries", || consumer.stats().buffered == 3).await;

    let timed_out = tokio::time::timeout(Duration::from_millis(50), consumer.close()).await;
    assert!(timed_out.is_err());
    assert!(consumer.state().is_stopping());

    state
        .wait_for(|s| *s == ConsumerState::Draining)
        .await
        .unwrap();
    gate.release(1);

    // Shutdown finishes on its own once the gate opens
    state
        .wait_for(|s| *s == ConsumerState::Stopped)
        .await
        .unwrap();
    assert_eq!(store.texts("a"), vec!["e2", "e3", "e4"]);

    let report = consumer.close().await;
    assert_eq!(report, CloseReport { requeued: 3, failed: 0 });
    assert_eq!(gate.finished(), vec!["e1"]);
    assert_eq!(consumer.stats().requeued, 3);
}

#[tokio::test]
async fn test_close_during_pop_requeues_whole_batch() {
    let store = TestStore::new(MemoryQueueStore::new().with_queue("a", ["1", "2", "3", "4"]));
    let recorder = Recorder::new();
    let consumer = consumer(
        &store,
        recorder.clone(),
        ConsumerConfig::new(["a"]).pop_batch_size(4),
    );
    let mut state = consumer.subscribe_state();

    store.hold_pops();
    consumer.start().await;
    eventually("a parked pop", || store.waiting_pops() == 1).await;

    let closing = tokio::spawn({
        let consumer = consumer.clone();
        async move { consumer.close().await }
    });
    state
        .wait_for(|s| *s == ConsumerState::StopRequested)
        .await
        .unwrap();
    store.release_pop();

    let report = closing.await.unwrap();
    assert_eq!(report, CloseReport { requeued: 4, failed: 0 });
    assert_eq!(store.texts("a"), vec!["1", "2", "3", "4"]);
    assert_eq!(store.pop_count(), 1);
    assert_eq!(recorder.count(), 0);
    assert_eq!(consumer.state(), ConsumerState::Stopped);
}
