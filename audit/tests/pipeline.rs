use std::sync::Arc;
use std::time::Duration;

use audit_config::shared::{PipelineConfig, RetryConfig};
use audit_telemetry::tracing::init_test_tracing;

use audit::concurrency::gate::Gate;
use audit::concurrency::queue::RecordQueue;
use audit::concurrency::shutdown::create_shutdown_channel;
use audit::directory::UserDirectory;
use audit::error::AuditError;
use audit::pipeline::AuditPipeline;
use audit::retry::RetryPolicy;
use audit::stats::PipelineStats;
use audit::storage::MemoryStorage;
use audit::test_utils::{FailingStreamClient, ScriptedStreamClient, raw_event};
use audit::types::{TweetRecord, UserMapping};
use audit::workers::{PersistWorker, TransformWorker};

fn test_config() -> PipelineConfig {
    PipelineConfig {
        id: 1,
        pop_timeout_ms: 200,
        persist_retry: RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 10,
            max_delay_ms: 50,
            backoff_factor: 2.0,
        },
    }
}

fn known_author_storage() -> MemoryStorage {
    MemoryStorage::with_directory(vec![UserMapping {
        author_id: 42,
        author_name: "alice".to_string(),
    }])
}

/// Polls until `predicate` holds or the deadline passes.
async fn wait_until<F>(predicate: F)
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);

    while !predicate() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn events_from_known_authors_are_persisted() {
    init_test_tracing();

    let storage = known_author_storage();
    let client = ScriptedStreamClient::new(vec![
        Ok(raw_event("1001", "first\npost", "42")),
        Ok(raw_event("1002", "second post", "42")),
    ]);

    let mut pipeline = AuditPipeline::new(test_config(), client, storage.clone());
    pipeline.start().await.unwrap();

    let tweets = storage.wait_for_tweets(2).await;
    assert_eq!(tweets[0].tweet_id, 1001);
    assert_eq!(tweets[0].author_name, "alice");
    assert_eq!(tweets[0].text, "firstpost");
    assert_eq!(tweets[1].tweet_id, 1002);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test]
async fn unknown_authors_are_dropped_before_storage() {
    init_test_tracing();

    let storage = known_author_storage();
    let client = ScriptedStreamClient::new(vec![
        Ok(raw_event("1001", "kept", "42")),
        Ok(raw_event("1002", "dropped", "99")),
    ]);

    let mut pipeline = AuditPipeline::new(test_config(), client, storage.clone());
    pipeline.start().await.unwrap();
    let stats = pipeline.stats();

    storage.wait_for_tweets(1).await;
    wait_until(|| stats.directory_miss_drops() == 1).await;

    // The unknown author's event never reached storage.
    let tweets = storage.tweets().await;
    assert_eq!(tweets.len(), 1);
    assert_eq!(tweets[0].tweet_id, 1001);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test]
async fn failed_insert_does_not_block_later_records() {
    init_test_tracing();

    let storage = known_author_storage();
    // The first insert attempt hits a duplicate, which is never retried.
    storage
        .push_insert_failure(AuditError::DuplicateRecord { tweet_id: 1001 })
        .await;

    let client = ScriptedStreamClient::new(vec![
        Ok(raw_event("1001", "rejected", "42")),
        Ok(raw_event("1002", "persisted", "42")),
    ]);

    let mut pipeline = AuditPipeline::new(test_config(), client, storage.clone());
    pipeline.start().await.unwrap();
    let stats = pipeline.stats();

    let tweets = storage.wait_for_tweets(1).await;
    assert_eq!(tweets[0].tweet_id, 1002);
    wait_until(|| stats.storage_drops() == 1).await;

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test]
async fn transient_insert_failure_is_retried() {
    init_test_tracing();

    let storage = known_author_storage();
    storage
        .push_insert_failure(AuditError::StorageUnavailable("down".to_string()))
        .await;

    let client = ScriptedStreamClient::new(vec![Ok(raw_event("1001", "retried", "42"))]);

    let mut pipeline = AuditPipeline::new(test_config(), client, storage.clone());
    pipeline.start().await.unwrap();

    let tweets = storage.wait_for_tweets(1).await;
    assert_eq!(tweets[0].tweet_id, 1001);
    assert_eq!(pipeline.stats().storage_drops(), 0);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test]
async fn shutdown_stops_an_idle_pipeline_promptly() {
    init_test_tracing();

    let storage = known_author_storage();
    let client = ScriptedStreamClient::new(vec![]);

    let mut pipeline = AuditPipeline::new(test_config(), client, storage);
    pipeline.start().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), pipeline.shutdown_and_wait())
        .await
        .expect("pipeline did not shut down in time")
        .unwrap();
}

#[tokio::test]
async fn shutdown_leaves_backlogged_records_unprocessed() {
    init_test_tracing();

    let storage = known_author_storage();
    let (shutdown_tx, _shutdown_rx) = create_shutdown_channel();

    let directory = Arc::new(UserDirectory::from_mappings(vec![UserMapping {
        author_id: 42,
        author_name: "alice".to_string(),
    }]));
    let ingest_queue = RecordQueue::new();
    let persist_queue = RecordQueue::new();
    let transform_gate = Gate::new();
    let persist_gate = Gate::new();

    // A backlog waits on both queues with the gates raised.
    ingest_queue.push(raw_event("1001", "queued", "42"));
    ingest_queue.push(raw_event("1002", "queued", "42"));
    persist_queue.push(TweetRecord {
        tweet_id: 1000,
        author_id: 42,
        author_name: "alice".to_string(),
        text: "queued".to_string(),
    });
    transform_gate.set();
    persist_gate.set();

    // Shutdown arrives before the stages get to run.
    shutdown_tx.shutdown();

    let transform = TransformWorker::new(
        1,
        directory,
        ingest_queue.clone(),
        persist_queue.clone(),
        transform_gate,
        persist_gate.clone(),
        shutdown_tx.subscribe(),
        Duration::from_secs(10),
        PipelineStats::new(),
    )
    .start();
    let persist = PersistWorker::new(
        1,
        storage.clone(),
        persist_queue.clone(),
        persist_gate,
        shutdown_tx.subscribe(),
        Duration::from_secs(10),
        RetryPolicy::new(&test_config().persist_retry),
        PipelineStats::new(),
    )
    .start();

    // Both stages must observe shutdown and exit well before one pop-timeout,
    // leaving their queues untouched.
    tokio::time::timeout(Duration::from_secs(1), transform.wait())
        .await
        .expect("transform worker did not stop")
        .unwrap();
    tokio::time::timeout(Duration::from_secs(1), persist.wait())
        .await
        .expect("persist worker did not stop")
        .unwrap();

    assert!(storage.tweets().await.is_empty());
    assert_eq!(ingest_queue.len(), 2);
    assert_eq!(persist_queue.len(), 1);
}

#[tokio::test]
async fn refused_stream_connection_fails_the_pipeline() {
    init_test_tracing();

    let storage = known_author_storage();
    let client = FailingStreamClient::new(429);

    let mut pipeline = AuditPipeline::new(test_config(), client, storage);
    pipeline.start().await.unwrap();

    let err = pipeline.wait().await.unwrap_err();
    assert!(matches!(err, AuditError::StreamConnect { status: 429, .. }));
}

#[tokio::test]
async fn broken_stream_tears_the_pipeline_down() {
    init_test_tracing();

    let storage = known_author_storage();
    let client = ScriptedStreamClient::disconnecting(vec![Ok(raw_event("1001", "last", "42"))]);

    let mut pipeline = AuditPipeline::new(test_config(), client, storage);
    pipeline.start().await.unwrap();

    let err = tokio::time::timeout(Duration::from_secs(5), pipeline.wait())
        .await
        .expect("pipeline did not stop after the disconnect")
        .unwrap_err();
    assert!(matches!(err, AuditError::StreamClosed(_)));
}

#[tokio::test]
async fn transform_gate_clears_when_its_queue_goes_quiet() {
    init_test_tracing();

    let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let directory = Arc::new(UserDirectory::from_mappings(vec![UserMapping {
        author_id: 42,
        author_name: "alice".to_string(),
    }]));
    let ingest_queue = RecordQueue::new();
    let persist_queue = RecordQueue::new();
    let transform_gate = Gate::new();
    let persist_gate = Gate::new();

    let handle = TransformWorker::new(
        1,
        directory,
        ingest_queue.clone(),
        persist_queue.clone(),
        transform_gate.clone(),
        persist_gate.clone(),
        shutdown_rx,
        Duration::from_millis(50),
        PipelineStats::new(),
    )
    .start();

    // Producer side: queue an event and set the gate.
    ingest_queue.push(raw_event("1001", "hello", "42"));
    transform_gate.set();

    wait_until(|| !persist_queue.is_empty()).await;
    assert!(persist_gate.is_set());

    // With the queue drained, the bounded-wait pop expires and the stage
    // suspends itself.
    wait_until(|| !transform_gate.is_set()).await;

    // Setting the gate again resumes the stage.
    ingest_queue.push(raw_event("1002", "again", "42"));
    transform_gate.set();
    wait_until(|| persist_queue.len() == 2).await;

    drop(handle);
}
