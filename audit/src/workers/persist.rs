use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::concurrency::gate::Gate;
use crate::concurrency::queue::RecordQueue;
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::{AuditError, AuditResult};
use crate::metrics::{
    AUDIT_PERSIST_FAILURES_TOTAL, AUDIT_RECORDS_DROPPED_TOTAL, AUDIT_RECORDS_PERSISTED_TOTAL,
    DROP_REASON_STORAGE, PIPELINE_ID_LABEL, REASON_LABEL,
};
use crate::pipeline::PipelineId;
use crate::retry::{RetryDirective, RetryPolicy};
use crate::stats::PipelineStats;
use crate::storage::Storage;
use crate::types::TweetRecord;

/// Handle to a running persist worker.
#[derive(Debug)]
pub struct PersistWorkerHandle {
    join_handle: JoinHandle<AuditResult<()>>,
}

impl PersistWorkerHandle {
    /// Waits for the persist worker to complete.
    pub async fn wait(self) -> AuditResult<()> {
        match self.join_handle.await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "persist worker task panicked");
                Err(AuditError::WorkerPanic(format!("persist worker: {err}")))
            }
        }
    }
}

/// Worker that writes enriched records to storage.
///
/// Mirrors the transform loop on the persist gate and queue. Each record is
/// inserted as a single row; failures follow the retry policy and records
/// whose retries are exhausted are discarded. Persistence is best-effort: a
/// failed record never blocks, crashes, or re-queues.
pub struct PersistWorker<S> {
    pipeline_id: PipelineId,
    storage: S,
    persist_queue: RecordQueue<TweetRecord>,
    persist_gate: Gate,
    shutdown_rx: ShutdownRx,
    pop_timeout: Duration,
    retry_policy: RetryPolicy,
    stats: PipelineStats,
}

impl<S> PersistWorker<S>
where
    S: Storage + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pipeline_id: PipelineId,
        storage: S,
        persist_queue: RecordQueue<TweetRecord>,
        persist_gate: Gate,
        shutdown_rx: ShutdownRx,
        pop_timeout: Duration,
        retry_policy: RetryPolicy,
        stats: PipelineStats,
    ) -> Self {
        Self {
            pipeline_id,
            storage,
            persist_queue,
            persist_gate,
            shutdown_rx,
            pop_timeout,
            retry_policy,
            stats,
        }
    }

    /// Starts the persist worker in a background task.
    pub fn start(self) -> PersistWorkerHandle {
        let join_handle = tokio::spawn(self.run());
        PersistWorkerHandle { join_handle }
    }

    async fn run(self) -> AuditResult<()> {
        info!(pipeline_id = self.pipeline_id, "starting persist worker");

        loop {
            if self.shutdown_rx.is_shutdown() {
                info!(pipeline_id = self.pipeline_id, "persist worker shutting down");
                return Ok(());
            }

            tokio::select! {
                _ = self.shutdown_rx.wait_for_shutdown() => {
                    info!(pipeline_id = self.pipeline_id, "persist worker shutting down");
                    return Ok(());
                }
                _ = self.persist_gate.wait_set() => {}
            }

            match self.persist_queue.pop_timeout(self.pop_timeout).await {
                Some(record) => self.persist_record(record).await,
                None => {
                    debug!(
                        pipeline_id = self.pipeline_id,
                        "persist queue quiet, suspending persist stage"
                    );
                    self.persist_gate.clear();
                }
            }
        }
    }

    /// Inserts one record, retrying transient failures per the policy.
    ///
    /// An in-flight record is always finished (or given up on) before the
    /// worker reacts to shutdown; only the backoff sleeps are cut short.
    async fn persist_record(&self, record: TweetRecord) {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match self.storage.insert_tweet(&record).await {
                Ok(()) => {
                    counter!(
                        AUDIT_RECORDS_PERSISTED_TOTAL,
                        PIPELINE_ID_LABEL => self.pipeline_id.to_string()
                    )
                    .increment(1);
                    self.stats.record_persisted();

                    return;
                }
                Err(err) => err,
            };

            counter!(
                AUDIT_PERSIST_FAILURES_TOTAL,
                PIPELINE_ID_LABEL => self.pipeline_id.to_string()
            )
            .increment(1);

            match self.retry_policy.directive(&err, attempt) {
                RetryDirective::Timed(delay) => {
                    warn!(
                        pipeline_id = self.pipeline_id,
                        tweet_id = record.tweet_id,
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "insert failed, retrying after backoff"
                    );

                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = self.shutdown_rx.wait_for_shutdown() => {
                            self.record_storage_drop(&record, &err);
                            return;
                        }
                    }
                }
                RetryDirective::NoRetry => {
                    self.record_storage_drop(&record, &err);
                    return;
                }
            }
        }
    }

    fn record_storage_drop(&self, record: &TweetRecord, err: &AuditError) {
        warn!(
            pipeline_id = self.pipeline_id,
            tweet_id = record.tweet_id,
            error = %err,
            "discarding record that storage would not accept"
        );

        counter!(
            AUDIT_RECORDS_DROPPED_TOTAL,
            PIPELINE_ID_LABEL => self.pipeline_id.to_string(),
            REASON_LABEL => DROP_REASON_STORAGE
        )
        .increment(1);
        self.stats.record_storage_drop();
    }
}
