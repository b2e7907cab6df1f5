use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::concurrency::gate::Gate;
use crate::concurrency::queue::RecordQueue;
use crate::concurrency::shutdown::ShutdownRx;
use crate::directory::UserDirectory;
use crate::error::{AuditError, AuditResult};
use crate::metrics::{
    AUDIT_RECORDS_DROPPED_TOTAL, DROP_REASON_DIRECTORY_MISS, DROP_REASON_MALFORMED,
    PIPELINE_ID_LABEL, REASON_LABEL,
};
use crate::pipeline::PipelineId;
use crate::stats::PipelineStats;
use crate::types::{RawEvent, TweetRecord};

/// Handle to a running transform worker.
#[derive(Debug)]
pub struct TransformWorkerHandle {
    join_handle: JoinHandle<AuditResult<()>>,
}

impl TransformWorkerHandle {
    /// Waits for the transform worker to complete.
    pub async fn wait(self) -> AuditResult<()> {
        match self.join_handle.await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "transform worker task panicked");
                Err(AuditError::WorkerPanic(format!("transform worker: {err}")))
            }
        }
    }
}

/// Worker that turns raw events into enriched records.
///
/// Waits on the transform gate, drains the ingest queue with a bounded-wait
/// pop, and clears the gate when the queue goes quiet. Records whose author is
/// missing from the directory snapshot are dropped and counted; so are events
/// with non-numeric identifiers. Neither failure ever stops the stage.
pub struct TransformWorker {
    pipeline_id: PipelineId,
    directory: Arc<UserDirectory>,
    ingest_queue: RecordQueue<RawEvent>,
    persist_queue: RecordQueue<TweetRecord>,
    transform_gate: Gate,
    persist_gate: Gate,
    shutdown_rx: ShutdownRx,
    pop_timeout: Duration,
    stats: PipelineStats,
    /// Diagnostic map of every record this run has produced, by tweet id.
    history: HashMap<i64, TweetRecord>,
}

impl TransformWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pipeline_id: PipelineId,
        directory: Arc<UserDirectory>,
        ingest_queue: RecordQueue<RawEvent>,
        persist_queue: RecordQueue<TweetRecord>,
        transform_gate: Gate,
        persist_gate: Gate,
        shutdown_rx: ShutdownRx,
        pop_timeout: Duration,
        stats: PipelineStats,
    ) -> Self {
        Self {
            pipeline_id,
            directory,
            ingest_queue,
            persist_queue,
            transform_gate,
            persist_gate,
            shutdown_rx,
            pop_timeout,
            stats,
            history: HashMap::new(),
        }
    }

    /// Starts the transform worker in a background task.
    pub fn start(self) -> TransformWorkerHandle {
        let join_handle = tokio::spawn(self.run());
        TransformWorkerHandle { join_handle }
    }

    async fn run(mut self) -> AuditResult<()> {
        info!(
            pipeline_id = self.pipeline_id,
            known_authors = self.directory.len(),
            "starting transform worker"
        );

        loop {
            if self.shutdown_rx.is_shutdown() {
                info!(pipeline_id = self.pipeline_id, "transform worker shutting down");
                return Ok(());
            }

            tokio::select! {
                _ = self.shutdown_rx.wait_for_shutdown() => {
                    info!(pipeline_id = self.pipeline_id, "transform worker shutting down");
                    return Ok(());
                }
                _ = self.transform_gate.wait_set() => {}
            }

            match self.ingest_queue.pop_timeout(self.pop_timeout).await {
                Some(event) => self.process(event),
                None => {
                    debug!(
                        pipeline_id = self.pipeline_id,
                        "ingest queue quiet, suspending transform stage"
                    );
                    self.transform_gate.clear();
                }
            }
        }
    }

    fn process(&mut self, event: RawEvent) {
        let Some(record) = self.normalize(event) else {
            return;
        };

        self.history.insert(record.tweet_id, record.clone());

        self.persist_queue.push(record);

        if !self.persist_gate.is_set() {
            self.persist_gate.set();
        }
    }

    /// Parses and enriches one event.
    ///
    /// Returns `None` when the event is dropped, with the drop already logged
    /// and counted.
    fn normalize(&self, event: RawEvent) -> Option<TweetRecord> {
        let Ok(tweet_id) = event.id.parse::<i64>() else {
            warn!(
                pipeline_id = self.pipeline_id,
                id = %event.id,
                "dropping event with non-numeric post id"
            );
            self.record_drop(DROP_REASON_MALFORMED);
            self.stats.record_malformed_drop();

            return None;
        };

        let Ok(author_id) = event.author_id.parse::<i64>() else {
            warn!(
                pipeline_id = self.pipeline_id,
                author_id = %event.author_id,
                "dropping event with non-numeric author id"
            );
            self.record_drop(DROP_REASON_MALFORMED);
            self.stats.record_malformed_drop();

            return None;
        };

        let Some(author_name) = self.directory.name_for(author_id) else {
            warn!(
                pipeline_id = self.pipeline_id,
                author_id,
                "mapping unavailable for author, dropping record"
            );
            self.record_drop(DROP_REASON_DIRECTORY_MISS);
            self.stats.record_directory_miss_drop();

            return None;
        };

        Some(TweetRecord {
            tweet_id,
            author_id,
            author_name: author_name.to_string(),
            text: event.text.replace('\n', ""),
        })
    }

    fn record_drop(&self, reason: &'static str) {
        counter!(
            AUDIT_RECORDS_DROPPED_TOTAL,
            PIPELINE_ID_LABEL => self.pipeline_id.to_string(),
            REASON_LABEL => reason
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::concurrency::shutdown::create_shutdown_channel;
    use crate::types::UserMapping;

    fn worker(directory: UserDirectory) -> TransformWorker {
        let (_, shutdown_rx) = create_shutdown_channel();

        TransformWorker::new(
            1,
            Arc::new(directory),
            RecordQueue::new(),
            RecordQueue::new(),
            Gate::new(),
            Gate::new(),
            shutdown_rx,
            Duration::from_secs(10),
            PipelineStats::new(),
        )
    }

    fn directory() -> UserDirectory {
        UserDirectory::from_mappings(vec![UserMapping {
            author_id: 42,
            author_name: "alice".to_string(),
        }])
    }

    #[tokio::test]
    async fn known_author_produces_an_enriched_record() {
        let mut worker = worker(directory());

        worker.process(RawEvent {
            id: "1001".to_string(),
            text: "first\nline".to_string(),
            author_id: "42".to_string(),
        });

        let record = worker.persist_queue.try_pop().unwrap();
        assert_eq!(record.tweet_id, 1001);
        assert_eq!(record.author_id, 42);
        assert_eq!(record.author_name, "alice");
        assert_eq!(record.text, "firstline");
        assert!(worker.persist_gate.is_set());
        assert!(worker.history.contains_key(&1001));
    }

    #[tokio::test]
    async fn unknown_author_is_dropped() {
        let mut worker = worker(directory());

        worker.process(RawEvent {
            id: "1002".to_string(),
            text: "text".to_string(),
            author_id: "99".to_string(),
        });

        assert!(worker.persist_queue.is_empty());
        assert!(!worker.persist_gate.is_set());
        assert_eq!(worker.stats.directory_miss_drops(), 1);
    }

    #[tokio::test]
    async fn non_numeric_ids_are_dropped() {
        let mut worker = worker(directory());

        worker.process(RawEvent {
            id: "not-a-number".to_string(),
            text: "text".to_string(),
            author_id: "42".to_string(),
        });

        assert!(worker.persist_queue.is_empty());
        assert_eq!(worker.stats.malformed_drops(), 1);
    }
}
