use futures::StreamExt;
use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::concurrency::gate::Gate;
use crate::concurrency::queue::RecordQueue;
use crate::concurrency::shutdown::{ShutdownRx, ShutdownTx};
use crate::error::{AuditError, AuditResult};
use crate::metrics::{
    AUDIT_EVENTS_INGESTED_TOTAL, AUDIT_RECORDS_DROPPED_TOTAL, DROP_REASON_MALFORMED,
    PIPELINE_ID_LABEL, REASON_LABEL,
};
use crate::pipeline::PipelineId;
use crate::stats::PipelineStats;
use crate::stream::StreamClient;
use crate::types::RawEvent;

/// Handle to a running ingest worker.
#[derive(Debug)]
pub struct IngestWorkerHandle {
    join_handle: JoinHandle<AuditResult<()>>,
}

impl IngestWorkerHandle {
    /// Waits for the ingest worker to complete.
    pub async fn wait(self) -> AuditResult<()> {
        match self.join_handle.await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "ingest worker task panicked");
                Err(AuditError::WorkerPanic(format!("ingest worker: {err}")))
            }
        }
    }
}

/// Worker that feeds stream events into the pipeline.
///
/// Opens the stream once and pushes each decoded event onto the ingest queue,
/// setting the transform gate whenever it finds it clear. Any stream failure,
/// including the stream simply ending, is fatal: the worker broadcasts
/// shutdown and exits with the error.
pub struct IngestWorker<C> {
    pipeline_id: PipelineId,
    client: C,
    ingest_queue: RecordQueue<RawEvent>,
    transform_gate: Gate,
    persist_gate: Gate,
    shutdown_tx: ShutdownTx,
    shutdown_rx: ShutdownRx,
    stats: PipelineStats,
}

impl<C> IngestWorker<C>
where
    C: StreamClient + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pipeline_id: PipelineId,
        client: C,
        ingest_queue: RecordQueue<RawEvent>,
        transform_gate: Gate,
        persist_gate: Gate,
        shutdown_tx: ShutdownTx,
        stats: PipelineStats,
    ) -> Self {
        let shutdown_rx = shutdown_tx.subscribe();

        Self {
            pipeline_id,
            client,
            ingest_queue,
            transform_gate,
            persist_gate,
            shutdown_tx,
            shutdown_rx,
            stats,
        }
    }

    /// Starts the ingest worker in a background task.
    pub fn start(self) -> IngestWorkerHandle {
        let join_handle = tokio::spawn(self.run());
        IngestWorkerHandle { join_handle }
    }

    async fn run(mut self) -> AuditResult<()> {
        info!(pipeline_id = self.pipeline_id, "starting ingest worker");

        let mut events = match self.client.open().await {
            Ok(events) => events,
            Err(err) => {
                error!(
                    pipeline_id = self.pipeline_id,
                    error = %err,
                    "failed to open the event stream"
                );
                self.trigger_shutdown();

                return Err(err);
            }
        };

        loop {
            tokio::select! {
                _ = self.shutdown_rx.wait_for_shutdown() => {
                    info!(pipeline_id = self.pipeline_id, "ingest worker shutting down");
                    return Ok(());
                }
                event = events.next() => match event {
                    Some(Ok(event)) => self.accept(event),
                    Some(Err(err)) if err.is_fatal() => {
                        error!(
                            pipeline_id = self.pipeline_id,
                            error = %err,
                            "event stream broke, shutting the pipeline down"
                        );
                        self.trigger_shutdown();

                        return Err(err);
                    }
                    Some(Err(err)) => {
                        warn!(
                            pipeline_id = self.pipeline_id,
                            error = %err,
                            "dropping undecodable stream event"
                        );
                        self.record_malformed_drop();
                    }
                    None => {
                        let err = AuditError::StreamClosed("the event stream ended".to_string());
                        error!(
                            pipeline_id = self.pipeline_id,
                            "event stream ended, shutting the pipeline down"
                        );
                        self.trigger_shutdown();

                        return Err(err);
                    }
                }
            }
        }
    }

    fn accept(&self, event: RawEvent) {
        counter!(
            AUDIT_EVENTS_INGESTED_TOTAL,
            PIPELINE_ID_LABEL => self.pipeline_id.to_string()
        )
        .increment(1);
        self.stats.record_ingested();

        self.ingest_queue.push(event);

        if !self.transform_gate.is_set() {
            self.transform_gate.set();
        }
    }

    fn record_malformed_drop(&self) {
        counter!(
            AUDIT_RECORDS_DROPPED_TOTAL,
            PIPELINE_ID_LABEL => self.pipeline_id.to_string(),
            REASON_LABEL => DROP_REASON_MALFORMED
        )
        .increment(1);
        self.stats.record_malformed_drop();
    }

    /// Broadcasts shutdown and sets both stage gates so blocked waiters wake,
    /// observe the signal, and exit.
    fn trigger_shutdown(&self) {
        self.shutdown_tx.shutdown();
        self.transform_gate.set();
        self.persist_gate.set();
    }
}
