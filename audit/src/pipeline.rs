use std::sync::Arc;
use std::time::Duration;

use audit_config::shared::PipelineConfig;
use tracing::{error, info, warn};

use crate::concurrency::gate::Gate;
use crate::concurrency::queue::RecordQueue;
use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use crate::directory::UserDirectory;
use crate::error::AuditResult;
use crate::retry::RetryPolicy;
use crate::stats::PipelineStats;
use crate::storage::Storage;
use crate::stream::StreamClient;
use crate::workers::{
    IngestWorker, IngestWorkerHandle, PersistWorker, PersistWorkerHandle, TransformWorker,
    TransformWorkerHandle,
};

pub type PipelineId = u64;

#[derive(Debug)]
enum PipelineState {
    NotStarted,
    Started {
        ingest_worker: IngestWorkerHandle,
        transform_worker: TransformWorkerHandle,
        persist_worker: PersistWorkerHandle,
    },
}

/// The staged audit pipeline.
///
/// Owns the shutdown channel, queues, gates, and stats for one run. The
/// directory snapshot is loaded in [`AuditPipeline::start`] before any stage
/// runs and is immutable for the lifetime of the pipeline.
pub struct AuditPipeline<C, S> {
    id: PipelineId,
    config: Arc<PipelineConfig>,
    client: C,
    storage: S,
    state: PipelineState,
    shutdown_tx: ShutdownTx,
    stats: PipelineStats,
}

impl<C, S> AuditPipeline<C, S>
where
    C: StreamClient + Clone + Send + Sync + 'static,
    S: Storage + Clone + Send + Sync + 'static,
{
    pub fn new(config: PipelineConfig, client: C, storage: S) -> Self {
        let (shutdown_tx, _) = create_shutdown_channel();

        Self {
            id: config.id,
            config: Arc::new(config),
            client,
            storage,
            state: PipelineState::NotStarted,
            shutdown_tx,
            stats: PipelineStats::new(),
        }
    }

    pub fn id(&self) -> PipelineId {
        self.id
    }

    /// Returns a handle that can request shutdown from outside the pipeline.
    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Returns the shared counters for this run.
    pub fn stats(&self) -> PipelineStats {
        self.stats.clone()
    }

    /// Loads the directory snapshot and spawns the three stage workers.
    ///
    /// The snapshot load must complete before any stage starts; a failure here
    /// leaves the pipeline not started.
    pub async fn start(&mut self) -> AuditResult<()> {
        info!(pipeline_id = self.id, "starting audit pipeline");

        let mappings = self.storage.load_user_directory().await?;
        let directory = UserDirectory::from_mappings(mappings);

        if directory.is_empty() {
            warn!(
                pipeline_id = self.id,
                "author directory is empty; every event will be dropped until rules are synced"
            );
        }

        let directory = Arc::new(directory);
        let ingest_queue = RecordQueue::new();
        let persist_queue = RecordQueue::new();
        let transform_gate = Gate::new();
        let persist_gate = Gate::new();
        let pop_timeout = Duration::from_millis(self.config.pop_timeout_ms);

        let ingest_worker = IngestWorker::new(
            self.id,
            self.client.clone(),
            ingest_queue.clone(),
            transform_gate.clone(),
            persist_gate.clone(),
            self.shutdown_tx.clone(),
            self.stats.clone(),
        )
        .start();

        let transform_worker = TransformWorker::new(
            self.id,
            directory,
            ingest_queue,
            persist_queue.clone(),
            transform_gate,
            persist_gate.clone(),
            self.shutdown_tx.subscribe(),
            pop_timeout,
            self.stats.clone(),
        )
        .start();

        let persist_worker = PersistWorker::new(
            self.id,
            self.storage.clone(),
            persist_queue,
            persist_gate,
            self.shutdown_tx.subscribe(),
            pop_timeout,
            RetryPolicy::new(&self.config.persist_retry),
            self.stats.clone(),
        )
        .start();

        self.state = PipelineState::Started {
            ingest_worker,
            transform_worker,
            persist_worker,
        };

        Ok(())
    }

    /// Waits for all stage workers to complete.
    ///
    /// Returns the first worker error; later errors are logged.
    pub async fn wait(self) -> AuditResult<()> {
        let PipelineState::Started {
            ingest_worker,
            transform_worker,
            persist_worker,
        } = self.state
        else {
            info!(pipeline_id = self.id, "pipeline was not started, nothing to wait for");

            return Ok(());
        };

        info!(pipeline_id = self.id, "waiting for pipeline workers to complete");

        let mut errors = vec![];

        if let Err(err) = ingest_worker.wait().await {
            errors.push(err);
        }
        if let Err(err) = transform_worker.wait().await {
            errors.push(err);
        }
        if let Err(err) = persist_worker.wait().await {
            errors.push(err);
        }

        let mut errors = errors.into_iter();
        let Some(first) = errors.next() else {
            info!(pipeline_id = self.id, "pipeline completed cleanly");

            return Ok(());
        };

        for err in errors {
            error!(pipeline_id = self.id, error = %err, "additional worker failure");
        }

        Err(first)
    }

    /// Broadcasts the shutdown signal to all workers.
    pub fn shutdown(&self) {
        info!(pipeline_id = self.id, "shutting down the pipeline");
        self.shutdown_tx.shutdown();
    }

    /// Broadcasts shutdown and waits for the workers to finish.
    pub async fn shutdown_and_wait(self) -> AuditResult<()> {
        self.shutdown();
        self.wait().await
    }
}
