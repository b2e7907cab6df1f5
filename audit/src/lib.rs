//! Core library for the tweet audit pipeline.
//!
//! The pipeline ingests post events from a long-lived streaming HTTP connection,
//! enriches each event with the author's display name from a directory snapshot,
//! and persists the enriched records to Postgres. Three staged workers (ingest,
//! transform, persist) communicate through unbounded FIFO queues and
//! level-triggered gates, and shut down cooperatively through a dedicated
//! broadcast channel.

pub mod concurrency;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod retry;
pub mod stats;
pub mod storage;
pub mod stream;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod twitter;
pub mod types;
pub mod workers;
