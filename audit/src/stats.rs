//! In-process pipeline counters.
//!
//! [`PipelineStats`] mirrors the drop/persist counters exported via `metrics`
//! so tests and embedding code can observe pipeline behavior without a metrics
//! recorder installed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared atomic counters for one pipeline run.
///
/// Cloning is cheap; all clones observe the same counters.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    inner: Arc<StatsInner>,
}

#[derive(Debug, Default)]
struct StatsInner {
    events_ingested: AtomicU64,
    records_persisted: AtomicU64,
    directory_miss_drops: AtomicU64,
    malformed_drops: AtomicU64,
    storage_drops: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ingested(&self) {
        self.inner.events_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persisted(&self) {
        self.inner.records_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_directory_miss_drop(&self) {
        self.inner
            .directory_miss_drops
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed_drop(&self) {
        self.inner.malformed_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_drop(&self) {
        self.inner.storage_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn events_ingested(&self) -> u64 {
        self.inner.events_ingested.load(Ordering::Relaxed)
    }

    pub fn records_persisted(&self) -> u64 {
        self.inner.records_persisted.load(Ordering::Relaxed)
    }

    pub fn directory_miss_drops(&self) -> u64 {
        self.inner.directory_miss_drops.load(Ordering::Relaxed)
    }

    pub fn malformed_drops(&self) -> u64 {
        self.inner.malformed_drops.load(Ordering::Relaxed)
    }

    pub fn storage_drops(&self) -> u64 {
        self.inner.storage_drops.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let stats = PipelineStats::new();
        let clone = stats.clone();

        stats.record_ingested();
        clone.record_ingested();
        stats.record_directory_miss_drop();

        assert_eq!(stats.events_ingested(), 2);
        assert_eq!(clone.directory_miss_drops(), 1);
        assert_eq!(stats.records_persisted(), 0);
    }
}
