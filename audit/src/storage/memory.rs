use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tracing::info;

use crate::error::{AuditError, AuditResult};
use crate::storage::base::Storage;
use crate::types::{TweetRecord, UserMapping};

#[derive(Debug, Default)]
struct Inner {
    directory: Vec<UserMapping>,
    tweets: Vec<TweetRecord>,
    insert_failures: VecDeque<AuditError>,
}

/// In-memory [`Storage`] for testing and development.
///
/// Captures inserted records for later inspection and can be scripted to fail
/// individual inserts. All data is lost when the process terminates.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
    tweets_changed: Arc<Notify>,
}

impl MemoryStorage {
    /// Creates an empty storage with an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage whose directory holds the given mappings.
    pub fn with_directory(mappings: Vec<UserMapping>) -> Self {
        let storage = Self::new();
        {
            let mut inner = storage.inner.try_lock().unwrap();
            inner.directory = mappings;
        }

        storage
    }

    /// Scripts the next insert to fail with the given error.
    ///
    /// Failures are consumed in order, one per insert attempt.
    pub async fn push_insert_failure(&self, error: AuditError) {
        let mut inner = self.inner.lock().await;
        inner.insert_failures.push_back(error);
    }

    /// Returns a copy of all persisted records.
    pub async fn tweets(&self) -> Vec<TweetRecord> {
        let inner = self.inner.lock().await;
        inner.tweets.clone()
    }

    /// Waits until at least `count` records have been persisted.
    pub async fn wait_for_tweets(&self, count: usize) -> Vec<TweetRecord> {
        loop {
            let notified = self.tweets_changed.notified();

            {
                let inner = self.inner.lock().await;
                if inner.tweets.len() >= count {
                    return inner.tweets.clone();
                }
            }

            notified.await;
        }
    }
}

impl Storage for MemoryStorage {
    async fn init_schema(&self) -> AuditResult<()> {
        Ok(())
    }

    async fn load_user_directory(&self) -> AuditResult<Vec<UserMapping>> {
        let inner = self.inner.lock().await;
        Ok(inner.directory.clone())
    }

    async fn upsert_user_mappings(&self, mappings: Vec<UserMapping>) -> AuditResult<()> {
        let mut inner = self.inner.lock().await;

        for mapping in mappings {
            match inner
                .directory
                .iter_mut()
                .find(|existing| existing.author_id == mapping.author_id)
            {
                Some(existing) => existing.author_name = mapping.author_name,
                None => inner.directory.push(mapping),
            }
        }

        Ok(())
    }

    async fn insert_tweet(&self, record: &TweetRecord) -> AuditResult<()> {
        let mut inner = self.inner.lock().await;

        if let Some(error) = inner.insert_failures.pop_front() {
            return Err(error);
        }

        if inner
            .tweets
            .iter()
            .any(|existing| existing.tweet_id == record.tweet_id)
        {
            return Err(AuditError::DuplicateRecord {
                tweet_id: record.tweet_id,
            });
        }

        info!(tweet_id = record.tweet_id, "storing record in memory");

        inner.tweets.push(record.clone());
        drop(inner);

        self.tweets_changed.notify_waiters();

        Ok(())
    }
}
