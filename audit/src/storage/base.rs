use std::future::Future;

use crate::error::AuditResult;
use crate::types::{TweetRecord, UserMapping};

/// Trait for systems that persist audit records and the author directory.
///
/// Implementations must surface a duplicate-key insert as
/// [`crate::error::AuditError::DuplicateRecord`] so the persist stage can
/// discard the record without retrying. Inserts are one record per call; there
/// is no batching.
pub trait Storage {
    /// Creates the backing schema if it does not already exist.
    fn init_schema(&self) -> impl Future<Output = AuditResult<()>> + Send;

    /// Loads the full author directory.
    fn load_user_directory(&self) -> impl Future<Output = AuditResult<Vec<UserMapping>>> + Send;

    /// Inserts or updates author directory entries.
    fn upsert_user_mappings(
        &self,
        mappings: Vec<UserMapping>,
    ) -> impl Future<Output = AuditResult<()>> + Send;

    /// Persists one enriched record.
    fn insert_tweet(&self, record: &TweetRecord) -> impl Future<Output = AuditResult<()>> + Send;
}
