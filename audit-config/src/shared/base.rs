use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Maximum persist retry attempts cannot be zero.
    #[error("`persist_retry.max_attempts` cannot be zero")]
    PersistRetryMaxAttemptsZero,
    /// The queue pop timeout cannot be zero.
    #[error("`pop_timeout_ms` cannot be zero")]
    PopTimeoutZero,
    /// The stream bearer token is empty.
    #[error("`twitter.bearer_token` cannot be empty")]
    MissingBearerToken,
    /// No tracked accounts configured.
    #[error("`tracked_accounts` cannot be empty")]
    NoTrackedAccounts,
}
