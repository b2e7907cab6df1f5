//! Error types shared across the audit pipeline.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type AuditResult<T> = Result<T, AuditError>;

/// Errors produced by the pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The streaming endpoint refused the connection.
    #[error("failed to connect to the event stream (status {status}): {body}")]
    StreamConnect { status: u16, body: String },

    /// The long-lived stream ended or broke mid-run.
    #[error("event stream closed: {0}")]
    StreamClosed(String),

    /// A REST endpoint returned a non-success status.
    #[error("request to `{url}` failed with status {status}: {body}")]
    ApiStatus {
        url: String,
        status: u16,
        body: String,
    },

    /// HTTP transport failure.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// A stream line could not be decoded into an event.
    #[error("malformed stream event: {0}")]
    MalformedEvent(#[source] serde_json::Error),

    /// A wire identifier was not a valid integer.
    #[error("invalid numeric identifier `{0}`")]
    InvalidId(String),

    /// Postgres reported an error.
    #[error("storage error: {0}")]
    Storage(#[from] tokio_postgres::Error),

    /// An insert collided with an already-persisted record.
    #[error("duplicate record for tweet {tweet_id}")]
    DuplicateRecord { tweet_id: i64 },

    /// The storage backend could not serve the request.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A worker task panicked.
    #[error("worker panicked: {0}")]
    WorkerPanic(String),
}

/// Coarse classification of an [`AuditError`], used to pick a handling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The pipeline cannot continue; shutdown is broadcast.
    Fatal,
    /// The record already exists; discard without retrying.
    Duplicate,
    /// The operation may succeed if retried.
    Transient,
}

impl AuditError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuditError::StreamConnect { .. }
            | AuditError::StreamClosed(_)
            | AuditError::WorkerPanic(_) => ErrorKind::Fatal,
            AuditError::DuplicateRecord { .. } => ErrorKind::Duplicate,
            AuditError::ApiStatus { .. }
            | AuditError::Http(_)
            | AuditError::MalformedEvent(_)
            | AuditError::InvalidId(_)
            | AuditError::Storage(_)
            | AuditError::StorageUnavailable(_) => ErrorKind::Transient,
        }
    }

    /// Returns `true` if this error should tear the pipeline down.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_errors_are_fatal() {
        let err = AuditError::StreamClosed("connection reset".to_string());
        assert!(err.is_fatal());

        let err = AuditError::StreamConnect {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn duplicates_and_storage_errors_are_not_fatal() {
        let err = AuditError::DuplicateRecord { tweet_id: 1 };
        assert_eq!(err.kind(), ErrorKind::Duplicate);

        let err = AuditError::StorageUnavailable("connection pool exhausted".to_string());
        assert_eq!(err.kind(), ErrorKind::Transient);
    }
}
