use std::future::Future;

use futures::stream::BoxStream;

use crate::error::AuditResult;
use crate::types::RawEvent;

/// A live stream of decoded post events.
///
/// `Ok` items are events; `Err` items are per-event decode failures the
/// consumer may skip. The stream ending, for whatever reason, is fatal to the
/// pipeline.
pub type EventStream = BoxStream<'static, AuditResult<RawEvent>>;

/// Source of post events for the ingest worker.
///
/// Implementations open a long-lived connection and yield decoded events until
/// the connection breaks. A refused connection must surface as
/// [`crate::error::AuditError::StreamConnect`] so callers can distinguish it
/// from a mid-run disconnect.
pub trait StreamClient {
    /// Opens the stream and returns the event sequence.
    fn open(&self) -> impl Future<Output = AuditResult<EventStream>> + Send;
}
