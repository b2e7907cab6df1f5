//! Test doubles for exercising the pipeline without a network.

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use futures::stream;

use crate::error::{AuditError, AuditResult};
use crate::stream::{EventStream, StreamClient};
use crate::types::RawEvent;

/// Builds a [`RawEvent`] from literals.
pub fn raw_event(id: &str, text: &str, author_id: &str) -> RawEvent {
    RawEvent {
        id: id.to_string(),
        text: text.to_string(),
        author_id: author_id.to_string(),
    }
}

/// Stream client that replays a scripted sequence of events.
///
/// By default the stream stays open after the script is exhausted, mimicking a
/// quiet live connection; [`ScriptedStreamClient::disconnecting`] ends the
/// stream instead, which the ingest worker treats as a fatal disconnect. The
/// script is consumed by the first `open` call.
#[derive(Debug, Clone)]
pub struct ScriptedStreamClient {
    events: Arc<Mutex<Option<Vec<AuditResult<RawEvent>>>>>,
    stay_open: bool,
}

impl ScriptedStreamClient {
    /// Creates a client whose stream stays open after the scripted events.
    pub fn new(events: Vec<AuditResult<RawEvent>>) -> Self {
        Self {
            events: Arc::new(Mutex::new(Some(events))),
            stay_open: true,
        }
    }

    /// Creates a client whose stream ends after the scripted events.
    pub fn disconnecting(events: Vec<AuditResult<RawEvent>>) -> Self {
        Self {
            events: Arc::new(Mutex::new(Some(events))),
            stay_open: false,
        }
    }
}

impl StreamClient for ScriptedStreamClient {
    async fn open(&self) -> AuditResult<EventStream> {
        let events = self
            .events
            .lock()
            .unwrap()
            .take()
            .unwrap_or_default();

        let head = stream::iter(events);

        if self.stay_open {
            Ok(head.chain(stream::pending()).boxed())
        } else {
            Ok(head.boxed())
        }
    }
}

/// Stream client whose connection attempt always fails.
#[derive(Debug, Clone)]
pub struct FailingStreamClient {
    status: u16,
}

impl FailingStreamClient {
    pub fn new(status: u16) -> Self {
        Self { status }
    }
}

impl StreamClient for FailingStreamClient {
    async fn open(&self) -> AuditResult<EventStream> {
        Err(AuditError::StreamConnect {
            status: self.status,
            body: "scripted connect failure".to_string(),
        })
    }
}
