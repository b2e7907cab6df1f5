//! Metrics definitions for audit pipeline monitoring.

/// Label for pipeline ID in metrics.
pub const PIPELINE_ID_LABEL: &str = "pipeline_id";

/// Label for the reason a record was dropped.
pub const REASON_LABEL: &str = "reason";

/// Drop reason: the author was missing from the directory snapshot.
pub const DROP_REASON_DIRECTORY_MISS: &str = "directory_miss";

/// Drop reason: the event carried non-numeric identifiers.
pub const DROP_REASON_MALFORMED: &str = "malformed";

/// Drop reason: storage rejected the record after retries were exhausted.
pub const DROP_REASON_STORAGE: &str = "storage";

/// Counter for events accepted from the stream.
pub const AUDIT_EVENTS_INGESTED_TOTAL: &str = "audit_events_ingested_total";

/// Counter for records dropped anywhere in the pipeline, labeled by reason.
pub const AUDIT_RECORDS_DROPPED_TOTAL: &str = "audit_records_dropped_total";

/// Counter for records durably persisted.
pub const AUDIT_RECORDS_PERSISTED_TOTAL: &str = "audit_records_persisted_total";

/// Counter for individual failed insert attempts (including retried ones).
pub const AUDIT_PERSIST_FAILURES_TOTAL: &str = "audit_persist_failures_total";
