//! Tracing and metrics bootstrap shared by the audit services.

pub mod metrics;
pub mod tracing;
