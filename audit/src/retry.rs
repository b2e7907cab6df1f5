//! Retry policy for failed storage writes.

use std::time::Duration;

use audit_config::shared::RetryConfig;

use crate::error::{AuditError, ErrorKind};

/// What the persist stage should do with a failed insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDirective {
    /// Discard the record immediately.
    NoRetry,
    /// Retry after the given delay.
    Timed(Duration),
}

/// Exponential backoff schedule for insert retries.
///
/// Delays grow from `initial_delay` by `backoff_factor` per attempt and are
/// capped at `max_delay`. Once `max_attempts` insert attempts have failed the
/// record is discarded and the pipeline moves on.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_factor: config.backoff_factor,
        }
    }

    /// Maximum number of insert attempts per record.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides how to handle the given failure on attempt `attempt` (1-based).
    pub fn directive(&self, error: &AuditError, attempt: u32) -> RetryDirective {
        match error.kind() {
            // Duplicates can never succeed on retry.
            ErrorKind::Duplicate => RetryDirective::NoRetry,
            ErrorKind::Fatal => RetryDirective::NoRetry,
            ErrorKind::Transient => {
                if attempt >= self.max_attempts {
                    RetryDirective::NoRetry
                } else {
                    RetryDirective::Timed(self.delay_for(attempt))
                }
            }
        }
    }

    /// Returns the backoff delay preceding attempt `attempt + 1`.
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        let delay = self.initial_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay).min(self.max_delay)
    }
}
