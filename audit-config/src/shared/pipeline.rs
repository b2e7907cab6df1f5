use serde::Deserialize;

use crate::shared::ValidationError;

const fn default_pop_timeout_ms() -> u64 {
    10_000
}

const fn default_retry_max_attempts() -> u32 {
    3
}

const fn default_retry_initial_delay_ms() -> u64 {
    1_000
}

const fn default_retry_max_delay_ms() -> u64 {
    60_000
}

const fn default_retry_backoff_factor() -> f64 {
    2.0
}

/// Retry schedule applied to failed storage writes.
///
/// Delays grow exponentially from `initial_delay_ms` by `backoff_factor` per
/// attempt, capped at `max_delay_ms`. Once `max_attempts` is exhausted the
/// record is discarded and the pipeline continues.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_retry_backoff_factor")]
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            initial_delay_ms: default_retry_initial_delay_ms(),
            max_delay_ms: default_retry_max_delay_ms(),
            backoff_factor: default_retry_backoff_factor(),
        }
    }
}

/// Configuration for the audit pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// The unique identifier for this pipeline, used as a metric label.
    pub id: u64,
    /// Number of milliseconds a stage waits on an empty queue before clearing
    /// its gate and suspending.
    #[serde(default = "default_pop_timeout_ms")]
    pub pop_timeout_ms: u64,
    /// Retry schedule for failed tweet inserts.
    #[serde(default)]
    pub persist_retry: RetryConfig,
}

impl PipelineConfig {
    /// Validates pipeline configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pop_timeout_ms == 0 {
            return Err(ValidationError::PopTimeoutZero);
        }

        if self.persist_retry.max_attempts == 0 {
            return Err(ValidationError::PersistRetryMaxAttemptsZero);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_pop_timeout_is_rejected() {
        let config = PipelineConfig {
            id: 1,
            pop_timeout_ms: 0,
            persist_retry: RetryConfig::default(),
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retry_attempts_are_rejected() {
        let config = PipelineConfig {
            id: 1,
            pop_timeout_ms: default_pop_timeout_ms(),
            persist_retry: RetryConfig {
                max_attempts: 0,
                ..RetryConfig::default()
            },
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn defaults_pass_validation() {
        let config = PipelineConfig {
            id: 1,
            pop_timeout_ms: default_pop_timeout_ms(),
            persist_retry: RetryConfig::default(),
        };

        assert!(config.validate().is_ok());
    }
}
