use serde::Deserialize;

use crate::Config;
use crate::shared::{PgConnectionConfig, PipelineConfig, TwitterConfig, ValidationError};

/// Top-level configuration for the auditor service.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid
/// accidentally leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditorConfig {
    /// Twitter API and stream settings.
    pub twitter: TwitterConfig,
    /// Postgres connection for audit storage.
    pub storage: PgConnectionConfig,
    /// Pipeline tuning parameters.
    pub pipeline: PipelineConfig,
    /// Usernames whose posts the stream rules track.
    pub tracked_accounts: Vec<String>,
}

impl Config for AuditorConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["tracked_accounts"];
}

impl AuditorConfig {
    /// Validates all nested configuration sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.twitter.validate()?;
        self.pipeline.validate()?;

        if self.tracked_accounts.is_empty() {
            return Err(ValidationError::NoTrackedAccounts);
        }

        Ok(())
    }
}
