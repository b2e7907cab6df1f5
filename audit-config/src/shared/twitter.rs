use secrecy::SecretString;
use serde::Deserialize;

use crate::shared::ValidationError;

fn default_api_base_url() -> String {
    "https://api.twitter.com".to_string()
}

fn default_stream_endpoint() -> String {
    "/2/tweets/search/stream".to_string()
}

/// Settings for the Twitter REST API and filtered-stream endpoints.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid
/// accidentally leaking the bearer token into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterConfig {
    /// Bearer token used for all API and stream requests.
    pub bearer_token: SecretString,
    /// Base URL for REST endpoints (rules, user lookup).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Path of the filtered-stream endpoint, relative to `api_base_url`.
    #[serde(default = "default_stream_endpoint")]
    pub stream_endpoint: String,
}

impl TwitterConfig {
    /// Validates the Twitter API settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        use secrecy::ExposeSecret;

        if self.bearer_token.expose_secret().is_empty() {
            return Err(ValidationError::MissingBearerToken);
        }

        Ok(())
    }

    /// Full URL of the filtered-stream endpoint.
    pub fn stream_url(&self) -> String {
        format!(
            "{}{}",
            self.api_base_url.trim_end_matches('/'),
            self.stream_endpoint
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_joins_base_and_endpoint() {
        let config = TwitterConfig {
            bearer_token: SecretString::new("token".to_string()),
            api_base_url: "https://api.twitter.com/".to_string(),
            stream_endpoint: "/2/tweets/search/stream".to_string(),
        };

        assert_eq!(
            config.stream_url(),
            "https://api.twitter.com/2/tweets/search/stream"
        );
    }

    #[test]
    fn empty_bearer_token_is_rejected() {
        let config = TwitterConfig {
            bearer_token: SecretString::new(String::new()),
            api_base_url: default_api_base_url(),
            stream_endpoint: default_stream_endpoint(),
        };

        assert!(config.validate().is_err());
    }
}
