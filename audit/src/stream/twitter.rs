use audit_config::shared::TwitterConfig;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::error::{AuditError, AuditResult};
use crate::stream::client::{EventStream, StreamClient};
use crate::stream::decoder::decode_event_stream;

/// Query expansion requesting author ids alongside each post.
const STREAM_EXPANSIONS: &str = "author_id";

/// Filtered-stream client for the Twitter v2 API.
///
/// Opens `GET /2/tweets/search/stream` with bearer authentication and decodes
/// the line-delimited JSON body. Which posts arrive is controlled by the rule
/// set managed through [`crate::twitter::TwitterApiClient`].
#[derive(Debug, Clone)]
pub struct TwitterStreamClient {
    http: reqwest::Client,
    stream_url: String,
    bearer_token: SecretString,
}

impl TwitterStreamClient {
    pub fn new(config: &TwitterConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            stream_url: config.stream_url(),
            bearer_token: config.bearer_token.clone(),
        }
    }
}

impl StreamClient for TwitterStreamClient {
    async fn open(&self) -> AuditResult<EventStream> {
        let response = self
            .http
            .get(&self.stream_url)
            .query(&[("expansions", STREAM_EXPANSIONS)])
            .bearer_auth(self.bearer_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(AuditError::StreamConnect {
                status: status.as_u16(),
                body,
            });
        }

        info!(url = %self.stream_url, "connected to the filtered stream");

        Ok(decode_event_stream(response.bytes_stream()).boxed())
    }
}
