use audit_config::shared::TwitterConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AuditError, AuditResult};

/// Bearer-authenticated client for the Twitter v2 REST endpoints.
///
/// Covers the sequential glue around the pipeline: rule management and bulk
/// user lookup. The streaming endpoint has its own client in
/// [`crate::stream::TwitterStreamClient`].
#[derive(Debug, Clone)]
pub struct TwitterApiClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: SecretString,
}

impl TwitterApiClient {
    pub fn new(config: &TwitterConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Issues a GET request and deserializes the JSON response.
    pub(crate) async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> AuditResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .bearer_auth(self.bearer_token.expose_secret())
            .send()
            .await?;

        Self::into_json(url, response).await
    }

    /// Issues a POST request with a JSON body and deserializes the response.
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> AuditResult<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let url = self.endpoint(path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .bearer_auth(self.bearer_token.expose_secret())
            .send()
            .await?;

        Self::into_json(url, response).await
    }

    async fn into_json<T>(url: String, response: reqwest::Response) -> AuditResult<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(AuditError::ApiStatus {
                url,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
