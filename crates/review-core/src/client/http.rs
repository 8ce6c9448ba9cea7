use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use super::{describe_request_error, StatusFetcher};
use crate::watch::WatchError;

/// reqwest-backed client for the homework status endpoint.
#[derive(Clone)]
pub struct HttpStatusClient {
    client: Client,
    endpoint: Url,
    token: String,
}

impl std::fmt::Debug for HttpStatusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStatusClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpStatusClient {
    pub fn new(client: Client, endpoint: Url, token: impl Into<String>) -> Self {
        Self {
            client,
            endpoint,
            token: token.into(),
        }
    }

    pub fn from_config(
        config: &crate::config::WatchConfig,
        client: Client,
        token: impl Into<String>,
    ) -> Self {
        Self::new(client, config.endpoint.clone(), token)
    }

    pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .gzip(true)
            .build()
    }
}

#[async_trait]
impl StatusFetcher for HttpStatusClient {
    async fn fetch(&self, from_date: i64) -> Result<serde_json::Value, WatchError> {
        debug!(endpoint = %self.endpoint, from_date, "Requesting homework statuses");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("from_date", from_date)])
            .header("Authorization", format!("OAuth {}", self.token))
            .send()
            .await
            .map_err(|e| {
                let reason = describe_request_error(&e);
                warn!(endpoint = %self.endpoint, error = %reason, "Status request failed");
                WatchError::Transport { reason }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(endpoint = %self.endpoint, status = status.as_u16(), "Status endpoint returned error status");
            return Err(WatchError::Endpoint {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| WatchError::Transport {
            reason: describe_request_error(&e),
        })?;

        serde_json::from_str(&body).map_err(|e| WatchError::Transport {
            reason: format!("malformed response body: {}", e),
        })
    }
}
