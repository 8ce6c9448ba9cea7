use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{DeliveryError, MessageSink};
use crate::client::describe_request_error;

/// Sends messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramSink {
    client: Client,
    api_base: Url,
    token: String,
}

impl std::fmt::Debug for TelegramSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSink")
            .field("api_base", &self.api_base.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramSink {
    pub fn new(client: Client, api_base: Url, token: impl Into<String>) -> Self {
        Self {
            client,
            api_base,
            token: token.into(),
        }
    }

    fn method_url(&self) -> String {
        let base = self.api_base.as_str().trim_end_matches('/');
        format!("{}/bot{}/sendMessage", base, self.token)
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.method_url())
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .map_err(|e| DeliveryError::Transport {
                reason: describe_request_error(&e),
            })?;

        let status = response.status();
        let reply = response.json::<ApiReply>().await.ok();

        match reply {
            Some(ApiReply { ok: true, .. }) if status.is_success() => Ok(()),
            reply => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: reply
                    .and_then(|r| r.description)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string()),
            }),
        }
    }
}
