mod http;

pub use http::HttpStatusClient;

use async_trait::async_trait;

use crate::watch::WatchError;

/// Source of homework status payloads.
///
/// `from_date` is the cursor: only status changes after that Unix timestamp are
/// returned. Implementations do not retry; the watch loop's fixed interval is
/// the only retry mechanism.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch(&self, from_date: i64) -> Result<serde_json::Value, WatchError>;
}

/// Renders a reqwest failure as its class plus the chain of underlying causes.
///
/// reqwest's own `Display` stops at "error sending request for url (...)", so
/// the OS-level reason (refused, reset, DNS) only appears in `source()`. The
/// URL itself is left out: the Telegram one carries the bot token.
pub(crate) fn describe_request_error(error: &reqwest::Error) -> String {
    let class = if error.is_timeout() {
        "request timed out"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_body() || error.is_decode() {
        "failed to read response body"
    } else {
        "request failed"
    };

    let mut reason = class.to_string();
    let mut cause = std::error::Error::source(error);
    while let Some(err) = cause {
        reason.push_str(": ");
        reason.push_str(&err.to_string());
        cause = err.source();
    }
    reason
}
