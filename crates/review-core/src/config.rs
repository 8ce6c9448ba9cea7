use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org/";

pub const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";
pub const BOT_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const SOURCE_TOKEN_VAR: &str = "PRACTICUM_TOKEN";

/// Startup failures. These halt the process before the watch loop starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
    #[error("invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },
}

impl ConfigError {
    /// Names of the missing variables, empty for other kinds.
    pub fn missing(&self) -> &[&'static str] {
        match self {
            Self::MissingCredentials(names) => names,
            _ => &[],
        }
    }
}

/// Non-secret settings for a watcher instance.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Homework status endpoint polled every cycle.
    pub endpoint: Url,
    /// Fixed sleep after every cycle, whatever its outcome (default: 600s).
    pub retry_period: Duration,
    /// HTTP request timeout shared by the endpoint client and the Telegram sink.
    pub request_timeout: Duration,
    /// Base URL of the Telegram Bot API.
    pub telegram_api: Url,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            retry_period: Duration::from_secs(600),
            request_timeout: Duration::from_secs(30),
            telegram_api: Url::parse(DEFAULT_TELEGRAM_API)
                .expect("default Telegram API URL is valid"),
        }
    }
}

impl WatchConfig {
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, ConfigError> {
        self.endpoint = parse_http_url("endpoint", endpoint)?;
        Ok(self)
    }

    pub fn with_telegram_api(mut self, base: &str) -> Result<Self, ConfigError> {
        self.telegram_api = parse_http_url("telegram_api", base)?;
        Ok(self)
    }

    pub fn with_retry_period(mut self, secs: u64) -> Self {
        self.retry_period = Duration::from_secs(secs.max(1));
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = Duration::from_secs(secs.max(1));
        self
    }
}

fn parse_http_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: format!("{raw}: {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            field,
            reason: format!("{raw}: scheme must be http or https, got {other}"),
        }),
    }
}

/// Credentials as read from the environment, before validation.
#[derive(Clone, Default)]
pub struct Credentials {
    pub chat_id: Option<String>,
    pub bot_token: Option<String>,
    pub source_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("chat_id", &self.chat_id)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("source_token", &self.source_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            chat_id: lookup(CHAT_ID_VAR),
            bot_token: lookup(BOT_TOKEN_VAR),
            source_token: lookup(SOURCE_TOKEN_VAR),
        }
    }

    /// Checks that every credential is present and non-blank.
    ///
    /// The error lists all missing variables, not just the first one found.
    pub fn validate(self) -> Result<ValidCredentials, ConfigError> {
        let chat_id = non_blank(self.chat_id);
        let bot_token = non_blank(self.bot_token);
        let source_token = non_blank(self.source_token);

        match (chat_id, bot_token, source_token) {
            (Some(chat_id), Some(bot_token), Some(source_token)) => Ok(ValidCredentials {
                chat_id,
                bot_token,
                source_token,
            }),
            (chat_id, bot_token, source_token) => {
                let missing = [
                    (CHAT_ID_VAR, chat_id.is_none()),
                    (BOT_TOKEN_VAR, bot_token.is_none()),
                    (SOURCE_TOKEN_VAR, source_token.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| name)
                .collect();
                Err(ConfigError::MissingCredentials(missing))
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Credentials that passed validation.
#[derive(Clone)]
pub struct ValidCredentials {
    pub chat_id: String,
    pub bot_token: String,
    pub source_token: String,
}

impl fmt::Debug for ValidCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidCredentials")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}
