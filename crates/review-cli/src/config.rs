//! TOML configuration file schema and parsing.
//!
//! Secrets never live here; they come from the environment (or a `.env` file).
//!
//! ```toml
//! [watch]
//! endpoint = "https://practicum.yandex.ru/api/user_api/homework_statuses/"
//! retry_period_secs = 600
//! request_timeout_secs = 30
//! telegram_api = "https://api.telegram.org/"
//!
//! [log]
//! format = "json"
//! file = "event_journal.log"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use review_core::config::{DEFAULT_ENDPOINT, DEFAULT_TELEGRAM_API};
use review_core::WatchConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_retry_period_secs")]
    pub retry_period_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_telegram_api")]
    pub telegram_api: String,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            retry_period_secs: default_retry_period_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            telegram_api: default_telegram_api(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}

fn default_retry_period_secs() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_telegram_api() -> String {
    DEFAULT_TELEGRAM_API.into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Extra log destination alongside stdout.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            file: None,
        }
    }
}

fn default_log_format() -> String {
    "pretty".into()
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise falls back to built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, String> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.watch.retry_period_secs == 0 {
            return Err("retry_period_secs must be greater than zero".into());
        }
        if self.watch.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".into());
        }

        self.to_watch_config()?;

        match self.log.format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        Ok(())
    }

    pub fn to_watch_config(&self) -> Result<WatchConfig, String> {
        let config = WatchConfig::default()
            .with_endpoint(&self.watch.endpoint)
            .and_then(|c| c.with_telegram_api(&self.watch.telegram_api))
            .map_err(|e| e.to_string())?
            .with_retry_period(self.watch.retry_period_secs)
            .with_request_timeout(self.watch.request_timeout_secs);
        Ok(config)
    }
}
