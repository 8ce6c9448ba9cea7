#![forbid(unsafe_code)]

pub mod catalog;
pub mod client;
pub mod config;
pub mod notify;
pub mod response;
pub mod status;
pub mod watch;

pub use catalog::{HomeworkStatus, UnknownStatus};
pub use client::{HttpStatusClient, StatusFetcher};
pub use config::{ConfigError, Credentials, ValidCredentials, WatchConfig};
pub use notify::{DeliveryError, MessageSink, Notifier, TelegramSink};
pub use response::{check_response, StatusReport};
pub use status::{parse_status, HomeworkRecord};
pub use watch::{CycleOutcome, WatchError, WatchPhase, WatchState, Watcher};
