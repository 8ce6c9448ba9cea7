//! Chat notifications.
//!
//! The watch loop talks to a [`Notifier`], which wraps a [`MessageSink`] and
//! turns delivery failures into a plain `false` so that a messaging outage can
//! never stop polling.

mod telegram;

pub use telegram::TelegramSink;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("message transport failed: {reason}")]
    Transport { reason: String },
    #[error("message rejected with HTTP {status}: {description}")]
    Rejected { status: u16, description: String },
}

/// Something that can deliver a text message to a chat.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Delivers messages to one fixed chat.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn MessageSink>,
    chat_id: String,
}

impl Notifier {
    pub fn new(sink: Arc<dyn MessageSink>, chat_id: impl Into<String>) -> Self {
        Self {
            sink,
            chat_id: chat_id.into(),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Returns `true` if the message was delivered.
    pub async fn notify(&self, text: &str) -> bool {
        debug!(chat_id = %self.chat_id, text, "Sending message");
        match self.sink.send(&self.chat_id, text).await {
            Ok(()) => {
                debug!(chat_id = %self.chat_id, "Message delivered");
                true
            }
            Err(e) => {
                error!(chat_id = %self.chat_id, error = %e, "Message delivery failed");
                false
            }
        }
    }
}
