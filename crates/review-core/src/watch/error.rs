use thiserror::Error;

/// Everything that can go wrong inside a single poll cycle.
///
/// None of these stop the watcher; they are rendered into an error notification
/// and the loop sleeps until the next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchError {
    #[error("endpoint unreachable: {reason}")]
    Transport { reason: String },
    #[error("endpoint returned HTTP {status} {reason}")]
    Endpoint { status: u16, reason: String },
    #[error("response does not match the API contract: {0}")]
    Schema(String),
    #[error("cannot parse homework status: {0}")]
    Parse(String),
    #[error("response carried no current_date to advance the cursor")]
    EmptyCursor,
    #[error("response current_date {received} is older than the cursor {cursor}")]
    StaleCursor { cursor: i64, received: i64 },
}

impl WatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Endpoint { .. } => "endpoint",
            Self::Schema(_) => "schema",
            Self::Parse(_) => "parse",
            Self::EmptyCursor => "empty_cursor",
            Self::StaleCursor { .. } => "stale_cursor",
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Endpoint { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text sent to the chat when this error is reported.
    pub fn report_message(&self) -> String {
        format!("Bot failure: {}", self)
    }
}
