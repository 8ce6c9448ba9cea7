use super::error::WatchError;

/// Where the watcher is within a poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    Polling,
    Processing,
    Notifying,
    Idle,
    Error,
    Sleeping,
}

impl WatchPhase {
    pub fn can_transition_to(self, target: WatchPhase) -> bool {
        matches!(
            (self, target),
            (WatchPhase::Polling, WatchPhase::Processing)
                | (WatchPhase::Polling, WatchPhase::Error)
                | (WatchPhase::Processing, WatchPhase::Notifying)
                | (WatchPhase::Processing, WatchPhase::Idle)
                | (WatchPhase::Processing, WatchPhase::Error)
                | (WatchPhase::Notifying, WatchPhase::Sleeping)
                | (WatchPhase::Notifying, WatchPhase::Error)
                | (WatchPhase::Idle, WatchPhase::Sleeping)
                | (WatchPhase::Error, WatchPhase::Sleeping)
                | (WatchPhase::Sleeping, WatchPhase::Polling)
        )
    }
}

impl std::fmt::Display for WatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Polling => write!(f, "polling"),
            Self::Processing => write!(f, "processing"),
            Self::Notifying => write!(f, "notifying"),
            Self::Idle => write!(f, "idle"),
            Self::Error => write!(f, "error"),
            Self::Sleeping => write!(f, "sleeping"),
        }
    }
}

/// State carried between cycles. Owned by the watcher alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchState {
    /// Lower bound (Unix seconds) of the next fetch window. Never decreases.
    pub cursor: i64,
    /// Last error text that was actually delivered to the chat.
    pub last_error_message: Option<String>,
}

impl WatchState {
    pub fn new(cursor: i64) -> Self {
        Self {
            cursor,
            last_error_message: None,
        }
    }

    /// Moves the cursor forward. Returns `false` if `next` would move it back.
    pub fn advance_cursor(&mut self, next: i64) -> bool {
        if next < self.cursor {
            return false;
        }
        self.cursor = next;
        true
    }

    pub fn is_already_reported(&self, message: &str) -> bool {
        self.last_error_message.as_deref() == Some(message)
    }
}

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A status change was delivered; `cursor` is the cursor after the cycle.
    Notified { message: String, cursor: i64 },
    /// Nothing new since the cursor.
    Idle,
    /// A status change was found but the chat could not be reached. The cursor
    /// is left alone so the change is picked up again next cycle.
    DeliveryFailed { message: String },
    /// The cycle failed. `reported` is true when an error notification went out
    /// during this cycle.
    Failed { error: WatchError, reported: bool },
}

impl CycleOutcome {
    pub fn phase(&self) -> WatchPhase {
        match self {
            Self::Notified { .. } | Self::DeliveryFailed { .. } => WatchPhase::Notifying,
            Self::Idle => WatchPhase::Idle,
            Self::Failed { .. } => WatchPhase::Error,
        }
    }
}
