use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, trace, warn};

use super::error::WatchError;
use super::state::{CycleOutcome, WatchPhase, WatchState};
use crate::client::StatusFetcher;
use crate::config::WatchConfig;
use crate::notify::Notifier;
use crate::response::check_response;
use crate::status::parse_status;

/// The poll → validate → parse → notify → sleep loop for one homework feed.
pub struct Watcher {
    fetcher: Arc<dyn StatusFetcher>,
    notifier: Notifier,
    retry_period: Duration,
    state: WatchState,
    phase: WatchPhase,
}

impl Watcher {
    /// Creates a watcher whose cursor starts at the current time.
    pub fn new(fetcher: Arc<dyn StatusFetcher>, notifier: Notifier, config: &WatchConfig) -> Self {
        Self {
            fetcher,
            notifier,
            retry_period: config.retry_period,
            state: WatchState::new(Utc::now().timestamp()),
            phase: WatchPhase::Sleeping,
        }
    }

    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.state.cursor = cursor;
        self
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn cursor(&self) -> i64 {
        self.state.cursor
    }

    pub fn phase(&self) -> WatchPhase {
        self.phase
    }

    pub fn retry_period(&self) -> Duration {
        self.retry_period
    }

    /// Runs forever. Every cycle is followed by the same fixed sleep.
    pub async fn run(mut self) {
        info!(
            cursor = self.state.cursor,
            retry_period_secs = self.retry_period.as_secs(),
            chat_id = %self.notifier.chat_id(),
            "Watcher started"
        );

        loop {
            let outcome = self.poll_once().await;
            debug!(
                outcome = %outcome.phase(),
                cursor = self.state.cursor,
                "Cycle finished, sleeping"
            );
            tokio::time::sleep(self.retry_period).await;
        }
    }

    /// Runs a single cycle without the trailing sleep.
    pub async fn poll_once(&mut self) -> CycleOutcome {
        self.transition(WatchPhase::Polling);
        let outcome = match self.cycle().await {
            Ok(outcome) => outcome,
            Err(e) => self.report_error(e).await,
        };
        self.transition(WatchPhase::Sleeping);
        outcome
    }

    async fn cycle(&mut self) -> Result<CycleOutcome, WatchError> {
        let payload = self.fetcher.fetch(self.state.cursor).await?;
        self.transition(WatchPhase::Processing);

        let report = check_response(payload)?;
        let Some(latest) = report.latest() else {
            debug!(cursor = self.state.cursor, "No new reviews");
            self.transition(WatchPhase::Idle);
            return Ok(CycleOutcome::Idle);
        };

        let message = parse_status(latest)?;
        self.transition(WatchPhase::Notifying);

        if !self.notifier.notify(&message).await {
            warn!(cursor = self.state.cursor, "Status change not delivered, will retry next cycle");
            return Ok(CycleOutcome::DeliveryFailed { message });
        }

        let next = report.current_date.ok_or(WatchError::EmptyCursor)?;
        if !self.state.advance_cursor(next) {
            return Err(WatchError::StaleCursor {
                cursor: self.state.cursor,
                received: next,
            });
        }
        info!(cursor = self.state.cursor, "Status change delivered");

        Ok(CycleOutcome::Notified {
            message,
            cursor: self.state.cursor,
        })
    }

    async fn report_error(&mut self, error: WatchError) -> CycleOutcome {
        self.transition(WatchPhase::Error);
        let message = error.report_message();
        error!(kind = error.kind(), error = %error, "Poll cycle failed");

        if self.state.is_already_reported(&message) {
            debug!("Error already reported, not sending again");
            return CycleOutcome::Failed {
                error,
                reported: false,
            };
        }

        let reported = self.notifier.notify(&message).await;
        if reported {
            self.state.last_error_message = Some(message);
        }
        CycleOutcome::Failed { error, reported }
    }

    fn transition(&mut self, to: WatchPhase) {
        if !self.phase.can_transition_to(to) {
            warn!(from = %self.phase, to = %to, "Unexpected phase transition");
        }
        trace!(from = %self.phase, to = %to, "Phase transition");
        self.phase = to;
    }
}
