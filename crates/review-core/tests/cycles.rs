use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use review_core::{
    CycleOutcome, DeliveryError, MessageSink, Notifier, StatusFetcher, WatchConfig, WatchError,
    Watcher,
};

const APPROVED_HW1: &str =
    "Status changed for \"hw1\": Работа проверена: ревьюеру всё понравилось. Ура!";

/// Replays scripted fetch results in order, repeating the last one forever,
/// and records the cursor each fetch was made with.
struct SequenceFetcher {
    steps: Mutex<VecDeque<Result<Value, WatchError>>>,
    last: Mutex<Option<Result<Value, WatchError>>>,
    cursors: Mutex<Vec<i64>>,
}

impl SequenceFetcher {
    fn new(steps: Vec<Result<Value, WatchError>>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            cursors: Mutex::new(Vec::new()),
        })
    }

    fn cursors(&self) -> Vec<i64> {
        self.cursors.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusFetcher for SequenceFetcher {
    async fn fetch(&self, from_date: i64) -> Result<Value, WatchError> {
        self.cursors.lock().unwrap().push(from_date);
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.steps.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        (*last)
            .clone()
            .unwrap_or_else(|| panic!("SequenceFetcher: no scripted response"))
    }
}

/// Records every message and answers with scripted delivery results
/// (defaults to success once the script runs out).
#[derive(Default)]
struct RecordingSink {
    results: Mutex<VecDeque<bool>>,
    sent: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn with_results(results: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.iter().copied().collect()),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, _chat_id: &str, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(text.to_string());
        if self.results.lock().unwrap().pop_front().unwrap_or(true) {
            Ok(())
        } else {
            Err(DeliveryError::Transport {
                reason: "connection reset".into(),
            })
        }
    }
}

fn watcher(fetcher: Arc<SequenceFetcher>, sink: Arc<RecordingSink>, cursor: i64) -> Watcher {
    Watcher::new(fetcher, Notifier::new(sink, "100500"), &WatchConfig::default()).with_cursor(cursor)
}

fn status(name: &str, status: &str, current_date: Option<i64>) -> Value {
    let mut payload = json!({
        "homeworks": [{"homework_name": name, "status": status}]
    });
    if let Some(date) = current_date {
        payload["current_date"] = json!(date);
    }
    payload
}

fn unavailable() -> WatchError {
    WatchError::Endpoint {
        status: 503,
        reason: "Service Unavailable".into(),
    }
}

#[tokio::test]
async fn empty_homeworks_is_idle() {
    let fetcher = SequenceFetcher::new(vec![Ok(json!({"homeworks": [], "current_date": 1000}))]);
    let sink = RecordingSink::with_results(&[]);
    let mut w = watcher(fetcher.clone(), sink.clone(), 500);

    assert_eq!(w.poll_once().await, CycleOutcome::Idle);
    assert!(sink.sent().is_empty());
    assert_eq!(w.cursor(), 500);
}

#[tokio::test]
async fn delivered_status_change_advances_cursor() {
    let fetcher = SequenceFetcher::new(vec![
        Ok(status("hw1", "approved", Some(2000))),
        Ok(json!({"homeworks": [], "current_date": 2600})),
    ]);
    let sink = RecordingSink::with_results(&[]);
    let mut w = watcher(fetcher.clone(), sink.clone(), 1000);

    let outcome = w.poll_once().await;
    assert_eq!(
        outcome,
        CycleOutcome::Notified {
            message: APPROVED_HW1.into(),
            cursor: 2000
        }
    );
    assert_eq!(sink.sent(), vec![APPROVED_HW1.to_string()]);

    w.poll_once().await;
    assert_eq!(fetcher.cursors(), vec![1000, 2000]);
}

#[tokio::test]
async fn repeated_endpoint_failure_is_reported_once() {
    let fetcher = SequenceFetcher::new(vec![Err(unavailable())]);
    let sink = RecordingSink::with_results(&[]);
    let mut w = watcher(fetcher, sink.clone(), 1000);

    let first = w.poll_once().await;
    assert_eq!(
        first,
        CycleOutcome::Failed {
            error: unavailable(),
            reported: true
        }
    );
    for _ in 0..3 {
        let again = w.poll_once().await;
        assert!(matches!(again, CycleOutcome::Failed { reported: false, .. }));
    }

    assert_eq!(
        sink.sent(),
        vec!["Bot failure: endpoint returned HTTP 503 Service Unavailable".to_string()]
    );
    assert_eq!(w.cursor(), 1000);
}

#[tokio::test]
async fn unknown_status_goes_through_error_branch() {
    let fetcher = SequenceFetcher::new(vec![Ok(status("hw1", "unknown", None))]);
    let sink = RecordingSink::with_results(&[]);
    let mut w = watcher(fetcher, sink.clone(), 1000);

    let outcome = w.poll_once().await;
    let CycleOutcome::Failed { error, reported } = outcome else {
        panic!("expected failure, got {:?}", outcome);
    };
    assert!(matches!(error, WatchError::Parse(_)));
    assert!(reported);
    assert_eq!(sink.sent().len(), 1);
    assert!(sink.sent()[0].starts_with("Bot failure: cannot parse homework status"));
    assert_eq!(w.cursor(), 1000);
}

#[tokio::test]
async fn changed_error_text_is_reported_again() {
    let fetcher = SequenceFetcher::new(vec![
        Err(unavailable()),
        Err(unavailable()),
        Ok(json!({"no": "homeworks"})),
        Err(unavailable()),
    ]);
    let sink = RecordingSink::with_results(&[]);
    let mut w = watcher(fetcher, sink.clone(), 0);

    for _ in 0..4 {
        w.poll_once().await;
    }

    let sent = sink.sent();
    assert_eq!(sent.len(), 3, "{:?}", sent);
    assert!(sent[0].contains("503"));
    assert!(sent[1].contains("missing 'homeworks'"));
    assert!(sent[2].contains("503"));
}

#[tokio::test]
async fn undelivered_error_is_retried_next_cycle() {
    let fetcher = SequenceFetcher::new(vec![Err(unavailable())]);
    let sink = RecordingSink::with_results(&[false, true]);
    let mut w = watcher(fetcher, sink.clone(), 0);

    assert!(matches!(w.poll_once().await, CycleOutcome::Failed { reported: false, .. }));
    assert_eq!(w.state().last_error_message, None);

    assert!(matches!(w.poll_once().await, CycleOutcome::Failed { reported: true, .. }));
    assert!(matches!(w.poll_once().await, CycleOutcome::Failed { reported: false, .. }));
    assert_eq!(sink.sent().len(), 2);
}

#[tokio::test]
async fn delivery_failure_keeps_cursor_and_renotifies() {
    let fetcher = SequenceFetcher::new(vec![Ok(status("hw1", "approved", Some(2000)))]);
    let sink = RecordingSink::with_results(&[false]);
    let mut w = watcher(fetcher.clone(), sink.clone(), 1000);

    let outcome = w.poll_once().await;
    assert_eq!(
        outcome,
        CycleOutcome::DeliveryFailed {
            message: APPROVED_HW1.into()
        }
    );
    assert_eq!(w.cursor(), 1000);
    assert_eq!(w.state().last_error_message, None);

    let outcome = w.poll_once().await;
    assert!(matches!(outcome, CycleOutcome::Notified { cursor: 2000, .. }));
    assert_eq!(fetcher.cursors(), vec![1000, 1000]);
    assert_eq!(sink.sent(), vec![APPROVED_HW1.to_string(), APPROVED_HW1.to_string()]);
}

#[tokio::test]
async fn delivered_change_without_cursor_is_an_error() {
    let fetcher = SequenceFetcher::new(vec![Ok(status("hw1", "reviewing", None))]);
    let sink = RecordingSink::with_results(&[]);
    let mut w = watcher(fetcher, sink.clone(), 1000);

    let outcome = w.poll_once().await;
    assert_eq!(
        outcome,
        CycleOutcome::Failed {
            error: WatchError::EmptyCursor,
            reported: true
        }
    );
    let sent = sink.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains("Работа взята на проверку ревьюером."));
    assert_eq!(
        sent[1],
        "Bot failure: response carried no current_date to advance the cursor"
    );
    assert_eq!(w.cursor(), 1000);
}

#[tokio::test]
async fn only_the_first_record_is_used() {
    let fetcher = SequenceFetcher::new(vec![Ok(json!({
        "homeworks": [
            {"homework_name": "latest", "status": "rejected"},
            {"homework_name": "older", "status": "bogus"}
        ],
        "current_date": 3000
    }))]);
    let sink = RecordingSink::with_results(&[]);
    let mut w = watcher(fetcher, sink.clone(), 1000);

    let outcome = w.poll_once().await;
    assert!(matches!(outcome, CycleOutcome::Notified { cursor: 3000, .. }));
    assert_eq!(sink.sent().len(), 1);
    assert!(sink.sent()[0].starts_with("Status changed for \"latest\""));
}

#[tokio::test]
async fn cursor_is_monotonic_across_mixed_cycles() {
    let fetcher = SequenceFetcher::new(vec![
        Ok(status("hw1", "reviewing", Some(2000))),
        Err(WatchError::Transport {
            reason: "timed out".into(),
        }),
        Ok(status("hw1", "rejected", Some(1500))),
        Ok(json!({"homeworks": [], "current_date": 9000})),
        Ok(status("hw1", "approved", Some(4000))),
    ]);
    // The fifth send is the first approved notification, which fails once.
    let sink = RecordingSink::with_results(&[true, true, true, true, false]);
    let mut w = watcher(fetcher.clone(), sink.clone(), 1000);

    let mut seen = vec![w.cursor()];
    let mut outcomes = Vec::new();
    for _ in 0..6 {
        outcomes.push(w.poll_once().await);
        seen.push(w.cursor());
    }

    assert!(seen.windows(2).all(|p| p[0] <= p[1]), "{:?}", seen);
    // An older server date is reported after the status message went out.
    assert_eq!(
        outcomes[2],
        CycleOutcome::Failed {
            error: WatchError::StaleCursor {
                cursor: 2000,
                received: 1500
            },
            reported: true,
        }
    );
    assert!(sink
        .sent()
        .contains(&"Bot failure: response current_date 1500 is older than the cursor 2000".to_string()));
    // Idle cycles never move the cursor even when the server reports a later date.
    assert!(!seen.contains(&9000));
    assert_eq!(w.cursor(), 4000);
}

#[tokio::test(start_paused = true)]
async fn run_sleeps_the_retry_period_between_cycles() {
    let fetcher = SequenceFetcher::new(vec![Ok(json!({"homeworks": []}))]);
    let sink = RecordingSink::with_results(&[]);
    let config = WatchConfig::default().with_retry_period(600);
    let w = Watcher::new(fetcher.clone(), Notifier::new(sink, "1"), &config).with_cursor(0);

    let result = tokio::time::timeout(Duration::from_secs(1500), w.run()).await;
    assert!(result.is_err(), "run must not return on its own");

    // Cycles at t=0, 600 and 1200.
    assert_eq!(fetcher.cursors().len(), 3);
}
