use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use vercelscope_api::VercelClient;
use vercelscope_types::{Deployment, LogEvent};

use crate::cursor::resume_cursor;
use crate::feed::LogFeed;
use crate::parser::EventStreamParser;

/// Lifecycle phase of the log cycle for the bound deployment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StreamPhase {
    /// No deployment bound
    #[default]
    Idle,
    /// Historical fetch in flight
    FetchingHistory,
    /// Live tail open
    StreamingLive,
    /// History loaded and no live tail is (or will be) running
    Settled,
}

/// Progress reports from the background fetch/tail task
#[derive(Debug)]
pub enum StreamUpdate {
    /// Historical batch loaded; `following` is whether a live tail was opened
    History {
        events: Vec<LogEvent>,
        following: bool,
    },
    /// Historical fetch failed (non-fatal; the feed stays empty)
    HistoryFailed(String),
    /// Live-tail events, in arrival order
    Events(Vec<LogEvent>),
    /// Live tail ended: closed by the server or a transport error
    Closed,
}

/// A [`StreamUpdate`] stamped with the stream generation that produced it
#[derive(Debug)]
pub struct StampedUpdate {
    generation: u64,
    update: StreamUpdate,
}

/// Owns the full log retrieval lifecycle for one viewed deployment at a time
///
/// Binding a deployment cancels the previous cycle, resets the feed, and
/// spawns a new fetch task. Updates flow back over a channel stamped with a
/// generation counter; updates from a superseded generation are dropped, so
/// a stale stream can never append to the feed of a newly bound deployment.
pub struct LogStreamController {
    feed: LogFeed,
    phase: StreamPhase,
    generation: u64,
    cancel: CancellationToken,
    task: Option<tokio::task::JoinHandle<()>>,
    update_tx: mpsc::UnboundedSender<StampedUpdate>,
    last_error: Option<String>,
}

impl LogStreamController {
    /// Create a controller and the receiver its updates arrive on
    ///
    /// The caller's event loop forwards received updates back into
    /// [`apply`](Self::apply).
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StampedUpdate>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let controller = Self {
            feed: LogFeed::new(),
            phase: StreamPhase::Idle,
            generation: 0,
            cancel: CancellationToken::new(),
            task: None,
            update_tx,
            last_error: None,
        };
        (controller, update_rx)
    }

    /// The feed for the currently bound deployment
    pub fn feed(&self) -> &LogFeed {
        &self.feed
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// Last transport failure, for status-line display
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Bind the controller to a deployment: cancel-then-reset-then-refetch
    ///
    /// The previous cycle is fully cancelled before any new network call is
    /// issued.
    pub fn bind(&mut self, client: &VercelClient, deployment: &Deployment) {
        // cancel() retires the previous generation
        self.cancel();

        self.feed.reset();
        self.last_error = None;
        self.phase = StreamPhase::FetchingHistory;

        let client = client.clone();
        let deployment = deployment.clone();
        let cancel = self.cancel.clone();
        let generation = self.generation;
        let tx = self.update_tx.clone();

        self.task = Some(tokio::spawn(async move {
            run_log_cycle(client, deployment, cancel, generation, tx).await;
        }));
    }

    /// Cancel the in-flight cycle, if any
    ///
    /// Safe to call when nothing is running. Bumping the generation here
    /// retires updates the cancelled task already queued on the channel;
    /// without it they would still pass the staleness check in [`apply`].
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // Fresh token for the next cycle
        self.cancel = CancellationToken::new();
        self.generation += 1;
        self.phase = StreamPhase::Idle;
    }

    /// Apply an update received from the background task
    ///
    /// Updates stamped with a superseded generation are dropped.
    pub fn apply(&mut self, stamped: StampedUpdate) {
        if stamped.generation != self.generation {
            tracing::debug!(
                "Dropping update from stale stream generation {}",
                stamped.generation
            );
            return;
        }

        match stamped.update {
            StreamUpdate::History { events, following } => {
                self.feed.seed(events);
                self.phase = if following {
                    StreamPhase::StreamingLive
                } else {
                    StreamPhase::Settled
                };
            }
            StreamUpdate::HistoryFailed(message) => {
                self.feed.finish_loading();
                self.last_error = Some(message);
                self.phase = StreamPhase::Settled;
            }
            StreamUpdate::Events(events) => {
                self.feed.append(events);
            }
            StreamUpdate::Closed => {
                self.phase = StreamPhase::Settled;
            }
        }
    }
}

impl Drop for LogStreamController {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// One full fetch cycle: history, then a live tail while still building
async fn run_log_cycle(
    client: VercelClient,
    deployment: Deployment,
    cancel: CancellationToken,
    generation: u64,
    tx: mpsc::UnboundedSender<StampedUpdate>,
) {
    let history = tokio::select! {
        _ = cancel.cancelled() => return,
        result = client.get_deployment_events(&deployment.uid) => result,
    };

    let events = match history {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!("Failed to fetch logs for {}: {:#}", deployment.uid, e);
            let _ = tx.send(StampedUpdate {
                generation,
                update: StreamUpdate::HistoryFailed(format!("Could not load logs: {}", e)),
            });
            return;
        }
    };

    // The live tail only makes sense while the build is still producing
    // output; a finished deployment's history is already complete.
    let following = deployment.is_building();
    let since = resume_cursor(&events);

    let _ = tx.send(StampedUpdate {
        generation,
        update: StreamUpdate::History { events, following },
    });

    if !following {
        return;
    }

    run_live_tail(&client, &deployment.uid, since, cancel, generation, &tx).await;
}

/// Consume the follow endpoint's byte stream until cancellation or closure
async fn run_live_tail(
    client: &VercelClient,
    uid: &str,
    since: Option<i64>,
    cancel: CancellationToken,
    generation: u64,
    tx: &mpsc::UnboundedSender<StampedUpdate>,
) {
    let response = tokio::select! {
        _ = cancel.cancelled() => return,
        result = client.stream_deployment_events(uid, since) => result,
    };

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to open log stream for {}: {:#}", uid, e);
            let _ = tx.send(StampedUpdate {
                generation,
                update: StreamUpdate::Closed,
            });
            return;
        }
    };

    let mut stream = response.bytes_stream();
    let mut parser = EventStreamParser::new();

    loop {
        tokio::select! {
            // Cancellation is a normal shutdown: no flush, no error
            _ = cancel.cancelled() => return,

            chunk = stream.next() => match chunk {
                Some(Ok(bytes)) => {
                    let events = parser.feed(&bytes);
                    if !events.is_empty() {
                        let _ = tx.send(StampedUpdate {
                            generation,
                            update: StreamUpdate::Events(events),
                        });
                    }
                }
                Some(Err(e)) => {
                    // Transport error: keep whatever was already delivered
                    tracing::warn!("Log stream for {} failed: {:#}", uid, e);
                    break;
                }
                None => break,
            }
        }
    }

    let remaining = parser.finish();
    if !remaining.is_empty() {
        let _ = tx.send(StampedUpdate {
            generation,
            update: StreamUpdate::Events(remaining),
        });
    }

    let _ = tx.send(StampedUpdate {
        generation,
        update: StreamUpdate::Closed,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_client() -> VercelClient {
        VercelClient::new("test-token".to_string(), None)
            .unwrap()
            .with_base_url("http://127.0.0.1:9")
    }

    fn deployment(state: &str) -> Deployment {
        serde_json::from_value(json!({ "uid": "dpl_test", "readyState": state })).unwrap()
    }

    fn event(created: i64) -> LogEvent {
        LogEvent {
            created: Some(created),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_bind_resets_feed_and_bumps_generation() {
        let (mut controller, _rx) = LogStreamController::new();
        let client = test_client();

        controller.bind(&client, &deployment("BUILDING"));
        assert_eq!(controller.generation, 1);
        assert_eq!(controller.phase(), StreamPhase::FetchingHistory);
        assert!(controller.feed().is_loading());

        controller.bind(&client, &deployment("BUILDING"));
        assert_eq!(controller.generation, 2);
    }

    #[tokio::test]
    async fn test_rebind_cancels_previous_cycle() {
        let (mut controller, _rx) = LogStreamController::new();
        let client = test_client();

        controller.bind(&client, &deployment("BUILDING"));
        let first_cancel = controller.cancel.clone();
        assert!(!first_cancel.is_cancelled());

        controller.bind(&client, &deployment("BUILDING"));
        assert!(first_cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_stale_generation_updates_are_dropped() {
        let (mut controller, _rx) = LogStreamController::new();
        let client = test_client();

        // Deployment A's cycle, then rebind to B
        controller.bind(&client, &deployment("BUILDING"));
        let stale_generation = controller.generation;
        controller.bind(&client, &deployment("BUILDING"));

        controller.apply(StampedUpdate {
            generation: stale_generation,
            update: StreamUpdate::Events(vec![event(1)]),
        });
        assert!(controller.feed().is_empty());

        controller.apply(StampedUpdate {
            generation: controller.generation,
            update: StreamUpdate::History {
                events: vec![event(2)],
                following: true,
            },
        });
        assert_eq!(controller.feed().len(), 1);
        assert_eq!(controller.phase(), StreamPhase::StreamingLive);
    }

    #[tokio::test]
    async fn test_cancel_retires_current_generation() {
        let (mut controller, _rx) = LogStreamController::new();
        let client = test_client();

        controller.bind(&client, &deployment("BUILDING"));
        let bound_generation = controller.generation;
        controller.cancel();

        // An update the aborted task had already queued must not land
        controller.apply(StampedUpdate {
            generation: bound_generation,
            update: StreamUpdate::Events(vec![event(42)]),
        });
        assert!(controller.feed().is_empty());
        assert_eq!(controller.phase(), StreamPhase::Idle);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let (mut controller, _rx) = LogStreamController::new();
        let client = test_client();

        controller.cancel();
        controller.cancel();
        assert_eq!(controller.phase(), StreamPhase::Idle);

        controller.bind(&client, &deployment("READY"));
        controller.cancel();
        controller.cancel();
        assert_eq!(controller.phase(), StreamPhase::Idle);
    }

    #[tokio::test]
    async fn test_settled_deployment_never_opens_live_tail() {
        let (mut controller, _rx) = LogStreamController::new();

        // READY never follows, whatever the history contained
        assert!(!deployment("READY").is_building());
        assert!(!deployment("ERROR").is_building());
        assert!(!deployment("CANCELED").is_building());

        controller.generation = 1;
        controller.apply(StampedUpdate {
            generation: 1,
            update: StreamUpdate::History {
                events: vec![event(1), event(2)],
                following: false,
            },
        });
        assert_eq!(controller.phase(), StreamPhase::Settled);
        assert_eq!(controller.feed().len(), 2);
        assert!(!controller.feed().is_loading());
    }

    #[tokio::test]
    async fn test_history_failure_is_non_fatal() {
        let (mut controller, _rx) = LogStreamController::new();

        controller.generation = 1;
        controller.apply(StampedUpdate {
            generation: 1,
            update: StreamUpdate::HistoryFailed("boom".to_string()),
        });

        assert!(!controller.feed().is_loading());
        assert!(controller.feed().is_empty());
        assert!(controller.last_error().is_some());
        assert_eq!(controller.phase(), StreamPhase::Settled);
    }

    #[tokio::test]
    async fn test_closed_stream_keeps_partial_data() {
        let (mut controller, _rx) = LogStreamController::new();

        controller.generation = 1;
        controller.apply(StampedUpdate {
            generation: 1,
            update: StreamUpdate::History {
                events: vec![event(1)],
                following: true,
            },
        });
        controller.apply(StampedUpdate {
            generation: 1,
            update: StreamUpdate::Events(vec![event(2)]),
        });
        controller.apply(StampedUpdate {
            generation: 1,
            update: StreamUpdate::Closed,
        });

        assert_eq!(controller.feed().len(), 2);
        assert_eq!(controller.phase(), StreamPhase::Settled);
    }
}
