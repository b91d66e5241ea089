use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Terminal events
#[derive(Clone, Debug)]
pub enum Event {
    /// Periodic tick driving refresh scheduling
    Tick,
    /// Key press event
    Key(KeyEvent),
    /// Terminal was resized; the next draw picks up the new size
    Resize,
    /// Error reading terminal input
    Error(String),
}

/// Reads terminal input on a background task and merges it with a tick
pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventHandler {
    /// Start the reader task with the given tick rate
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        // The task ends on shutdown, on input stream closure, or once the
        // receiving side is gone; no handle is kept.
        tokio::spawn(async move {
            let mut input = event::EventStream::new();
            let mut ticker = tokio::time::interval(tick_rate);
            // A stalled render loop should not be followed by a tick burst
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,

                    _ = ticker.tick() => {
                        if sender.send(Event::Tick).is_err() {
                            break;
                        }
                    }

                    maybe_event = input.next().fuse() => {
                        let event = match maybe_event {
                            // Key releases are filtered (reported on Windows)
                            Some(Ok(CrosstermEvent::Key(key)))
                                if key.kind == KeyEventKind::Press =>
                            {
                                Event::Key(key)
                            }
                            Some(Ok(CrosstermEvent::Resize(_, _))) => Event::Resize,
                            Some(Ok(_)) => continue,
                            Some(Err(e)) => Event::Error(e.to_string()),
                            None => break,
                        };
                        if sender.send(event).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { receiver, cancel }
    }

    /// Receive the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Stop the reader task
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
