//! Keeps a Gotify stream subscription alive.
//!
//! ```text
//!   Connecting ──open ok──▶ Streaming ──error / end──▶ Backoff
//!       ▲  └──open failed────────────────────────────────┘ │
//!       └──── delay (0 events) / immediately (≥1 event) ───┘
//! ```
//!
//! Cancelling the token moves any state to `Stopped`.

use std::{sync::Arc, time::Duration};

use {
    futures::StreamExt,
    herald_gotify::{EventStream, NotificationSource},
    tokio::sync::watch,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::dispatcher::Dispatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Connecting,
    Streaming,
    Backoff,
    Stopped,
}

/// How a streaming phase ended.
enum StreamEnd {
    Closed,
    Failed(herald_gotify::Error),
    Cancelled,
}

pub struct StreamSupervisor {
    source: Arc<dyn NotificationSource>,
    dispatcher: Arc<Dispatcher>,
    /// Wait applied after an attempt that produced no events.
    reconnect_delay: Duration,
    state: watch::Sender<SupervisorState>,
}

impl StreamSupervisor {
    pub fn new(
        source: Arc<dyn NotificationSource>,
        dispatcher: Arc<Dispatcher>,
        reconnect_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SupervisorState::Connecting);
        Self {
            source,
            dispatcher,
            reconnect_delay,
            state,
        }
    }

    /// Observe state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    fn transition(&self, next: SupervisorState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(from = ?prev, to = ?next, "gotify supervisor state");
        }
    }

    /// Run until `cancel` fires. Connection problems are logged and retried,
    /// never returned.
    pub async fn run(&self, cancel: CancellationToken) {
        info!("gotify listener started");

        loop {
            self.transition(SupervisorState::Connecting);
            let mut received: u64 = 0;

            let opened = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                opened = self.source.open_stream() => opened,
            };

            match opened {
                Ok(stream) => {
                    self.transition(SupervisorState::Streaming);
                    match self.pump(stream, &cancel, &mut received).await {
                        StreamEnd::Cancelled => break,
                        StreamEnd::Closed => {
                            warn!(received, "gotify stream ended, reconnecting");
                        },
                        StreamEnd::Failed(e) => {
                            warn!(received, error = %e, "gotify connection lost, reconnecting");
                        },
                    }
                },
                Err(e) => {
                    warn!(received, error = %e, "gotify connection failed, reconnecting");
                },
            }

            self.transition(SupervisorState::Backoff);
            // A server that accepts connections but never streams would
            // otherwise be hammered in a tight loop.
            if received == 0 {
                debug!(
                    delay_secs = self.reconnect_delay.as_secs(),
                    "no messages received, waiting before reconnect"
                );
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(self.reconnect_delay) => {},
                }
            }
        }

        self.transition(SupervisorState::Stopped);
        info!("gotify listener stopped");
    }

    /// Forward events to the dispatcher one at a time, in arrival order.
    async fn pump(
        &self,
        mut stream: EventStream,
        cancel: &CancellationToken,
        received: &mut u64,
    ) -> StreamEnd {
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return StreamEnd::Cancelled,
                next = stream.next() => next,
            };

            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(e)) => return StreamEnd::Failed(e),
                None => return StreamEnd::Closed,
            };
            *received += 1;
            debug!(
                id = ?event.id,
                appid = event.appid,
                received = *received,
                "gotify message received"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return StreamEnd::Cancelled,
                _ = self.dispatcher.dispatch(&event) => {},
            }
        }
    }
}
