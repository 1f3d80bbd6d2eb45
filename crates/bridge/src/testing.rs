//! Fakes shared by the unit tests of this crate.

use std::{
    collections::{HashSet, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use {
    async_trait::async_trait,
    futures::{StreamExt, stream},
    herald_channels::{ChannelOutbound, DestinationRegistry, InMemoryDestinationStore},
    herald_gotify::{Application, EventStream, NotificationEvent, NotificationSource},
    tokio::time::Instant,
};

/// How one scripted stream attempt behaves.
pub enum Attempt {
    /// `open_stream` itself fails.
    RefuseConnect,
    /// Yields the events, then breaks with an error.
    EventsThenError(Vec<NotificationEvent>),
    /// Yields the events, then closes cleanly.
    EventsThenClose(Vec<NotificationEvent>),
    /// Connects and never yields anything.
    Silent,
}

/// Scripted notification server. Once the script runs out every further
/// attempt is [`Attempt::Silent`].
#[derive(Default)]
pub struct FakeSource {
    apps: Mutex<Vec<Application>>,
    script: Mutex<VecDeque<Attempt>>,
    fetches: AtomicUsize,
    opens: Mutex<Vec<Instant>>,
}

impl FakeSource {
    pub fn with_apps(apps: Vec<Application>) -> Arc<Self> {
        let source = Self::default();
        *source.apps.lock().unwrap() = apps;
        Arc::new(source)
    }

    pub fn scripted(script: Vec<Attempt>) -> Arc<Self> {
        let source = Self::default();
        *source.script.lock().unwrap() = script.into();
        Arc::new(source)
    }

    pub fn set_apps(&self, apps: Vec<Application>) {
        *self.apps.lock().unwrap() = apps;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn open_times(&self) -> Vec<Instant> {
        self.opens.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.opens.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSource for FakeSource {
    async fn fetch_applications(&self) -> herald_gotify::Result<Vec<Application>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.apps.lock().unwrap().clone())
    }

    async fn open_stream(&self) -> herald_gotify::Result<EventStream> {
        self.opens.lock().unwrap().push(Instant::now());
        let attempt = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Attempt::Silent);

        match attempt {
            Attempt::RefuseConnect => Err(herald_gotify::Error::message("connection refused")),
            Attempt::EventsThenError(events) => {
                let items = events
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(herald_gotify::Error::message(
                        "connection reset",
                    ))));
                Ok(stream::iter(items.collect::<Vec<_>>()).boxed())
            },
            Attempt::EventsThenClose(events) => {
                Ok(stream::iter(events.into_iter().map(Ok).collect::<Vec<_>>()).boxed())
            },
            Attempt::Silent => Ok(stream::pending().boxed()),
        }
    }
}

/// Records every delivery; fails or hangs for the configured destinations.
#[derive(Default)]
pub struct RecordingOutbound {
    sent: Mutex<Vec<(String, String)>>,
    attempts: Mutex<Vec<String>>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
}

impl RecordingOutbound {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_for(destinations: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: destinations.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        })
    }

    /// Deliveries to these destinations never complete.
    pub fn hanging_on(destinations: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            hanging: destinations.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        })
    }

    /// Successful deliveries as `(destination, text)`.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Every destination a delivery was attempted for, in order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelOutbound for RecordingOutbound {
    async fn send_text(&self, to: &str, text: &str) -> herald_channels::Result<()> {
        self.attempts.lock().unwrap().push(to.to_string());
        if self.failing.contains(to) {
            return Err(herald_channels::Error::unavailable(format!("{to} unreachable")));
        }
        if self.hanging.contains(to) {
            std::future::pending::<()>().await;
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), text.to_string()));
        Ok(())
    }
}

pub fn registry(destinations: &[&str]) -> Arc<DestinationRegistry> {
    Arc::new(DestinationRegistry::new(
        destinations.iter().map(|d| d.to_string()),
        Arc::new(InMemoryDestinationStore::new()),
    ))
}
