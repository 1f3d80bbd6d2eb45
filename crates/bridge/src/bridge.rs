use std::{sync::Arc, time::Duration};

use {
    herald_channels::{AppAllowlist, ChannelOutbound, DestinationRegistry, DestinationStore},
    herald_config::HeraldConfig,
    herald_gotify::NotificationSource,
    tokio::{sync::Mutex, task::JoinHandle},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use crate::{
    Result, command, directory::ApplicationDirectory, dispatcher::Dispatcher,
    supervisor::StreamSupervisor,
};

/// Settings the bridge is built from.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Application names to forward; empty forwards everything.
    pub allowlist: Vec<String>,
    /// Destinations known at startup.
    pub destinations: Vec<String>,
    pub reconnect_delay: Duration,
}

impl BridgeSettings {
    pub fn from_config(config: &HeraldConfig) -> Self {
        Self {
            allowlist: config.applications.clone(),
            destinations: config.destinations.clone(),
            reconnect_delay: config.gotify.reconnect_delay(),
        }
    }
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the supervisor task and the destination registry.
pub struct Bridge {
    supervisor: Arc<StreamSupervisor>,
    registry: Arc<DestinationRegistry>,
    task: Mutex<Option<RunningTask>>,
}

impl Bridge {
    pub fn new(
        source: Arc<dyn NotificationSource>,
        outbound: Arc<dyn ChannelOutbound>,
        store: Arc<dyn DestinationStore>,
        settings: BridgeSettings,
    ) -> Self {
        let registry = Arc::new(DestinationRegistry::new(settings.destinations, store));
        let directory = Arc::new(ApplicationDirectory::new(Arc::clone(&source)));
        let dispatcher = Arc::new(Dispatcher::new(
            directory,
            Arc::clone(&registry),
            AppAllowlist::new(settings.allowlist),
            outbound,
        ));
        let supervisor = Arc::new(StreamSupervisor::new(
            source,
            dispatcher,
            settings.reconnect_delay,
        ));

        Self {
            supervisor,
            registry,
            task: Mutex::new(None),
        }
    }

    /// Start streaming in the background. No-op while already running.
    pub async fn initialize(&self) {
        let mut task = self.task.lock().await;
        if let Some(running) = task.as_ref()
            && !running.handle.is_finished()
        {
            info!("gotify bridge already running");
            return;
        }

        let cancel = CancellationToken::new();
        let supervisor = Arc::clone(&self.supervisor);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { supervisor.run(token).await });
        *task = Some(RunningTask { cancel, handle });
        info!(destinations = self.registry.len(), "gotify bridge initialized");
    }

    /// Stop streaming and wait for the task to exit. Safe to call repeatedly
    /// or without a prior [`initialize`](Self::initialize).
    pub async fn terminate(&self) {
        let Some(running) = self.task.lock().await.take() else {
            return;
        };
        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            warn!(error = %e, "gotify bridge task ended abnormally");
        }
        info!("gotify bridge terminated");
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Register `origin` as a destination; returns the acknowledgement text.
    pub async fn register_origin(&self, origin: &str) -> Result<String> {
        command::register_origin(&self.registry, origin).await
    }

    pub fn registry(&self) -> &Arc<DestinationRegistry> {
        &self.registry
    }

    pub fn supervisor(&self) -> &Arc<StreamSupervisor> {
        &self.supervisor
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            supervisor::SupervisorState,
            testing::{Attempt, FakeSource, RecordingOutbound},
        },
        herald_channels::InMemoryDestinationStore,
        herald_gotify::{Application, NotificationEvent},
    };

    fn settings(allow: &[&str], destinations: &[&str]) -> BridgeSettings {
        BridgeSettings {
            allowlist: allow.iter().map(|s| s.to_string()).collect(),
            destinations: destinations.iter().map(|s| s.to_string()).collect(),
            reconnect_delay: Duration::from_secs(60),
        }
    }

    fn bridge(
        source: Arc<FakeSource>,
        outbound: Arc<RecordingOutbound>,
        settings: BridgeSettings,
    ) -> (Bridge, Arc<InMemoryDestinationStore>) {
        let store = Arc::new(InMemoryDestinationStore::new());
        let bridge = Bridge::new(
            source,
            outbound,
            Arc::clone(&store) as Arc<dyn DestinationStore>,
            settings,
        );
        (bridge, store)
    }

    #[test]
    fn settings_from_config() {
        let cfg = HeraldConfig {
            applications: vec!["Server".into()],
            destinations: vec!["1".into(), "2".into()],
            gotify: herald_config::GotifyConfig {
                reconnect_delay_secs: 5,
                ..Default::default()
            },
            ..Default::default()
        };

        let s = BridgeSettings::from_config(&cfg);

        assert_eq!(s.allowlist, vec!["Server"]);
        assert_eq!(s.destinations, vec!["1", "2"]);
        assert_eq!(s.reconnect_delay, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn terminate_without_initialize_is_noop() {
        let (b, _) = bridge(
            FakeSource::scripted(Vec::new()),
            RecordingOutbound::new(),
            settings(&[], &[]),
        );
        b.terminate().await;
        b.terminate().await;
        assert!(!b.is_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn initialize_twice_runs_one_task() {
        let source = FakeSource::scripted(vec![Attempt::Silent]);
        let (b, _) = bridge(source.clone(), RecordingOutbound::new(), settings(&[], &[]));
        let mut states = b.supervisor().subscribe_state();

        b.initialize().await;
        b.initialize().await;
        states
            .wait_for(|s| *s == SupervisorState::Streaming)
            .await
            .unwrap();
        assert!(b.is_running().await);
        assert_eq!(source.open_count(), 1);

        b.terminate().await;
        assert!(!b.is_running().await);
        assert_eq!(b.supervisor().state(), SupervisorState::Stopped);
        b.terminate().await;
    }

    #[tokio::test(start_paused = true)]
    async fn can_restart_after_terminate() {
        let source = FakeSource::scripted(vec![Attempt::Silent, Attempt::Silent]);
        let (b, _) = bridge(source.clone(), RecordingOutbound::new(), settings(&[], &[]));
        let mut states = b.supervisor().subscribe_state();

        b.initialize().await;
        states
            .wait_for(|s| *s == SupervisorState::Streaming)
            .await
            .unwrap();
        b.terminate().await;

        b.initialize().await;
        states
            .wait_for(|s| *s == SupervisorState::Streaming)
            .await
            .unwrap();
        assert_eq!(source.open_count(), 2);
        b.terminate().await;
    }

    #[tokio::test(start_paused = true)]
    async fn registered_origin_receives_later_events() {
        let source = FakeSource::scripted(vec![
            Attempt::RefuseConnect,
            Attempt::EventsThenClose(vec![NotificationEvent::new(1, "Down", "disk full")]),
        ]);
        source.set_apps(vec![Application::new(1, "Server")]);
        let outbound = RecordingOutbound::new();
        let (b, store) = bridge(source.clone(), outbound.clone(), settings(&["Server"], &[]));

        b.initialize().await;
        // Registered while the supervisor is backing off.
        let ack = b.register_origin("chatA").await.unwrap();
        assert!(!ack.is_empty());
        assert_eq!(store.last_saved(), Some(vec!["chatA".to_string()]));

        tokio::time::sleep(Duration::from_secs(61)).await;
        b.terminate().await;

        let sent = outbound.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "chatA");
        assert!(sent[0].1.contains("From: Server"));
    }
}
