use std::sync::Arc;

use {
    herald_channels::{AppAllowlist, ChannelOutbound, DestinationRegistry},
    herald_gotify::NotificationEvent,
    tracing::{debug, info, warn},
};

use crate::directory::ApplicationDirectory;

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The application id is unknown (or nameless) even after a refresh.
    Unresolved,
    /// The application is not on the allow-list.
    Filtered { app: String },
    /// Delivery was attempted for every registered destination.
    Delivered { attempted: usize, failed: usize },
}

/// Render the notification text sent to chats.
pub fn format_notification(app: &str, event: &NotificationEvent) -> String {
    format!(
        "📨 New message\nFrom: {app}\nTitle: {}\nContent: {}",
        event.title, event.message
    )
}

/// Turns one Gotify event into deliveries.
pub struct Dispatcher {
    directory: Arc<ApplicationDirectory>,
    destinations: Arc<DestinationRegistry>,
    allowlist: AppAllowlist,
    outbound: Arc<dyn ChannelOutbound>,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<ApplicationDirectory>,
        destinations: Arc<DestinationRegistry>,
        allowlist: AppAllowlist,
        outbound: Arc<dyn ChannelOutbound>,
    ) -> Self {
        Self {
            directory,
            destinations,
            allowlist,
            outbound,
        }
    }

    /// Resolve, filter, format, and deliver `event`.
    ///
    /// Never fails: unresolved and filtered events are logged and dropped,
    /// and a failed delivery to one destination does not stop the others.
    pub async fn dispatch(&self, event: &NotificationEvent) -> DispatchOutcome {
        let Some(app) = self.resolve_app_name(event.appid).await else {
            info!(
                appid = event.appid,
                appname = ?event.appname,
                "application not found, dropping message"
            );
            return DispatchOutcome::Unresolved;
        };

        if !self.allowlist.is_allowed(&app) {
            info!(appid = event.appid, app = %app, "application not monitored, dropping message");
            return DispatchOutcome::Filtered { app };
        }

        let text = format_notification(&app, event);
        let targets = self.destinations.list();
        if targets.is_empty() {
            debug!(appid = event.appid, app = %app, "no destinations registered");
        }

        let mut results = Vec::with_capacity(targets.len());
        for destination in &targets {
            let result = self.outbound.send_text(destination, &text).await;
            results.push((destination, result));
        }

        let mut failed = 0;
        for (destination, result) in &results {
            if let Err(e) = result {
                failed += 1;
                warn!(destination = %destination, app = %app, error = %e, "delivery failed");
            }
        }
        debug!(
            appid = event.appid,
            app = %app,
            attempted = results.len(),
            failed,
            "message dispatched"
        );

        DispatchOutcome::Delivered {
            attempted: results.len(),
            failed,
        }
    }

    /// Look the name up, refreshing the directory at most once on a miss.
    async fn resolve_app_name(&self, appid: i64) -> Option<String> {
        if let Some(name) = self.directory.resolve_name(appid) {
            return Some(name);
        }

        debug!(appid, "application not cached, refreshing directory");
        if let Err(e) = self.directory.refresh().await {
            warn!(appid, error = %e, "application directory refresh failed");
            return None;
        }
        self.directory.resolve_name(appid)
    }
}
