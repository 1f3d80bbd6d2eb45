//! Config schema types (gotify server, allow-list, destinations, channels).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Default delay before reconnecting after a stream attempt that delivered nothing.
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 60;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    /// Application names to forward. Empty forwards every application.
    pub applications: Vec<String>,
    /// Registered delivery destinations (chat ids).
    pub destinations: Vec<String>,
    pub gotify: GotifyConfig,
    pub channels: ChannelsConfig,
}

/// Gotify server connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GotifyConfig {
    /// Base URL of the Gotify server, e.g. `https://push.example.com`.
    pub server: String,
    /// Client token used for the REST API and the websocket stream.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
    /// Seconds to wait before reconnecting when a stream attempt received no messages.
    pub reconnect_delay_secs: u64,
}

impl std::fmt::Debug for GotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GotifyConfig")
            .field("server", &self.server)
            .field("token", &"[REDACTED]")
            .field("reconnect_delay_secs", &self.reconnect_delay_secs)
            .finish()
    }
}

impl Default for GotifyConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            token: Secret::new(String::new()),
            reconnect_delay_secs: DEFAULT_RECONNECT_DELAY_SECS,
        }
    }
}

impl GotifyConfig {
    #[must_use]
    pub fn reconnect_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.reconnect_delay_secs)
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

/// Chat transport configuration. Each entry is handed to its channel crate
/// as raw JSON and parsed there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<serde_json::Value>,
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
