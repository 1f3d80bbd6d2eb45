use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Telegram bot settings (`[channels.telegram]`).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Long-poll timeout passed to `getUpdates`, in seconds.
    pub poll_timeout_secs: u32,

    /// Seconds to wait after a failed `getUpdates` call.
    pub poll_error_backoff_secs: u64,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish_non_exhaustive()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: 30,
            poll_error_backoff_secs: 5,
        }
    }
}

impl TelegramConfig {
    /// Parse the raw `[channels.telegram]` table.
    pub fn from_value(value: serde_json::Value) -> crate::Result<Self> {
        let config: Self = serde_json::from_value(value)?;
        if config.token.expose_secret().trim().is_empty() {
            return Err(crate::Error::message("telegram bot token is required"));
        }
        Ok(config)
    }
}
