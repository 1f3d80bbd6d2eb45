use async_trait::async_trait;

use crate::Result;

/// Send text to a chat transport.
///
/// `to` is an opaque destination identifier as stored in the destination
/// registry; each transport decides how to interpret it. Retrying (rate
/// limits, flaky networks) is the transport's own business.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> Result<()>;
}

/// Probe transport health.
#[async_trait]
pub trait ChannelStatus: Send + Sync {
    async fn probe(&self) -> Result<ChannelHealthSnapshot>;
}

/// Transport health snapshot.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChannelHealthSnapshot {
    pub channel_type: String,
    pub connected: bool,
    pub details: Option<String>,
}
