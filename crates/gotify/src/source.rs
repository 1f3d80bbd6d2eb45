use {async_trait::async_trait, futures::stream::BoxStream};

use crate::{
    Result,
    types::{Application, NotificationEvent},
};

/// Live message stream. Yields events in arrival order until the connection
/// closes (stream ends) or breaks (an `Err` item). It cannot be restarted;
/// open a new one instead.
pub type EventStream = BoxStream<'static, Result<NotificationEvent>>;

/// The notification server operations the bridge depends on.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Fetch the full current application list.
    async fn fetch_applications(&self) -> Result<Vec<Application>>;

    /// Open a new live event stream.
    async fn open_stream(&self) -> Result<EventStream>;
}
