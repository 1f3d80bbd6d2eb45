use async_trait::async_trait;

use crate::Result;

/// Durable storage for the registered destination list.
///
/// `save` always receives the complete list; implementations overwrite
/// whatever they stored before.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    async fn save(&self, destinations: &[String]) -> Result<()>;
}
