use std::path::PathBuf;

use {
    async_trait::async_trait,
    herald_channels::{DestinationStore, Error as ChannelError},
    tracing::debug,
};

/// Persists destinations into the `destinations` key of a config file,
/// leaving the rest of the file untouched.
pub struct ConfigDestinationStore {
    path: PathBuf,
}

impl ConfigDestinationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl DestinationStore for ConfigDestinationStore {
    async fn save(&self, destinations: &[String]) -> herald_channels::Result<()> {
        let path = self.path.clone();
        let list = destinations.to_vec();
        tokio::task::spawn_blocking(move || herald_config::update_destinations(&path, &list))
            .await
            .map_err(|e| ChannelError::external("destination persist task", e))?
            .map_err(ChannelError::persist)?;
        debug!(path = %self.path.display(), count = destinations.len(), "destinations persisted");
        Ok(())
    }
}
