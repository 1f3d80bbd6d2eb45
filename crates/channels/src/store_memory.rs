//! In-memory destination store for tests and dry runs.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Result, store::DestinationStore};

/// Keeps every saved snapshot in memory. No persistence.
#[derive(Default)]
pub struct InMemoryDestinationStore {
    saves: Mutex<Vec<Vec<String>>>,
}

impl InMemoryDestinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save` calls seen so far.
    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// The most recently saved list, if any.
    pub fn last_saved(&self) -> Option<Vec<String>> {
        self.saves
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

#[async_trait]
impl DestinationStore for InMemoryDestinationStore {
    async fn save(&self, destinations: &[String]) -> Result<()> {
        let mut saves = self.saves.lock().unwrap_or_else(|e| e.into_inner());
        saves.push(destinations.to_vec());
        Ok(())
    }
}
