use std::{
    collections::HashSet,
    sync::{Arc, RwLock},
};

use tracing::{debug, info};

use crate::{Result, store::DestinationStore};

/// Registry of delivery destinations.
///
/// Entries are unique and keep the order in which they were first added.
/// Readers get snapshots; writers are serialized so that the list handed to
/// the store always matches the mutation order.
pub struct DestinationRegistry {
    destinations: RwLock<Vec<String>>,
    /// Held across mutate + persist so concurrent `add`s persist in order.
    write_lock: tokio::sync::Mutex<()>,
    store: Arc<dyn DestinationStore>,
}

impl DestinationRegistry {
    /// Build a registry hydrated from `initial` (typically the configured
    /// list). Duplicates collapse onto their first occurrence. Nothing is
    /// persisted here.
    pub fn new<I>(initial: I, store: Arc<dyn DestinationStore>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let destinations: Vec<String> = initial
            .into_iter()
            .filter(|d| seen.insert(d.clone()))
            .collect();
        debug!(count = destinations.len(), "destination registry hydrated");
        Self {
            destinations: RwLock::new(destinations),
            write_lock: tokio::sync::Mutex::new(()),
            store,
        }
    }

    /// Add `destination` and persist the full list.
    ///
    /// Adding an existing destination leaves the list unchanged but still
    /// persists. Returns `true` when the destination was new.
    pub async fn add(&self, destination: impl Into<String>) -> Result<bool> {
        let destination = destination.into();
        let _guard = self.write_lock.lock().await;

        let (inserted, snapshot) = {
            let mut list = self
                .destinations
                .write()
                .unwrap_or_else(|e| e.into_inner());
            let inserted = !list.contains(&destination);
            if inserted {
                list.push(destination.clone());
            }
            (inserted, list.clone())
        };

        self.store.save(&snapshot).await?;
        info!(
            destination = %destination,
            inserted,
            count = snapshot.len(),
            "destination registered"
        );
        Ok(inserted)
    }

    /// Snapshot of the current destinations in registry order.
    pub fn list(&self) -> Vec<String> {
        self.destinations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn contains(&self, destination: &str) -> bool {
        self.destinations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|d| d == destination)
    }

    pub fn len(&self) -> usize {
        self.destinations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
