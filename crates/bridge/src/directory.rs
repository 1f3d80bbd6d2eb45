use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use {
    herald_gotify::{Application, NotificationSource},
    tracing::debug,
};

/// In-memory snapshot of the server's applications, keyed by id.
///
/// The snapshot may be stale or incomplete. It only changes through
/// [`refresh`](Self::refresh), which replaces it wholesale.
pub struct ApplicationDirectory {
    source: Arc<dyn NotificationSource>,
    cache: RwLock<HashMap<i64, Application>>,
}

impl ApplicationDirectory {
    /// Create an empty directory backed by `source`.
    pub fn new(source: Arc<dyn NotificationSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Re-fetch the application list and replace the cache with it.
    ///
    /// Concurrent refreshes are not coalesced; the last one to finish wins.
    /// On error the previous snapshot is kept. Returns the number of cached
    /// applications.
    pub async fn refresh(&self) -> herald_gotify::Result<usize> {
        let apps = self.source.fetch_applications().await?;
        let fresh: HashMap<i64, Application> = apps.into_iter().map(|a| (a.id, a)).collect();
        let count = fresh.len();
        *self.cache.write().unwrap_or_else(|e| e.into_inner()) = fresh;
        debug!(count, "application directory refreshed");
        Ok(count)
    }

    pub fn lookup(&self, id: i64) -> Option<Application> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }

    /// Name of the application with `id`, if it is cached and has one.
    pub fn resolve_name(&self, id: i64) -> Option<String> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .and_then(Application::display_name)
            .map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
