//! In-process render cache.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::RenderCache;

/// In-process [`RenderCache`] backed by a mutex-guarded map.
///
/// The lock is held only for the duration of a single map operation, never
/// across a render, so concurrent misses on the same key both render and
/// store; the second write wins and both bodies are identical by
/// construction.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RenderCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, body: &str) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(key.to_owned(), body.to_owned());
    }

    fn flush(&self) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        tracing::debug!(entries = entries.len(), "flushing render cache");
        entries.clear();
    }
}
