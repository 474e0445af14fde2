use std::collections::HashMap;

use tokio::sync::RwLock;

/// Local key-value data of a single node.
///
/// All access goes through one reader-writer lock: reads share it, every
/// mutation takes it exclusively. No method holds the lock across an `.await`
/// other than the lock acquisition itself, so callers can fan out or talk to
/// the network right after a call returns without blocking other requests.
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<String, String>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `entries`.
    pub fn with_entries(entries: HashMap<String, String>) -> Self {
        Self {
            data: RwLock::new(entries),
        }
    }

    /// Inserts or overwrites `key`.
    pub async fn set(&self, key: String, value: String) {
        self.data.write().await.insert(key, value);
    }

    /// Returns the current value of `key`, or `None` if it is absent.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.data.read().await.get(key).cloned()
    }

    /// Removes `key` if present. Deleting a missing key is not an error;
    /// the return value only tells whether something was removed.
    pub async fn delete(&self, key: &str) -> bool {
        self.data.write().await.remove(key).is_some()
    }

    /// Replaces the whole mapping with `snapshot`. Prior entries are dropped,
    /// not merged.
    pub async fn replace_all(&self, snapshot: HashMap<String, String>) {
        *self.data.write().await = snapshot;
    }

    /// Returns a copy of the full mapping.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.data.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}
