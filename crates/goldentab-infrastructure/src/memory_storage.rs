//! Process-local key-value storage.

use std::collections::HashMap;

use async_trait::async_trait;
use goldentab_core::error::Result;
use goldentab_core::storage::{KeyValueStorage, StorageChange};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// [`KeyValueStorage`] kept in memory, shared by every surface holding the
/// same `Arc`.
pub struct MemoryStorage {
    values: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            values: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Storage pre-filled with `values`. No change events are sent for them.
    pub fn with_values(values: HashMap<String, Value>) -> Self {
        let storage = Self::new();
        Self {
            values: RwLock::new(values),
            ..storage
        }
    }

    fn notify(&self, key: &str, old_value: Option<Value>, new_value: Option<Value>) {
        // No receivers is fine.
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            old_value,
            new_value,
        });
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let old_value = self
            .values
            .write()
            .await
            .insert(key.to_string(), value.clone());
        self.notify(key, old_value, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let old_value = self.values.write().await.remove(key);
        if old_value.is_some() {
            self.notify(key, old_value, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
