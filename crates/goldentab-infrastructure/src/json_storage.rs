//! Key-value storage persisted to a single JSON file.
//!
//! The file holds one JSON object. It is read once on open and rewritten on
//! every change through a temporary file renamed over the original, so a
//! crash mid-write leaves the previous contents intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use goldentab_core::error::{GoldenTabError, Result};
use goldentab_core::storage::{KeyValueStorage, StorageChange};
use serde_json::{Map, Value};
use tokio::sync::{broadcast, Mutex};

use crate::paths::ensure_parent_dir;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

pub struct JsonFileStorage {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

impl JsonFileStorage {
    /// Opens the storage file at `path`; a missing or empty file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => map,
                _ => {
                    return Err(GoldenTabError::storage(format!(
                        "{:?} does not hold a JSON object",
                        path
                    )));
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("[Storage] Opened {:?} with {} key(s)", path, values.len());

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            values: Mutex::new(values),
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, values: &Map<String, Value>) -> Result<()> {
        ensure_parent_dir(&self.path).await?;
        let content = serde_json::to_string_pretty(values)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for JsonFileStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock().await;
        let old_value = values.insert(key.to_string(), value.clone());
        if let Err(e) = self.persist(&values).await {
            // Keep memory and disk in agreement.
            match old_value {
                Some(old) => values.insert(key.to_string(), old),
                None => values.remove(key),
            };
            return Err(e);
        }
        drop(values);

        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: Some(value),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().await;
        let Some(old_value) = values.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&values).await {
            values.insert(key.to_string(), old_value);
            return Err(e);
        }
        drop(values);

        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            old_value: Some(old_value),
            new_value: None,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
