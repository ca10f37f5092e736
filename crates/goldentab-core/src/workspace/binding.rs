//! Per-window active workspace bindings.
//!
//! Stored under one shared key as an object keyed by window id:
//!
//! ```json
//! { "activeWorkspaces": { "1": "42", "7": null } }
//! ```
//!
//! Every write is a read-modify-write of the whole object. Two surfaces
//! writing at the same time can lose one of the updates (last writer wins)
//! unless the store is built with [`BindingStore::serialized`], which only
//! covers writers sharing that store instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::{GoldenTabError, Result};
use crate::storage::{KeyValueStorage, StorageChange};
use crate::tab::WindowId;

/// Storage key holding the window → workspace map.
pub const ACTIVE_WORKSPACES_KEY: &str = "activeWorkspaces";

/// Persistence wrapper for window → workspace bindings.
#[derive(Clone)]
pub struct BindingStore {
    storage: Arc<dyn KeyValueStorage>,
    write_guard: Option<Arc<Mutex<()>>>,
}

impl BindingStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            write_guard: None,
        }
    }

    /// Serializes read-modify-write cycles made through this store and its clones.
    pub fn serialized(mut self) -> Self {
        self.write_guard = Some(Arc::new(Mutex::new(())));
        self
    }

    pub fn is_serialized(&self) -> bool {
        self.write_guard.is_some()
    }

    /// Returns the workspace bound to the window, if any.
    pub async fn get(&self, window_id: WindowId) -> Result<Option<String>> {
        let map = self.read_map().await?;
        Ok(map
            .get(&window_id.to_string())
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string))
    }

    /// Binds the window to a workspace, or stores an explicit `null`.
    pub async fn set(&self, window_id: WindowId, workspace_id: Option<&str>) -> Result<()> {
        let value = workspace_id.map_or(Value::Null, |id| Value::String(id.to_string()));
        self.modify(|map| {
            map.insert(window_id.to_string(), value);
        })
        .await?;
        tracing::debug!("[Binding] window {} -> {:?}", window_id, workspace_id);
        Ok(())
    }

    /// Removes the window's entry.
    pub async fn clear(&self, window_id: WindowId) -> Result<()> {
        self.modify(|map| {
            map.remove(&window_id.to_string());
        })
        .await?;
        tracing::debug!("[Binding] window {} cleared", window_id);
        Ok(())
    }

    /// Every window that currently has a workspace bound.
    pub async fn all(&self) -> Result<BTreeMap<WindowId, String>> {
        let map = self.read_map().await?;
        Ok(map
            .iter()
            .filter_map(|(window, value)| {
                let window_id = window.parse::<WindowId>().ok()?;
                let workspace_id = value.as_str().filter(|id| !id.is_empty())?;
                Some((window_id, workspace_id.to_string()))
            })
            .collect())
    }

    async fn modify<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Map<String, Value>) + Send,
    {
        let _guard = match &self.write_guard {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };
        let mut map = self.read_map().await?;
        f(&mut map);
        self.storage
            .set(ACTIVE_WORKSPACES_KEY, Value::Object(map))
            .await
    }

    async fn read_map(&self) -> Result<Map<String, Value>> {
        match self.storage.get(ACTIVE_WORKSPACES_KEY).await? {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map),
            Some(other) => Err(GoldenTabError::storage(format!(
                "'{}' is not an object: {}",
                ACTIVE_WORKSPACES_KEY, other
            ))),
        }
    }
}

/// Interprets a storage change for one window.
///
/// Returns `None` when the change does not concern the window's binding, and
/// `Some(binding)` with the new value otherwise.
pub fn binding_change(change: &StorageChange, window_id: WindowId) -> Option<Option<String>> {
    if change.key != ACTIVE_WORKSPACES_KEY {
        return None;
    }
    let key = window_id.to_string();
    let read = |value: &Option<Value>| -> Option<String> {
        value
            .as_ref()
            .and_then(|v| v.get(&key))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    };
    let old = read(&change.old_value);
    let new = read(&change.new_value);
    (old != new).then_some(new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryKv;
    use serde_json::json;

    fn store() -> (Arc<MemoryKv>, BindingStore) {
        let kv = Arc::new(MemoryKv::default());
        (kv.clone(), BindingStore::new(kv))
    }

    #[tokio::test]
    async fn test_get_set_clear() {
        let (kv, bindings) = store();
        assert_eq!(bindings.get(1).await.unwrap(), None);

        bindings.set(1, Some("42")).await.unwrap();
        bindings.set(2, Some("43")).await.unwrap();
        assert_eq!(bindings.get(1).await.unwrap().as_deref(), Some("42"));
        assert_eq!(bindings.get(2).await.unwrap().as_deref(), Some("43"));

        bindings.set(1, None).await.unwrap();
        assert_eq!(bindings.get(1).await.unwrap(), None);
        assert_eq!(
            kv.get(ACTIVE_WORKSPACES_KEY).await.unwrap(),
            Some(json!({"1": null, "2": "43"}))
        );

        bindings.clear(2).await.unwrap();
        assert_eq!(
            kv.get(ACTIVE_WORKSPACES_KEY).await.unwrap(),
            Some(json!({"1": null}))
        );
    }

    #[tokio::test]
    async fn test_one_value_per_window() {
        let (_kv, bindings) = store();
        bindings.set(5, Some("a")).await.unwrap();
        bindings.set(5, Some("b")).await.unwrap();
        let all = bindings.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get(&5).map(String::as_str), Some("b"));
    }

    #[tokio::test]
    async fn test_malformed_value_is_an_error() {
        let (kv, bindings) = store();
        kv.set(ACTIVE_WORKSPACES_KEY, json!("oops")).await.unwrap();
        assert!(bindings.get(1).await.is_err());
    }

    #[tokio::test]
    async fn test_serialized_store_keeps_concurrent_writes() {
        let (_kv, bindings) = store();
        let bindings = bindings.serialized();
        assert!(bindings.is_serialized());

        let a = bindings.clone();
        let b = bindings.clone();
        let (ra, rb) = tokio::join!(a.set(1, Some("x")), b.set(2, Some("y")));
        ra.unwrap();
        rb.unwrap();

        let all = bindings.all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_binding_change() {
        let change = StorageChange {
            key: ACTIVE_WORKSPACES_KEY.to_string(),
            old_value: Some(json!({"1": "a"})),
            new_value: Some(json!({"1": "b", "2": "c"})),
        };
        assert_eq!(binding_change(&change, 1), Some(Some("b".to_string())));
        assert_eq!(binding_change(&change, 2), Some(Some("c".to_string())));
        assert_eq!(binding_change(&change, 3), None);

        let cleared = StorageChange {
            key: ACTIVE_WORKSPACES_KEY.to_string(),
            old_value: Some(json!({"1": "a"})),
            new_value: Some(json!({})),
        };
        assert_eq!(binding_change(&cleared, 1), Some(None));

        let other = StorageChange {
            key: "workspaceActiveTabs".to_string(),
            old_value: None,
            new_value: Some(json!({"1": "x"})),
        };
        assert_eq!(binding_change(&other, 1), None);
    }
}
