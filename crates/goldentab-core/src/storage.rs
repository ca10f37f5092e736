//! Shared key-value storage trait.
//!
//! Models the extension's local storage area: JSON values under string keys,
//! readable by every surface, with a change feed so one surface can follow
//! writes made by another.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::Result;

/// One key changed in storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Shared key-value storage.
///
/// Reads and writes are independent calls; nothing makes a read followed by
/// a write atomic.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Subscribes to changes made after this call.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}
