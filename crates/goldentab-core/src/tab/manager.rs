//! Tab and window manager traits.

use async_trait::async_trait;

use super::model::{CreateTab, CreateWindow, Tab, TabId, TabQuery, Window, WindowId};
use crate::error::Result;

/// Host tab list.
///
/// Removing or activating a tab that no longer exists fails with
/// [`GoldenTabError::NotFound`](crate::error::GoldenTabError::NotFound).
#[async_trait]
pub trait TabManager: Send + Sync {
    async fn query(&self, query: TabQuery) -> Result<Vec<Tab>>;

    async fn create(&self, properties: CreateTab) -> Result<Tab>;

    /// Closes every listed tab. Fails if any id is unknown, after closing the
    /// ones that are known.
    async fn remove(&self, ids: &[TabId]) -> Result<()>;

    /// Moves a tab; `window_id` of `None` keeps its window.
    async fn move_tab(&self, id: TabId, index: usize, window_id: Option<WindowId>) -> Result<Tab>;

    /// Makes the tab the active one in its window.
    async fn activate(&self, id: TabId) -> Result<Tab>;
}

/// Host window list.
#[async_trait]
pub trait WindowManager: Send + Sync {
    /// The window the calling surface lives in.
    async fn get_current(&self) -> Result<Window>;

    async fn get(&self, id: WindowId) -> Result<Window>;

    async fn get_all(&self) -> Result<Vec<Window>>;

    /// Opens a window; a focused one becomes the current window.
    async fn create_window(&self, properties: CreateWindow) -> Result<Window>;
}
