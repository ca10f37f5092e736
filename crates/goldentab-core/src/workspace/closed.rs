//! Recently closed tabs of a workspace.
//!
//! Kept as bookmarks in the workspace's reserved `.closed` folder and capped
//! at a fixed capacity; the oldest entries by creation time go first.

use std::sync::Arc;

use crate::bookmark::{BookmarkNode, BookmarkStore, CreateBookmark, CLOSED_FOLDER_NAME};
use crate::error::Result;
use crate::tab::{CreateTab, Tab, TabManager, WindowId};

#[derive(Clone)]
pub struct ClosedTabsRing {
    bookmarks: Arc<dyn BookmarkStore>,
    tabs: Arc<dyn TabManager>,
    capacity: usize,
}

impl ClosedTabsRing {
    pub fn new(
        bookmarks: Arc<dyn BookmarkStore>,
        tabs: Arc<dyn TabManager>,
        capacity: usize,
    ) -> Self {
        Self {
            bookmarks,
            tabs,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn get_or_create_closed_folder(&self, workspace_id: &str) -> Result<String> {
        if let Some(existing) = self
            .bookmarks
            .find_child_folder(workspace_id, CLOSED_FOLDER_NAME)
            .await?
        {
            return Ok(existing.id);
        }
        let folder = self
            .bookmarks
            .create(CreateBookmark::folder(workspace_id, CLOSED_FOLDER_NAME).at_index(0))
            .await?;
        Ok(folder.id)
    }

    /// Records a closed tab and evicts the oldest entries beyond capacity.
    ///
    /// Does nothing for an empty URL.
    pub async fn add_closed_tab(&self, workspace_id: &str, url: &str, title: &str) -> Result<()> {
        if workspace_id.is_empty() || url.is_empty() {
            return Ok(());
        }

        let folder_id = self.get_or_create_closed_folder(workspace_id).await?;
        let title = if title.is_empty() { url } else { title };
        self.bookmarks
            .create(CreateBookmark::bookmark(folder_id.as_str(), title, url))
            .await?;

        self.prune(&folder_id).await;
        Ok(())
    }

    async fn prune(&self, folder_id: &str) {
        let mut children = match self.bookmarks.get_children(folder_id).await {
            Ok(children) => children,
            Err(e) => {
                tracing::debug!("[Closed] Folder {} unavailable for pruning: {}", folder_id, e);
                return;
            }
        };
        if children.len() <= self.capacity {
            return;
        }

        children.sort_by_key(|b| b.date_added);
        let excess = children.len() - self.capacity;
        for bookmark in children.into_iter().take(excess) {
            if let Err(e) = self.bookmarks.remove(&bookmark.id).await {
                tracing::debug!("[Closed] Entry {} already gone: {}", bookmark.id, e);
            }
        }
    }

    /// Closed tabs of the workspace, most recent first. Empty on any error.
    pub async fn closed_tabs(&self, workspace_id: &str) -> Vec<BookmarkNode> {
        match self.try_closed_tabs(workspace_id).await {
            Ok(tabs) => tabs,
            Err(e) => {
                tracing::debug!("[Closed] Could not list closed tabs of {}: {}", workspace_id, e);
                Vec::new()
            }
        }
    }

    async fn try_closed_tabs(&self, workspace_id: &str) -> Result<Vec<BookmarkNode>> {
        let Some(folder) = self
            .bookmarks
            .find_child_folder(workspace_id, CLOSED_FOLDER_NAME)
            .await?
        else {
            return Ok(Vec::new());
        };
        let mut tabs: Vec<BookmarkNode> = self
            .bookmarks
            .get_children(&folder.id)
            .await?
            .into_iter()
            .filter(|b| b.url().is_some())
            .collect();
        tabs.sort_by(|a, b| b.date_added.cmp(&a.date_added).then(b.index.cmp(&a.index)));
        Ok(tabs)
    }

    /// Opens a closed tab in the foreground and drops it from the list.
    ///
    /// Returns `None` when the entry is not a bookmark with a URL.
    pub async fn reopen_closed_tab(&self, bookmark_id: &str, window_id: WindowId) -> Result<Option<Tab>> {
        let bookmark = self.bookmarks.get(bookmark_id).await?;
        let Some(url) = bookmark.url() else {
            return Ok(None);
        };
        let tab = self.tabs.create(CreateTab::foreground(url, window_id)).await?;
        self.bookmarks.remove(bookmark_id).await?;
        Ok(Some(tab))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeHost, BAR, WINDOW};

    #[tokio::test]
    async fn test_ring_keeps_newest_entries() {
        let host = Arc::new(FakeHost::new());
        let ws = host.add_folder(BAR, "W {workspace}");
        let ring = ClosedTabsRing::new(host.clone(), host.clone(), 20);

        for i in 0..25 {
            ring.add_closed_tab(&ws, &format!("https://t{i}.example/"), "")
                .await
                .unwrap();
        }

        let folder = host.child_folder(&ws, CLOSED_FOLDER_NAME).unwrap();
        let urls: Vec<String> = host.leaves(&folder).into_iter().map(|(_, u)| u).collect();
        assert_eq!(urls.len(), 20);
        for i in 0..5 {
            assert!(!urls.contains(&format!("https://t{i}.example/")));
        }
        for i in 5..25 {
            assert!(urls.contains(&format!("https://t{i}.example/")));
        }
    }

    #[tokio::test]
    async fn test_closed_tabs_most_recent_first() {
        let host = Arc::new(FakeHost::new());
        let ws = host.add_folder(BAR, "W {workspace}");
        let ring = ClosedTabsRing::new(host.clone(), host.clone(), 20);

        assert!(ring.closed_tabs(&ws).await.is_empty());
        ring.add_closed_tab(&ws, "https://a.example/", "A").await.unwrap();
        ring.add_closed_tab(&ws, "https://b.example/", "").await.unwrap();
        ring.add_closed_tab(&ws, "", "ignored").await.unwrap();

        let closed = ring.closed_tabs(&ws).await;
        let titles: Vec<&str> = closed.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["https://b.example/", "A"]);
    }

    #[tokio::test]
    async fn test_reopen_removes_entry() {
        let host = Arc::new(FakeHost::new());
        let ws = host.add_folder(BAR, "W {workspace}");
        let ring = ClosedTabsRing::new(host.clone(), host.clone(), 20);
        ring.add_closed_tab(&ws, "https://a.example/", "A").await.unwrap();

        let entry = ring.closed_tabs(&ws).await.remove(0);
        let tab = ring.reopen_closed_tab(&entry.id, WINDOW).await.unwrap().unwrap();
        assert!(tab.active);
        assert_eq!(host.active_url().as_deref(), Some("https://a.example/"));
        assert!(ring.closed_tabs(&ws).await.is_empty());
    }

    #[tokio::test]
    async fn test_closed_tabs_of_missing_workspace_is_empty() {
        let host = Arc::new(FakeHost::new());
        let ring = ClosedTabsRing::new(host.clone(), host.clone(), 20);
        assert!(ring.closed_tabs("does-not-exist").await.is_empty());
    }
}
