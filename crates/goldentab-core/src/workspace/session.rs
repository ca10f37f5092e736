//! Session snapshots of a workspace's tabs.
//!
//! A workspace keeps the tabs it had open while it is not active as plain
//! bookmarks inside its reserved `.session` child folder. Saving replaces
//! the folder's contents wholesale; restoring reads it without consuming it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bookmark::{BookmarkStore, CreateBookmark, SESSION_FOLDER_NAME};
use crate::error::Result;
use crate::tab::{CreateTab, Tab, TabManager, WindowId};

/// One saved tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub title: String,
    pub url: String,
}

/// Saves and restores workspace tab sets through the bookmark store.
#[derive(Clone)]
pub struct SessionSnapshotManager {
    bookmarks: Arc<dyn BookmarkStore>,
    tabs: Arc<dyn TabManager>,
}

impl SessionSnapshotManager {
    pub fn new(bookmarks: Arc<dyn BookmarkStore>, tabs: Arc<dyn TabManager>) -> Self {
        Self { bookmarks, tabs }
    }

    /// Returns the id of the workspace's `.session` folder, creating it as
    /// the first child when missing.
    ///
    /// Two callers racing here may both create a folder; the first one found
    /// by title wins on later lookups.
    pub async fn get_or_create_session_folder(&self, workspace_id: &str) -> Result<String> {
        if let Some(existing) = self
            .bookmarks
            .find_child_folder(workspace_id, SESSION_FOLDER_NAME)
            .await?
        {
            return Ok(existing.id);
        }

        let folder = self
            .bookmarks
            .create(CreateBookmark::folder(workspace_id, SESSION_FOLDER_NAME).at_index(0))
            .await?;
        tracing::debug!(
            "[Session] Created {} folder {} in workspace {}",
            SESSION_FOLDER_NAME,
            folder.id,
            workspace_id
        );
        Ok(folder.id)
    }

    /// The saved tabs of a workspace, in order. Empty when nothing was saved.
    pub async fn session_entries(&self, workspace_id: &str) -> Result<Vec<SessionEntry>> {
        let Some(folder) = self
            .bookmarks
            .find_child_folder(workspace_id, SESSION_FOLDER_NAME)
            .await?
        else {
            return Ok(Vec::new());
        };

        let children = self.bookmarks.get_children(&folder.id).await?;
        Ok(children
            .into_iter()
            .filter_map(|b| {
                let url = b.url()?.to_string();
                Some(SessionEntry {
                    title: b.title,
                    url,
                })
            })
            .collect())
    }

    /// Replaces the workspace's snapshot with `tabs`, in order.
    ///
    /// Existing entries that are already gone when deleted are skipped. An
    /// empty `tabs` leaves an empty snapshot. Returns the number of tabs saved.
    pub async fn save_current_tabs(&self, workspace_id: &str, tabs: &[Tab]) -> Result<usize> {
        let folder_id = self.get_or_create_session_folder(workspace_id).await?;

        let existing = match self.bookmarks.get_children(&folder_id).await {
            Ok(children) => children,
            Err(e) => {
                tracing::debug!("[Session] Could not list {}: {}", folder_id, e);
                Vec::new()
            }
        };
        for bookmark in existing {
            if let Err(e) = self.bookmarks.remove(&bookmark.id).await {
                tracing::debug!("[Session] Skipping removal of {}: {}", bookmark.id, e);
            }
        }

        for tab in tabs {
            self.bookmarks
                .create(CreateBookmark::bookmark(
                    folder_id.as_str(),
                    tab.bookmark_title(),
                    tab.url.as_str(),
                ))
                .await?;
        }

        tracing::info!(
            "[Session] Saved {} tab(s) to workspace {}",
            tabs.len(),
            workspace_id
        );
        Ok(tabs.len())
    }

    /// Opens every saved tab of the workspace in the background, in order.
    ///
    /// The snapshot is left in place. Returns the number of tabs opened.
    pub async fn restore_tabs(&self, workspace_id: &str, window_id: WindowId) -> Result<usize> {
        let entries = self.session_entries(workspace_id).await?;
        for entry in &entries {
            self.tabs
                .create(CreateTab::background(entry.url.as_str(), window_id))
                .await?;
        }
        tracing::info!(
            "[Session] Restored {} tab(s) from workspace {}",
            entries.len(),
            workspace_id
        );
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeHost, BAR, WINDOW};

    fn manager(host: &Arc<FakeHost>) -> SessionSnapshotManager {
        SessionSnapshotManager::new(host.clone(), host.clone())
    }

    #[tokio::test]
    async fn test_session_folder_created_once_at_index_zero() {
        let host = Arc::new(FakeHost::new());
        let ws = host.add_folder(BAR, "W {workspace}");
        host.add_bookmark(&ws, "A", "https://a.example/");
        let snapshots = manager(&host);

        let first = snapshots.get_or_create_session_folder(&ws).await.unwrap();
        let second = snapshots.get_or_create_session_folder(&ws).await.unwrap();
        assert_eq!(first, second);

        let children = host.get_children(&ws).await.unwrap();
        assert_eq!(children[0].id, first);
        assert_eq!(children[0].title, SESSION_FOLDER_NAME);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_snapshot() {
        let host = Arc::new(FakeHost::new());
        let ws = host.add_folder(BAR, "W {workspace}");
        let snapshots = manager(&host);

        let a = host.open("https://a.example/", "A");
        let b = host.open("https://b.example/", "");
        assert_eq!(snapshots.save_current_tabs(&ws, &[a, b.clone()]).await.unwrap(), 2);

        let folder = host.child_folder(&ws, SESSION_FOLDER_NAME).unwrap();
        assert_eq!(
            host.leaves(&folder),
            vec![
                ("A".to_string(), "https://a.example/".to_string()),
                ("https://b.example/".to_string(), "https://b.example/".to_string()),
            ]
        );

        assert_eq!(snapshots.save_current_tabs(&ws, &[b]).await.unwrap(), 1);
        assert_eq!(host.leaves(&folder).len(), 1);

        assert_eq!(snapshots.save_current_tabs(&ws, &[]).await.unwrap(), 0);
        assert!(host.leaves(&folder).is_empty());
    }

    #[tokio::test]
    async fn test_restore_opens_in_order_and_keeps_snapshot() {
        let host = Arc::new(FakeHost::new());
        let ws = host.add_folder(BAR, "W {workspace}");
        let session = host.add_folder(&ws, SESSION_FOLDER_NAME);
        host.add_bookmark(&session, "A", "https://a.example/");
        host.add_folder(&session, "not a tab");
        host.add_bookmark(&session, "B", "https://b.example/");
        let snapshots = manager(&host);

        assert_eq!(snapshots.restore_tabs(&ws, WINDOW).await.unwrap(), 2);
        assert_eq!(host.open_urls(), vec!["https://a.example/", "https://b.example/"]);
        assert_eq!(host.leaves(&session).len(), 2);
        assert_eq!(host.active_url().as_deref(), Some(crate::test_support::MANAGEMENT_URL));
    }

    #[tokio::test]
    async fn test_restore_without_session_folder_opens_nothing() {
        let host = Arc::new(FakeHost::new());
        let ws = host.add_folder(BAR, "W {workspace}");
        let snapshots = manager(&host);
        assert_eq!(snapshots.restore_tabs(&ws, WINDOW).await.unwrap(), 0);
        assert!(host.open_urls().is_empty());
    }

    #[tokio::test]
    async fn test_save_completes_when_old_entries_cannot_be_removed() {
        let host = Arc::new(FakeHost::new());
        let ws = host.add_folder(BAR, "W {workspace}");
        let session = host.add_folder(&ws, SESSION_FOLDER_NAME);
        host.add_bookmark(&session, "Old", "https://old.example/");
        let snapshots = manager(&host);

        let a = host.open("https://a.example/", "A");
        let b = host.open("https://b.example/", "B");
        host.fail_bookmark_remove(true);

        assert_eq!(snapshots.save_current_tabs(&ws, &[a, b]).await.unwrap(), 2);
        let urls: Vec<String> = host.leaves(&session).into_iter().map(|(_, u)| u).collect();
        assert_eq!(
            urls,
            vec!["https://old.example/", "https://a.example/", "https://b.example/"]
        );
    }
}
