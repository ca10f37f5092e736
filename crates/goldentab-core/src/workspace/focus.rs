//! Focused-tab memory per workspace.
//!
//! When the user leaves a workspace the URL of its focused tab is stored;
//! after coming back, the tab with that URL is focused again once it shows
//! up. Restored tabs appear asynchronously, so restoration polls for a
//! bounded number of attempts and then gives up quietly.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::config::FocusConfig;
use crate::error::Result;
use crate::storage::KeyValueStorage;
use crate::tab::{Tab, TabManager, TabQuery, WindowId};
use crate::url::normalize_url;

/// Storage key holding the workspace → last focused URL map.
pub const WORKSPACE_ACTIVE_TABS_KEY: &str = "workspaceActiveTabs";

#[derive(Clone)]
pub struct FocusRestorer {
    tabs: Arc<dyn TabManager>,
    storage: Arc<dyn KeyValueStorage>,
    window_id: WindowId,
    config: FocusConfig,
}

impl FocusRestorer {
    pub fn new(
        tabs: Arc<dyn TabManager>,
        storage: Arc<dyn KeyValueStorage>,
        window_id: WindowId,
        config: FocusConfig,
    ) -> Self {
        Self {
            tabs,
            storage,
            window_id,
            config,
        }
    }

    /// Stores the URL of the window's focused tab for `workspace_id`.
    pub async fn remember_active_tab(&self, workspace_id: &str) -> Result<Option<String>> {
        let active = self
            .tabs
            .query(TabQuery::active_in_window(self.window_id))
            .await?;
        let Some(url) = active
            .into_iter()
            .map(|t| t.url)
            .find(|url| !url.is_empty())
        else {
            return Ok(None);
        };

        let mut map = self.read_map().await?;
        map.insert(workspace_id.to_string(), Value::String(url.clone()));
        self.storage
            .set(WORKSPACE_ACTIVE_TABS_KEY, Value::Object(map))
            .await?;
        tracing::debug!("[Focus] Remembered {} for workspace {}", url, workspace_id);
        Ok(Some(url))
    }

    pub async fn saved_url(&self, workspace_id: &str) -> Result<Option<String>> {
        let map = self.read_map().await?;
        Ok(map
            .get(workspace_id)
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .map(str::to_string))
    }

    /// Focuses the remembered tab of `workspace_id` once it is open.
    ///
    /// Returns whether a tab was focused. Failures only end the attempt.
    pub async fn restore_active_tab(&self, workspace_id: &str) -> bool {
        let saved = match self.saved_url(workspace_id).await {
            Ok(Some(url)) => url,
            Ok(None) => return false,
            Err(e) => {
                tracing::debug!("[Focus] No saved tab for {}: {}", workspace_id, e);
                return false;
            }
        };
        let wanted = normalize_url(&saved);
        let delay = Duration::from_millis(self.config.retry_delay_ms);

        for attempt in 0..self.config.max_attempts {
            let tabs = match self.tabs.query(TabQuery::in_window(self.window_id)).await {
                Ok(tabs) => tabs,
                Err(e) => {
                    tracing::debug!("[Focus] Tab query failed: {}", e);
                    return false;
                }
            };

            let accept_loading = attempt >= self.config.accept_loading_after;
            if let Some(tab) = find_match(&tabs, &wanted, accept_loading) {
                return match self.tabs.activate(tab.id).await {
                    Ok(_) => {
                        tracing::debug!("[Focus] Focused {} after {} attempt(s)", saved, attempt + 1);
                        true
                    }
                    Err(e) => {
                        tracing::debug!("[Focus] Could not focus tab {}: {}", tab.id, e);
                        false
                    }
                };
            }

            tokio::time::sleep(delay).await;
        }

        tracing::debug!("[Focus] Gave up waiting for {}", saved);
        false
    }

    async fn read_map(&self) -> Result<Map<String, Value>> {
        Ok(match self.storage.get(WORKSPACE_ACTIVE_TABS_KEY).await? {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        })
    }
}

/// A fully loaded tab with the URL wins; a loading one is taken only when
/// `accept_loading` is set.
fn find_match<'a>(tabs: &'a [Tab], wanted: &str, accept_loading: bool) -> Option<&'a Tab> {
    let matches = |t: &&Tab| !t.url.is_empty() && normalize_url(&t.url) == wanted;
    tabs.iter()
        .filter(matches)
        .find(|t| t.is_complete())
        .or_else(|| {
            accept_loading
                .then(|| tabs.iter().find(matches))
                .flatten()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tab::TabStatus;
    use crate::test_support::{FakeHost, MemoryKv, WINDOW};

    fn restorer(host: &Arc<FakeHost>, kv: &Arc<MemoryKv>) -> FocusRestorer {
        FocusRestorer::new(host.clone(), kv.clone(), WINDOW, FocusConfig::default())
    }

    #[tokio::test]
    async fn test_remember_and_restore() {
        let host = Arc::new(FakeHost::new());
        let kv = Arc::new(MemoryKv::default());
        let focus = restorer(&host, &kv);

        let tab = host.open("https://www.a.example/page", "A");
        host.activate(tab.id).await.unwrap();
        assert_eq!(
            focus.remember_active_tab("ws").await.unwrap().as_deref(),
            Some("https://www.a.example/page")
        );

        let mgmt = host.query(TabQuery::in_window(WINDOW)).await.unwrap()[0].id;
        host.activate(mgmt).await.unwrap();
        host.open("https://a.example/page/", "A again");

        assert!(focus.restore_active_tab("ws").await);
        assert_eq!(host.active_url().as_deref(), Some("https://www.a.example/page"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_tab_accepted_after_threshold() {
        let host = Arc::new(FakeHost::new());
        let kv = Arc::new(MemoryKv::default());
        let focus = restorer(&host, &kv);
        kv.set(WORKSPACE_ACTIVE_TABS_KEY, serde_json::json!({"ws": "https://b.example/"}))
            .await
            .unwrap();

        host.open("https://b.example/", "B");
        host.set_status("https://b.example/", TabStatus::Loading);

        assert!(focus.restore_active_tab("ws").await);
        assert_eq!(host.active_url().as_deref(), Some("https://b.example/"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_quietly() {
        let host = Arc::new(FakeHost::new());
        let kv = Arc::new(MemoryKv::default());
        let focus = restorer(&host, &kv);
        kv.set(WORKSPACE_ACTIVE_TABS_KEY, serde_json::json!({"ws": "https://gone.example/"}))
            .await
            .unwrap();

        assert!(!focus.restore_active_tab("ws").await);
        assert!(!focus.restore_active_tab("unknown").await);
    }

    #[test]
    fn test_find_match_prefers_complete_tab() {
        let tab = |id, status| Tab {
            id,
            window_id: WINDOW,
            index: 0,
            url: "https://c.example/".to_string(),
            title: String::new(),
            active: false,
            pinned: false,
            status,
        };
        let tabs = vec![tab(1, TabStatus::Loading), tab(2, TabStatus::Complete)];
        assert_eq!(find_match(&tabs, "c.example", false).map(|t| t.id), Some(2));

        let loading = vec![tab(1, TabStatus::Loading)];
        assert!(find_match(&loading, "c.example", false).is_none());
        assert_eq!(find_match(&loading, "c.example", true).map(|t| t.id), Some(1));
    }
}
