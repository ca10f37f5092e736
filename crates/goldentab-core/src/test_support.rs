//! In-process fakes of the host APIs for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::bookmark::{BookmarkNode, BookmarkStore, CreateBookmark, MoveDestination};
use crate::error::{GoldenTabError, Result};
use crate::storage::{KeyValueStorage, StorageChange};
use crate::tab::{CreateTab, Tab, TabId, TabManager, TabQuery, TabStatus, WindowId};

pub const WINDOW: WindowId = 1;
pub const BAR: &str = "1";
pub const MANAGEMENT_URL: &str = "chrome-extension://goldentab/bookmarks.html";

// ============================================================================
// Key-value storage
// ============================================================================

pub struct MemoryKv {
    values: Mutex<HashMap<String, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

impl Default for MemoryKv {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            values: Mutex::new(HashMap::new()),
            changes,
        }
    }
}

#[async_trait]
impl KeyValueStorage for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let old_value = self
            .values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: Some(value),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let old_value = self.values.lock().unwrap().remove(key);
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: None,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

// ============================================================================
// Bookmarks and tabs
// ============================================================================

struct FakeNode {
    parent_id: Option<String>,
    title: String,
    url: Option<String>,
    date_added: i64,
    children: Vec<String>,
}

#[derive(Default)]
struct FakeState {
    nodes: HashMap<String, FakeNode>,
    next_id: u64,
    clock: i64,
    tabs: Vec<Tab>,
    next_tab_id: TabId,
    mutations: usize,
    fail_tab_create: bool,
    fail_bookmark_remove: bool,
    tab_remove_reports_missing: bool,
}

impl FakeState {
    fn build(&self, id: &str, deep: bool) -> Option<BookmarkNode> {
        let node = self.nodes.get(id)?;
        let index = node
            .parent_id
            .as_ref()
            .and_then(|p| self.nodes.get(p))
            .and_then(|p| p.children.iter().position(|c| c == id))
            .unwrap_or(0);
        let children = match (&node.url, deep) {
            (None, true) => Some(
                node.children
                    .iter()
                    .filter_map(|c| self.build(c, true))
                    .collect(),
            ),
            _ => None,
        };
        Some(BookmarkNode {
            id: id.to_string(),
            parent_id: node.parent_id.clone(),
            title: node.title.clone(),
            url: node.url.clone(),
            index,
            date_added: node.date_added,
            children,
        })
    }

    fn remove_recursive(&mut self, id: &str) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.remove_recursive(&child);
            }
        }
    }

    fn reindex(&mut self, window_id: WindowId) {
        for (index, tab) in self
            .tabs
            .iter_mut()
            .filter(|t| t.window_id == window_id)
            .enumerate()
        {
            tab.index = index;
        }
    }
}

/// Bookmark tree plus tab strip of a single window.
pub struct FakeHost {
    state: Mutex<FakeState>,
}

impl FakeHost {
    /// Root `"0"` with a bookmarks bar `"1"` and the management tab open.
    pub fn new() -> Self {
        let mut state = FakeState {
            next_id: 100,
            next_tab_id: 1,
            ..Default::default()
        };
        state.nodes.insert(
            "0".to_string(),
            FakeNode {
                parent_id: None,
                title: String::new(),
                url: None,
                date_added: 0,
                children: vec![BAR.to_string()],
            },
        );
        state.nodes.insert(
            BAR.to_string(),
            FakeNode {
                parent_id: Some("0".to_string()),
                title: "Bookmarks Bar".to_string(),
                url: None,
                date_added: 0,
                children: Vec::new(),
            },
        );
        let host = Self {
            state: Mutex::new(state),
        };
        host.push_tab(MANAGEMENT_URL, "GoldenTab", true);
        host
    }

    pub fn add_folder(&self, parent_id: &str, title: &str) -> String {
        self.insert(parent_id, title, None, None).unwrap().id
    }

    pub fn add_bookmark(&self, parent_id: &str, title: &str, url: &str) -> String {
        self.insert(parent_id, title, Some(url.to_string()), None)
            .unwrap()
            .id
    }

    pub fn open(&self, url: &str, title: &str) -> Tab {
        self.push_tab(url, title, false)
    }

    /// URLs of the window's tabs, management tab excluded.
    pub fn open_urls(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .tabs
            .iter()
            .filter(|t| t.url != MANAGEMENT_URL)
            .map(|t| t.url.clone())
            .collect()
    }

    /// URLs of every tab in strip order, management tab included.
    pub fn all_urls(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .tabs
            .iter()
            .map(|t| t.url.clone())
            .collect()
    }

    /// `(title, url)` of the leaves in a folder, in order.
    pub fn leaves(&self, folder_id: &str) -> Vec<(String, String)> {
        let state = self.state.lock().unwrap();
        state
            .nodes
            .get(folder_id)
            .map(|f| {
                f.children
                    .iter()
                    .filter_map(|c| state.nodes.get(c))
                    .filter_map(|n| n.url.clone().map(|u| (n.title.clone(), u)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn child_folder(&self, parent_id: &str, title: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.nodes.get(parent_id).and_then(|p| {
            p.children
                .iter()
                .find(|c| {
                    state
                        .nodes
                        .get(*c)
                        .is_some_and(|n| n.title == title && n.url.is_none())
                })
                .cloned()
        })
    }

    pub fn mutations(&self) -> usize {
        self.state.lock().unwrap().mutations
    }

    pub fn fail_tab_create(&self, fail: bool) {
        self.state.lock().unwrap().fail_tab_create = fail;
    }

    /// Makes bookmark removal fail with a host error, removing nothing.
    pub fn fail_bookmark_remove(&self, fail: bool) {
        self.state.lock().unwrap().fail_bookmark_remove = fail;
    }

    /// Makes tab removal close the requested tabs, then report one of them
    /// as already gone, the way the host does when the user closed it first.
    pub fn tab_remove_reports_missing(&self, report: bool) {
        self.state.lock().unwrap().tab_remove_reports_missing = report;
    }

    pub fn set_status(&self, url: &str, status: TabStatus) {
        let mut state = self.state.lock().unwrap();
        for tab in state.tabs.iter_mut().filter(|t| t.url == url) {
            tab.status = status;
        }
    }

    pub fn active_url(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .tabs
            .iter()
            .find(|t| t.active)
            .map(|t| t.url.clone())
    }

    fn push_tab(&self, url: &str, title: &str, active: bool) -> Tab {
        let mut state = self.state.lock().unwrap();
        let id = state.next_tab_id;
        state.next_tab_id += 1;
        if active {
            state.tabs.iter_mut().for_each(|t| t.active = false);
        }
        let tab = Tab {
            id,
            window_id: WINDOW,
            index: 0,
            url: url.to_string(),
            title: title.to_string(),
            active,
            pinned: false,
            status: TabStatus::Complete,
        };
        state.tabs.push(tab);
        state.reindex(WINDOW);
        state.tabs.iter().find(|t| t.id == id).cloned().unwrap()
    }

    fn insert(
        &self,
        parent_id: &str,
        title: &str,
        url: Option<String>,
        index: Option<usize>,
    ) -> Result<BookmarkNode> {
        let mut state = self.state.lock().unwrap();
        if !state
            .nodes
            .get(parent_id)
            .is_some_and(|p| p.url.is_none())
        {
            return Err(GoldenTabError::not_found("bookmark", parent_id));
        }
        let id = state.next_id.to_string();
        state.next_id += 1;
        state.clock += 1;
        let date_added = state.clock;
        state.nodes.insert(
            id.clone(),
            FakeNode {
                parent_id: Some(parent_id.to_string()),
                title: title.to_string(),
                url,
                date_added,
                children: Vec::new(),
            },
        );
        let siblings = &mut state.nodes.get_mut(parent_id).unwrap().children;
        let at = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(at, id.clone());
        Ok(state.build(&id, false).unwrap())
    }
}

#[async_trait]
impl BookmarkStore for FakeHost {
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>> {
        let state = self.state.lock().unwrap();
        Ok(state.build("0", true).into_iter().collect())
    }

    async fn get_sub_tree(&self, id: &str) -> Result<Vec<BookmarkNode>> {
        let state = self.state.lock().unwrap();
        state
            .build(id, true)
            .map(|n| vec![n])
            .ok_or_else(|| GoldenTabError::not_found("bookmark", id))
    }

    async fn get_children(&self, id: &str) -> Result<Vec<BookmarkNode>> {
        let state = self.state.lock().unwrap();
        let node = state
            .nodes
            .get(id)
            .ok_or_else(|| GoldenTabError::not_found("bookmark", id))?;
        Ok(node
            .children
            .iter()
            .filter_map(|c| state.build(c, false))
            .collect())
    }

    async fn get(&self, id: &str) -> Result<BookmarkNode> {
        let state = self.state.lock().unwrap();
        state
            .build(id, false)
            .ok_or_else(|| GoldenTabError::not_found("bookmark", id))
    }

    async fn create(&self, details: CreateBookmark) -> Result<BookmarkNode> {
        self.state.lock().unwrap().mutations += 1;
        self.insert(&details.parent_id, &details.title, details.url, details.index)
    }

    async fn update_title(&self, id: &str, title: &str) -> Result<BookmarkNode> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        let node = state
            .nodes
            .get_mut(id)
            .ok_or_else(|| GoldenTabError::not_found("bookmark", id))?;
        node.title = title.to_string();
        Ok(state.build(id, false).unwrap())
    }

    async fn move_node(&self, id: &str, destination: MoveDestination) -> Result<BookmarkNode> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        let old_parent = state
            .nodes
            .get(id)
            .and_then(|n| n.parent_id.clone())
            .ok_or_else(|| GoldenTabError::not_found("bookmark", id))?;
        if let Some(parent) = state.nodes.get_mut(&old_parent) {
            parent.children.retain(|c| c != id);
        }
        let siblings = &mut state
            .nodes
            .get_mut(&destination.parent_id)
            .ok_or_else(|| GoldenTabError::not_found("bookmark", &destination.parent_id))?
            .children;
        let at = destination.index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(at, id.to_string());
        if let Some(node) = state.nodes.get_mut(id) {
            node.parent_id = Some(destination.parent_id.clone());
        }
        Ok(state.build(id, false).unwrap())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_bookmark_remove {
            return Err(GoldenTabError::host("bookmark removal refused"));
        }
        state.mutations += 1;
        let parent_id = state
            .nodes
            .get(id)
            .ok_or_else(|| GoldenTabError::not_found("bookmark", id))?
            .parent_id
            .clone();
        if let Some(parent_id) = parent_id
            && let Some(parent) = state.nodes.get_mut(&parent_id)
        {
            parent.children.retain(|c| c != id);
        }
        state.remove_recursive(id);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<BookmarkNode>> {
        let state = self.state.lock().unwrap();
        let needle = query.to_lowercase();
        let mut ids: Vec<&String> = state
            .nodes
            .iter()
            .filter(|(_, n)| {
                n.title.to_lowercase().contains(&needle)
                    || n.url.as_deref().is_some_and(|u| u.to_lowercase().contains(&needle))
            })
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        Ok(ids.into_iter().filter_map(|id| state.build(id, false)).collect())
    }
}

#[async_trait]
impl TabManager for FakeHost {
    async fn query(&self, query: TabQuery) -> Result<Vec<Tab>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tabs
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn create(&self, properties: CreateTab) -> Result<Tab> {
        {
            let mut state = self.state.lock().unwrap();
            if state.fail_tab_create {
                return Err(GoldenTabError::host("tab creation refused"));
            }
            state.mutations += 1;
        }
        let tab = self.push_tab(&properties.url, &properties.url, properties.active);
        Ok(tab)
    }

    async fn remove(&self, ids: &[TabId]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        let missing = ids
            .iter()
            .find(|id| !state.tabs.iter().any(|t| t.id == **id))
            .copied()
            .or_else(|| ids.first().copied().filter(|_| state.tab_remove_reports_missing));
        state.tabs.retain(|t| !ids.contains(&t.id));
        state.reindex(WINDOW);
        match missing {
            Some(id) => Err(GoldenTabError::not_found("tab", id.to_string())),
            None => Ok(()),
        }
    }

    async fn move_tab(&self, id: TabId, index: usize, _window_id: Option<WindowId>) -> Result<Tab> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        let from = state
            .tabs
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| GoldenTabError::not_found("tab", id.to_string()))?;
        let tab = state.tabs.remove(from);
        let at = index.min(state.tabs.len());
        state.tabs.insert(at, tab);
        state.reindex(WINDOW);
        Ok(state.tabs[at].clone())
    }

    async fn activate(&self, id: TabId) -> Result<Tab> {
        let mut state = self.state.lock().unwrap();
        if !state.tabs.iter().any(|t| t.id == id) {
            return Err(GoldenTabError::not_found("tab", id.to_string()));
        }
        for tab in state.tabs.iter_mut() {
            tab.active = tab.id == id;
        }
        Ok(state.tabs.iter().find(|t| t.id == id).cloned().unwrap())
    }
}
