//! In-memory browser host.
//!
//! [`InMemoryBrowser`] simulates the parts of a browser the workspace
//! protocol talks to: a bookmark tree, windows and their tab strips. It backs
//! the CLI and the integration tests, and can be saved to and loaded from a
//! JSON [`BrowserProfile`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use goldentab_core::bookmark::{BookmarkNode, BookmarkStore, CreateBookmark, MoveDestination};
use goldentab_core::error::{GoldenTabError, Result};
use goldentab_core::tab::{
    CreateTab, CreateWindow, Tab, TabId, TabManager, TabQuery, TabStatus, Window, WindowId,
    WindowKind, WindowManager,
};
use serde::{Deserialize, Serialize};

use crate::paths::ensure_parent_dir;

pub const ROOT_ID: &str = "0";
pub const BOOKMARKS_BAR_ID: &str = "1";
pub const OTHER_BOOKMARKS_ID: &str = "2";

const FIRST_WINDOW_ID: WindowId = 1;

/// Serializable snapshot of an [`InMemoryBrowser`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserProfile {
    /// The root node with every descendant populated.
    pub bookmarks: BookmarkNode,
    pub windows: Vec<Window>,
    pub tabs: Vec<Tab>,
    pub current_window: WindowId,
    pub next_bookmark_id: u64,
    pub next_tab_id: TabId,
    pub next_window_id: WindowId,
    #[serde(default)]
    pub last_date_added: i64,
}

struct NodeRecord {
    parent_id: Option<String>,
    title: String,
    url: Option<String>,
    date_added: i64,
    children: Vec<String>,
}

impl NodeRecord {
    fn folder(parent_id: Option<&str>, title: &str) -> Self {
        Self {
            parent_id: parent_id.map(str::to_string),
            title: title.to_string(),
            url: None,
            date_added: 0,
            children: Vec::new(),
        }
    }
}

struct BrowserState {
    nodes: HashMap<String, NodeRecord>,
    next_bookmark_id: u64,
    last_date_added: i64,
    windows: Vec<Window>,
    current_window: WindowId,
    /// Tabs of all windows; the order within one window is its strip order.
    tabs: Vec<Tab>,
    next_tab_id: TabId,
    next_window_id: WindowId,
}

impl BrowserState {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        let mut root = NodeRecord::folder(None, "");
        root.children = vec![BOOKMARKS_BAR_ID.to_string(), OTHER_BOOKMARKS_ID.to_string()];
        nodes.insert(ROOT_ID.to_string(), root);
        nodes.insert(
            BOOKMARKS_BAR_ID.to_string(),
            NodeRecord::folder(Some(ROOT_ID), "Bookmarks Bar"),
        );
        nodes.insert(
            OTHER_BOOKMARKS_ID.to_string(),
            NodeRecord::folder(Some(ROOT_ID), "Other Bookmarks"),
        );

        Self {
            nodes,
            next_bookmark_id: 3,
            last_date_added: 0,
            windows: vec![Window {
                id: FIRST_WINDOW_ID,
                focused: true,
                incognito: false,
                kind: WindowKind::Normal,
            }],
            current_window: FIRST_WINDOW_ID,
            tabs: Vec::new(),
            next_tab_id: 1,
            next_window_id: FIRST_WINDOW_ID + 1,
        }
    }

    fn from_profile(profile: BrowserProfile) -> Result<Self> {
        if profile.bookmarks.id != ROOT_ID {
            return Err(GoldenTabError::invalid_argument(format!(
                "profile root must have id '{}', found '{}'",
                ROOT_ID, profile.bookmarks.id
            )));
        }

        let mut nodes = HashMap::new();
        flatten(&profile.bookmarks, None, &mut nodes);

        let mut state = Self {
            nodes,
            next_bookmark_id: profile.next_bookmark_id,
            last_date_added: profile.last_date_added,
            windows: profile.windows,
            current_window: profile.current_window,
            tabs: profile.tabs,
            next_tab_id: profile.next_tab_id,
            next_window_id: profile.next_window_id,
        };
        let window_ids: Vec<WindowId> = state.windows.iter().map(|w| w.id).collect();
        for window_id in window_ids {
            state.reindex(window_id);
        }
        Ok(state)
    }

    fn to_profile(&self) -> Result<BrowserProfile> {
        let bookmarks = self
            .build(ROOT_ID, true)
            .ok_or_else(|| GoldenTabError::internal("bookmark root is missing"))?;
        Ok(BrowserProfile {
            bookmarks,
            windows: self.windows.clone(),
            tabs: self.tabs.clone(),
            current_window: self.current_window,
            next_bookmark_id: self.next_bookmark_id,
            next_tab_id: self.next_tab_id,
            next_window_id: self.next_window_id,
            last_date_added: self.last_date_added,
        })
    }

    // ------------------------------------------------------------------------
    // Bookmarks
    // ------------------------------------------------------------------------

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

    fn node(&self, id: &str) -> Result<&NodeRecord> {
        self.nodes
            .get(id)
            .ok_or_else(|| GoldenTabError::not_found("bookmark", id))
    }

    fn folder_mut(&mut self, id: &str) -> Result<&mut NodeRecord> {
        match self.nodes.get_mut(id) {
            Some(node) if node.url.is_none() => Ok(node),
            Some(_) => Err(GoldenTabError::invalid_argument(format!(
                "bookmark '{}' is not a folder",
                id
            ))),
            None => Err(GoldenTabError::not_found("bookmark", id)),
        }
    }

    fn built(&self, id: &str) -> Result<BookmarkNode> {
        self.build(id, false)
            .ok_or_else(|| GoldenTabError::not_found("bookmark", id))
    }

    /// Next creation timestamp; strictly increasing even within one millisecond.
    fn next_date_added(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_date_added = now.max(self.last_date_added + 1);
        self.last_date_added
    }

    fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = Some(id.to_string());
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.nodes.get(&node_id).and_then(|n| n.parent_id.clone());
        }
        false
    }

    fn remove_recursive(&mut self, id: &str) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.remove_recursive(&child);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Tabs
    // ------------------------------------------------------------------------

    fn add_window(&mut self, kind: WindowKind) -> Window {
        let window = Window {
            id: self.next_window_id,
            focused: false,
            incognito: false,
            kind,
        };
        self.next_window_id += 1;
        self.windows.push(window.clone());
        window
    }

    fn focus_window(&mut self, id: WindowId) {
        self.current_window = id;
        for window in self.windows.iter_mut() {
            window.focused = window.id == id;
        }
    }

    fn window(&self, id: WindowId) -> Result<&Window> {
        self.windows
            .iter()
            .find(|w| w.id == id)
            .ok_or_else(|| GoldenTabError::not_found("window", id.to_string()))
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

    /// Position in `tabs` at which a tab lands when placed at `index` of the
    /// window's strip.
    fn insert_position(&self, window_id: WindowId, index: Option<usize>) -> usize {
        let in_window: Vec<usize> = self
            .tabs
            .iter()
            .enumerate()
            .filter(|(_, t)| t.window_id == window_id)
            .map(|(pos, _)| pos)
            .collect();
        match index.and_then(|i| in_window.get(i).copied()) {
            Some(pos) => pos,
            None => in_window.last().map(|pos| pos + 1).unwrap_or(self.tabs.len()),
        }
    }

    fn set_active(&mut self, window_id: WindowId, tab_id: TabId) {
        for tab in self.tabs.iter_mut().filter(|t| t.window_id == window_id) {
            tab.active = tab.id == tab_id;
        }
    }

    /// Gives the window an active tab if it lost it, preferring the tab now at
    /// `near` (or the last one).
    fn ensure_active(&mut self, window_id: WindowId, near: usize) {
        let in_window: Vec<&Tab> = self
            .tabs
            .iter()
            .filter(|t| t.window_id == window_id)
            .collect();
        if in_window.is_empty() || in_window.iter().any(|t| t.active) {
            return;
        }
        let pick = in_window
            .get(near)
            .or(in_window.last())
            .map(|t| t.id);
        if let Some(id) = pick {
            self.set_active(window_id, id);
        }
    }

    fn tab(&self, id: TabId) -> Result<&Tab> {
        self.tabs
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| GoldenTabError::not_found("tab", id.to_string()))
    }
}

fn flatten(node: &BookmarkNode, parent_id: Option<&str>, nodes: &mut HashMap<String, NodeRecord>) {
    let children = node.children();
    nodes.insert(
        node.id.clone(),
        NodeRecord {
            parent_id: parent_id.map(str::to_string),
            title: node.title.clone(),
            url: node.url.clone(),
            date_added: node.date_added,
            children: children.iter().map(|c| c.id.clone()).collect(),
        },
    );
    for child in children {
        flatten(child, Some(&node.id), nodes);
    }
}

/// Simulated browser: bookmark tree plus windows and tabs.
///
/// Starts with the root `"0"`, the "Bookmarks Bar" `"1"`, "Other Bookmarks"
/// `"2"` and one focused window without tabs. New tabs report their URL as
/// title and are complete immediately.
pub struct InMemoryBrowser {
    state: Mutex<BrowserState>,
}

impl InMemoryBrowser {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BrowserState::new()),
        }
    }

    pub fn from_profile(profile: BrowserProfile) -> Result<Self> {
        Ok(Self {
            state: Mutex::new(BrowserState::from_profile(profile)?),
        })
    }

    pub fn to_profile(&self) -> Result<BrowserProfile> {
        self.state().to_profile()
    }

    /// Loads a profile from `path`; a missing file gives a fresh browser.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let profile: BrowserProfile = serde_json::from_str(&content)?;
                tracing::debug!("[Browser] Loaded profile {:?}", path);
                Self::from_profile(profile)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("[Browser] No profile at {:?}, starting fresh", path);
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the profile to `path` through a temporary file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let profile = self.to_profile()?;
        let content = serde_json::to_string_pretty(&profile)?;
        ensure_parent_dir(path).await?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        tracing::debug!("[Browser] Saved profile {:?}", path);
        Ok(())
    }

    /// Opens a new, unfocused window without tabs.
    pub fn open_window(&self) -> Window {
        self.state().add_window(WindowKind::Normal)
    }

    /// Makes `id` the window [`WindowManager::get_current`] reports.
    pub fn set_current_window(&self, id: WindowId) -> Result<()> {
        let mut state = self.state();
        state.window(id)?;
        state.focus_window(id);
        Ok(())
    }

    /// Simulates a page load state change.
    pub fn set_tab_status(&self, id: TabId, status: TabStatus) -> Result<()> {
        let mut state = self.state();
        let tab = state
            .tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| GoldenTabError::not_found("tab", id.to_string()))?;
        tab.status = status;
        Ok(())
    }

    /// Simulates a page setting its title.
    pub fn set_tab_title(&self, id: TabId, title: &str) -> Result<()> {
        let mut state = self.state();
        let tab = state
            .tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| GoldenTabError::not_found("tab", id.to_string()))?;
        tab.title = title.to_string();
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, BrowserState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookmarkStore for InMemoryBrowser {
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>> {
        let state = self.state();
        Ok(state.build(ROOT_ID, true).into_iter().collect())
    }

    async fn get_sub_tree(&self, id: &str) -> Result<Vec<BookmarkNode>> {
        let state = self.state();
        state
            .build(id, true)
            .map(|node| vec![node])
            .ok_or_else(|| GoldenTabError::not_found("bookmark", id))
    }

    async fn get_children(&self, id: &str) -> Result<Vec<BookmarkNode>> {
        let state = self.state();
        let node = state.node(id)?;
        Ok(node
            .children
            .iter()
            .filter_map(|c| state.build(c, false))
            .collect())
    }

    async fn get(&self, id: &str) -> Result<BookmarkNode> {
        self.state().built(id)
    }

    async fn create(&self, details: CreateBookmark) -> Result<BookmarkNode> {
        let mut state = self.state();
        state.folder_mut(&details.parent_id)?;

        let id = state.next_bookmark_id.to_string();
        state.next_bookmark_id += 1;
        let date_added = state.next_date_added();
        state.nodes.insert(
            id.clone(),
            NodeRecord {
                parent_id: Some(details.parent_id.clone()),
                title: details.title,
                url: details.url.filter(|u| !u.is_empty()),
                date_added,
                children: Vec::new(),
            },
        );

        let parent = state.folder_mut(&details.parent_id)?;
        let at = details
            .index
            .unwrap_or(parent.children.len())
            .min(parent.children.len());
        parent.children.insert(at, id.clone());
        state.built(&id)
    }

    async fn update_title(&self, id: &str, title: &str) -> Result<BookmarkNode> {
        let mut state = self.state();
        if id == ROOT_ID {
            return Err(GoldenTabError::invalid_argument("cannot modify the root"));
        }
        let node = state
            .nodes
            .get_mut(id)
            .ok_or_else(|| GoldenTabError::not_found("bookmark", id))?;
        node.title = title.to_string();
        state.built(id)
    }

    async fn move_node(&self, id: &str, destination: MoveDestination) -> Result<BookmarkNode> {
        let mut state = self.state();
        if is_permanent(id) {
            return Err(GoldenTabError::invalid_argument(format!(
                "cannot move permanent folder '{}'",
                id
            )));
        }
        let old_parent = state
            .node(id)?
            .parent_id
            .clone()
            .ok_or_else(|| GoldenTabError::internal(format!("bookmark '{}' has no parent", id)))?;
        state.folder_mut(&destination.parent_id)?;
        if state.is_ancestor(id, &destination.parent_id) {
            return Err(GoldenTabError::invalid_argument(format!(
                "cannot move '{}' into its own subtree",
                id
            )));
        }

        state.folder_mut(&old_parent)?.children.retain(|c| c != id);
        let parent = state.folder_mut(&destination.parent_id)?;
        let at = destination
            .index
            .unwrap_or(parent.children.len())
            .min(parent.children.len());
        parent.children.insert(at, id.to_string());
        if let Some(node) = state.nodes.get_mut(id) {
            node.parent_id = Some(destination.parent_id.clone());
        }
        state.built(id)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        if is_permanent(id) {
            return Err(GoldenTabError::invalid_argument(format!(
                "cannot remove permanent folder '{}'",
                id
            )));
        }
        let parent_id = state.node(id)?.parent_id.clone();
        if let Some(parent_id) = parent_id
            && let Some(parent) = state.nodes.get_mut(&parent_id)
        {
            parent.children.retain(|c| c != id);
        }
        state.remove_recursive(id);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<BookmarkNode>> {
        let state = self.state();
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<&String> = state
            .nodes
            .iter()
            .filter(|(id, _)| !is_permanent(id))
            .filter(|(_, n)| {
                n.title.to_lowercase().contains(&needle)
                    || n
                        .url
                        .as_deref()
                        .is_some_and(|u| u.to_lowercase().contains(&needle))
            })
            .map(|(id, _)| id)
            .collect();
        ids.sort_by_key(|id| id.parse::<u64>().unwrap_or(u64::MAX));
        Ok(ids
            .into_iter()
            .filter_map(|id| state.build(id, false))
            .collect())
    }
}

fn is_permanent(id: &str) -> bool {
    id == ROOT_ID || id == BOOKMARKS_BAR_ID || id == OTHER_BOOKMARKS_ID
}

#[async_trait]
impl TabManager for InMemoryBrowser {
    async fn query(&self, query: TabQuery) -> Result<Vec<Tab>> {
        let state = self.state();
        Ok(state
            .tabs
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn create(&self, properties: CreateTab) -> Result<Tab> {
        let mut state = self.state();
        let window_id = properties.window_id.unwrap_or(state.current_window);
        state.window(window_id)?;

        let id = state.next_tab_id;
        state.next_tab_id += 1;
        let has_tabs = state.tabs.iter().any(|t| t.window_id == window_id);
        let tab = Tab {
            id,
            window_id,
            index: 0,
            title: properties.url.clone(),
            url: properties.url,
            // A window's first tab is always the active one.
            active: properties.active || !has_tabs,
            pinned: properties.pinned,
            status: TabStatus::Complete,
        };
        let position = state.insert_position(window_id, properties.index);
        state.tabs.insert(position, tab);
        if properties.active {
            state.set_active(window_id, id);
        }
        state.reindex(window_id);
        Ok(state.tab(id)?.clone())
    }

    async fn remove(&self, ids: &[TabId]) -> Result<()> {
        let mut state = self.state();
        let missing = ids
            .iter()
            .find(|id| !state.tabs.iter().any(|t| t.id == **id))
            .copied();

        let removed: Vec<(WindowId, usize)> = state
            .tabs
            .iter()
            .filter(|t| ids.contains(&t.id))
            .map(|t| (t.window_id, t.index))
            .collect();
        state.tabs.retain(|t| !ids.contains(&t.id));
        for (window_id, index) in removed {
            state.reindex(window_id);
            state.ensure_active(window_id, index);
        }

        match missing {
            Some(id) => Err(GoldenTabError::not_found("tab", id.to_string())),
            None => Ok(()),
        }
    }

    async fn move_tab(&self, id: TabId, index: usize, window_id: Option<WindowId>) -> Result<Tab> {
        let mut state = self.state();
        let from = state
            .tabs
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| GoldenTabError::not_found("tab", id.to_string()))?;
        let old_window = state.tabs[from].window_id;
        let old_index = state.tabs[from].index;
        let target_window = window_id.unwrap_or(old_window);
        state.window(target_window)?;

        let mut tab = state.tabs.remove(from);
        if target_window != old_window {
            tab.active = false;
        }
        tab.window_id = target_window;
        let position = state.insert_position(target_window, Some(index));
        state.tabs.insert(position, tab);

        state.reindex(old_window);
        state.ensure_active(old_window, old_index);
        state.reindex(target_window);
        state.ensure_active(target_window, index);
        Ok(state.tab(id)?.clone())
    }

    async fn activate(&self, id: TabId) -> Result<Tab> {
        let mut state = self.state();
        let window_id = state.tab(id)?.window_id;
        state.set_active(window_id, id);
        Ok(state.tab(id)?.clone())
    }
}

#[async_trait]
impl WindowManager for InMemoryBrowser {
    async fn get_current(&self) -> Result<Window> {
        let state = self.state();
        state.window(state.current_window).cloned()
    }

    async fn get(&self, id: WindowId) -> Result<Window> {
        self.state().window(id).cloned()
    }

    async fn get_all(&self) -> Result<Vec<Window>> {
        Ok(self.state().windows.clone())
    }

    async fn create_window(&self, properties: CreateWindow) -> Result<Window> {
        let mut state = self.state();
        let window = state.add_window(properties.kind);
        if properties.focused {
            state.focus_window(window.id);
        }
        tracing::debug!("[Browser] Opened window {}", window.id);
        state.window(window.id).cloned()
    }
}
