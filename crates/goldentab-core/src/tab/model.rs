//! Tab and window domain models.

use serde::{Deserialize, Serialize};

pub type TabId = i64;
pub type WindowId = i64;

/// Loading state reported by the host for a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    #[default]
    Complete,
}

/// An open browser tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    pub index: usize,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub status: TabStatus,
}

impl Tab {
    /// Title used when the tab is saved as a bookmark.
    pub fn bookmark_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == TabStatus::Complete
    }
}

/// Filter for [`TabManager::query`](super::TabManager::query).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabQuery {
    pub window_id: Option<WindowId>,
    pub active: Option<bool>,
}

impl TabQuery {
    pub fn in_window(window_id: WindowId) -> Self {
        Self {
            window_id: Some(window_id),
            active: None,
        }
    }

    pub fn active_in_window(window_id: WindowId) -> Self {
        Self {
            window_id: Some(window_id),
            active: Some(true),
        }
    }

    pub fn matches(&self, tab: &Tab) -> bool {
        self.window_id.is_none_or(|w| w == tab.window_id)
            && self.active.is_none_or(|a| a == tab.active)
    }
}

/// Arguments for opening a tab.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTab {
    pub url: String,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(default)]
    pub pinned: bool,
}

impl CreateTab {
    /// A tab opened without taking focus.
    pub fn background(url: impl Into<String>, window_id: WindowId) -> Self {
        Self {
            url: url.into(),
            active: false,
            index: None,
            window_id: Some(window_id),
            pinned: false,
        }
    }

    pub fn foreground(url: impl Into<String>, window_id: WindowId) -> Self {
        Self {
            active: true,
            ..Self::background(url, window_id)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    #[default]
    Normal,
    Popup,
}

/// A browser window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub id: WindowId,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub incognito: bool,
    #[serde(default)]
    pub kind: WindowKind,
}

/// Arguments for opening a window. The window starts without tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWindow {
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub kind: WindowKind,
}

impl CreateWindow {
    pub fn focused() -> Self {
        Self {
            focused: true,
            kind: WindowKind::Normal,
        }
    }
}
