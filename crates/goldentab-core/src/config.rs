//! Runtime configuration model.

use serde::{Deserialize, Serialize};

use crate::metadata::DEFAULT_NOTE_MAX_LEN;

pub const DEFAULT_MANAGEMENT_PAGE_URL: &str = "chrome-extension://goldentab/bookmarks.html";
pub const DEFAULT_CLOSED_TABS_CAPACITY: usize = 20;

/// Settings shared by every surface.
///
/// Every field has a default so a partial `config.toml` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoldenTabConfig {
    /// URL of the extension's own management page; its tab is never closed
    /// or saved by workspace swaps.
    pub management_page_url: String,
    /// Tabs whose URL starts with one of these are never part of a workspace.
    pub excluded_url_prefixes: Vec<String>,
    /// Size of each workspace's recently-closed list.
    pub closed_tabs_capacity: usize,
    /// Notes are cut to this many characters; values above 250 have no effect.
    pub note_max_len: usize,
    pub focus: FocusConfig,
    /// Serialize binding read-modify-write cycles behind a mutex.
    ///
    /// The mutex belongs to the `BindingStore` a context builds, so it only
    /// covers contexts that share that store: ones derived with
    /// `WorkspaceContext::for_window` or given the same store through
    /// `WorkspaceContext::with_bindings`. Contexts built separately with
    /// `WorkspaceContext::new` still race each other.
    pub serialize_binding_access: bool,
}

impl Default for GoldenTabConfig {
    fn default() -> Self {
        Self {
            management_page_url: DEFAULT_MANAGEMENT_PAGE_URL.to_string(),
            excluded_url_prefixes: vec!["chrome://".to_string(), "chrome-extension://".to_string()],
            closed_tabs_capacity: DEFAULT_CLOSED_TABS_CAPACITY,
            note_max_len: DEFAULT_NOTE_MAX_LEN,
            focus: FocusConfig::default(),
            serialize_binding_access: false,
        }
    }
}

impl GoldenTabConfig {
    pub fn is_management_url(&self, url: &str) -> bool {
        url == self.management_page_url || url.starts_with(&self.management_page_url)
    }

    pub fn is_excluded_url(&self, url: &str) -> bool {
        self.excluded_url_prefixes
            .iter()
            .any(|prefix| url.starts_with(prefix.as_str()))
    }
}

/// Polling parameters for restoring the focused tab after a switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// From this attempt on, a matching tab that is still loading is accepted.
    pub accept_loading_after: u32,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            retry_delay_ms: 200,
            accept_loading_after: 5,
        }
    }
}
