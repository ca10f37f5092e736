//! Workspace activation state machine.
//!
//! Each window is either without a workspace or bound to exactly one
//! workspace folder. Activating a workspace saves the tabs of the workspace
//! being left into its `.session` snapshot, closes them, and opens the
//! target's snapshot. Deactivating saves and closes without opening
//! anything.
//!
//! A [`WorkspaceContext`] is built once per surface (main view, companion
//! panel) and carries everything a transition needs. Steps of one
//! transition run in order, but nothing stops another surface from running
//! its own transition on the same window in between them unless both share
//! a [`WindowLocks`] registry.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::binding::BindingStore;
use super::closed::ClosedTabsRing;
use super::focus::FocusRestorer;
use super::lock::WindowLocks;
use super::session::SessionSnapshotManager;
use crate::bookmark::{BookmarkNode, BookmarkStore};
use crate::config::GoldenTabConfig;
use crate::error::{GoldenTabError, Result};
use crate::housekeeping::Housekeeper;
use crate::storage::KeyValueStorage;
use crate::tab::{
    CreateTab, CreateWindow, Tab, TabId, TabManager, TabQuery, WindowId, WindowManager,
};

/// What to do with open tabs when entering a workspace from no workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LooseTabsChoice {
    /// Keep them open and add them to the workspace.
    BringIn,
    /// Close them first.
    Discard,
    /// Abort the activation.
    Cancel,
}

impl FromStr for LooseTabsChoice {
    type Err = GoldenTabError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bring-in" => Ok(Self::BringIn),
            "discard" => Ok(Self::Discard),
            "cancel" => Ok(Self::Cancel),
            other => Err(GoldenTabError::invalid_argument(format!(
                "unknown loose tabs choice '{other}' (expected bring-in, discard or cancel)"
            ))),
        }
    }
}

/// Asks the user what to do with loose tabs.
#[async_trait]
pub trait LooseTabsPrompt: Send + Sync {
    async fn choose(&self, loose_tab_count: usize) -> LooseTabsChoice;
}

/// A fixed answer, for callers that already know.
#[async_trait]
impl LooseTabsPrompt for LooseTabsChoice {
    async fn choose(&self, _loose_tab_count: usize) -> LooseTabsChoice {
        *self
    }
}

/// Result of [`WorkspaceContext::activate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated {
        /// Tabs opened from the target's snapshot.
        restored: usize,
        /// Loose tabs brought into the workspace.
        merged: usize,
    },
    /// The user declined at the loose-tabs prompt. Nothing was changed.
    Cancelled,
    /// A step failed. The binding was not updated.
    Failed(GoldenTabError),
}

impl ActivationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Activated { .. })
    }
}

/// Result of [`WorkspaceContext::deactivate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeactivationOutcome {
    Deactivated { saved: usize },
    /// No workspace was bound to the window. Nothing was changed.
    NotActive,
    /// A step failed. The binding was left in place.
    Failed(GoldenTabError),
}

impl DeactivationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Deactivated { .. })
    }
}

/// Result of [`WorkspaceContext::switch_workspace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub activation: ActivationOutcome,
    pub focus_restored: bool,
}

/// Everything a surface needs to move its window between workspaces.
#[derive(Clone)]
pub struct WorkspaceContext {
    window_id: WindowId,
    bookmarks: Arc<dyn BookmarkStore>,
    tabs: Arc<dyn TabManager>,
    storage: Arc<dyn KeyValueStorage>,
    bindings: BindingStore,
    snapshots: SessionSnapshotManager,
    closed: ClosedTabsRing,
    focus: FocusRestorer,
    housekeeper: Housekeeper,
    config: GoldenTabConfig,
    window_locks: Option<WindowLocks>,
}

impl WorkspaceContext {
    pub fn new(
        window_id: WindowId,
        bookmarks: Arc<dyn BookmarkStore>,
        tabs: Arc<dyn TabManager>,
        storage: Arc<dyn KeyValueStorage>,
        config: GoldenTabConfig,
    ) -> Self {
        let mut bindings = BindingStore::new(storage.clone());
        if config.serialize_binding_access {
            bindings = bindings.serialized();
        }
        Self {
            window_id,
            snapshots: SessionSnapshotManager::new(bookmarks.clone(), tabs.clone()),
            closed: ClosedTabsRing::new(bookmarks.clone(), tabs.clone(), config.closed_tabs_capacity),
            focus: FocusRestorer::new(tabs.clone(), storage.clone(), window_id, config.focus.clone()),
            housekeeper: Housekeeper::new(bookmarks.clone(), tabs.clone()),
            bindings,
            bookmarks,
            tabs,
            storage,
            config,
            window_locks: None,
        }
    }

    /// The same context for another window, sharing bindings and locks.
    pub fn for_window(&self, window_id: WindowId) -> Self {
        Self {
            window_id,
            focus: FocusRestorer::new(
                self.tabs.clone(),
                self.storage.clone(),
                window_id,
                self.config.focus.clone(),
            ),
            ..self.clone()
        }
    }

    /// Builds a context for the window the surface is running in.
    pub async fn for_current_window(
        windows: &dyn WindowManager,
        bookmarks: Arc<dyn BookmarkStore>,
        tabs: Arc<dyn TabManager>,
        storage: Arc<dyn KeyValueStorage>,
        config: GoldenTabConfig,
    ) -> Result<Self> {
        let window = windows.get_current().await?;
        Ok(Self::new(window.id, bookmarks, tabs, storage, config))
    }

    /// Shares a lock registry so transitions on one window run one at a time.
    pub fn with_window_locks(mut self, locks: WindowLocks) -> Self {
        self.window_locks = Some(locks);
        self
    }

    /// Shares a binding store between contexts. Surfaces that build their
    /// own contexts need this for `serialize_binding_access` to cover them.
    pub fn with_bindings(mut self, bindings: BindingStore) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    pub fn bindings(&self) -> &BindingStore {
        &self.bindings
    }

    pub fn snapshots(&self) -> &SessionSnapshotManager {
        &self.snapshots
    }

    pub fn closed_tabs(&self) -> &ClosedTabsRing {
        &self.closed
    }

    pub fn focus(&self) -> &FocusRestorer {
        &self.focus
    }

    pub fn housekeeper(&self) -> &Housekeeper {
        &self.housekeeper
    }

    pub fn config(&self) -> &GoldenTabConfig {
        &self.config
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn active_workspace_id(&self) -> Result<Option<String>> {
        self.bindings.get(self.window_id).await
    }

    pub async fn is_in_workspace(&self) -> Result<bool> {
        Ok(self.active_workspace_id().await?.is_some())
    }

    /// The bound workspace folder, or `None`.
    ///
    /// A binding pointing at a folder that no longer exists is cleared, and
    /// the window counts as having no workspace.
    pub async fn get_active_workspace_folder(&self) -> Result<Option<BookmarkNode>> {
        let Some(workspace_id) = self.active_workspace_id().await? else {
            return Ok(None);
        };

        match self.bookmarks.get(&workspace_id).await {
            Ok(folder) => Ok(Some(folder)),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    "[Workspace] Bound workspace {} is gone ({}), clearing binding for window {}",
                    workspace_id,
                    e,
                    self.window_id
                );
                self.bindings.clear(self.window_id).await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The id of this window's management tab, if open.
    pub async fn management_tab_id(&self) -> Result<Option<TabId>> {
        let tabs = self.tabs.query(TabQuery::in_window(self.window_id)).await?;
        Ok(tabs
            .iter()
            .find(|t| self.config.is_management_url(&t.url))
            .map(|t| t.id))
    }

    /// Tabs of this window that belong to a workspace: everything except
    /// the management tab and internal pages.
    pub async fn current_window_tabs(&self) -> Result<Vec<Tab>> {
        let tabs = self.tabs.query(TabQuery::in_window(self.window_id)).await?;
        let management = tabs
            .iter()
            .find(|t| self.config.is_management_url(&t.url))
            .map(|t| t.id);
        Ok(tabs
            .into_iter()
            .filter(|t| Some(t.id) != management && !self.config.is_excluded_url(&t.url))
            .collect())
    }

    /// Closes every tab of the window except `except`.
    pub async fn close_all_tabs(&self, except: Option<TabId>) -> Result<()> {
        let tabs = self.tabs.query(TabQuery::in_window(self.window_id)).await?;
        let ids: Vec<TabId> = tabs
            .iter()
            .map(|t| t.id)
            .filter(|id| Some(*id) != except)
            .collect();
        self.remove_tabs(&ids).await
    }

    async fn remove_tabs(&self, ids: &[TabId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        match self.tabs.remove(ids).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::debug!("[Workspace] Some tabs were already closed: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Makes `target` the window's workspace.
    ///
    /// `prompt` is consulted only when no workspace is bound and tabs are
    /// open; without a prompt those tabs are brought in. Activating the
    /// workspace that is already bound runs a full save, close and restore.
    pub async fn activate(
        &self,
        target: &str,
        prompt: Option<&dyn LooseTabsPrompt>,
    ) -> ActivationOutcome {
        let _guard = self.lock_window().await;
        match self.try_activate(target, prompt).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("[Workspace] Activating {} failed: {}", target, e);
                ActivationOutcome::Failed(e)
            }
        }
    }

    async fn try_activate(
        &self,
        target: &str,
        prompt: Option<&dyn LooseTabsPrompt>,
    ) -> Result<ActivationOutcome> {
        let current = self.get_active_workspace_folder().await?.map(|f| f.id);
        let current_tabs = self.current_window_tabs().await?;

        let mut bring_in = false;
        if current.is_none() && !current_tabs.is_empty() {
            let choice = match prompt {
                Some(prompt) => prompt.choose(current_tabs.len()).await,
                None => LooseTabsChoice::BringIn,
            };
            match choice {
                LooseTabsChoice::Cancel => {
                    tracing::info!("[Workspace] Activation of {} cancelled", target);
                    return Ok(ActivationOutcome::Cancelled);
                }
                LooseTabsChoice::Discard => {
                    let ids: Vec<TabId> = current_tabs.iter().map(|t| t.id).collect();
                    self.remove_tabs(&ids).await?;
                }
                LooseTabsChoice::BringIn => bring_in = true,
            }
        }

        if let Some(current_id) = current.as_deref() {
            self.snapshots
                .save_current_tabs(current_id, &current_tabs)
                .await?;
            let management = self.management_tab_id().await?;
            self.close_all_tabs(management).await?;
        }

        let restored = self.snapshots.restore_tabs(target, self.window_id).await?;

        let merged = if bring_in {
            // Re-read: restored tabs may have changed since the first listing.
            let live = self.current_window_tabs().await?;
            self.snapshots.save_current_tabs(target, &live).await?;
            current_tabs.len()
        } else {
            0
        };

        self.bindings.set(self.window_id, Some(target)).await?;
        tracing::info!(
            "[Workspace] Window {} now on workspace {} ({} restored, {} brought in)",
            self.window_id,
            target,
            restored,
            merged
        );
        Ok(ActivationOutcome::Activated { restored, merged })
    }

    /// Leaves the window's workspace: saves and closes its tabs, then clears
    /// the binding.
    pub async fn deactivate(&self) -> DeactivationOutcome {
        let _guard = self.lock_window().await;
        match self.try_deactivate().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("[Workspace] Deactivating window {} failed: {}", self.window_id, e);
                DeactivationOutcome::Failed(e)
            }
        }
    }

    async fn try_deactivate(&self) -> Result<DeactivationOutcome> {
        let Some(current) = self.get_active_workspace_folder().await?.map(|f| f.id) else {
            return Ok(DeactivationOutcome::NotActive);
        };

        let tabs = self.current_window_tabs().await?;
        let saved = self.snapshots.save_current_tabs(&current, &tabs).await?;
        let management = self.management_tab_id().await?;
        self.close_all_tabs(management).await?;

        self.bindings.clear(self.window_id).await?;
        tracing::info!(
            "[Workspace] Window {} left workspace {} ({} tab(s) saved)",
            self.window_id,
            current,
            saved
        );
        Ok(DeactivationOutcome::Deactivated { saved })
    }

    /// Activates `target` the way a surface does on user request: remembers
    /// the focused tab of the workspace being left, activates, then focuses
    /// the tab that was focused when `target` was last left.
    pub async fn switch_workspace(
        &self,
        target: &str,
        prompt: Option<&dyn LooseTabsPrompt>,
    ) -> SwitchOutcome {
        self.remember_focus().await;

        let activation = self.activate(target, prompt).await;
        let focus_restored = if activation.is_success() {
            self.focus.restore_active_tab(target).await
        } else {
            false
        };
        SwitchOutcome {
            activation,
            focus_restored,
        }
    }

    /// Deactivates after remembering the focused tab.
    pub async fn leave_workspace(&self) -> DeactivationOutcome {
        self.remember_focus().await;
        self.deactivate().await
    }

    async fn remember_focus(&self) {
        let current = match self.get_active_workspace_folder().await {
            Ok(Some(folder)) => folder.id,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("[Workspace] Could not read binding: {}", e);
                return;
            }
        };
        if let Err(e) = self.focus.remember_active_tab(&current).await {
            tracing::warn!("[Workspace] Could not remember focused tab: {}", e);
        }
    }

    /// Opens `target` in a new focused window.
    ///
    /// The window gets a pinned management tab pointing at the workspace,
    /// then the workspace is activated there. The calling window is left
    /// as it is. Returns the new window's context with the activation result.
    pub async fn open_in_new_window(
        &self,
        windows: &dyn WindowManager,
        target: &str,
    ) -> Result<(WorkspaceContext, ActivationOutcome)> {
        let window = windows.create_window(CreateWindow::focused()).await?;
        self.tabs
            .create(CreateTab {
                url: format!("{}?workspace={}", self.config.management_page_url, target),
                active: true,
                index: None,
                window_id: Some(window.id),
                pinned: true,
            })
            .await?;
        tracing::info!("[Workspace] Opening workspace {} in new window {}", target, window.id);

        let context = self.for_window(window.id);
        let outcome = context.activate(target, None).await;
        Ok((context, outcome))
    }

    /// Closes tabs of this window that repeat an earlier tab's URL.
    pub async fn close_duplicate_tabs(&self) -> Result<usize> {
        let tabs = self.tabs_in_strip_order().await?;
        self.housekeeper.close_duplicate_tabs(&tabs).await
    }

    /// Groups this window's workspace tabs by website.
    pub async fn sort_tabs_by_website(&self) -> Result<usize> {
        let tabs = self.tabs_in_strip_order().await?;
        self.housekeeper.sort_tabs_by_website(&tabs).await
    }

    async fn tabs_in_strip_order(&self) -> Result<Vec<Tab>> {
        let mut tabs = self.current_window_tabs().await?;
        tabs.sort_by_key(|t| t.index);
        Ok(tabs)
    }

    /// Records a tab the user closed in the active workspace's closed list.
    ///
    /// Returns whether it was recorded; tabs are ignored when no workspace is
    /// active or when they are internal pages.
    pub async fn record_closed_tab(&self, tab: &Tab) -> Result<bool> {
        if tab.url.is_empty()
            || self.config.is_excluded_url(&tab.url)
            || self.config.is_management_url(&tab.url)
        {
            return Ok(false);
        }
        let Some(workspace) = self.get_active_workspace_folder().await? else {
            return Ok(false);
        };
        self.closed
            .add_closed_tab(&workspace.id, &tab.url, &tab.title)
            .await?;
        Ok(true)
    }

    async fn lock_window(&self) -> Option<tokio::sync::OwnedMutexGuard<()>> {
        match &self.window_locks {
            Some(locks) => Some(locks.acquire(self.window_id).await),
            None => None,
        }
    }
}
