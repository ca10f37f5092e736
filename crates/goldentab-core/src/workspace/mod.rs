//! Per-window workspace lifecycle: bindings, session snapshots, closed tabs
//! and focus memory, tied together by [`WorkspaceContext`].

pub mod activation;
pub mod binding;
pub mod closed;
pub mod focus;
pub mod lock;
pub mod session;

pub use activation::{
    ActivationOutcome, DeactivationOutcome, LooseTabsChoice, LooseTabsPrompt, SwitchOutcome,
    WorkspaceContext,
};
pub use binding::{binding_change, BindingStore, ACTIVE_WORKSPACES_KEY};
pub use closed::ClosedTabsRing;
pub use focus::{FocusRestorer, WORKSPACE_ACTIVE_TABS_KEY};
pub use lock::WindowLocks;
pub use session::{SessionEntry, SessionSnapshotManager};
