//! Optional per-window serialization of workspace transitions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::tab::WindowId;

/// Registry of per-window async mutexes.
///
/// Clones share the registry, so every surface of one process that is given
/// the same `WindowLocks` waits for the others' transitions on the same
/// window. Without it, transitions from two surfaces may interleave.
#[derive(Clone, Default)]
pub struct WindowLocks {
    locks: Arc<Mutex<HashMap<WindowId, Arc<AsyncMutex<()>>>>>,
}

impl WindowLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other transition holds `window_id`.
    ///
    /// Entries of other windows that nobody holds or waits for are dropped
    /// on the way, so closed windows do not accumulate.
    pub async fn acquire(&self, window_id: WindowId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.registry();
            locks.retain(|id, lock| *id == window_id || Arc::strong_count(lock) > 1);
            locks.entry(window_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Forgets a closed window. Does nothing while the window's lock is held
    /// or awaited.
    pub fn release(&self, window_id: WindowId) {
        let mut locks = self.registry();
        if locks
            .get(&window_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&window_id);
        }
    }

    /// Number of windows currently tracked.
    pub fn tracked_windows(&self) -> usize {
        self.registry().len()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<WindowId, Arc<AsyncMutex<()>>>> {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
