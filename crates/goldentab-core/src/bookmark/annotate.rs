//! Title metadata edits applied through the bookmark store.

use std::sync::Arc;

use super::model::BookmarkNode;
use super::store::BookmarkStore;
use crate::error::Result;
use crate::metadata::{build_title, parse_title, sanitize_note, TitleMetadata};

/// Rewrites bookmark titles when a flag changes.
///
/// Each edit reads the current title, changes one field of the decoded
/// metadata and writes the title back through [`build_title`].
pub struct MetadataEditor {
    store: Arc<dyn BookmarkStore>,
    note_max_len: usize,
}

impl MetadataEditor {
    pub fn new(store: Arc<dyn BookmarkStore>, note_max_len: usize) -> Self {
        Self {
            store,
            note_max_len,
        }
    }

    /// Flips the starred flag. Returns the new state.
    pub async fn toggle_starred(&self, id: &str) -> Result<bool> {
        let mut starred = false;
        self.edit(id, |metadata| {
            metadata.starred = !metadata.starred;
            starred = metadata.starred;
        })
        .await?;
        Ok(starred)
    }

    pub async fn set_workspace(&self, id: &str, workspace: bool) -> Result<BookmarkNode> {
        self.edit(id, |metadata| metadata.workspace = workspace).await
    }

    /// Stores a note on the bookmark; empty text removes it.
    pub async fn set_note(&self, id: &str, text: &str) -> Result<BookmarkNode> {
        let note = sanitize_note(text, self.note_max_len);
        self.edit(id, |metadata| {
            metadata.note = (!note.is_empty()).then(|| note.clone());
        })
        .await
    }

    pub async fn clear_note(&self, id: &str) -> Result<BookmarkNode> {
        self.edit(id, |metadata| metadata.note = None).await
    }

    async fn edit<F>(&self, id: &str, f: F) -> Result<BookmarkNode>
    where
        F: FnOnce(&mut TitleMetadata) + Send,
    {
        let node = self.store.get(id).await?;
        let mut parsed = parse_title(&node.title);
        f(&mut parsed.metadata);
        let title = build_title(&parsed.display_title, &parsed.metadata);
        tracing::debug!("[Metadata] Retitling {} to {:?}", id, title);
        self.store.update_title(id, &title).await
    }
}
