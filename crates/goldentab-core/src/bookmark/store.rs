//! Bookmark store trait.
//!
//! Thin async boundary over the host bookmark tree. Every call is a
//! suspension point at which another surface may mutate the tree.

use async_trait::async_trait;

use super::model::{BookmarkNode, CreateBookmark, MoveDestination};
use crate::error::Result;

/// Host bookmark tree.
///
/// Implementations report a missing node as [`GoldenTabError::NotFound`] so
/// callers can tolerate nodes removed underneath them.
///
/// [`GoldenTabError::NotFound`]: crate::error::GoldenTabError::NotFound
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Returns the whole tree as a single-element list holding the root.
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>>;

    /// Returns the node and all of its descendants.
    async fn get_sub_tree(&self, id: &str) -> Result<Vec<BookmarkNode>>;

    /// Returns the direct children of a folder, in index order, without
    /// their own descendants populated.
    async fn get_children(&self, id: &str) -> Result<Vec<BookmarkNode>>;

    async fn get(&self, id: &str) -> Result<BookmarkNode>;

    async fn create(&self, details: CreateBookmark) -> Result<BookmarkNode>;

    async fn update_title(&self, id: &str, title: &str) -> Result<BookmarkNode>;

    async fn move_node(&self, id: &str, destination: MoveDestination) -> Result<BookmarkNode>;

    /// Removes a bookmark or a folder together with its contents.
    async fn remove(&self, id: &str) -> Result<()>;

    /// Case-insensitive match of `query` against titles and URLs.
    async fn search(&self, query: &str) -> Result<Vec<BookmarkNode>>;

    /// Finds a direct child folder by exact title.
    async fn find_child_folder(&self, parent_id: &str, title: &str) -> Result<Option<BookmarkNode>> {
        let children = self.get_children(parent_id).await?;
        Ok(children
            .into_iter()
            .find(|c| c.title == title && c.url().is_none()))
    }
}
