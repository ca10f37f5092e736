//! Bookmark tree domain models.

use serde::{Deserialize, Serialize};

/// Reserved child folder holding a workspace's saved tabs.
pub const SESSION_FOLDER_NAME: &str = ".session";

/// Reserved child folder holding a workspace's recently closed tabs.
pub const CLOSED_FOLDER_NAME: &str = ".closed";

/// A node of the host bookmark tree.
///
/// A node with `children` is a folder; a node with a `url` is a leaf
/// bookmark. The title carries display text plus encoded metadata
/// (see [`crate::metadata`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub index: usize,
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub date_added: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BookmarkNode>>,
}

impl BookmarkNode {
    pub fn is_folder(&self) -> bool {
        self.children.is_some() || self.url.is_none()
    }

    /// Returns the URL when it is present and non-empty.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    /// True for the `.session` and `.closed` bookkeeping folders.
    pub fn is_reserved(&self) -> bool {
        self.title == SESSION_FOLDER_NAME || self.title == CLOSED_FOLDER_NAME
    }

    pub fn children(&self) -> &[BookmarkNode] {
        self.children.as_deref().unwrap_or_default()
    }
}

/// Arguments for creating a bookmark or folder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmark {
    pub parent_id: String,
    pub title: String,
    /// `None` creates a folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// `None` appends at the end of the parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl CreateBookmark {
    pub fn folder(parent_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn bookmark(
        parent_id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            parent_id: parent_id.into(),
            title: title.into(),
            url: Some(url.into()),
            index: None,
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

/// Target position for a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDestination {
    pub parent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}
