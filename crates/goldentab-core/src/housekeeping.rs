//! Tidying of tab strips and bookmark folders.
//!
//! Duplicates are detected on [`normalize_url`], so `https://www.a.example/`
//! and `http://a.example#top` count as the same page. The first occurrence is
//! kept. Sorting moves items one by one through the host, so each move is a
//! point at which another surface may change the same strip or folder.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::bookmark::{BookmarkNode, BookmarkStore, MoveDestination};
use crate::error::Result;
use crate::metadata::display_title;
use crate::tab::{Tab, TabId, TabManager};
use crate::url::normalize_url;

/// Ids of tabs whose URL already appeared earlier in `tabs`.
pub fn find_duplicate_tab_ids(tabs: &[Tab]) -> Vec<TabId> {
    let mut seen = HashSet::new();
    tabs.iter()
        .filter(|t| !seen.insert(normalize_url(&t.url)))
        .map(|t| t.id)
        .collect()
}

/// Grouping key for sorting tabs: the host without a leading `www.`.
///
/// URLs without a host (`about:blank`, `file:///...`) group under the whole
/// lowercased URL.
pub fn site_key(url: &str) -> String {
    let host = url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| url.to_lowercase());
    if let Some(rest) = host.strip_prefix("www.") {
        return rest.to_string();
    }
    host
}

/// `tabs` ordered by site, then by title. Ties keep their strip order.
pub fn sort_tabs_by_site(tabs: &[Tab]) -> Vec<Tab> {
    let mut sorted = tabs.to_vec();
    sorted.sort_by_cached_key(|t| (site_key(&t.url), t.title.to_lowercase()));
    sorted
}

fn compare_titles(a: &BookmarkNode, b: &BookmarkNode) -> Ordering {
    let (a, b) = (display_title(&a.title), display_title(&b.title));
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(&b))
}

/// Duplicate removal and sorting through the host APIs.
#[derive(Clone)]
pub struct Housekeeper {
    bookmarks: Arc<dyn BookmarkStore>,
    tabs: Arc<dyn TabManager>,
}

impl Housekeeper {
    pub fn new(bookmarks: Arc<dyn BookmarkStore>, tabs: Arc<dyn TabManager>) -> Self {
        Self { bookmarks, tabs }
    }

    /// Closes every tab of `tabs` that repeats an earlier one's URL.
    ///
    /// Returns the number of tabs asked to close; tabs already closed by the
    /// time the request runs are not an error.
    pub async fn close_duplicate_tabs(&self, tabs: &[Tab]) -> Result<usize> {
        let duplicates = find_duplicate_tab_ids(tabs);
        if duplicates.is_empty() {
            return Ok(0);
        }
        match self.tabs.remove(&duplicates).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("[Housekeeping] Some duplicates were already closed: {}", e);
            }
            Err(e) => return Err(e),
        }
        tracing::info!("[Housekeeping] Closed {} duplicate tab(s)", duplicates.len());
        Ok(duplicates.len())
    }

    /// Reorders `tabs` by site, starting at the lowest strip index among them.
    ///
    /// Tabs outside `tabs` (the management tab, internal pages) are not moved
    /// themselves but may shift as the sorted ones move around them. Returns
    /// the number of tabs moved.
    pub async fn sort_tabs_by_website(&self, tabs: &[Tab]) -> Result<usize> {
        let Some(base) = tabs.iter().map(|t| t.index).min() else {
            return Ok(0);
        };
        let sorted = sort_tabs_by_site(tabs);
        let mut moved = 0;
        for (offset, tab) in sorted.iter().enumerate() {
            match self.tabs.move_tab(tab.id, base + offset, None).await {
                Ok(_) => moved += 1,
                Err(e) if e.is_not_found() => {
                    tracing::debug!("[Housekeeping] Tab {} closed while sorting", tab.id);
                }
                Err(e) => return Err(e),
            }
        }
        tracing::info!("[Housekeeping] Sorted {} tab(s) by website", moved);
        Ok(moved)
    }

    /// Bookmarks directly inside `folder_id` whose URL repeats an earlier
    /// sibling's. Subfolders are not searched.
    pub async fn find_folder_duplicates(&self, folder_id: &str) -> Result<Vec<BookmarkNode>> {
        let children = self.bookmarks.get_children(folder_id).await?;
        let mut seen = HashSet::new();
        Ok(children
            .into_iter()
            .filter(|child| match child.url() {
                Some(url) => !seen.insert(normalize_url(url)),
                None => false,
            })
            .collect())
    }

    /// Removes the duplicates [`Self::find_folder_duplicates`] reports.
    pub async fn deduplicate_folder(&self, folder_id: &str) -> Result<usize> {
        let duplicates = self.find_folder_duplicates(folder_id).await?;
        let mut removed = 0;
        for bookmark in &duplicates {
            match self.bookmarks.remove(&bookmark.id).await {
                Ok(()) => removed += 1,
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        tracing::info!(
            "[Housekeeping] Removed {} duplicate bookmark(s) from {}",
            removed,
            folder_id
        );
        Ok(removed)
    }

    /// Sorts the direct children of `folder_id`: folders first, then
    /// bookmarks, each group by visible title ignoring case.
    pub async fn sort_folder(&self, folder_id: &str) -> Result<usize> {
        let children = self.bookmarks.get_children(folder_id).await?;
        let (mut folders, mut bookmarks): (Vec<_>, Vec<_>) =
            children.into_iter().partition(BookmarkNode::is_folder);
        folders.sort_by(compare_titles);
        bookmarks.sort_by(compare_titles);

        let sorted: Vec<BookmarkNode> = folders.into_iter().chain(bookmarks).collect();
        for (index, node) in sorted.iter().enumerate() {
            self.bookmarks
                .move_node(
                    &node.id,
                    MoveDestination {
                        parent_id: folder_id.to_string(),
                        index: Some(index),
                    },
                )
                .await?;
        }
        tracing::info!("[Housekeeping] Sorted {} item(s) in {}", sorted.len(), folder_id);
        Ok(sorted.len())
    }
}
