//! Bookmark tree filtering.
//!
//! Produces the pruned view of the tree shown when "starred only" or a
//! search is active. Reserved bookkeeping folders never appear in the output.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::bookmark::BookmarkNode;
use crate::metadata::{is_starred, parse_title};
use crate::url::normalize_url;

/// Filter switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub starred_only: bool,
    /// A starred folder shows all of its children, starred or not.
    pub starred_folders_expandable: bool,
    pub show_context_parents: bool,
    pub search_query: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            starred_only: false,
            starred_folders_expandable: true,
            show_context_parents: true,
            search_query: String::new(),
        }
    }
}

/// How a node made it into the filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterMeta {
    pub is_starred: bool,
    /// Shown only because a descendant is starred.
    pub is_context: bool,
    pub expandable: bool,
}

impl Default for FilterMeta {
    fn default() -> Self {
        Self {
            is_starred: false,
            is_context: false,
            expandable: true,
        }
    }
}

/// A node in the filtered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredNode {
    pub node: BookmarkNode,
    pub meta: FilterMeta,
    pub children: Vec<FilteredNode>,
}

impl FilteredNode {
    fn unfiltered(node: &BookmarkNode) -> Self {
        Self {
            node: without_children(node),
            meta: FilterMeta::default(),
            children: node
                .children()
                .iter()
                .filter(|c| !c.is_reserved())
                .map(Self::unfiltered)
                .collect(),
        }
    }
}

fn without_children(node: &BookmarkNode) -> BookmarkNode {
    BookmarkNode {
        children: None,
        ..node.clone()
    }
}

/// Stateful filter owned by one surface.
#[derive(Debug, Clone, Default)]
pub struct TreeFilter {
    pub config: FilterConfig,
}

impl TreeFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn is_active(&self) -> bool {
        self.config.starred_only || !self.config.search_query.trim().is_empty()
    }

    pub fn set_starred_only(&mut self, enabled: bool) {
        self.config.starred_only = enabled;
    }

    pub fn toggle_starred_only(&mut self) -> bool {
        self.config.starred_only = !self.config.starred_only;
        self.config.starred_only
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.config.search_query = query.into();
    }

    pub fn reset(&mut self) {
        self.config.starred_only = false;
        self.config.search_query.clear();
    }

    /// Applies the star filter, then restricts to `search_matches` when given.
    pub fn apply(
        &self,
        nodes: &[BookmarkNode],
        search_matches: Option<&HashSet<String>>,
    ) -> Vec<FilteredNode> {
        let mut result = if self.config.starred_only {
            self.apply_star_filter(nodes)
        } else {
            nodes
                .iter()
                .filter(|n| !n.is_reserved())
                .map(FilteredNode::unfiltered)
                .collect()
        };

        if let Some(ids) = search_matches {
            result = filter_tree_by_ids(result, ids);
        }
        result
    }

    /// Keeps starred nodes and the folders leading to them.
    pub fn apply_star_filter(&self, nodes: &[BookmarkNode]) -> Vec<FilteredNode> {
        let mut result = Vec::new();

        for node in nodes.iter().filter(|n| !n.is_reserved()) {
            let starred = is_starred(&node.title);
            let starred_below = node.children().iter().any(has_starred_descendant);
            if !starred && !starred_below {
                continue;
            }

            let meta = FilterMeta {
                is_starred: starred,
                is_context: !starred && starred_below,
                expandable: starred || !self.config.starred_only,
            };

            let children = if node.children.is_none() {
                Vec::new()
            } else if starred && self.config.starred_folders_expandable {
                node.children()
                    .iter()
                    .filter(|c| !c.is_reserved())
                    .map(|c| FilteredNode {
                        node: without_children(c),
                        meta: FilterMeta {
                            is_starred: is_starred(&c.title),
                            is_context: false,
                            expandable: true,
                        },
                        children: FilteredNode::unfiltered(c).children,
                    })
                    .collect()
            } else {
                self.apply_star_filter(node.children())
            };

            if meta.is_context && !self.config.show_context_parents {
                result.extend(children);
                continue;
            }

            result.push(FilteredNode {
                node: without_children(node),
                meta,
                children,
            });
        }

        result
    }
}

/// True when the node or anything below it is starred.
pub fn has_starred_descendant(node: &BookmarkNode) -> bool {
    if node.is_reserved() {
        return false;
    }
    is_starred(&node.title) || node.children().iter().any(has_starred_descendant)
}

/// Keeps leaves whose id is in `ids`, and folders that are matched
/// themselves or still have children after filtering.
pub fn filter_tree_by_ids(nodes: Vec<FilteredNode>, ids: &HashSet<String>) -> Vec<FilteredNode> {
    let mut filtered = Vec::new();

    for mut item in nodes {
        if item.node.is_folder() {
            let children = filter_tree_by_ids(std::mem::take(&mut item.children), ids);
            if !children.is_empty() || ids.contains(&item.node.id) {
                item.children = children;
                filtered.push(item);
            }
        } else if ids.contains(&item.node.id) {
            filtered.push(item);
        }
    }

    filtered
}

/// A workspace folder as listed in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub id: String,
    pub title: String,
}

/// Lists workspace folders below `root` in tree order.
pub fn find_workspaces(root: &BookmarkNode) -> Vec<WorkspaceSummary> {
    let mut results = Vec::new();
    collect_workspaces(root, &mut results);
    results
}

fn collect_workspaces(node: &BookmarkNode, results: &mut Vec<WorkspaceSummary>) {
    for child in node.children() {
        if child.children.is_none() || child.is_reserved() {
            continue;
        }
        let parsed = parse_title(&child.title);
        if parsed.metadata.workspace {
            results.push(WorkspaceSummary {
                id: child.id.clone(),
                title: parsed.display_title,
            });
        }
        collect_workspaces(child, results);
    }
}

/// Normalised URLs of every bookmark in a subtree, skipping reserved folders.
pub fn workspace_url_set(node: &BookmarkNode) -> HashSet<String> {
    let mut urls = HashSet::new();
    collect_urls(node, &mut urls);
    urls
}

fn collect_urls(node: &BookmarkNode, urls: &mut HashSet<String>) {
    if node.is_reserved() {
        return;
    }
    if let Some(url) = node.url() {
        urls.insert(normalize_url(url));
    }
    for child in node.children() {
        collect_urls(child, urls);
    }
}
