/*!
 * Core types and data structures for treepick
 */

use std::collections::BTreeMap;

use serde::Serialize;

use crate::utils::is_same_or_descendant;

/// Kind of a filesystem entry as seen through a directory capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Regular file
    File,
    /// Directory containing other entries
    Directory,
}

/// One filesystem entry in a tree snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Root-relative path, always starting with `/`
    pub path: String,
    /// Last path segment
    pub name: String,
    /// Entry kind
    pub kind: NodeKind,
    /// Children, `Some` iff this is a directory. `Some(vec![])` is an empty
    /// (or unreadable) directory; `None` on a directory means not loaded.
    pub children: Option<Vec<TreeNode>>,
    /// The node's own selection flag
    pub selected: bool,
}

impl TreeNode {
    /// Create a file leaf
    pub fn file(path: String, name: String, selected: bool) -> Self {
        Self {
            path,
            name,
            kind: NodeKind::File,
            children: None,
            selected,
        }
    }

    /// Create a directory node with its loaded children
    pub fn directory(path: String, name: String, children: Vec<TreeNode>, selected: bool) -> Self {
        Self {
            path,
            name,
            kind: NodeKind::Directory,
            children: Some(children),
            selected,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Children as a slice, empty for files and unloaded directories
    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// An immutable snapshot of a directory's entries. The root directory itself
/// has no node; its entries are the top-level nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find the node at `path`, descending only into matching ancestors
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let mut level = self.nodes.as_slice();
        loop {
            let node = level
                .iter()
                .find(|n| is_same_or_descendant(path, &n.path))?;
            if node.path == path {
                return Some(node);
            }
            level = node.children();
        }
    }

    /// Depth-first pre-order iteration over every node
    pub fn walk(&self) -> TreeWalk<'_> {
        TreeWalk {
            stack: self.nodes.iter().rev().collect(),
        }
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.walk().count()
    }
}

/// Pre-order iterator returned by [`Tree::walk`]
pub struct TreeWalk<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for TreeWalk<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// The set of selected paths.
///
/// Derived from a tree (see [`SelectionSet::from_tree`]); each entry records
/// the kind the path had when it was selected so a later build can tell when
/// a path now denotes something else. Paths supplied by a user before any
/// tree exists carry no kind and accept either.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: BTreeMap<String, Option<NodeKind>>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every selected node of `tree`
    pub fn from_tree(tree: &Tree) -> Self {
        let entries = tree
            .walk()
            .filter(|n| n.selected)
            .map(|n| (n.path.clone(), Some(n.kind)))
            .collect();
        Self { entries }
    }

    /// Build a seed from bare paths of unknown kind
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = paths.into_iter().map(|p| (p.into(), None)).collect();
        Self { entries }
    }

    pub fn insert(&mut self, path: String, kind: Option<NodeKind>) {
        self.entries.insert(path, kind);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Kind recorded for `path`, if any was recorded
    pub fn kind_of(&self, path: &str) -> Option<NodeKind> {
        self.entries.get(path).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selected paths in lexical order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, Option<NodeKind>)> {
        self.entries.iter().map(|(p, k)| (p.as_str(), *k))
    }
}
