/*!
 * Cascading selection over tree snapshots
 *
 * All operations are pure: toggling produces a new tree and the selection set
 * is always recomputed from that tree, never edited on its own.
 */

use tracing::debug;

use crate::types::{SelectionSet, Tree, TreeNode};
use crate::utils::is_same_or_descendant;

/// Set `selected` on the node at `path` and on every node below it.
///
/// Ancestors are left untouched. Returns the new tree and its selection set;
/// the input tree is not modified. A path that matches nothing yields an
/// unchanged copy.
pub fn toggle(tree: &Tree, path: &str, selected: bool) -> (Tree, SelectionSet) {
    let nodes = tree
        .nodes
        .iter()
        .map(|node| apply(node, path, selected))
        .collect();
    let tree = Tree::new(nodes);

    if tree.find(path).is_none() {
        debug!("toggle on unknown path {}", path);
    }

    let selection = collect_selection(&tree);
    (tree, selection)
}

fn apply(node: &TreeNode, path: &str, selected: bool) -> TreeNode {
    let covered = is_same_or_descendant(&node.path, path);
    // Only the target's ancestors and its subtree can contain matches
    let on_route = covered || is_same_or_descendant(path, &node.path);

    TreeNode {
        path: node.path.clone(),
        name: node.name.clone(),
        kind: node.kind,
        children: node.children.as_ref().map(|children| {
            if on_route {
                children.iter().map(|c| apply(c, path, selected)).collect()
            } else {
                children.clone()
            }
        }),
        selected: if covered { selected } else { node.selected },
    }
}

/// Every selected path of `tree`, found by a full depth-first walk
pub fn collect_selection(tree: &Tree) -> SelectionSet {
    SelectionSet::from_tree(tree)
}

/// Whether the node at `path` exists and is a file
pub fn is_file(tree: &Tree, path: &str) -> bool {
    tree.find(path).map_or(false, TreeNode::is_file)
}

/// Whether the node at `path` exists and is selected
pub fn is_selected(tree: &Tree, path: &str) -> bool {
    tree.find(path).map_or(false, |n| n.selected)
}
