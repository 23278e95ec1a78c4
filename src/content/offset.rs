//! Conversion between linear logical offsets and tree positions.
//!
//! Both directions are pure functions of a tree snapshot. Text runs count
//! their characters, pictograms count their label (never the glyph), and
//! regions count nothing themselves.

use super::tree::{ContentTree, Node, NodeId};

/// A caret location inside a [`ContentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreePosition {
    /// `offset` characters into a text run.
    Text { node: NodeId, offset: usize },
    /// Immediately after an atomic node.
    After(NodeId),
    /// Before child `index` of `parent` (or at its end when `index` is past the last child).
    Boundary { parent: NodeId, index: usize },
}

impl TreePosition {
    /// Start of an empty tree.
    pub const fn start_of(tree: &ContentTree) -> Self {
        Self::Boundary {
            parent: tree.root(),
            index: 0,
        }
    }
}

/// Logical offset of `position`.
///
/// Positions naming nodes that no longer exist clamp to the end of content.
pub fn to_linear_offset(tree: &ContentTree, position: TreePosition) -> usize {
    let total = tree.logical_len();
    match position {
        TreePosition::Text { node, offset } => match tree.node(node) {
            Some(Node::Text(text)) => offset_before(tree, node) + offset.min(text.chars().count()),
            _ => total,
        },
        TreePosition::After(node) => {
            if tree.contains(node) {
                offset_before(tree, node) + tree.subtree_len(node)
            } else {
                total
            }
        }
        TreePosition::Boundary { parent, index } => {
            if !tree.contains(parent) {
                return total;
            }
            match tree.children(parent).get(index) {
                Some(&child) => offset_before(tree, child),
                None => offset_before(tree, parent) + tree.subtree_len(parent),
            }
        }
    }
    .min(total)
}

/// Tree position of logical `offset`.
///
/// Total: offsets past the end clamp to the end. An offset on the boundary
/// between a text run and what follows stays at the end of that run. An
/// offset that lands on or inside a pictogram resolves to just after it.
pub fn to_tree_position(tree: &ContentTree, offset: usize) -> TreePosition {
    let mut remaining = offset.min(tree.logical_len());
    for leaf in tree.leaves() {
        let Some(node) = tree.node(leaf) else {
            continue;
        };
        let len = node.logical_len();
        match node {
            Node::Text(_) if remaining <= len => {
                return TreePosition::Text {
                    node: leaf,
                    offset: remaining,
                };
            }
            Node::Pictogram(_) if remaining == 0 => {
                let parent = tree.parent(leaf).unwrap_or_else(|| tree.root());
                let index = tree.index_in_parent(leaf).unwrap_or(0);
                return TreePosition::Boundary { parent, index };
            }
            Node::Pictogram(_) if remaining <= len => return TreePosition::After(leaf),
            _ => remaining -= len,
        }
    }
    let root = tree.root();
    TreePosition::Boundary {
        parent: root,
        index: tree.children(root).len(),
    }
}

/// Logical characters preceding `id` in document order.
fn offset_before(tree: &ContentTree, id: NodeId) -> usize {
    let mut total = 0;
    for node in tree.descendants(tree.root()) {
        if node == id {
            return total;
        }
        if tree.is_within(id, node) {
            continue;
        }
        total += tree.contribution(node);
    }
    total
}
