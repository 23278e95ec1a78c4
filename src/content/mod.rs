//! Content trees and caret offset mapping.
//!
//! A [`ContentTree`] is the structured form of one editable or display
//! region: text runs, atomic pictograms, and grouping regions. The
//! [`offset`] functions translate a caret between its linear logical
//! offset and a position in the tree, so the caret survives rewrites that
//! move node boundaries around.

pub mod offset;
mod tree;

pub use offset::{TreePosition, to_linear_offset, to_tree_position};
pub use tree::{Change, ChangeKind, ContentTree, Node, NodeId, Pictogram, RegionKind, Shape};
