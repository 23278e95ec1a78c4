//! Pictogram substitution.
//!
//! [`substitute`] is idempotent: it first reverts every pictogram to a text
//! run holding its label and merges the runs back together, then rescans
//! the plain text and splits matches out into pictogram nodes. Running it
//! twice produces a content-equal tree, and the logical text never changes.

mod table;

pub use table::{PictogramMatch, PictogramTable, TableError};

use crate::content::{ContentTree, Node, NodeId, Pictogram, RegionKind};

/// Outcome counts of one substitution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstitutionStats {
    pub reverted: usize,
    pub substituted: usize,
}

/// Full pass over `region`: revert, normalise, rescan.
pub fn substitute(tree: &mut ContentTree, region: NodeId, table: &PictogramTable) -> SubstitutionStats {
    let reverted = revert(tree, region);
    let substituted = apply_matches(tree, region, table);
    SubstitutionStats {
        reverted,
        substituted,
    }
}

/// Display form of plain `text`: table sequences shown as their glyphs.
pub fn render_display(text: &str, table: &PictogramTable) -> String {
    if table.is_empty() {
        return text.to_string();
    }
    let mut tree = ContentTree::from_text(text);
    let root = tree.root();
    apply_matches(&mut tree, root, table);
    tree.display_text()
}

/// Turn every pictogram under `region` back into plain text and merge
/// adjacent runs. Skip regions are left untouched. Returns how many
/// pictograms were reverted.
pub fn revert(tree: &mut ContentTree, region: NodeId) -> usize {
    let pictograms: Vec<NodeId> = reachable(tree, region)
        .into_iter()
        .filter(|&id| matches!(tree.node(id), Some(Node::Pictogram(_))))
        .collect();
    for &id in &pictograms {
        let label = match tree.node(id) {
            Some(Node::Pictogram(pictogram)) => pictogram.label.clone(),
            _ => continue,
        };
        tree.replace(id, vec![Node::Text(label)]);
    }
    tree.normalize(region);
    pictograms.len()
}

/// Split table matches out of the text runs under `region` into pictogram
/// nodes. Returns how many pictograms were created.
pub fn apply_matches(tree: &mut ContentTree, region: NodeId, table: &PictogramTable) -> usize {
    if table.is_empty() {
        return 0;
    }
    let runs: Vec<(NodeId, String)> = reachable(tree, region)
        .into_iter()
        .filter_map(|id| match tree.node(id) {
            Some(Node::Text(text)) => Some((id, text.clone())),
            _ => None,
        })
        .collect();

    let mut created = 0;
    for (id, text) in runs {
        let found = table.find_all(&text);
        if found.is_empty() {
            continue;
        }
        created += found.len();
        tree.replace(id, split_run(&text, found));
    }
    created
}

/// Nodes under `region` in document order, not descending into skip regions.
fn reachable(tree: &ContentTree, region: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![region];
    while let Some(id) = stack.pop() {
        out.push(id);
        if matches!(tree.node(id), Some(Node::Region(RegionKind::Skip))) {
            continue;
        }
        stack.extend(tree.children(id).iter().rev());
    }
    out
}

fn split_run(text: &str, found: Vec<PictogramMatch>) -> Vec<Node> {
    let chars: Vec<char> = text.chars().collect();
    let mut pieces = Vec::with_capacity(found.len() * 2 + 1);
    let mut cursor = 0;
    for found in found {
        if found.start > cursor {
            pieces.push(Node::Text(chars[cursor..found.start].iter().collect()));
        }
        pieces.push(Node::Pictogram(Pictogram {
            glyph: found.glyph,
            label: found.label,
        }));
        cursor = found.end;
    }
    if cursor < chars.len() {
        pieces.push(Node::Text(chars[cursor..].iter().collect()));
    }
    pieces
}
