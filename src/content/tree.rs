//! Arena-backed content tree.

use std::fmt::Write as _;

/// Handle to a node in a [`ContentTree`].
///
/// A handle outlives its node: once the node is removed the handle is dead
/// for good, even after its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// An atomic embedded glyph standing in for a character sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pictogram {
    /// What the view draws.
    pub glyph: String,
    /// The sequence the pictogram replaced; this is what counts as typed text.
    pub label: String,
}

/// Container flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// The tree root.
    Root,
    /// Plain grouping (a line, a quoted span).
    Block,
    /// Explicit skip marker: substitution and change delivery never look inside.
    Skip,
}

/// Node payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A run of plain characters.
    Text(String),
    /// An embedded pictogram.
    Pictogram(Pictogram),
    /// A container of other nodes.
    Region(RegionKind),
}

impl Node {
    /// Logical characters this node contributes on its own (containers contribute nothing).
    pub fn logical_len(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Pictogram(pictogram) => pictogram.label.chars().count(),
            Self::Region(_) => 0,
        }
    }

    /// Whether the caret can never sit inside this node.
    pub const fn is_atomic(&self) -> bool {
        matches!(self, Self::Pictogram(_))
    }

    /// Whether this node is a leaf that carries logical text.
    pub const fn is_leaf(&self) -> bool {
        !matches!(self, Self::Region(_))
    }
}

/// What happened to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Characters inside a text run changed.
    Text,
    /// A container gained or lost children.
    Children,
}

/// One journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub target: NodeId,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone)]
struct Slot {
    node: Node,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena cell; `generation` bumps every time the cell is freed.
#[derive(Debug, Clone)]
struct Entry {
    generation: u32,
    slot: Option<Slot>,
}

/// Comparable shape of a subtree, ignoring node identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    pub node: Node,
    pub children: Vec<Shape>,
}

/// A mutable tree of text runs, pictograms and regions.
///
/// Every structural write is appended to a change journal which
/// [`crate::dispatch::Dispatcher`] drains.
///
/// # Example
///
/// ```
/// use chatpane::content::{ContentTree, Node, Pictogram};
///
/// let mut tree = ContentTree::from_text("hi ");
/// let root = tree.root();
/// tree.append(root, Node::Pictogram(Pictogram { glyph: "🙂".into(), label: ":)".into() }));
/// assert_eq!(tree.logical_text(), "hi :)");
/// assert_eq!(tree.logical_len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct ContentTree {
    slots: Vec<Entry>,
    free: Vec<usize>,
    root: NodeId,
    journal: Vec<Change>,
}

impl Default for ContentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTree {
    /// Create a tree holding only an empty root region.
    pub fn new() -> Self {
        Self {
            slots: vec![Entry {
                generation: 0,
                slot: Some(Slot {
                    node: Node::Region(RegionKind::Root),
                    parent: None,
                    children: Vec::new(),
                }),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            journal: Vec::new(),
        }
    }

    /// Create a tree with a single text run (none if `text` is empty).
    pub fn from_text(text: &str) -> Self {
        let mut tree = Self::new();
        if !text.is_empty() {
            let root = tree.root;
            tree.append(root, Node::Text(text.to_string()));
        }
        tree.journal.clear();
        tree
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `id` still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slot(id).map(|slot| &slot.node)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|slot| slot.parent)
    }

    /// Children of `id` in order (empty for leaves and dead ids).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map_or(&[], |slot| slot.children.as_slice())
    }

    /// Index of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Logical length contributed by the node itself.
    pub fn contribution(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, Node::logical_len)
    }

    /// Logical length of the whole subtree under `id`.
    pub fn subtree_len(&self, id: NodeId) -> usize {
        self.descendants(id)
            .into_iter()
            .map(|node| self.contribution(node))
            .sum()
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// All text runs and pictograms in document order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.node(id).is_some_and(Node::is_leaf))
            .collect()
    }

    /// Whether `id` is `ancestor` or lies beneath it.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Whether `id` is a skip region or sits inside one.
    pub fn in_skip_region(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if matches!(self.node(current), Some(Node::Region(RegionKind::Skip))) {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Concatenated logical text of the whole tree.
    pub fn logical_text(&self) -> String {
        self.subtree_text(self.root)
    }

    /// Concatenated logical text under `id`.
    pub fn subtree_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            match self.node(node) {
                Some(Node::Text(text)) => out.push_str(text),
                Some(Node::Pictogram(pictogram)) => out.push_str(&pictogram.label),
                _ => {}
            }
        }
        out
    }

    pub fn logical_len(&self) -> usize {
        self.subtree_len(self.root)
    }

    /// Display form: pictograms render as their glyph.
    pub fn display_text(&self) -> String {
        let mut out = String::new();
        for node in self.descendants(self.root) {
            match self.node(node) {
                Some(Node::Text(text)) => out.push_str(text),
                Some(Node::Pictogram(pictogram)) => out.push_str(&pictogram.glyph),
                _ => {}
            }
        }
        out
    }

    /// Shape of the subtree under `id`, for content comparison.
    pub fn shape(&self, id: NodeId) -> Option<Shape> {
        let node = self.node(id)?.clone();
        let children = self
            .children(id)
            .iter()
            .filter_map(|&child| self.shape(child))
            .collect();
        Some(Shape { node, children })
    }

    /// Structural equality ignoring node identities.
    pub fn content_eq(&self, other: &Self) -> bool {
        self.shape(self.root) == other.shape(other.root)
    }

    /// Append `node` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, node: Node) -> NodeId {
        let index = self.children(parent).len();
        self.insert(parent, index, node)
    }

    /// Insert `node` at `index` among `parent`'s children (clamped).
    ///
    /// Inserting under a leaf or a dead id falls back to the root.
    pub fn insert(&mut self, parent: NodeId, index: usize, node: Node) -> NodeId {
        let parent = if matches!(self.node(parent), Some(Node::Region(_))) {
            parent
        } else {
            self.root
        };
        let id = self.alloc(Slot {
            node,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(slot) = self.slot_mut(parent) {
            let index = index.min(slot.children.len());
            slot.children.insert(index, id);
        }
        self.record(parent, ChangeKind::Children);
        id
    }

    /// Insert `node` directly after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, node: Node) -> NodeId {
        match (self.parent(sibling), self.index_in_parent(sibling)) {
            (Some(parent), Some(index)) => self.insert(parent, index + 1, node),
            _ => {
                let root = self.root;
                self.append(root, node)
            }
        }
    }

    /// Detach and free `id` with its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.contains(id) {
            return false;
        }
        if let Some(parent) = self.parent(id) {
            if let Some(slot) = self.slot_mut(parent) {
                slot.children.retain(|&child| child != id);
            }
            self.record(parent, ChangeKind::Children);
        }
        for node in self.descendants(id) {
            if let Some(entry) = self.slots.get_mut(node.index) {
                entry.slot = None;
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(node.index);
            }
        }
        true
    }

    /// Remove every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) {
        for child in self.children(parent).to_vec() {
            self.remove(child);
        }
    }

    /// Replace `id` in place with a sequence of new nodes. Returns their ids.
    pub fn replace(&mut self, id: NodeId, nodes: Vec<Node>) -> Vec<NodeId> {
        let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) else {
            return Vec::new();
        };
        self.remove(id);
        nodes
            .into_iter()
            .enumerate()
            .map(|(offset, node)| self.insert(parent, index + offset, node))
            .collect()
    }

    /// Overwrite the characters of a text run.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        let Some(Node::Text(existing)) = self.slot_mut(id).map(|slot| &mut slot.node) else {
            return false;
        };
        *existing = text.into();
        self.record(id, ChangeKind::Text);
        true
    }

    /// Insert `text` at character offset `at` (clamped) inside a text run.
    pub fn insert_chars(&mut self, id: NodeId, at: usize, text: &str) -> bool {
        let Some(Node::Text(existing)) = self.node(id) else {
            return false;
        };
        let byte = byte_index(existing, at);
        let mut updated = existing.clone();
        updated.insert_str(byte, text);
        self.set_text(id, updated)
    }

    /// Remove the character range `range` (in chars, clamped) from a text run.
    pub fn remove_chars(&mut self, id: NodeId, range: std::ops::Range<usize>) -> bool {
        let Some(Node::Text(existing)) = self.node(id) else {
            return false;
        };
        let start = byte_index(existing, range.start);
        let end = byte_index(existing, range.end.max(range.start));
        let mut updated = existing.clone();
        updated.replace_range(start..end, "");
        self.set_text(id, updated)
    }

    /// Merge adjacent text runs and drop empty ones below `region`,
    /// without descending into skip regions.
    pub fn normalize(&mut self, region: NodeId) {
        let children = self.children(region).to_vec();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            match self.node(child).cloned() {
                Some(Node::Text(text)) => {
                    if text.is_empty() {
                        self.remove(child);
                    } else if let Some(previous) = previous_text {
                        let merged = match self.node(previous) {
                            Some(Node::Text(head)) => format!("{head}{text}"),
                            _ => text,
                        };
                        self.set_text(previous, merged);
                        self.remove(child);
                    } else {
                        previous_text = Some(child);
                    }
                }
                Some(Node::Region(kind)) => {
                    previous_text = None;
                    if kind != RegionKind::Skip {
                        self.normalize(child);
                    }
                }
                _ => previous_text = None,
            }
        }
    }

    /// Drain the change journal.
    pub fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.journal)
    }

    /// Whether writes happened since the last drain.
    pub fn has_changes(&self) -> bool {
        !self.journal.is_empty()
    }

    /// Debug rendering of the structure, one node per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.outline_into(self.root, 0, &mut out);
        out
    }

    fn outline_into(&self, id: NodeId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match self.node(id) {
            Some(Node::Text(text)) => {
                let _ = writeln!(out, "{indent}text {text:?}");
            }
            Some(Node::Pictogram(pictogram)) => {
                let _ = writeln!(out, "{indent}pictogram {} ({:?})", pictogram.glyph, pictogram.label);
            }
            Some(Node::Region(kind)) => {
                let _ = writeln!(out, "{indent}{kind:?}");
                for &child in self.children(id) {
                    self.outline_into(child, depth + 1, out);
                }
            }
            None => {}
        }
    }

    fn record(&mut self, target: NodeId, kind: ChangeKind) {
        self.journal.push(Change { target, kind });
    }

    fn alloc(&mut self, slot: Slot) -> NodeId {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.slots[index];
            entry.slot = Some(slot);
            return NodeId {
                index,
                generation: entry.generation,
            };
        }
        self.slots.push(Entry {
            generation: 0,
            slot: Some(slot),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots
            .get(id.index)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.slot.as_ref())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.slot.as_mut())
    }
}

/// Byte index of the `chars`-th character, clamped to the end.
fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(byte, _)| byte)
}
