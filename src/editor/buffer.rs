use crate::content::{ContentTree, Node, NodeId, TreePosition, to_linear_offset, to_tree_position};
use crate::dispatch::Dispatcher;
use crate::pictogram::{PictogramTable, apply_matches, revert};
use crate::runtime::Scheduler;

/// Reconciliation phase of an [`EditableBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for an edit signal.
    Idle,
    /// Edits seen; a flush is queued.
    Editing,
    /// Normalising and re-substituting; edit signals are dropped.
    Reconciling,
}

/// Deferred work the buffer asks its host to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTask {
    /// Deliver batched changes and reconcile.
    Flush,
}

/// What happened to an edit signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// A flush was queued for this burst.
    Scheduled,
    /// Folded into an already queued flush, or nothing reportable changed.
    Coalesced,
    /// Arrived mid-reconcile and was ignored.
    Dropped,
}

/// Handle returned by [`EditableBuffer::on_plain_text_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&str)>;

/// One editable region whose plain text stays in sync with a rich tree.
///
/// The host edits the tree (directly through [`EditableBuffer::tree_mut`],
/// or through the editing helpers), then raises the content-changed signal.
/// On the next microtask the buffer reconciles: it captures the caret as a
/// logical offset, reverts pictograms to text, substitutes again, puts the
/// caret back, and publishes the plain text if it changed.
pub struct EditableBuffer {
    tree: ContentTree,
    caret: TreePosition,
    dispatcher: Dispatcher,
    table: PictogramTable,
    pictograms_enabled: bool,
    phase: Phase,
    plain_text: String,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl std::fmt::Debug for EditableBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditableBuffer")
            .field("plain_text", &self.plain_text)
            .field("caret", &self.caret)
            .field("phase", &self.phase)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for EditableBuffer {
    fn default() -> Self {
        Self::new(PictogramTable::builtin())
    }
}

impl EditableBuffer {
    /// Create an empty buffer substituting from `table`.
    pub fn new(table: PictogramTable) -> Self {
        let tree = ContentTree::new();
        let caret = TreePosition::start_of(&tree);
        let dispatcher = Dispatcher::new(tree.root());
        Self {
            tree,
            caret,
            dispatcher,
            table,
            pictograms_enabled: true,
            phase: Phase::Idle,
            plain_text: String::new(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Current logical text.
    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn tree(&self) -> &ContentTree {
        &self.tree
    }

    /// Raw access for a host that edits the tree itself. Follow up with
    /// [`EditableBuffer::on_content_changed`].
    pub const fn tree_mut(&mut self) -> &mut ContentTree {
        &mut self.tree
    }

    pub const fn caret(&self) -> TreePosition {
        self.caret
    }

    /// Caret as a logical offset.
    pub fn caret_offset(&self) -> usize {
        to_linear_offset(&self.tree, self.caret)
    }

    /// Place the caret at a raw tree position.
    pub const fn set_caret(&mut self, caret: TreePosition) {
        self.caret = caret;
    }

    /// Place the caret at a logical offset (clamped).
    pub fn set_caret_offset(&mut self, offset: usize) {
        self.caret = to_tree_position(&self.tree, offset);
    }

    /// The dispatcher observing this buffer's tree.
    pub const fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Enable or disable substitution. Takes effect on the next reconcile.
    pub const fn set_pictograms_enabled(&mut self, enabled: bool) {
        self.pictograms_enabled = enabled;
    }

    /// Register a callback fired whenever the plain text changes.
    pub fn on_plain_text_changed(&mut self, listener: impl FnMut(&str) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        before != self.listeners.len()
    }

    /// The host is composing into `region` (an input-method preedit, say).
    /// Edits under it stop triggering reconciliation until
    /// [`EditableBuffer::end_composition`].
    pub fn begin_composition(&mut self, region: NodeId) {
        tracing::trace!(?region, "composer: composition started");
        self.dispatcher.protect(region);
    }

    /// Composition into `region` is committed: reconcile what was composed.
    pub fn end_composition(&mut self, region: NodeId) {
        tracing::trace!(?region, "composer: composition ended");
        self.dispatcher.unprotect(region);
        self.reconcile();
    }

    /// The host's "content changed" signal.
    pub fn on_content_changed<T: From<BufferTask>>(&mut self, tasks: &mut Scheduler<T>) -> Signal {
        if self.phase == Phase::Reconciling {
            tracing::debug!("composer: edit signal dropped while reconciling");
            crate::perf::log_event("composer.signal.dropped", "phase=reconciling");
            return Signal::Dropped;
        }
        if self.dispatcher.collect(&mut self.tree) {
            self.phase = Phase::Editing;
            tasks.queue_microtask(BufferTask::Flush.into());
            Signal::Scheduled
        } else {
            Signal::Coalesced
        }
    }

    /// Run a task this buffer scheduled.
    pub fn run(&mut self, task: BufferTask) {
        match task {
            BufferTask::Flush => {
                let batch = self.dispatcher.flush();
                if batch.is_empty() {
                    if self.phase == Phase::Editing {
                        self.phase = Phase::Idle;
                    }
                    return;
                }
                crate::perf::log_event("composer.flush", format!("changed={}", batch.len()));
                self.reconcile();
            }
        }
    }

    /// Normalise, re-substitute and restore the caret now.
    pub fn reconcile(&mut self) {
        if self.phase == Phase::Reconciling {
            return;
        }
        self.phase = Phase::Reconciling;

        let offset = to_linear_offset(&self.tree, self.caret);
        let root = self.tree.root();
        let table = &self.table;
        let enabled = self.pictograms_enabled;
        let (length_before, length_after) = self.dispatcher.suppressed(&mut self.tree, |tree| {
            revert(tree, root);
            let before = tree.logical_len();
            if enabled {
                apply_matches(tree, root, table);
            }
            (before, tree.logical_len())
        });
        debug_assert_eq!(length_before, length_after, "substitution changed logical length");
        self.caret = to_tree_position(&self.tree, offset);

        let text = self.tree.logical_text();
        tracing::trace!(offset, len = length_after, "composer: reconciled");
        if text != self.plain_text {
            self.plain_text = text;
            self.notify();
        }
        self.phase = Phase::Idle;
    }

    /// Insert typed text at the caret, as an editing surface would.
    pub fn insert_text<T: From<BufferTask>>(&mut self, text: &str, tasks: &mut Scheduler<T>) -> Signal {
        if text.is_empty() {
            return Signal::Coalesced;
        }
        let typed = text.chars().count();
        let root = self.tree.root();
        self.caret = match self.caret {
            TreePosition::Text { node, offset } if self.tree.insert_chars(node, offset, text) => {
                TreePosition::Text {
                    node,
                    offset: offset + typed,
                }
            }
            TreePosition::After(node) if self.tree.contains(node) => {
                match self.tree.next_sibling(node) {
                    Some(next) if self.tree.insert_chars(next, 0, text) => TreePosition::Text {
                        node: next,
                        offset: typed,
                    },
                    _ => {
                        let inserted = self.tree.insert_after(node, Node::Text(text.to_string()));
                        TreePosition::Text {
                            node: inserted,
                            offset: typed,
                        }
                    }
                }
            }
            TreePosition::Boundary { parent, index } if self.tree.contains(parent) => {
                let inserted = self.tree.insert(parent, index, Node::Text(text.to_string()));
                TreePosition::Text {
                    node: inserted,
                    offset: typed,
                }
            }
            _ => {
                // Stale caret: type at the end.
                let inserted = self.tree.append(root, Node::Text(text.to_string()));
                TreePosition::Text {
                    node: inserted,
                    offset: typed,
                }
            }
        };
        self.on_content_changed(tasks)
    }

    /// Delete the logical unit before the caret: one character, or a whole pictogram.
    pub fn delete_backward<T: From<BufferTask>>(&mut self, tasks: &mut Scheduler<T>) -> Signal {
        let offset = to_linear_offset(&self.tree, self.caret);
        if offset == 0 {
            return Signal::Coalesced;
        }
        match to_tree_position(&self.tree, offset) {
            TreePosition::Text { node, offset: inner } if inner > 0 => {
                self.tree.remove_chars(node, inner - 1..inner);
                self.caret = TreePosition::Text {
                    node,
                    offset: inner - 1,
                };
            }
            TreePosition::After(node) => {
                let width = self.tree.contribution(node);
                self.tree.remove(node);
                self.caret = to_tree_position(&self.tree, offset.saturating_sub(width));
            }
            _ => return Signal::Coalesced,
        }
        self.on_content_changed(tasks)
    }

    /// Replace the whole content (draft restore, clear after send) and
    /// reconcile immediately. The caret moves to the end.
    pub fn replace_text(&mut self, text: &str) {
        let root = self.tree.root();
        self.dispatcher.suppressed(&mut self.tree, |tree| {
            tree.clear_children(root);
            if !text.is_empty() {
                tree.append(root, Node::Text(text.to_string()));
            }
        });
        self.caret = to_tree_position(&self.tree, usize::MAX);
        self.reconcile();
    }

    /// Return the plain text and clear the buffer.
    pub fn take_text(&mut self) -> String {
        let text = self.plain_text.clone();
        self.replace_text("");
        text
    }

    fn notify(&mut self) {
        let text = self.plain_text.clone();
        for (_, listener) in &mut self.listeners {
            listener(&text);
        }
    }
}
