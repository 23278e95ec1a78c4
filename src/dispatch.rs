//! Batched change notification for a content tree.
//!
//! The [`Dispatcher`] drains the tree's change journal, filters out what
//! must not be reported, and queues the rest for a single deferred flush.
//! Writes made inside [`Dispatcher::suppressed`] are dropped instead of
//! queued, so a listener that rewrites the tree never hears about its own
//! writes.

use crate::content::{ContentTree, NodeId};

/// Changed nodes delivered by one flush, in detection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub nodes: Vec<NodeId>,
}

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Observes one root region of a [`ContentTree`].
#[derive(Debug)]
pub struct Dispatcher {
    root: NodeId,
    pending: Vec<NodeId>,
    flush_scheduled: bool,
    suppress_depth: u32,
    protected: Vec<NodeId>,
}

impl Dispatcher {
    /// Observe everything under `root`.
    pub const fn new(root: NodeId) -> Self {
        Self {
            root,
            pending: Vec::new(),
            flush_scheduled: false,
            suppress_depth: 0,
            protected: Vec::new(),
        }
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Stop reporting changes under `region` (an area the host is still
    /// composing into). See [`crate::editor::EditableBuffer::begin_composition`].
    pub fn protect(&mut self, region: NodeId) {
        if !self.protected.contains(&region) {
            self.protected.push(region);
        }
    }

    /// Resume reporting changes under `region`.
    pub fn unprotect(&mut self, region: NodeId) {
        self.protected.retain(|&id| id != region);
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_depth > 0
    }

    pub const fn is_flush_scheduled(&self) -> bool {
        self.flush_scheduled
    }

    /// Drain the tree's journal into the pending batch.
    ///
    /// Returns `true` when the caller must schedule a flush: the batch just
    /// became non-empty and no flush is queued yet.
    pub fn collect(&mut self, tree: &mut ContentTree) -> bool {
        self.enqueue(tree);
        self.schedule_pending()
    }

    /// Claim the flush slot if changes are waiting and none is scheduled.
    pub fn schedule_pending(&mut self) -> bool {
        if self.pending.is_empty() || self.flush_scheduled {
            return false;
        }
        self.flush_scheduled = true;
        true
    }

    /// Run `write` with its own writes hidden from this dispatcher.
    ///
    /// Changes made before the scope are collected first so they are not
    /// lost; the flush for them still has to be scheduled through
    /// [`Dispatcher::schedule_pending`].
    pub fn suppressed<R>(
        &mut self,
        tree: &mut ContentTree,
        write: impl FnOnce(&mut ContentTree) -> R,
    ) -> R {
        self.enqueue(tree);
        self.suppress_depth += 1;
        let result = write(tree);
        self.enqueue(tree);
        self.suppress_depth -= 1;
        result
    }

    /// Deliver the pending batch and free the flush slot.
    pub fn flush(&mut self) -> ChangeBatch {
        self.flush_scheduled = false;
        ChangeBatch {
            nodes: std::mem::take(&mut self.pending),
        }
    }

    fn enqueue(&mut self, tree: &mut ContentTree) {
        let changes = tree.take_changes();
        if self.is_suppressed() {
            if !changes.is_empty() {
                tracing::trace!(count = changes.len(), "dispatch: dropped own writes");
            }
            return;
        }
        for change in changes {
            let target = change.target;
            if self.pending.contains(&target) || !self.is_reportable(tree, target) {
                continue;
            }
            self.pending.push(target);
        }
    }

    fn is_reportable(&self, tree: &ContentTree, target: NodeId) -> bool {
        tree.contains(target)
            && tree.is_within(target, self.root)
            && !tree.in_skip_region(target)
            && !self
                .protected
                .iter()
                .any(|&region| tree.is_within(target, region))
    }
}
