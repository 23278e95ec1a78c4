use std::collections::HashSet;

use crate::runtime::{Scheduler, TimerId};

use super::pagination::History;
use super::{AnchorConfig, ChatMessage, FeedId, MediaId, MessageId, PageRequest, ScrollLock, ViewportState};

/// The view a [`ScrollAnchor`] reads from and writes to.
pub trait FeedView {
    /// Current geometry, reflecting every update already applied.
    fn sample(&self) -> ViewportState;
    /// Scroll; implementations clamp to their valid range.
    fn set_scroll_top(&mut self, scroll_top: f64);
    /// Hide or show the feed without affecting layout.
    fn set_visible(&mut self, visible: bool);
    /// Rendered media that has neither loaded nor failed yet.
    fn unsettled_media(&self) -> Vec<MediaId>;
}

/// Deferred work the anchor asks its host to run.
///
/// Every task carries the feed and selection epoch it was issued under and
/// is ignored if the selection moved on since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedTask {
    /// The media wait ran out.
    MediaTimeout { feed: FeedId, epoch: u64 },
    /// Show the positioned feed.
    Reveal { feed: FeedId, epoch: u64 },
    /// Follow the bottom after new content has laid out.
    StickToBottom { feed: FeedId, epoch: u64 },
}

/// Public view of the anchor's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorState {
    NotInitialized,
    AwaitingMedia,
    Settled,
}

#[derive(Debug)]
enum Phase {
    NotInitialized,
    AwaitingMedia {
        pending: HashSet<MediaId>,
        timer: TimerId,
    },
    Settled,
}

/// Keeps one selected feed's scroll position stable across updates.
#[derive(Debug)]
pub struct ScrollAnchor {
    config: AnchorConfig,
    local_sender: String,
    feed: Option<FeedId>,
    epoch: u64,
    phase: Phase,
    lock: ScrollLock,
    last_sample: ViewportState,
    ids: Vec<MessageId>,
    tail_nodes: usize,
    prepend_from: Option<f64>,
    history: History,
}

impl ScrollAnchor {
    /// Create an anchor; messages from `local_sender` always scroll to bottom.
    pub fn new(config: AnchorConfig, local_sender: impl Into<String>) -> Self {
        let lock = ScrollLock::new(config.engage_distance, config.disengage_distance);
        Self {
            config,
            local_sender: local_sender.into(),
            feed: None,
            epoch: 0,
            phase: Phase::NotInitialized,
            lock,
            last_sample: ViewportState::default(),
            ids: Vec::new(),
            tail_nodes: 0,
            prepend_from: None,
            history: History::default(),
        }
    }

    pub const fn config(&self) -> &AnchorConfig {
        &self.config
    }

    pub const fn feed(&self) -> Option<&FeedId> {
        self.feed.as_ref()
    }

    /// Bumped on every feed change.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    pub const fn state(&self) -> AnchorState {
        match self.phase {
            Phase::NotInitialized => AnchorState::NotInitialized,
            Phase::AwaitingMedia { .. } => AnchorState::AwaitingMedia,
            Phase::Settled => AnchorState::Settled,
        }
    }

    pub const fn is_locked(&self) -> bool {
        self.lock.is_engaged()
    }

    pub const fn last_sample(&self) -> ViewportState {
        self.last_sample
    }

    /// Number of media elements still blocking first paint.
    pub fn pending_media(&self) -> usize {
        match &self.phase {
            Phase::AwaitingMedia { pending, .. } => pending.len(),
            _ => 0,
        }
    }

    pub const fn history_exhausted(&self) -> bool {
        self.history.is_exhausted()
    }

    pub const fn is_loading_older(&self) -> bool {
        self.history.is_loading()
    }

    /// The view scrolled. Updates the lock and, near the top of a settled
    /// feed, returns a request for the previous page.
    pub fn on_scroll<V: FeedView + ?Sized>(&mut self, view: &V) -> Option<PageRequest> {
        let sample = view.sample();
        self.last_sample = sample;
        if self.lock.observe(sample.distance_from_bottom()) {
            tracing::debug!(
                locked = self.lock.is_engaged(),
                distance = sample.distance_from_bottom(),
                "anchor: scroll lock flipped"
            );
            crate::perf::log_event(
                "anchor.lock",
                format!(
                    "engaged={} distance={:.1}",
                    self.lock.is_engaged(),
                    sample.distance_from_bottom()
                ),
            );
        }
        if matches!(self.phase, Phase::Settled) && sample.scroll_top <= self.config.load_older_within {
            self.request_older()
        } else {
            None
        }
    }

    /// The view changed size. A feed resting at the bottom stays there.
    pub fn on_resize<V: FeedView + ?Sized>(&mut self, view: &mut V) {
        let was_at_bottom = self.last_sample.distance_from_bottom() <= self.config.disengage_distance;
        if matches!(self.phase, Phase::Settled) && was_at_bottom && !self.lock.is_engaged() {
            let sample = view.sample();
            view.set_scroll_top(sample.content_height);
        }
        self.last_sample = view.sample();
    }

    /// Older messages are about to be inserted above the current ones.
    /// Call before the view applies them.
    pub fn on_page_prepended<V: FeedView + ?Sized>(&mut self, view: &V) {
        self.prepend_from = Some(view.sample().content_height);
    }

    /// The view has rendered `messages` for `feed`. Call after every update
    /// has been applied to the view, before the next paint.
    pub fn on_messages_changed<V, T>(
        &mut self,
        feed: &FeedId,
        messages: &[ChatMessage],
        view: &mut V,
        tasks: &mut Scheduler<T>,
    ) where
        V: FeedView + ?Sized,
        T: From<FeedTask>,
    {
        if self.feed.as_ref() != Some(feed) {
            self.select(feed, view, tasks);
        }
        let before = self.last_sample;

        match self.phase {
            Phase::NotInitialized => {
                if !messages.is_empty() {
                    self.begin_first_paint(view, tasks);
                }
            }
            Phase::AwaitingMedia { ref mut pending, .. } => {
                pending.extend(view.unsettled_media());
            }
            Phase::Settled => {
                self.anchor_prepend(messages, view);
                if self.grew_at_tail(messages) {
                    self.follow_tail(messages, before, tasks);
                }
            }
        }

        self.ids = messages.iter().map(|message| message.id.clone()).collect();
        self.tail_nodes = messages.last().map_or(0, |message| message.rendered_node_count);
        self.last_sample = view.sample();
    }

    /// A media element finished loading or failed; either way it no longer blocks.
    pub fn on_media_settled<V, T>(&mut self, media: MediaId, view: &mut V, tasks: &mut Scheduler<T>)
    where
        V: FeedView + ?Sized,
        T: From<FeedTask>,
    {
        let Phase::AwaitingMedia { pending, timer } = &mut self.phase else {
            return;
        };
        if !pending.remove(&media) || !pending.is_empty() {
            return;
        }
        tasks.cancel(*timer);
        tracing::debug!(feed = ?self.feed, "anchor: media settled");
        self.settle(view, tasks);
    }

    /// Run a task this anchor scheduled.
    pub fn run<V, T>(&mut self, task: FeedTask, view: &mut V, tasks: &mut Scheduler<T>)
    where
        V: FeedView + ?Sized,
        T: From<FeedTask>,
    {
        match task {
            FeedTask::MediaTimeout { feed, epoch } => {
                if !self.is_current(&feed, epoch) {
                    return;
                }
                if let Phase::AwaitingMedia { pending, .. } = &self.phase {
                    tracing::debug!(%feed, unsettled = pending.len(), "anchor: media wait timed out");
                    crate::perf::log_event(
                        "anchor.media.timeout",
                        format!("feed={feed} unsettled={}", pending.len()),
                    );
                    self.settle(view, tasks);
                }
            }
            FeedTask::Reveal { feed, epoch } => {
                if self.is_current(&feed, epoch) {
                    view.set_visible(true);
                    crate::perf::log_event("anchor.reveal", format!("feed={feed}"));
                }
            }
            FeedTask::StickToBottom { feed, epoch } => {
                if self.is_current(&feed, epoch) {
                    let sample = view.sample();
                    view.set_scroll_top(sample.content_height);
                    self.last_sample = view.sample();
                    self.lock.observe(self.last_sample.distance_from_bottom());
                }
            }
        }
    }

    /// Ask for the page before the oldest loaded message.
    pub fn request_older(&mut self) -> Option<PageRequest> {
        if !matches!(self.phase, Phase::Settled) {
            return None;
        }
        let feed = self.feed.as_ref()?;
        let before = self.ids.first()?;
        let request = self.history.request(feed, before, self.epoch)?;
        tracing::debug!(%feed, %before, "anchor: requesting older page");
        Some(request)
    }

    /// An older page arrived. Returns the page to insert, or `None` when the
    /// result is stale (feed switched meanwhile) or empty. On `Some`, the
    /// pre-insert height is recorded, so the caller then applies the page
    /// and calls [`ScrollAnchor::on_messages_changed`].
    pub fn accept_older<V: FeedView + ?Sized>(
        &mut self,
        request: &PageRequest,
        page: Vec<ChatMessage>,
        view: &V,
    ) -> Option<Vec<ChatMessage>> {
        if !self.is_current(&request.feed, request.epoch) || !self.history.resolve(request, page.len()) {
            tracing::debug!(feed = %request.feed, "anchor: discarded stale page");
            crate::perf::log_event("anchor.page.stale", format!("feed={}", request.feed));
            return None;
        }
        if page.is_empty() {
            return None;
        }
        self.on_page_prepended(view);
        Some(page)
    }

    /// Start the current feed over as if it had just been selected. Work
    /// scheduled for the old selection, including in-flight page requests,
    /// is ignored from here on.
    pub fn reselect<V, T>(&mut self, view: &mut V, tasks: &mut Scheduler<T>)
    where
        V: FeedView + ?Sized,
        T: From<FeedTask>,
    {
        if let Some(feed) = self.feed.clone() {
            self.select(&feed, view, tasks);
        }
    }

    fn is_current(&self, feed: &FeedId, epoch: u64) -> bool {
        self.feed.as_ref() == Some(feed) && self.epoch == epoch
    }

    fn select<V, T>(&mut self, feed: &FeedId, view: &mut V, tasks: &mut Scheduler<T>)
    where
        V: FeedView + ?Sized,
        T: From<FeedTask>,
    {
        if let Phase::AwaitingMedia { timer, .. } = &self.phase {
            tasks.cancel(*timer);
        }
        tracing::debug!(from = ?self.feed, to = %feed, "anchor: feed selected");
        crate::perf::log_event("anchor.select", format!("feed={feed}"));
        self.feed = Some(feed.clone());
        self.epoch += 1;
        self.phase = Phase::NotInitialized;
        self.lock = ScrollLock::new(self.config.engage_distance, self.config.disengage_distance);
        self.last_sample = view.sample();
        self.ids.clear();
        self.tail_nodes = 0;
        self.prepend_from = None;
        self.history = History::default();
        view.set_visible(true);
    }

    fn begin_first_paint<V, T>(&mut self, view: &mut V, tasks: &mut Scheduler<T>)
    where
        V: FeedView + ?Sized,
        T: From<FeedTask>,
    {
        let Some(feed) = self.feed.clone() else {
            return;
        };
        view.set_visible(false);
        let pending: HashSet<MediaId> = view.unsettled_media().into_iter().collect();
        if pending.is_empty() {
            self.settle(view, tasks);
            return;
        }
        tracing::debug!(%feed, media = pending.len(), "anchor: awaiting media");
        crate::perf::log_event("anchor.await", format!("feed={feed} media={}", pending.len()));
        let timer = tasks.set_timeout(
            self.config.media_timeout,
            FeedTask::MediaTimeout {
                feed,
                epoch: self.epoch,
            }
            .into(),
        );
        self.phase = Phase::AwaitingMedia { pending, timer };
    }

    fn settle<V, T>(&mut self, view: &mut V, tasks: &mut Scheduler<T>)
    where
        V: FeedView + ?Sized,
        T: From<FeedTask>,
    {
        let Some(feed) = self.feed.clone() else {
            return;
        };
        self.phase = Phase::Settled;
        let sample = view.sample();
        view.set_scroll_top(sample.content_height);
        self.last_sample = view.sample();
        self.lock.release();
        tasks.request_frame(
            FeedTask::Reveal {
                feed,
                epoch: self.epoch,
            }
            .into(),
        );
    }

    /// Keep the first previously visible message in place after older ones
    /// were inserted above it.
    fn anchor_prepend<V: FeedView + ?Sized>(&mut self, messages: &[ChatMessage], view: &mut V) {
        let captured = self.prepend_from.take();
        let head_moved = match (self.ids.first(), messages.first()) {
            (Some(old_head), Some(new_head)) => {
                old_head != &new_head.id && messages.iter().skip(1).any(|message| &message.id == old_head)
            }
            _ => false,
        };
        if captured.is_none() && !head_moved {
            return;
        }
        let old_height = captured.unwrap_or(self.last_sample.content_height);
        let sample = view.sample();
        let delta = sample.content_height - old_height;
        if delta != 0.0 {
            view.set_scroll_top(sample.scroll_top + delta);
        }
        crate::perf::log_event(
            "anchor.prepend",
            format!("delta={delta:.1} scroll_top={:.1}", view.sample().scroll_top),
        );
    }

    fn grew_at_tail(&self, messages: &[ChatMessage]) -> bool {
        let Some(tail) = messages.last() else {
            return false;
        };
        match self.ids.last() {
            Some(old_tail) if old_tail == &tail.id => tail.rendered_node_count > self.tail_nodes,
            Some(_) => !self.ids.contains(&tail.id),
            None => true,
        }
    }

    fn follow_tail<T: From<FeedTask>>(
        &self,
        messages: &[ChatMessage],
        before: ViewportState,
        tasks: &mut Scheduler<T>,
    ) {
        let Some(feed) = self.feed.clone() else {
            return;
        };
        let local = messages
            .last()
            .is_some_and(|message| message.sender_id == self.local_sender);
        let near_bottom = before.distance_from_bottom() < self.config.near_bottom_distance;
        let follow = local || (near_bottom && !self.lock.is_engaged());
        tracing::debug!(%feed, local, near_bottom, locked = self.lock.is_engaged(), follow, "anchor: tail grew");
        if follow {
            tasks.after_frames(
                2,
                FeedTask::StickToBottom {
                    feed,
                    epoch: self.epoch,
                }
                .into(),
            );
        }
    }
}
