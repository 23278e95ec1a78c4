use std::time::Duration;

use crate::feed::{AnchorState, PageRequest};
use crate::transcript::Transcript;

use super::{Model, Task};

/// Simulated latency of a history fetch.
pub(super) const PAGE_LATENCY: Duration = Duration::from_millis(120);

impl Model {
    /// Run microtasks until none are left.
    pub(super) fn run_microtasks(&mut self) {
        loop {
            let batch = self.tasks.drain_microtasks();
            if batch.is_empty() {
                return;
            }
            for task in batch {
                self.run_task(task);
            }
        }
    }

    /// Move the scheduler clock and run whatever came due. Returns true if
    /// anything ran.
    pub fn advance_clock(&mut self, elapsed: Duration) -> bool {
        let due = self.tasks.advance(elapsed);
        let ran = !due.is_empty();
        for task in due {
            self.run_task(task);
            self.run_microtasks();
        }
        ran
    }

    /// A frame was painted: run the frame callbacks that came due.
    pub fn finish_frame(&mut self) -> bool {
        let due = self.tasks.next_frame();
        let ran = !due.is_empty();
        for task in due {
            self.run_task(task);
            self.run_microtasks();
        }
        ran
    }

    pub(super) fn run_task(&mut self, task: Task) {
        match task {
            Task::Feed(task) => self.anchor.run(task, &mut self.pane, &mut self.tasks),
            Task::Composer(task) => self.composer.run(task),
            Task::MediaLoaded {
                feed,
                media,
                failed,
            } => {
                if self.selected_feed().is_none_or(|state| state.id() != &feed) {
                    return;
                }
                if !self.pane.settle_media(media, failed) {
                    return;
                }
                crate::perf::log_event(
                    "app.media",
                    format!("feed={feed} media={} failed={failed}", media.0),
                );
                if self.anchor.state() == AnchorState::Settled {
                    // grown media near the bottom keeps the feed pinned
                    self.anchor.on_resize(&mut self.pane);
                }
                self.anchor
                    .on_media_settled(media, &mut self.pane, &mut self.tasks);
            }
            Task::PageArrived(request) => self.load_older(&request),
        }
    }

    /// The user scrolled the pane.
    pub(super) fn scroll_changed(&mut self) {
        if let Some(request) = self.anchor.on_scroll(&self.pane) {
            crate::perf::log_event(
                "app.page.request",
                format!("feed={} before={}", request.feed, request.before),
            );
            self.tasks
                .set_timeout(PAGE_LATENCY, Task::PageArrived(request));
        }
    }

    fn load_older(&mut self, request: &PageRequest) {
        let Some(index) = self
            .feeds
            .iter()
            .position(|feed| feed.id() == &request.feed)
        else {
            return;
        };
        let feed = &self.feeds[index];
        let page: Vec<_> = feed.record.page_before(&request.before).to_vec();
        let chat_page = page.iter().map(|record| record.to_chat_message()).collect();
        if self
            .anchor
            .accept_older(request, chat_page, &self.pane)
            .is_none()
        {
            return;
        }

        let feed = &mut self.feeds[index];
        feed.first_loaded -= page.len();
        let feed_id = feed.id().clone();
        let messages = feed.chat_messages();
        let entries = page
            .iter()
            .map(|record| self.entry_for(&feed_id, record))
            .collect();
        self.pane.prepend(entries);
        self.anchor
            .on_messages_changed(&feed_id, &messages, &mut self.pane, &mut self.tasks);
    }

    /// Fold a reloaded transcript in. Messages not seen before are appended
    /// to their feed; new feeds are added. Returns the number of new messages.
    pub fn merge_transcript(&mut self, transcript: Transcript) -> usize {
        let mut added = 0;
        for record in transcript.feeds {
            let Some(index) = self.feeds.iter().position(|feed| feed.id() == &record.id) else {
                added += record.messages.len();
                self.feeds.push(super::FeedState::new(record));
                continue;
            };
            let fresh: Vec<_> = record
                .messages
                .into_iter()
                .filter(|message| !self.feeds[index].knows(&message.id))
                .collect();
            added += fresh.len();
            self.append_records(index, fresh);
        }
        if added > 0 {
            tracing::debug!(added, "transcript reloaded");
        }
        added
    }
}
