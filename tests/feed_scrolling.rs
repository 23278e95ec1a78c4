use std::time::Duration;

use chatpane::feed::{
    AnchorConfig, AnchorState, ChatMessage, FeedId, FeedTask, FeedView, MediaId, MessageId,
    ScrollAnchor,
};
use chatpane::runtime::Scheduler;
use chatpane::ui::viewport::{FeedPane, MediaSlot, MediaState, PaneEntry};

/// Every test message renders as header, one text row and a gap.
fn entry(id: &str, sender: &str) -> PaneEntry {
    PaneEntry::text(id, sender, format!("text of {id}"))
}

fn chat(entries: &[PaneEntry]) -> Vec<ChatMessage> {
    entries
        .iter()
        .map(|entry| ChatMessage {
            id: entry.id.clone(),
            sender_id: entry.sender.clone(),
            timestamp: 0,
            rendered_node_count: 1 + entry.media.len(),
        })
        .collect()
}

struct Harness {
    feed: FeedId,
    pane: FeedPane,
    anchor: ScrollAnchor,
    tasks: Scheduler<FeedTask>,
}

impl Harness {
    fn new(height: u16) -> Self {
        Self {
            feed: FeedId::from("general"),
            pane: FeedPane::new(40, height),
            anchor: ScrollAnchor::new(AnchorConfig::terminal(), "me"),
            tasks: Scheduler::new(),
        }
    }

    fn changed(&mut self) {
        let messages = chat(self.pane.entries());
        self.anchor
            .on_messages_changed(&self.feed, &messages, &mut self.pane, &mut self.tasks);
    }

    fn frame(&mut self) {
        for task in self.tasks.next_frame() {
            self.anchor.run(task, &mut self.pane, &mut self.tasks);
        }
    }

    fn advance(&mut self, elapsed: Duration) {
        for task in self.tasks.advance(elapsed) {
            self.anchor.run(task, &mut self.pane, &mut self.tasks);
        }
    }

    fn scroll_to(&mut self, top: f64) {
        self.pane.set_scroll_top(top);
        self.anchor.on_scroll(&self.pane);
    }
}

#[test]
fn test_first_paint_lands_at_bottom_then_reveals() {
    let mut h = Harness::new(6);
    h.pane
        .set_entries((1..=5).map(|i| entry(&format!("m{i}"), "ana")).collect());
    h.changed();

    assert_eq!(h.anchor.state(), AnchorState::Settled);
    assert_eq!(h.pane.scroll_top(), 9);
    assert!(!h.pane.is_visible());
    h.frame();
    assert!(h.pane.is_visible());
}

#[test]
fn test_media_holds_first_paint_until_it_settles() {
    let mut h = Harness::new(6);
    let mut photo = entry("m1", "ana");
    photo.media.push(MediaSlot {
        id: MediaId(7),
        rows: 5,
        state: MediaState::Loading,
    });
    h.pane.set_entries(vec![entry("m0", "ana"), photo]);
    h.changed();
    assert_eq!(h.anchor.state(), AnchorState::AwaitingMedia);

    assert!(h.pane.settle_media(MediaId(7), false));
    h.anchor
        .on_media_settled(MediaId(7), &mut h.pane, &mut h.tasks);
    assert_eq!(h.anchor.state(), AnchorState::Settled);
    // 3 + (3 + 5) rows in a 6-row pane
    assert_eq!(h.pane.scroll_top(), 5);

    // the timeout was cancelled with the wait
    h.advance(Duration::from_secs(10));
    assert_eq!(h.pane.scroll_top(), 5);
}

#[test]
fn test_incoming_message_follows_only_near_bottom() {
    let mut h = Harness::new(6);
    h.pane
        .set_entries((1..=10).map(|i| entry(&format!("m{i}"), "ana")).collect());
    h.changed();
    h.frame();
    assert_eq!(h.pane.scroll_top(), 24);

    h.pane.push(entry("m11", "bo"));
    h.changed();
    h.frame();
    h.frame();
    assert_eq!(h.pane.scroll_top(), 27);

    // far enough up to engage the lock
    h.scroll_to(10.0);
    assert!(h.anchor.is_locked());
    h.pane.push(entry("m12", "bo"));
    h.changed();
    h.frame();
    h.frame();
    assert_eq!(h.pane.scroll_top(), 10);
}

#[test]
fn test_own_message_always_scrolls_to_bottom() {
    let mut h = Harness::new(6);
    h.pane
        .set_entries((1..=10).map(|i| entry(&format!("m{i}"), "ana")).collect());
    h.changed();
    h.frame();
    h.scroll_to(0.0);

    h.pane.push(entry("local-1", "me"));
    h.changed();
    h.frame();
    h.frame();
    assert_eq!(h.pane.scroll_top(), 27);
    assert!(!h.anchor.is_locked());
}

#[test]
fn test_older_page_keeps_visible_message_in_place() {
    let mut h = Harness::new(6);
    h.pane
        .set_entries((4..=6).map(|i| entry(&format!("m{i}"), "ana")).collect());
    h.changed();
    h.frame();

    h.pane.set_scroll_top(0.0);
    let request = h.anchor.on_scroll(&h.pane).unwrap();
    assert_eq!(request.before, MessageId::from("m4"));

    let older: Vec<PaneEntry> = (1..=3).map(|i| entry(&format!("m{i}"), "ana")).collect();
    let page = h.anchor.accept_older(&request, chat(&older), &h.pane).unwrap();
    assert_eq!(page.len(), 3);
    h.pane.prepend(older);
    h.changed();

    assert_eq!(h.pane.scroll_top(), 9);
    assert_eq!(h.pane.visible_range().start, 9);
}

#[test]
fn test_page_for_abandoned_feed_is_ignored() {
    let mut h = Harness::new(6);
    h.pane
        .set_entries((4..=6).map(|i| entry(&format!("m{i}"), "ana")).collect());
    h.changed();
    h.frame();
    h.pane.set_scroll_top(0.0);
    let request = h.anchor.on_scroll(&h.pane).unwrap();

    h.feed = FeedId::from("random");
    h.pane.set_entries(vec![entry("r1", "bo")]);
    h.changed();

    let older: Vec<PaneEntry> = (1..=3).map(|i| entry(&format!("m{i}"), "ana")).collect();
    assert!(h.anchor.accept_older(&request, chat(&older), &h.pane).is_none());
}
