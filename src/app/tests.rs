use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::feed::{AnchorConfig, AnchorState, FeedId, MessageId};
use crate::transcript::{FeedRecord, MediaRecord, MessageRecord, Transcript};

use super::effects::PAGE_LATENCY;
use super::event_loop::ResizeDebouncer;
use super::{App, Message, Model, ToastLevel, update};

fn record(id: &str, sender: &str, text: &str) -> MessageRecord {
    MessageRecord {
        id: MessageId::from(id),
        sender: sender.to_string(),
        timestamp: 0,
        text: text.to_string(),
        media: Vec::new(),
    }
}

fn with_media(mut message: MessageRecord, load_ms: Option<u64>) -> MessageRecord {
    message.media.push(MediaRecord {
        rows: 4,
        load_ms,
        fails: false,
    });
    message
}

fn feed(id: &str, messages: Vec<MessageRecord>) -> FeedRecord {
    FeedRecord {
        id: FeedId::from(id),
        title: None,
        page_size: 3,
        messages,
    }
}

fn numbered(count: usize) -> Vec<MessageRecord> {
    (1..=count)
        .map(|i| record(&format!("m{i}"), "ana", &format!("msg {i}")))
        .collect()
}

fn model_with(feeds: Vec<FeedRecord>, size: (u16, u16)) -> Model {
    let transcript = Transcript {
        user: Some("me".to_string()),
        feeds,
    };
    Model::new(
        PathBuf::from("feeds.json"),
        transcript,
        size,
        AnchorConfig::terminal(),
        None,
    )
}

fn type_str(mut model: Model, text: &str) -> Model {
    for ch in text.chars() {
        model = update(model, Message::ComposerInput(ch));
    }
    model
}

#[test]
fn test_first_paint_reveals_on_next_frame() {
    let mut model = model_with(vec![feed("general", numbered(3))], (40, 12));
    assert_eq!(model.anchor.state(), AnchorState::Settled);
    assert!(!model.pane.is_visible());

    assert!(model.finish_frame());
    assert!(model.pane.is_visible());
}

#[test]
fn test_first_paint_waits_for_media() {
    let messages = vec![
        record("m1", "ana", "hello"),
        with_media(record("m2", "ana", "photo"), Some(300)),
    ];
    let mut model = model_with(vec![feed("general", messages)], (40, 12));
    assert_eq!(model.anchor.state(), AnchorState::AwaitingMedia);
    assert_eq!(model.anchor.pending_media(), 1);

    assert!(!model.advance_clock(Duration::from_millis(299)));
    assert_eq!(model.anchor.state(), AnchorState::AwaitingMedia);

    assert!(model.advance_clock(Duration::from_millis(1)));
    assert_eq!(model.anchor.state(), AnchorState::Settled);
    model.finish_frame();
    assert!(model.pane.is_visible());
    // text-only message is 3 rows, the loaded photo message 7
    assert_eq!(model.pane.content_height(), 3 + 7);
    assert_eq!(model.pane.scroll_top(), 0);
}

#[test]
fn test_media_that_never_loads_times_out() {
    let messages = vec![with_media(record("m1", "ana", "photo"), None)];
    let mut model = model_with(vec![feed("general", messages)], (40, 12));
    model.advance_clock(Duration::from_millis(1999));
    assert_eq!(model.anchor.state(), AnchorState::AwaitingMedia);
    model.advance_clock(Duration::from_millis(1));
    assert_eq!(model.anchor.state(), AnchorState::Settled);
}

#[test]
fn test_switching_feed_abandons_media_wait() {
    let slow = feed("slow", vec![with_media(record("m1", "ana", "photo"), None)]);
    let quick = feed("quick", numbered(2));
    let mut model = model_with(vec![slow, quick], (40, 12));
    assert_eq!(model.anchor.state(), AnchorState::AwaitingMedia);

    let mut model = update(model, Message::NextFeed);
    assert_eq!(model.anchor.feed(), Some(&FeedId::from("quick")));
    assert_eq!(model.anchor.state(), AnchorState::Settled);

    model.advance_clock(Duration::from_secs(5));
    model.finish_frame();
    assert_eq!(model.anchor.feed(), Some(&FeedId::from("quick")));
    assert!(model.pane.is_visible());
}

#[test]
fn test_typing_substitutes_pictograms() {
    let model = model_with(vec![feed("general", numbered(1))], (40, 12));
    let model = type_str(model, "hi :)");

    assert_eq!(model.composer.plain_text(), "hi :)");
    assert_eq!(model.draft_len(), 5);
    let (display, caret) = crate::ui::composer_line(&model.composer);
    assert_eq!(display, "hi 🙂");
    // "hi " plus a two-column glyph
    assert_eq!(caret, 5);
}

#[test]
fn test_backspace_removes_whole_pictogram() {
    let model = model_with(vec![feed("general", numbered(1))], (40, 12));
    let model = type_str(model, "a:)");
    let model = update(model, Message::ComposerBackspace);
    assert_eq!(model.composer.plain_text(), "a");
}

#[test]
fn test_caret_moves_over_pictogram_as_a_unit() {
    let model = model_with(vec![feed("general", numbered(1))], (40, 12));
    let model = type_str(model, ":)x");
    let model = update(model, Message::CaretLeft);
    assert_eq!(model.composer.caret_offset(), 2);
    let model = update(model, Message::CaretLeft);
    assert_eq!(model.composer.caret_offset(), 0);
    let model = update(model, Message::CaretRight);
    assert_eq!(model.composer.caret_offset(), 2);
    let model = update(model, Message::CaretEnd);
    assert_eq!(model.composer.caret_offset(), 3);
}

#[test]
fn test_send_posts_as_local_user_and_follows() {
    let mut model = model_with(vec![feed("general", numbered(3))], (40, 12));
    model.finish_frame();
    let model = type_str(model, "yo :)");
    let mut model = update(model, Message::Send);

    let loaded = model.selected_feed().map(|feed| feed.loaded().to_vec()).unwrap_or_default();
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded[3].sender, "me");
    assert_eq!(loaded[3].text, "yo :)");
    assert_eq!(model.composer.plain_text(), "");
    assert_eq!(model.draft_len(), 0);
    assert_eq!(model.pane.entries()[3].text, "yo 🙂");

    // stick-to-bottom runs two frames later
    assert_eq!(model.pane.scroll_top(), 0);
    model.finish_frame();
    assert_eq!(model.pane.scroll_top(), 0);
    model.finish_frame();
    assert_eq!(model.pane.scroll_top(), 2);
}

#[test]
fn test_blank_draft_is_not_sent() {
    let model = model_with(vec![feed("general", numbered(3))], (40, 12));
    let model = type_str(model, "   ");
    let model = update(model, Message::Send);
    assert_eq!(model.selected_feed().map(|feed| feed.loaded().len()), Some(3));
}

#[test]
fn test_scrolling_to_top_loads_older_page_in_place() {
    let mut model = model_with(vec![feed("general", numbered(8))], (40, 8));
    model.finish_frame();
    // 3 messages x 3 rows in a 6-row pane
    assert_eq!(model.pane.scroll_top(), 3);

    let mut model = update(model, Message::GoToTop);
    assert!(model.anchor.is_loading_older());
    model.advance_clock(PAGE_LATENCY);

    assert_eq!(model.pane.entries()[0].id, MessageId::from("m3"));
    assert_eq!(model.selected_feed().map(|feed| feed.loaded().len()), Some(6));
    // the previously first message stays where it was
    assert_eq!(model.pane.scroll_top(), 9);
    assert!(!model.anchor.is_loading_older());
}

#[test]
fn test_history_runs_out() {
    let mut model = model_with(vec![feed("general", numbered(5))], (40, 8));
    model.finish_frame();

    let mut model = update(model, Message::GoToTop);
    model.advance_clock(PAGE_LATENCY);
    assert_eq!(model.pane.entries().len(), 5);

    let mut model = update(model, Message::GoToTop);
    model.advance_clock(PAGE_LATENCY);
    assert!(model.anchor.history_exhausted());

    let model = update(model, Message::GoToTop);
    assert!(!model.anchor.is_loading_older());
}

#[test]
fn test_page_for_previous_feed_is_dropped() {
    let mut model = model_with(
        vec![feed("general", numbered(8)), feed("random", numbered(2))],
        (40, 8),
    );
    model.finish_frame();
    let model = update(model, Message::GoToTop);
    let mut model = update(model, Message::NextFeed);
    model.advance_clock(PAGE_LATENCY);

    assert_eq!(model.anchor.feed(), Some(&FeedId::from("random")));
    assert_eq!(model.pane.entries().len(), 2);
    assert_eq!(
        model.feeds[0].first_loaded, 5,
        "stale page must not widen the old feed"
    );
}

#[test]
fn test_reselecting_feed_drops_page_in_flight() {
    let mut model = model_with(vec![feed("general", numbered(12))], (40, 8));
    model.finish_frame();
    let mut model = update(model, Message::GoToTop);
    model.advance_clock(PAGE_LATENCY);
    assert_eq!(model.pane.entries().len(), 6);

    let model = update(model, Message::GoToTop);
    assert!(model.anchor.is_loading_older());
    // single feed: Tab lands on the same feed, back at its latest page
    let mut model = update(model, Message::NextFeed);
    assert!(!model.anchor.is_loading_older());
    model.advance_clock(PAGE_LATENCY);

    let shown: Vec<_> = model.pane.entries().iter().map(|entry| entry.id.clone()).collect();
    let loaded: Vec<_> = model
        .selected_feed()
        .map(|feed| feed.loaded().iter().map(|record| record.id.clone()).collect())
        .unwrap_or_default();
    assert_eq!(shown, loaded);
    assert_eq!(
        shown,
        vec![MessageId::from("m10"), MessageId::from("m11"), MessageId::from("m12")]
    );
    assert_eq!(model.feeds[0].first_loaded, 9);
}

#[test]
fn test_reloaded_messages_follow_when_at_bottom() {
    let mut model = model_with(vec![feed("general", numbered(3))], (40, 8));
    model.finish_frame();
    assert_eq!(model.pane.scroll_top(), 3);

    let mut grown = numbered(3);
    grown.push(record("m4", "bo", "new"));
    let added = model.merge_transcript(Transcript {
        user: None,
        feeds: vec![feed("general", grown)],
    });
    assert_eq!(added, 1);

    model.finish_frame();
    model.finish_frame();
    assert_eq!(model.pane.scroll_top(), 6);
}

#[test]
fn test_reloaded_messages_leave_reader_alone() {
    // a 3-row pane
    let mut model = model_with(vec![feed("general", numbered(8))], (40, 5));
    model.finish_frame();
    let mut model = update(model, Message::GoToTop);
    model.advance_clock(PAGE_LATENCY);
    assert_eq!(model.pane.scroll_top(), 9);
    // 14 rows above the bottom engages the lock
    let mut model = update(model, Message::ScrollUp(8));
    assert!(model.anchor.is_locked());
    let top = model.pane.scroll_top();

    let mut grown = numbered(8);
    grown.push(record("m9", "bo", "new"));
    model.merge_transcript(Transcript {
        user: None,
        feeds: vec![feed("general", grown)],
    });
    model.finish_frame();
    model.finish_frame();
    assert_eq!(model.pane.scroll_top(), top);
}

#[test]
fn test_reload_adds_new_feeds() {
    let mut model = model_with(vec![feed("general", numbered(1))], (40, 12));
    let added = model.merge_transcript(Transcript {
        user: None,
        feeds: vec![feed("general", numbered(1)), feed("new", numbered(2))],
    });
    assert_eq!(added, 2);
    assert_eq!(model.feeds.len(), 2);
}

#[test]
fn test_toggle_pictograms_rerenders_feed_text() {
    let feeds = vec![feed("general", vec![record("m1", "ana", "hey :)")])];
    let model = model_with(feeds, (40, 12));
    assert_eq!(model.pane.entries()[0].text, "hey 🙂");

    let model = update(model, Message::TogglePictograms);
    assert!(!model.pictograms_enabled());
    assert_eq!(model.pane.entries()[0].text, "hey :)");
    assert!(matches!(model.active_toast(), Some((_, ToastLevel::Info))));
}

#[test]
fn test_help_and_toast_travel_as_messages() {
    let model = model_with(vec![feed("general", numbered(1))], (40, 12));
    let model = update(model, Message::ToggleHelp);
    assert!(model.help_visible);
    let model = update(model, Message::HideHelp);
    assert!(!model.help_visible);

    let model = update(
        model,
        Message::Toast(ToastLevel::Warning, "Watch unavailable".to_string()),
    );
    assert_eq!(
        model.active_toast(),
        Some(("Watch unavailable", ToastLevel::Warning))
    );
}

#[test]
fn test_question_mark_opens_help_only_with_empty_draft() {
    let model = model_with(vec![feed("general", numbered(1))], (40, 12));
    let key = KeyEvent::new(KeyCode::Char('?'), KeyModifiers::NONE);
    assert_eq!(App::handle_key(key, &model), Some(Message::ToggleHelp));

    let model = type_str(model, "why");
    assert_eq!(App::handle_key(key, &model), Some(Message::ComposerInput('?')));
}

#[test]
fn test_keys_while_help_is_open() {
    let model = model_with(vec![feed("general", numbered(1))], (40, 12));
    let model = update(model, Message::ToggleHelp);
    let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
    let letter = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
    assert_eq!(App::handle_key(esc, &model), Some(Message::HideHelp));
    assert_eq!(App::handle_key(letter, &model), None);
}

#[test]
fn test_ctrl_c_quits() {
    let model = model_with(vec![feed("general", numbered(1))], (40, 12));
    let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert_eq!(App::handle_key(key, &model), Some(Message::Quit));
    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_resize_keeps_bottom() {
    let mut model = model_with(vec![feed("general", numbered(3))], (40, 8));
    model.finish_frame();
    assert_eq!(model.pane.scroll_top(), 3);
    let model = update(model, Message::Resize(40, 6));
    assert_eq!(model.pane.height(), 4);
    assert_eq!(model.pane.scroll_top(), 5);
}

#[test]
fn test_resize_debouncer_waits_for_quiet_period() {
    let mut debouncer = ResizeDebouncer::new(100);
    debouncer.queue(80, 24, 0);
    debouncer.queue(100, 30, 50);
    assert!(debouncer.is_pending());
    assert_eq!(debouncer.take_ready(120), None);
    assert_eq!(debouncer.take_ready(150), Some((100, 30)));
    assert!(!debouncer.is_pending());
}
