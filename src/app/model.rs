use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::editor::EditableBuffer;
use crate::feed::{AnchorConfig, ChatMessage, FeedId, MediaId, MessageId, ScrollAnchor};
use crate::pictogram::{PictogramTable, render_display};
use crate::runtime::Scheduler;
use crate::transcript::{FeedRecord, MessageRecord, Transcript};
use crate::ui::viewport::{FeedPane, MediaSlot, MediaState, PaneEntry};

use super::Task;

/// Rows below the feed: composer and status bar.
pub(super) const CHROME_ROWS: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// A feed as the client holds it: everything known from the transcript
/// (plus locally sent messages) and where the loaded window starts.
#[derive(Debug, Clone)]
pub struct FeedState {
    pub record: FeedRecord,
    /// Index of the oldest message on screen.
    pub first_loaded: usize,
}

impl FeedState {
    pub fn new(record: FeedRecord) -> Self {
        let first_loaded = record.messages.len() - record.latest_page().len();
        Self {
            record,
            first_loaded,
        }
    }

    pub const fn id(&self) -> &FeedId {
        &self.record.id
    }

    pub fn loaded(&self) -> &[MessageRecord] {
        &self.record.messages[self.first_loaded..]
    }

    /// The loaded window as the anchor sees it.
    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.loaded().iter().map(MessageRecord::to_chat_message).collect()
    }

    pub fn knows(&self, id: &MessageId) -> bool {
        self.record.messages.iter().any(|message| &message.id == id)
    }
}

/// The complete application state.
pub struct Model {
    pub feeds: Vec<FeedState>,
    /// Index into `feeds` of the selected feed.
    pub selected: usize,
    pub pane: FeedPane,
    pub anchor: ScrollAnchor,
    pub composer: EditableBuffer,
    pub tasks: Scheduler<Task>,
    /// Used to display received messages.
    pub table: PictogramTable,
    pub local_user: String,
    pub file_path: PathBuf,
    pub watch_enabled: bool,
    pub help_visible: bool,
    pub help_scroll_offset: usize,
    pub config_global_path: Option<PathBuf>,
    pub config_local_path: Option<PathBuf>,
    pub should_quit: bool,
    toast: Option<Toast>,
    draft_len: Rc<Cell<usize>>,
    next_media: u64,
    next_local: u64,
}

impl Model {
    /// Build the initial model and open the first feed.
    pub fn new(
        file_path: PathBuf,
        transcript: Transcript,
        terminal_size: (u16, u16),
        anchor_config: AnchorConfig,
        local_user: Option<String>,
    ) -> Self {
        let local_user = local_user
            .or_else(|| transcript.user.clone())
            .unwrap_or_else(|| "me".to_string());
        let mut model = Self {
            feeds: transcript.feeds.into_iter().map(FeedState::new).collect(),
            pane: FeedPane::new(
                terminal_size.0,
                terminal_size.1.saturating_sub(CHROME_ROWS),
            ),
            anchor: ScrollAnchor::new(anchor_config, local_user.clone()),
            local_user,
            file_path,
            ..Self::default()
        };
        model.watch_draft();
        if !model.feeds.is_empty() {
            model.select_feed(0);
        }
        model
    }

    /// Enable or disable pictograms in the composer and in the feed.
    pub fn set_pictograms_enabled(&mut self, enabled: bool) {
        self.table = if enabled {
            PictogramTable::builtin()
        } else {
            PictogramTable::empty()
        };
        self.composer.set_pictograms_enabled(enabled);
        self.composer.reconcile();
        let Some(feed) = self.feeds.get(self.selected) else {
            return;
        };
        let table = &self.table;
        let mut texts = feed
            .loaded()
            .iter()
            .map(|record| render_display(&record.text, table));
        self.pane.restyle(|entry| {
            if let Some(text) = texts.next() {
                entry.text = text;
            }
        });
    }

    pub fn pictograms_enabled(&self) -> bool {
        !self.table.is_empty()
    }

    pub fn selected_feed(&self) -> Option<&FeedState> {
        self.feeds.get(self.selected)
    }

    /// Characters in the composer draft, as last reported by the composer.
    pub fn draft_len(&self) -> usize {
        self.draft_len.get()
    }

    /// Show feed `index` from its latest page.
    pub(super) fn select_feed(&mut self, index: usize) {
        let Some(feed) = self.feeds.get_mut(index) else {
            return;
        };
        *feed = FeedState::new(feed.record.clone());
        self.selected = index;
        let feed_id = feed.id().clone();
        let records = feed.loaded().to_vec();
        let messages = feed.chat_messages();

        let entries = records
            .iter()
            .map(|record| self.entry_for(&feed_id, record))
            .collect();
        if self.anchor.feed() == Some(&feed_id) {
            self.anchor.reselect(&mut self.pane, &mut self.tasks);
        }
        self.pane.set_entries(entries);
        self.anchor
            .on_messages_changed(&feed_id, &messages, &mut self.pane, &mut self.tasks);
        crate::perf::log_event(
            "app.select",
            format!("feed={feed_id} messages={}", messages.len()),
        );
    }

    /// Lay out `record` for the pane and start its media loads.
    pub(super) fn entry_for(&mut self, feed: &FeedId, record: &MessageRecord) -> PaneEntry {
        let media = record
            .media
            .iter()
            .map(|item| {
                self.next_media += 1;
                let id = MediaId(self.next_media);
                if let Some(load_ms) = item.load_ms {
                    self.tasks.set_timeout(
                        Duration::from_millis(load_ms),
                        Task::MediaLoaded {
                            feed: feed.clone(),
                            media: id,
                            failed: item.fails,
                        },
                    );
                }
                MediaSlot {
                    id,
                    rows: item.rows,
                    state: MediaState::Loading,
                }
            })
            .collect();
        PaneEntry {
            id: record.id.clone(),
            sender: record.sender.clone(),
            text: render_display(&record.text, &self.table),
            media,
        }
    }

    /// Post the composer draft to the selected feed as the local user.
    pub(super) fn send_draft(&mut self) {
        self.composer.reconcile();
        if self.composer.plain_text().trim().is_empty() {
            return;
        }
        let text = self.composer.take_text();
        self.next_local += 1;
        let record = MessageRecord {
            id: MessageId(format!("local-{}", self.next_local)),
            sender: self.local_user.clone(),
            timestamp: unix_now(),
            text,
            media: Vec::new(),
        };
        tracing::debug!(id = %record.id, "sending message");
        self.append_records(self.selected, vec![record]);
    }

    /// Add messages at the tail of feed `index`.
    pub(super) fn append_records(&mut self, index: usize, records: Vec<MessageRecord>) {
        if records.is_empty() {
            return;
        }
        let Some(feed) = self.feeds.get_mut(index) else {
            return;
        };
        feed.record.messages.extend(records.iter().cloned());
        if index != self.selected {
            return;
        }
        let feed_id = feed.id().clone();
        let messages = feed.chat_messages();
        for record in &records {
            let entry = self.entry_for(&feed_id, record);
            self.pane.push(entry);
        }
        self.anchor
            .on_messages_changed(&feed_id, &messages, &mut self.pane, &mut self.tasks);
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    fn watch_draft(&mut self) {
        let draft_len = Rc::clone(&self.draft_len);
        self.composer
            .on_plain_text_changed(move |text| draft_len.set(text.chars().count()));
    }
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

impl Default for Model {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            selected: 0,
            pane: FeedPane::new(80, 22),
            anchor: ScrollAnchor::new(AnchorConfig::default(), "me"),
            composer: EditableBuffer::default(),
            tasks: Scheduler::new(),
            table: PictogramTable::builtin(),
            local_user: "me".to_string(),
            file_path: PathBuf::new(),
            watch_enabled: false,
            help_visible: false,
            help_scroll_offset: 0,
            config_global_path: None,
            config_local_path: None,
            should_quit: false,
            toast: None,
            draft_len: Rc::new(Cell::new(0)),
            next_media: 0,
            next_local: 0,
        }
    }
}
