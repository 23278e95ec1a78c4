//! The feed pane: laid-out message rows and their scroll position.
//!
//! [`FeedPane`] is the terminal's implementation of
//! [`crate::feed::FeedView`]. Geometry is measured in terminal rows.
//!
//! # Example
//!
//! ```
//! use chatpane::feed::FeedView;
//! use chatpane::ui::viewport::{FeedPane, PaneEntry};
//!
//! let mut pane = FeedPane::new(40, 4);
//! pane.set_entries((0..5).map(|i| PaneEntry::text(format!("m{i}"), "ana", "hi")).collect());
//! // 5 messages x (header + text + gap)
//! assert_eq!(pane.content_height(), 15);
//!
//! pane.set_scroll_top(f64::MAX);
//! assert_eq!(pane.scroll_top(), 11);
//! ```

use std::ops::Range;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::feed::{FeedView, MediaId, MessageId, ViewportState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSlot {
    pub id: MediaId,
    /// Rows once loaded; loading and failed media take one row.
    pub rows: u16,
    pub state: MediaState,
}

impl MediaSlot {
    const fn height(&self) -> usize {
        match self.state {
            MediaState::Loaded => self.rows as usize,
            MediaState::Loading | MediaState::Failed => 1,
        }
    }
}

/// One message as the pane shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneEntry {
    pub id: MessageId,
    pub sender: String,
    /// Display text, pictograms already shown as glyphs.
    pub text: String,
    pub media: Vec<MediaSlot>,
}

impl PaneEntry {
    pub fn text(id: impl Into<MessageId>, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            text: text.into(),
            media: Vec::new(),
        }
    }
}

/// A single laid-out terminal row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneRow {
    Header { sender: String },
    Text(String),
    Media { id: MediaId, state: MediaState, first: bool },
    Gap,
}

#[derive(Debug, Clone)]
pub struct FeedPane {
    width: u16,
    height: u16,
    scroll_top: usize,
    visible: bool,
    entries: Vec<PaneEntry>,
    rows: Vec<PaneRow>,
}

impl FeedPane {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            scroll_top: 0,
            visible: true,
            entries: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }

    pub const fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn entries(&self) -> &[PaneEntry] {
        &self.entries
    }

    pub fn content_height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[PaneRow] {
        &self.rows
    }

    /// Rows currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.scroll_top.min(self.rows.len());
        let end = (start + self.height as usize).min(self.rows.len());
        start..end
    }

    /// Scroll position as a percentage (0-100).
    pub fn scroll_percent(&self) -> u8 {
        let max = self.max_scroll_top();
        if max == 0 {
            return 100;
        }
        // Percentage value always 0-100
        #[allow(clippy::cast_possible_truncation)]
        {
            (self.scroll_top * 100 / max) as u8
        }
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll_top = self.scroll_top.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_top = (self.scroll_top + n).min(self.max_scroll_top());
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.height.max(1) as usize);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height.max(1) as usize);
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.relayout();
    }

    /// Replace every entry, keeping the scroll offset where it still fits.
    pub fn set_entries(&mut self, entries: Vec<PaneEntry>) {
        self.entries = entries;
        self.relayout();
    }

    /// Insert older entries above the current ones. The scroll offset is left
    /// as is; anchoring is the caller's business.
    pub fn prepend(&mut self, older: Vec<PaneEntry>) {
        self.entries.splice(0..0, older);
        self.relayout();
    }

    pub fn push(&mut self, entry: PaneEntry) {
        self.entries.push(entry);
        self.relayout();
    }

    /// Rewrite entries in place, oldest first, and lay out again.
    pub fn restyle(&mut self, f: impl FnMut(&mut PaneEntry)) {
        self.entries.iter_mut().for_each(f);
        self.relayout();
    }

    /// Mark a media item loaded or failed. Returns false if it is not in the
    /// pane or was already settled.
    pub fn settle_media(&mut self, id: MediaId, failed: bool) -> bool {
        let slot = self
            .entries
            .iter_mut()
            .flat_map(|entry| entry.media.iter_mut())
            .find(|slot| slot.id == id && slot.state == MediaState::Loading);
        let Some(slot) = slot else {
            return false;
        };
        slot.state = if failed {
            MediaState::Failed
        } else {
            MediaState::Loaded
        };
        self.relayout();
        true
    }

    fn max_scroll_top(&self) -> usize {
        self.rows.len().saturating_sub(self.height as usize)
    }

    fn relayout(&mut self) {
        let width = self.width.max(1) as usize;
        let mut rows = Vec::new();
        for entry in &self.entries {
            rows.push(PaneRow::Header {
                sender: entry.sender.clone(),
            });
            for line in entry.text.lines() {
                rows.extend(wrap_line(line, width).into_iter().map(PaneRow::Text));
            }
            for slot in &entry.media {
                rows.extend((0..slot.height()).map(|i| PaneRow::Media {
                    id: slot.id,
                    state: slot.state,
                    first: i == 0,
                }));
            }
            rows.push(PaneRow::Gap);
        }
        self.rows = rows;
        self.scroll_top = self.scroll_top.min(self.max_scroll_top());
    }
}

impl FeedView for FeedPane {
    #[allow(clippy::cast_precision_loss)]
    fn sample(&self) -> ViewportState {
        ViewportState::new(
            self.scroll_top as f64,
            f64::from(self.height),
            self.rows.len() as f64,
        )
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn set_scroll_top(&mut self, scroll_top: f64) {
        let max = self.max_scroll_top();
        self.scroll_top = if scroll_top.is_nan() || scroll_top <= 0.0 {
            0
        } else if scroll_top >= max as f64 {
            max
        } else {
            scroll_top.round() as usize
        };
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn unsettled_media(&self) -> Vec<MediaId> {
        self.entries
            .iter()
            .flat_map(|entry| &entry.media)
            .filter(|slot| slot.state == MediaState::Loading)
            .map(|slot| slot.id)
            .collect()
    }
}

/// Greedy word wrap by display width; words wider than `width` are split.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in line.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        let sep = usize::from(!current.is_empty());
        if current_width + sep + word_width <= width {
            if sep == 1 {
                current.push(' ');
            }
            current.push_str(word);
            current_width += sep + word_width;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if word_width <= width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }
        for ch in word.chars() {
            let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
            if current_width + ch_width > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(ch);
            current_width += ch_width;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
