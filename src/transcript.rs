//! Transcript files: the message source for the terminal client.
//!
//! A transcript is JSON holding one or more feeds. Media items carry a
//! simulated load delay so first-paint behaviour can be exercised; a
//! missing delay means the item never loads.
//!
//! ```json
//! {
//!   "user": "me",
//!   "feeds": [
//!     { "id": "general", "title": "#general", "messages": [
//!       { "id": "m1", "sender": "ana", "timestamp": 1700000000, "text": "hi :)",
//!         "media": [{ "rows": 6, "load_ms": 300 }] }
//!     ] }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::feed::{ChatMessage, FeedId, MessageId};

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("failed to read transcript {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid transcript: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("transcript has no feeds")]
    NoFeeds,
    #[error("feed {0} appears more than once")]
    DuplicateFeed(FeedId),
    #[error("message {message} appears more than once in feed {feed}")]
    DuplicateMessage { feed: FeedId, message: MessageId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Sender id of the local user.
    #[serde(default)]
    pub user: Option<String>,
    pub feeds: Vec<FeedRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedRecord {
    pub id: FeedId,
    #[serde(default)]
    pub title: Option<String>,
    /// How many messages a page holds (initial load and each older page).
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    pub messages: Vec<MessageRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: MessageId,
    pub sender: String,
    #[serde(default)]
    pub timestamp: i64,
    pub text: String,
    #[serde(default)]
    pub media: Vec<MediaRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Rows the item occupies once loaded.
    #[serde(default = "default_media_rows")]
    pub rows: u16,
    /// Simulated load delay; `None` never loads.
    #[serde(default)]
    pub load_ms: Option<u64>,
    /// Whether the load ends in an error instead of success.
    #[serde(default)]
    pub fails: bool,
}

const fn default_page_size() -> usize {
    30
}

const fn default_media_rows() -> u16 {
    6
}

impl Transcript {
    /// Read and validate a transcript file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, TranscriptError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TranscriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parse and validate transcript JSON.
    ///
    /// # Errors
    /// Returns an error for invalid JSON, no feeds, or duplicate ids.
    pub fn parse(raw: &str) -> Result<Self, TranscriptError> {
        let transcript: Self = serde_json::from_str(raw)?;
        transcript.validate()?;
        Ok(transcript)
    }

    fn validate(&self) -> Result<(), TranscriptError> {
        if self.feeds.is_empty() {
            return Err(TranscriptError::NoFeeds);
        }
        let mut feeds = HashSet::new();
        for feed in &self.feeds {
            if !feeds.insert(&feed.id) {
                return Err(TranscriptError::DuplicateFeed(feed.id.clone()));
            }
            let mut messages = HashSet::new();
            for message in &feed.messages {
                if !messages.insert(&message.id) {
                    return Err(TranscriptError::DuplicateMessage {
                        feed: feed.id.clone(),
                        message: message.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn feed(&self, id: &FeedId) -> Option<&FeedRecord> {
        self.feeds.iter().find(|feed| &feed.id == id)
    }
}

impl FeedRecord {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id.0)
    }

    /// The newest page: what a client shows when the feed is first opened.
    pub fn latest_page(&self) -> &[MessageRecord] {
        let start = self.messages.len().saturating_sub(self.page_size.max(1));
        &self.messages[start..]
    }

    /// Up to one page of messages older than `before`; empty when history ran out.
    pub fn page_before(&self, before: &MessageId) -> &[MessageRecord] {
        let Some(end) = self.messages.iter().position(|message| &message.id == before) else {
            return &[];
        };
        let start = end.saturating_sub(self.page_size.max(1));
        &self.messages[start..end]
    }
}

impl MessageRecord {
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            id: self.id.clone(),
            sender_id: self.sender.clone(),
            timestamp: self.timestamp,
            rendered_node_count: 1 + self.media.len(),
        }
    }
}
