//! Scroll anchoring for a chat feed.
//!
//! The [`ScrollAnchor`] keeps a feed visually stable while it changes:
//! - first paint is held back until the feed's media has settled
//! - new messages follow the bottom unless the user scrolled away
//! - older pages are prepended without moving what is on screen
//!
//! It talks to the view through the [`FeedView`] trait and defers work
//! through a [`crate::runtime::Scheduler`].

mod anchor;
mod pagination;
mod viewport;

pub use anchor::{AnchorState, FeedTask, FeedView, ScrollAnchor};
pub use pagination::PageRequest;
pub use viewport::{ScrollLock, ViewportState};

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Stable identity of a feed (a channel, a direct conversation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedId(pub String);

/// Stable identity of a message within its feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

/// A media element rendered by the view, as the view names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaId(pub u64);

macro_rules! string_id {
    ($name:ident) => {
        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(FeedId);
string_id!(MessageId);

/// What the anchor needs to know about a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_id: String,
    pub timestamp: i64,
    /// Number of rendered parts (text block, media, previews). Growth on the
    /// newest message counts as an append.
    pub rendered_node_count: usize,
}

/// Thresholds and timeouts for a [`ScrollAnchor`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorConfig {
    /// Distance from bottom above which the scroll lock engages.
    pub engage_distance: f64,
    /// Distance from bottom at or below which the scroll lock releases.
    pub disengage_distance: f64,
    /// Appends follow the bottom only if the feed was closer than this.
    pub near_bottom_distance: f64,
    /// Scroll top at or below which an older page is requested.
    pub load_older_within: f64,
    /// Longest wait for media before first paint.
    pub media_timeout: Duration,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            engage_distance: 200.0,
            disengage_distance: 8.0,
            near_bottom_distance: 150.0,
            load_older_within: 0.0,
            media_timeout: Duration::from_millis(2000),
        }
    }
}

impl AnchorConfig {
    /// Thresholds scaled for a terminal, where one unit is a row.
    pub fn terminal() -> Self {
        Self {
            engage_distance: 12.0,
            disengage_distance: 0.5,
            near_bottom_distance: 8.0,
            ..Self::default()
        }
    }
}
