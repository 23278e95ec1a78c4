//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: Every event the client reacts to, including help and
//!   toast requests
//! - [`update`]: State transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! The feed anchor and the composer defer work through the model's
//! [`crate::runtime::Scheduler`]; the loop drives it from wall-clock time
//! and rendered frames.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{FeedState, Model, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::editor::BufferTask;
use crate::feed::{AnchorConfig, FeedId, FeedTask, MediaId, PageRequest};

/// Deferred work queued on the model's scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Feed(FeedTask),
    Composer(BufferTask),
    /// A simulated media load finished.
    MediaLoaded {
        feed: FeedId,
        media: MediaId,
        failed: bool,
    },
    /// A simulated history fetch returned.
    PageArrived(PageRequest),
}

impl From<FeedTask> for Task {
    fn from(task: FeedTask) -> Self {
        Self::Feed(task)
    }
}

impl From<BufferTask> for Task {
    fn from(task: BufferTask) -> Self {
        Self::Composer(task)
    }
}

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    file_path: PathBuf,
    watch_enabled: bool,
    pictograms_enabled: bool,
    anchor_config: AnchorConfig,
    local_user: Option<String>,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application for the given transcript.
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            watch_enabled: false,
            pictograms_enabled: true,
            anchor_config: AnchorConfig::default(),
            local_user: None,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Reload the transcript when it changes on disk.
    pub fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    pub fn with_pictograms(mut self, enabled: bool) -> Self {
        self.pictograms_enabled = enabled;
        self
    }

    pub fn with_anchor_config(mut self, config: AnchorConfig) -> Self {
        self.anchor_config = config;
        self
    }

    /// Sender id treated as the local user; overrides the transcript's.
    pub fn with_local_user(mut self, user: Option<String>) -> Self {
        self.local_user = user;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}

#[cfg(test)]
mod tests;
