// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. feed::FeedId)
    clippy::module_name_repetitions
)]

//! # chatpane
//!
//! Client-side engines for a chat UI, plus a terminal client built on them.
//!
//! - A scroll anchor that keeps a message feed stable while it changes:
//!   first paint waits for media, appends follow the bottom unless the user
//!   is reading back, and older pages load in without moving the view.
//! - An editable buffer that turns sequences like `:)` into pictograms as
//!   you type, while its plain text and caret stay exactly where you
//!   expect them.
//!
//! ## Architecture
//!
//! The engines are state machines that never block. They defer work by
//! queueing tasks on a [`runtime::Scheduler`] (microtasks, frame callbacks,
//! timers) that their host drives. The terminal client uses The Elm
//! Architecture (TEA):
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: State transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`runtime`]: Cooperative task scheduler
//! - [`content`]: Content tree and offset mapping
//! - [`pictogram`]: Pictogram table and substitution
//! - [`dispatch`]: Batched change delivery
//! - [`editor`]: The pictogram-aware editable buffer
//! - [`feed`]: Scroll anchoring
//! - [`transcript`]: Transcript files for the terminal client
//! - [`app`]: Main application loop and state
//! - [`ui`]: Terminal UI components
//! - [`watcher`]: Transcript reloading
//! - [`config`]: Saved default flags
//! - [`perf`]: Timing and debug event log

pub mod app;
pub mod config;
pub mod content;
pub mod dispatch;
pub mod editor;
pub mod feed;
pub mod perf;
pub mod pictogram;
pub mod runtime;
pub mod transcript;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::editor::EditableBuffer;
    pub use crate::feed::{AnchorConfig, FeedView, ScrollAnchor};
    pub use crate::pictogram::PictogramTable;
    pub use crate::runtime::Scheduler;
}
