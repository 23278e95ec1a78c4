//! Pictogram-aware editable text buffer.
//!
//! Keeps the logical plain text of a composer in sync with its rich tree
//! and carries the caret across asynchronous rewrites, designed for
//! integration into the TEA architecture.

mod buffer;

pub use buffer::{BufferTask, EditableBuffer, ListenerId, Phase, Signal};
