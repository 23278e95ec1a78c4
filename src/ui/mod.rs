//! Terminal UI components.
//!
//! - [`viewport`]: The feed pane and its scroll position
//! - [`style`]: Theming and colors

pub mod style;
pub mod viewport;

mod overlays;
mod render;
mod status;

pub use render::{composer_line, render, split_rows};
pub use status::status_text;

pub const FEED_LEFT_PADDING: u16 = 2;
pub const COMPOSER_PROMPT: &str = "> ";
