//! Colors for the feed, composer and bars.
//!
//! Uses ANSI colors that adapt to the terminal's palette.

use ratatui::style::{Color, Modifier, Style};

use crate::ui::viewport::MediaState;

/// Sender header style; the local user stands out.
pub fn sender_style(local: bool) -> Style {
    let color = if local { Color::Green } else { Color::Cyan };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

pub fn media_style(state: MediaState) -> Style {
    match state {
        MediaState::Loading => Style::default()
            .fg(Color::Indexed(245))
            .add_modifier(Modifier::ITALIC),
        MediaState::Loaded => Style::default().fg(Color::Magenta),
        MediaState::Failed => Style::default().fg(Color::Red),
    }
}

pub fn composer_style(pictograms: bool) -> Style {
    if pictograms {
        Style::default()
    } else {
        Style::default().fg(Color::Indexed(250))
    }
}

pub fn status_style() -> Style {
    Style::default().bg(Color::DarkGray).fg(Color::White)
}

pub fn dim_style() -> Style {
    Style::default().fg(Color::Indexed(245))
}
