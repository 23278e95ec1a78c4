use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};
use crate::feed::AnchorState;

use super::style;

/// One-line summary of the selected feed and the anchor.
pub fn status_text(model: &Model) -> String {
    let Some(feed) = model.selected_feed() else {
        return " no feeds  ?:help".to_string();
    };
    let position = format!("{}/{}", model.selected + 1, model.feeds.len());

    let state = match model.anchor.state() {
        AnchorState::NotInitialized => "empty".to_string(),
        AnchorState::AwaitingMedia => format!("waiting for {} media", model.anchor.pending_media()),
        AnchorState::Settled => format!("{}%", model.pane.scroll_percent()),
    };
    let history = if model.anchor.is_loading_older() {
        " [loading history]"
    } else if model.anchor.history_exhausted() {
        " [start of history]"
    } else {
        ""
    };
    let lock = if model.anchor.is_locked() {
        " [reading back]"
    } else {
        ""
    };
    let watch = if model.watch_enabled { " [watching]" } else { "" };
    let pictograms = if model.pictograms_enabled() {
        ""
    } else {
        " [plain]"
    };

    format!(
        " {}  ({})  {}{}{}{}{}  as {}  ?:help",
        feed.record.display_title(),
        position,
        state,
        history,
        lock,
        watch,
        pictograms,
        model.local_user
    )
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let bar = Paragraph::new(status_text(model)).style(style::status_style());
    frame.render_widget(bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => ("[info]", style::status_style()),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
