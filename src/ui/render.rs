use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::app::Model;
use crate::content::{Node, TreePosition, to_tree_position};
use crate::editor::EditableBuffer;

use super::viewport::{MediaState, PaneRow};
use super::{COMPOSER_PROMPT, FEED_LEFT_PADDING, overlays, status, style};

/// Split the screen into feed, composer and status rows.
pub fn split_rows(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area)
}

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let rows = split_rows(area);

    render_feed(model, frame, rows[0]);
    render_composer(model, frame, rows[1]);
    if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, rows[2]);
    } else {
        status::render_status_bar(model, frame, rows[2]);
    }

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_feed(model: &Model, frame: &mut Frame, area: Rect) {
    let pane = &model.pane;
    if !pane.is_visible() {
        let waiting = Paragraph::new(Line::styled("  loading…", style::dim_style()));
        frame.render_widget(waiting, area);
        return;
    }

    let pad = " ".repeat(FEED_LEFT_PADDING as usize);
    let lines: Vec<Line> = pane.rows()[pane.visible_range()]
        .iter()
        .map(|row| match row {
            PaneRow::Header { sender } => Line::from(vec![
                Span::raw(" "),
                Span::styled(sender.clone(), style::sender_style(sender == &model.local_user)),
            ]),
            PaneRow::Text(text) => Line::raw(format!("{pad}{text}")),
            PaneRow::Media { state, first, .. } => {
                let body = match (state, first) {
                    (MediaState::Loading, _) => "[media loading]".to_string(),
                    (MediaState::Failed, _) => "[media failed to load]".to_string(),
                    (MediaState::Loaded, true) => "┌ media ┐".to_string(),
                    (MediaState::Loaded, false) => "│░░░░░░░│".to_string(),
                };
                Line::styled(format!("{pad}{body}"), style::media_style(*state))
            }
            PaneRow::Gap => Line::raw(""),
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_composer(model: &Model, frame: &mut Frame, area: Rect) {
    let (text, caret_col) = composer_line(&model.composer);
    let prompt_width = COMPOSER_PROMPT.width();
    // Keep the caret on screen for long drafts.
    let room = (area.width as usize).saturating_sub(prompt_width + 1);
    let skip = caret_col.saturating_sub(room);
    let shown = skip_columns(&text, skip);

    let line = Line::from(vec![
        Span::styled(COMPOSER_PROMPT, style::dim_style()),
        Span::styled(shown, style::composer_style(model.pictograms_enabled())),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    if !model.help_visible {
        let col = prompt_width + caret_col.saturating_sub(skip);
        let x = area.x + u16::try_from(col).unwrap_or(u16::MAX).min(area.width.saturating_sub(1));
        frame.set_cursor_position((x, area.y));
    }
}

/// Display text of the composer and the caret's display column.
///
/// The column comes from the caret's tree position, so it always agrees
/// with where the buffer will insert the next character.
pub fn composer_line(buffer: &EditableBuffer) -> (String, usize) {
    let tree = buffer.tree();
    let caret = to_tree_position(tree, buffer.caret_offset());
    // the child a boundary caret sits in front of
    let before = match caret {
        TreePosition::Boundary { parent, index } => tree.children(parent).get(index).copied(),
        _ => None,
    };
    let mut caret_col = None;
    let mut text = String::new();
    for leaf in tree.leaves() {
        if caret_col.is_none() && before.is_some_and(|child| tree.is_within(leaf, child)) {
            caret_col = Some(text.width());
        }
        match tree.node(leaf) {
            Some(Node::Text(run)) => {
                if let TreePosition::Text { node, offset } = caret {
                    if node == leaf {
                        let prefix: String = run.chars().take(offset).collect();
                        caret_col = Some(text.width() + prefix.width());
                    }
                }
                text.push_str(run);
            }
            Some(Node::Pictogram(pictogram)) => {
                text.push_str(&pictogram.glyph);
                if caret == TreePosition::After(leaf) {
                    caret_col = Some(text.width());
                }
            }
            _ => {}
        }
    }
    let caret_col = caret_col.unwrap_or_else(|| text.width());
    (text, caret_col)
}

fn skip_columns(text: &str, columns: usize) -> String {
    let mut skipped = 0;
    text.chars()
        .skip_while(|ch| {
            if skipped >= columns {
                return false;
            }
            skipped += unicode_width::UnicodeWidthChar::width(*ch).unwrap_or(0);
            true
        })
        .collect()
}
