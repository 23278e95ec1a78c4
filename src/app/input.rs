use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, Message, Model};

use super::event_loop::ResizeDebouncer;

/// Rows moved per mouse wheel notch.
const WHEEL_ROWS: usize = 3;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Paste(text) => Some(Message::Paste(text.clone())),
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl {
            return match key.code {
                KeyCode::Char('c' | 'q') => Some(Message::Quit),
                KeyCode::Char('e') => Some(Message::TogglePictograms),
                KeyCode::Char('w') => Some(Message::ToggleWatch),
                KeyCode::Char('l') => Some(Message::Redraw),
                KeyCode::Home => Some(Message::GoToTop),
                KeyCode::End => Some(Message::GoToBottom),
                _ => None,
            };
        }

        if model.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::F(1) => Some(Message::HideHelp),
                KeyCode::Up => Some(Message::HelpScrollUp),
                KeyCode::Down => Some(Message::HelpScrollDown),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Esc => Some(Message::Quit),
            KeyCode::F(1) => Some(Message::ToggleHelp),
            KeyCode::Char('?') if model.draft_len() == 0 => Some(Message::ToggleHelp),
            KeyCode::Up => Some(Message::ScrollUp(1)),
            KeyCode::Down => Some(Message::ScrollDown(1)),
            KeyCode::PageUp => Some(Message::PageUp),
            KeyCode::PageDown => Some(Message::PageDown),
            KeyCode::Tab => Some(Message::NextFeed),
            KeyCode::BackTab => Some(Message::PrevFeed),
            KeyCode::Enter => Some(Message::Send),
            KeyCode::Backspace => Some(Message::ComposerBackspace),
            KeyCode::Left => Some(Message::CaretLeft),
            KeyCode::Right => Some(Message::CaretRight),
            KeyCode::Home => Some(Message::CaretHome),
            KeyCode::End => Some(Message::CaretEnd),
            KeyCode::Char(ch) => Some(Message::ComposerInput(ch)),
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            return None;
        }
        match mouse.kind {
            MouseEventKind::ScrollUp => Some(Message::ScrollUp(WHEEL_ROWS)),
            MouseEventKind::ScrollDown => Some(Message::ScrollDown(WHEEL_ROWS)),
            _ => None,
        }
    }
}
