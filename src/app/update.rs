use crate::app::Model;
use crate::app::model::CHROME_ROWS;
use crate::feed::FeedView;

use super::ToastLevel;

/// All possible events and actions in the application.
///
/// Help and toasts travel through here like everything else; nothing
/// outside the model holds UI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Feed navigation
    /// Scroll up by n rows
    ScrollUp(usize),
    /// Scroll down by n rows
    ScrollDown(usize),
    PageUp,
    PageDown,
    /// Jump to the oldest loaded message
    GoToTop,
    /// Jump to the newest message
    GoToBottom,
    NextFeed,
    PrevFeed,

    // Composer
    /// Type a character at the caret
    ComposerInput(char),
    /// Insert pasted text at the caret
    Paste(String),
    /// Delete before the caret; a pictogram goes as a whole
    ComposerBackspace,
    CaretLeft,
    CaretRight,
    CaretHome,
    CaretEnd,
    /// Post the draft as the local user
    Send,
    TogglePictograms,

    // Overlays
    ToggleHelp,
    HideHelp,
    HelpScrollUp,
    HelpScrollDown,
    Toast(ToastLevel, String),

    /// Toggle transcript watching
    ToggleWatch,

    // Window
    /// Terminal resized
    Resize(u16, u16),
    Redraw,

    /// Quit the application
    Quit,
}

/// Apply `msg` to the model. Microtasks queued along the way run before
/// this returns.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::ScrollUp(n) => {
            model.pane.scroll_up(n);
            model.scroll_changed();
        }
        Message::ScrollDown(n) => {
            model.pane.scroll_down(n);
            model.scroll_changed();
        }
        Message::PageUp => {
            model.pane.page_up();
            model.scroll_changed();
        }
        Message::PageDown => {
            model.pane.page_down();
            model.scroll_changed();
        }
        Message::GoToTop => {
            model.pane.set_scroll_top(0.0);
            model.scroll_changed();
        }
        Message::GoToBottom => {
            model.pane.set_scroll_top(f64::MAX);
            model.scroll_changed();
        }
        Message::NextFeed => {
            if !model.feeds.is_empty() {
                let next = (model.selected + 1) % model.feeds.len();
                model.select_feed(next);
            }
        }
        Message::PrevFeed => {
            if !model.feeds.is_empty() {
                let prev = (model.selected + model.feeds.len() - 1) % model.feeds.len();
                model.select_feed(prev);
            }
        }

        Message::ComposerInput(ch) => {
            let mut buf = [0u8; 4];
            model
                .composer
                .insert_text(ch.encode_utf8(&mut buf), &mut model.tasks);
        }
        Message::Paste(text) => {
            let text = text.replace(['\r', '\n'], " ");
            model.composer.insert_text(&text, &mut model.tasks);
        }
        Message::ComposerBackspace => {
            model.composer.delete_backward(&mut model.tasks);
        }
        Message::CaretLeft => {
            // offsets inside a pictogram snap forward, so step until the caret moves
            let offset = model.composer.caret_offset();
            let mut target = offset;
            while target > 0 {
                target -= 1;
                model.composer.set_caret_offset(target);
                if model.composer.caret_offset() < offset {
                    break;
                }
            }
        }
        Message::CaretRight => {
            let offset = model.composer.caret_offset();
            model.composer.set_caret_offset(offset + 1);
        }
        Message::CaretHome => model.composer.set_caret_offset(0),
        Message::CaretEnd => model.composer.set_caret_offset(usize::MAX),
        Message::Send => model.send_draft(),
        Message::TogglePictograms => {
            let enabled = !model.pictograms_enabled();
            model.set_pictograms_enabled(enabled);
            model.show_toast(
                ToastLevel::Info,
                if enabled {
                    "Pictograms on"
                } else {
                    "Pictograms off"
                },
            );
        }

        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
        }
        Message::HideHelp => {
            model.help_visible = false;
            model.help_scroll_offset = 0;
        }
        Message::HelpScrollUp => {
            model.help_scroll_offset = model.help_scroll_offset.saturating_sub(1);
        }
        Message::HelpScrollDown => {
            model.help_scroll_offset += 1;
        }
        Message::Toast(level, text) => model.show_toast(level, text),
        Message::ToggleWatch => {
            model.watch_enabled = !model.watch_enabled;
        }

        Message::Resize(width, height) => {
            model
                .pane
                .resize(width, height.saturating_sub(CHROME_ROWS));
            model.anchor.on_resize(&mut model.pane);
        }
        Message::Redraw => {}
        Message::Quit => {
            model.should_quit = true;
        }
    }
    model.run_microtasks();
    model
}
