use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::transcript::Transcript;
use crate::watcher::TranscriptWatcher;

/// Frame pacing while frame callbacks are queued.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Longest idle wait between loop turns.
const IDLE_POLL: Duration = Duration::from_millis(250);

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the transcript cannot be loaded, the terminal
    /// cannot be initialized, or the event loop hits an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let load_scope = crate::perf::scope("app.load_transcript");
        let transcript = Transcript::load(&self.file_path)
            .with_context(|| format!("Failed to open {}", self.file_path.display()))?;
        drop(load_scope);

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; chatpane requires an interactive terminal")?;
        let size = terminal.size()?;

        let mut model = Model::new(
            self.file_path.clone(),
            transcript,
            (size.width, size.height),
            self.anchor_config.clone(),
            self.local_user.clone(),
        );
        if !self.pictograms_enabled {
            model.set_pictograms_enabled(false);
        }
        model.watch_enabled = self.watch_enabled;
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        crate::perf::log_event(
            "init.layout",
            format!(
                "terminal={}x{} feeds={} user={}",
                size.width,
                size.height,
                model.feeds.len(),
                model.local_user
            ),
        );

        execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)?;
        let result = Self::event_loop(&mut terminal, &mut model);

        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        ratatui::restore();

        result
    }

    fn make_watcher(model: &mut Model) -> Option<TranscriptWatcher> {
        match TranscriptWatcher::new(&model.file_path, Duration::from_millis(200)) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                model.watch_enabled = false;
                tracing::warn!(%err, "transcript watch unavailable");
                let msg = Message::Toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                *model = update(std::mem::take(model), msg);
                None
            }
        }
    }

    fn dispatch(model: &mut Model, msg: Message, frame_idx: u64) {
        crate::perf::log_event("event.message", format!("frame={frame_idx} msg={msg:?}"));
        *model = update(std::mem::take(model), msg);
    }

    fn event_loop(terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let start = Instant::now();
        let mut last_tick = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut watcher: Option<TranscriptWatcher> = None;
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            // Follow the watch toggle.
            if model.watch_enabled && watcher.is_none() {
                watcher = Self::make_watcher(model);
            } else if !model.watch_enabled && watcher.is_some() {
                watcher = None;
            }

            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now = Instant::now();
            if model.advance_clock(now.duration_since(last_tick)) {
                needs_render = true;
            }
            last_tick = now;

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                Self::dispatch(model, Message::Resize(width, height), frame_idx);
                needs_render = true;
            }

            if let Some(reloaded) = watcher.as_mut().and_then(TranscriptWatcher::poll) {
                match reloaded {
                    Ok(transcript) => {
                        let added = model.merge_transcript(transcript);
                        crate::perf::log_event("watcher.reload", format!("added={added}"));
                    }
                    Err(err) => {
                        tracing::warn!(%err, "transcript reload failed");
                        let msg = Message::Toast(ToastLevel::Error, format!("Reload failed: {err}"));
                        Self::dispatch(model, msg, frame_idx);
                    }
                }
                needs_render = true;
            }

            let frame_pending = model.tasks.has_frame_work();
            let wait = if needs_render {
                Duration::ZERO
            } else if frame_pending {
                FRAME_INTERVAL
            } else if resize_debouncer.is_pending() {
                Duration::from_millis(10)
            } else {
                model
                    .tasks
                    .next_deadline()
                    .map_or(IDLE_POLL, |deadline| deadline.min(IDLE_POLL))
            };
            if event::poll(wait)? {
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                if let Some(msg) =
                    Self::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer)
                {
                    Self::dispatch(model, msg, frame_idx);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                while event::poll(Duration::ZERO)? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    if let Some(msg) =
                        Self::handle_event(&event::read()?, model, drain_ms, &mut resize_debouncer)
                    {
                        Self::dispatch(model, msg, frame_idx);
                        needs_render = true;
                    }
                }
            }

            if needs_render || frame_pending {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );
                // Frame callbacks may change what is on screen.
                needs_render = model.finish_frame();
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}
