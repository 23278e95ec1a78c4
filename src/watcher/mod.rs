//! Live transcript reloading.
//!
//! [`TranscriptWatcher`] watches the transcript's directory with `notify`,
//! debounces bursts of events, and re-reads the file once writes settle.
//! The client diffs the new transcript against what it shows, so an
//! external process appending messages looks like live traffic.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::transcript::{Transcript, TranscriptError};

pub struct TranscriptWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl TranscriptWatcher {
    /// Watch the transcript at `path`.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or the directory cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Event paths arrive canonical.
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %target_path.display(), "watching transcript");

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_path,
            target_name,
            debounce,
            pending_since: None,
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Returns true once a debounced change is ready.
    pub fn take_change_ready(&mut self) -> bool {
        let mut relevant = 0u32;
        let mut total = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            total += 1;
            match event {
                Ok(ev) if self.is_relevant(&ev) => relevant += 1,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(%err, "transcript watcher error");
                    crate::perf::log_event("watcher.error", format!("{err}"));
                }
            }
        }
        if total > 0 {
            crate::perf::log_event(
                "watcher.poll",
                format!(
                    "total={total} relevant={relevant} target={}",
                    self.target_path.display()
                ),
            );
        }

        if relevant > 0 {
            self.pending_since = Some(Instant::now());
        }
        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }

    /// Re-read the transcript if a debounced change is ready.
    pub fn poll(&mut self) -> Option<Result<Transcript, TranscriptError>> {
        if !self.take_change_ready() {
            return None;
        }
        Some(Transcript::load(&self.target_path))
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use tempfile::tempdir;

    const ONE_FEED: &str = r#"{ "feeds": [ { "id": "general", "messages": [
        { "id": "m1", "sender": "ana", "text": "hi" }
    ] } ] }"#;

    const TWO_MESSAGES: &str = r#"{ "feeds": [ { "id": "general", "messages": [
        { "id": "m1", "sender": "ana", "text": "hi" },
        { "id": "m2", "sender": "bo", "text": "hey :)" }
    ] } ] }"#;

    fn event_for(path: PathBuf) -> Event {
        Event {
            kind: EventKind::Any,
            paths: vec![path],
            attrs: notify::event::EventAttributes::new(),
        }
    }

    #[test]
    fn test_directory_level_event_is_relevant() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("feed.json");
        std::fs::write(&path, ONE_FEED).expect("write");
        let watcher = TranscriptWatcher::new(&path, Duration::from_millis(10)).expect("watcher");

        assert!(watcher.is_relevant(&event_for(canonical_dir)));
    }

    #[test]
    fn test_sibling_file_event_is_ignored() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("feed.json");
        std::fs::write(&path, ONE_FEED).expect("write");
        let watcher = TranscriptWatcher::new(&path, Duration::from_millis(10)).expect("watcher");

        assert!(!watcher.is_relevant(&event_for(canonical_dir.join("other.json"))));
    }

    #[test]
    fn test_watch_root_for_relative_file_is_dot() {
        assert_eq!(watch_root_for(Path::new("feed.json")), PathBuf::from("."));
    }

    #[test]
    fn test_appended_message_is_reloaded() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("feed.json");
        std::fs::write(&path, ONE_FEED).expect("write");

        let mut watcher = TranscriptWatcher::new(&path, Duration::from_millis(50)).expect("watcher");
        // let the backend register the watch
        std::thread::sleep(Duration::from_millis(500));
        std::fs::write(&path, TWO_MESSAGES).expect("write");

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut reloaded = None;
        while Instant::now() < deadline {
            if let Some(result) = watcher.poll() {
                reloaded = Some(result.expect("valid transcript"));
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        let transcript = reloaded.expect("change should be detected within 5 seconds");
        assert_eq!(transcript.feeds[0].messages.len(), 2);
    }
}
