//! Timing scopes and the opt-in debug event log.
//!
//! The engines call [`log_event`] at every state transition (anchor
//! settles, composer flushes, stale pages). Nothing is written unless a
//! log file was configured with [`set_debug_log_path`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static EVENTS_WRITTEN: AtomicU64 = AtomicU64::new(0);
static DEBUG_LOGGER: LazyLock<Mutex<DebugLogger>> =
    LazyLock::new(|| Mutex::new(DebugLogger::new()));

/// Measures the time until it is dropped.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(scope = self.name, elapsed_ms, "perf");
        log_event("perf.scope", format!("{} {elapsed_ms:.2} ms", self.name));
    }
}

#[derive(Debug)]
struct DebugLogger {
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl DebugLogger {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            writer: None,
        }
    }
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// Start (or stop, with `None`) writing debug events to `path`.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut logger = DEBUG_LOGGER
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            writeln!(writer, "chatpane debug log start")?;
            writer.flush()?;
            logger.start = Instant::now();
            logger.writer = Some(writer);
        }
        None => logger.writer = None,
    }
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    DEBUG_LOGGER
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .writer
        .is_some()
}

/// Events written since start-up.
pub fn events_written() -> u64 {
    EVENTS_WRITTEN.load(Ordering::Relaxed)
}

pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut logger = DEBUG_LOGGER
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let elapsed_ms = logger.start.elapsed().as_secs_f64() * 1000.0;
    let Some(writer) = logger.writer.as_mut() else {
        return;
    };
    let _ = writeln!(writer, "[{elapsed_ms:>10.3} ms] {name}: {}", detail.as_ref());
    let _ = writer.flush();
    EVENTS_WRITTEN.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_set_enabled_toggles_runtime_flag() {
        set_enabled(true);
        assert!(is_enabled());

        set_enabled(false);
        assert!(!is_enabled());
    }

    #[test]
    fn test_debug_log_path_enables_logging_and_writes() {
        let temp_file = NamedTempFile::new().unwrap();
        set_debug_log_path(Some(temp_file.path())).unwrap();
        assert!(is_debug_log_enabled());
        log_event("anchor.settle", "feed=general");
        set_debug_log_path(None).unwrap();
        log_event("anchor.settle", "not written");

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("chatpane debug log start"));
        assert!(content.contains("anchor.settle: feed=general"));
        assert!(!content.contains("not written"));
    }
}
