//! Console adapter.
//!
//! Needs no binding step: it is always available and is the default backend.
//! Each record becomes one line:
//!
//! ```text
//! 2024-05-01 12:00:00 [INFO]  (app::db) [req-7] {tenant=acme} connected
//! ```
//!
//! followed by the error and its `caused by:` chain when an error is attached.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::Local;
use colored::{ColoredString, Colorize};
use parking_lot::Mutex;
use switchlog_core::LogLevel;
use switchlog_settings::{ConsoleSettings, ConsoleStream};

use super::{context_prefix, error_chain};
use crate::capability::{Backend, ContextSupport, LogEvent};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Writes colored, human-readable lines to a stream.
pub struct ConsoleBackend {
    min_level: LogLevel,
    color: bool,
    writer: SharedWriter,
}

impl ConsoleBackend {
    /// Console backend writing to the stream named in `settings`.
    pub fn new(settings: &ConsoleSettings) -> Self {
        match settings.stream {
            ConsoleStream::Stderr => Self::with_writer(settings, io::stderr()),
            ConsoleStream::Stdout => Self::with_writer(settings, io::stdout()),
        }
    }

    /// Console backend writing to an arbitrary writer.
    pub fn with_writer(settings: &ConsoleSettings, writer: impl Write + Send + 'static) -> Self {
        Self {
            min_level: settings.min_level,
            color: settings.color,
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    fn render(&self, name: &str, event: &LogEvent<'_>) -> String {
        let mut line = format!(
            "{} {:<8}({}) {}{}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            format!("[{}]", event.level.as_str().to_uppercase()),
            name,
            context_prefix(event.context),
            event.message,
        );
        if let Some(error) = event.error {
            line.push('\n');
            line.push_str(&error_chain(error));
        }
        if self.color {
            paint(event.level, &line).to_string()
        } else {
            line
        }
    }
}

fn paint(level: LogLevel, line: &str) -> ColoredString {
    match level {
        LogLevel::Fatal => line.red(),
        LogLevel::Error => line.yellow(),
        LogLevel::Warn => line.magenta(),
        LogLevel::Info => line.white(),
        LogLevel::Debug => line.bright_black(),
        LogLevel::Trace => line.dimmed(),
    }
}

impl Backend for ConsoleBackend {
    type Handle = Box<str>;

    fn name(&self) -> &'static str {
        "console"
    }

    fn logger(&self, name: &str) -> Self::Handle {
        Box::from(name)
    }

    fn is_enabled(&self, _handle: &Self::Handle, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn write(&self, handle: &Self::Handle, event: &LogEvent<'_>) {
        let line = self.render(handle, event);
        let mut out = self.writer.lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }

    fn context_support(&self) -> ContextSupport {
        ContextSupport::Flow
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use switchlog_core::context;

    use super::*;
    use crate::capability::CapabilitySet;
    use crate::testing::SharedBuffer;

    fn plain(min_level: LogLevel) -> (CapabilitySet, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let settings = ConsoleSettings {
            min_level,
            color: false,
            stream: ConsoleStream::Stderr,
        };
        let backend = ConsoleBackend::with_writer(&settings, buffer.clone());
        (CapabilitySet::from_backend(backend), buffer)
    }

    #[test]
    fn line_has_level_name_and_message() {
        let (caps, buffer) = plain(LogLevel::Trace);
        let handle = caps.get_logger("app::db");
        let wrote = caps
            .write(&handle, LogLevel::Warn, || "pool low".into(), None, &[])
            .unwrap();

        assert!(wrote);
        let out = buffer.contents();
        assert!(out.contains("[WARN]  (app::db) pool low"), "{out}");
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn below_min_level_is_disabled() {
        let (caps, buffer) = plain(LogLevel::Info);
        let handle = caps.get_logger("quiet");
        assert!(!caps.is_enabled(&handle, LogLevel::Debug));
        assert!(caps.is_enabled(&handle, LogLevel::Fatal));
        let wrote = caps
            .write(&handle, LogLevel::Debug, || "nope".into(), None, &[])
            .unwrap();
        assert!(!wrote);
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn error_chain_follows_message() {
        let (caps, buffer) = plain(LogLevel::Trace);
        let handle = caps.get_logger("io");
        let err = std::io::Error::other("disk full");
        let _ = caps
            .write(&handle, LogLevel::Error, || "save failed".into(), Some(&err), &[])
            .unwrap();

        let out = buffer.contents();
        assert!(out.contains("save failed\ndisk full"), "{out}");
    }

    #[test]
    fn context_is_rendered_before_message() {
        context::sync_scope(|| {
            let (caps, buffer) = plain(LogLevel::Trace);
            let handle = caps.get_logger("ctx");
            let _req = caps.push_nested("req-7");
            let _tenant = caps.push_mapped("tenant", "acme");
            let _ = caps
                .write(&handle, LogLevel::Info, || "connected".into(), None, &[])
                .unwrap();

            let out = buffer.contents();
            assert!(out.contains("(ctx) [req-7] {tenant=acme} connected"), "{out}");
        });
    }

    #[test]
    fn positional_args_are_rendered() {
        let (caps, buffer) = plain(LogLevel::Trace);
        let handle = caps.get_logger("fmt");
        let _ = caps
            .write(
                &handle,
                LogLevel::Info,
                || "{user} logged in from {ip}".into(),
                None,
                &[&"alice", &"10.0.0.1"],
            )
            .unwrap();
        assert!(buffer.contents().contains("alice logged in from 10.0.0.1"));
    }

    #[test]
    fn paint_keeps_text() {
        let painted = paint(LogLevel::Fatal, "boom");
        assert_eq!(&*painted, "boom");
    }
}
