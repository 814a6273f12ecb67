//! Test utilities for asserting on what reached a backend.
//!
//! - [`MemoryBackend`] records every event it is handed, with an adjustable
//!   threshold, into [`CapturedRecords`]
//! - [`capture_tracing`] installs a thread-local `tracing` subscriber that keeps
//!   events in memory
//! - [`CapturingLog`] is a `log::Log` implementation that keeps records and
//!   their key/value pairs
//! - [`SharedBuffer`] is a cloneable `Write` sink for the console adapter

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;
use switchlog_core::{DiagnosticContext, LogLevel};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::adapters::error_chain;
use crate::capability::{Backend, ContextSupport, LogEvent, Structure};

// ── Memory backend ──────────────────────────────────────────────────────────

/// One record as seen by [`MemoryBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedRecord {
    /// Severity.
    pub level: LogLevel,
    /// Logger name.
    pub logger: String,
    /// Rendered message.
    pub message: String,
    /// Attached error chain, rendered.
    pub error: Option<String>,
    /// Named properties.
    pub properties: Vec<(String, String)>,
    /// Context snapshot.
    pub context: Option<DiagnosticContext>,
}

/// Thread-safe store of records written to a [`MemoryBackend`].
#[derive(Clone, Default)]
pub struct CapturedRecords {
    records: Arc<Mutex<Vec<CapturedRecord>>>,
}

impl CapturedRecords {
    /// All records, oldest first.
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records.lock().clone()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<CapturedRecord> {
        self.records.lock().last().cloned()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when nothing was written.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Check if any record at `level` contains the message substring.
    pub fn has_event(&self, level: LogLevel, message_contains: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| r.level == level && r.message.contains(message_contains))
    }

    /// Count records at a specific level.
    pub fn count_at_level(&self, level: LogLevel) -> usize {
        self.records.lock().iter().filter(|r| r.level == level).count()
    }

    /// Clear all records.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

/// Backend that keeps every record in memory.
///
/// The threshold can be changed after binding through [`MemoryBackend::threshold`],
/// which is how tests observe that enablement is never cached.
pub struct MemoryBackend {
    records: CapturedRecords,
    threshold: Threshold,
    structure: Structure,
    context_support: ContextSupport,
}

impl MemoryBackend {
    /// Record everything at or above `min_level`, with properties and flow context.
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            records: CapturedRecords::default(),
            threshold: Threshold::new(min_level),
            structure: Structure::Properties,
            context_support: ContextSupport::Flow,
        }
    }

    /// Override how arguments arrive.
    #[must_use]
    pub fn with_structure(mut self, structure: Structure) -> Self {
        self.structure = structure;
        self
    }

    /// Override context support.
    #[must_use]
    pub fn with_context_support(mut self, context_support: ContextSupport) -> Self {
        self.context_support = context_support;
        self
    }

    /// Handle to the captured records.
    pub fn records(&self) -> CapturedRecords {
        self.records.clone()
    }

    /// Handle to the live threshold.
    pub fn threshold(&self) -> Threshold {
        self.threshold.clone()
    }
}

/// Adjustable minimum level shared with a [`MemoryBackend`].
#[derive(Clone)]
pub struct Threshold(Arc<AtomicU8>);

impl Threshold {
    fn new(level: LogLevel) -> Self {
        Self(Arc::new(AtomicU8::new(level as u8)))
    }

    /// Change the minimum level.
    pub fn set(&self, level: LogLevel) {
        self.0.store(level as u8, Ordering::SeqCst);
    }

    /// Current minimum level.
    pub fn get(&self) -> LogLevel {
        let raw = self.0.load(Ordering::SeqCst);
        LogLevel::ALL
            .into_iter()
            .find(|level| *level as u8 == raw)
            .unwrap_or(LogLevel::Trace)
    }
}

impl Backend for MemoryBackend {
    type Handle = ();

    fn name(&self) -> &'static str {
        "memory"
    }

    fn logger(&self, _name: &str) -> Self::Handle {}

    fn is_enabled(&self, _handle: &Self::Handle, level: LogLevel) -> bool {
        level >= self.threshold.get()
    }

    fn write(&self, _handle: &Self::Handle, event: &LogEvent<'_>) {
        self.records.records.lock().push(CapturedRecord {
            level: event.level,
            logger: event.logger.to_owned(),
            message: event.message.to_owned(),
            error: event.error.map(error_chain),
            properties: event.properties.to_vec(),
            context: event.context.cloned(),
        });
    }

    fn structure(&self) -> Structure {
        self.structure
    }

    fn context_support(&self) -> ContextSupport {
        self.context_support
    }
}

// ── Console sink ────────────────────────────────────────────────────────────

/// Cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── tracing capture ─────────────────────────────────────────────────────────

/// A captured tracing event for assertion.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    /// The log level.
    pub level: Level,
    /// The target module.
    pub target: String,
    /// The formatted message.
    pub message: String,
    /// Field key-value pairs.
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    /// Value of a recorded field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Thread-safe store for captured tracing events.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedLogs {
    /// Get all captured events.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    /// Check if any event at the given level contains the message substring.
    pub fn has_event(&self, level: Level, message_contains: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| e.level == level && e.message.contains(message_contains))
    }

    /// Count events at a specific level.
    pub fn count_at_level(&self, level: Level) -> usize {
        self.events.lock().iter().filter(|e| e.level == level).count()
    }
}

struct CaptureLayer {
    logs: CapturedLogs,
}

/// Visitor that extracts the message and fields from an event.
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let val = format!("{value:?}");
        if field.name() == "message" {
            self.message = val;
        } else {
            self.fields.push((field.name().to_owned(), val));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.message);
        } else {
            self.fields.push((field.name().to_owned(), value.to_owned()));
        }
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields.push((field.name().to_owned(), value.to_string()));
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.logs.events.lock().push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_owned(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// Install a subscriber that captures all events on the current thread.
///
/// The guard must be kept alive for the duration of the test.
pub fn capture_tracing() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    capture_tracing_at(Level::TRACE)
}

/// Like [`capture_tracing`], but drops events below `level`.
pub fn capture_tracing_at(level: Level) -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let layer = CaptureLayer { logs: logs.clone() };

    let subscriber = tracing_subscriber::registry()
        .with(layer)
        .with(LevelFilter::from_level(level));

    let guard = subscriber.set_default();
    (logs, guard)
}

// ── log capture ─────────────────────────────────────────────────────────────

#[cfg(feature = "log-backend")]
pub use log_capture::{CapturedLogRecord, CapturingLog};

#[cfg(feature = "log-backend")]
mod log_capture {
    use std::sync::Arc;

    use parking_lot::Mutex;

    /// A `log` record as kept by [`CapturingLog`].
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct CapturedLogRecord {
        /// `log` level.
        pub level: log::Level,
        /// Record target (the facade logger name).
        pub target: String,
        /// Rendered message.
        pub message: String,
        /// Key/value pairs, in visit order.
        pub key_values: Vec<(String, String)>,
    }

    impl CapturedLogRecord {
        /// Value of a key/value pair.
        pub fn value(&self, key: &str) -> Option<&str> {
            self.key_values
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        }
    }

    /// `log::Log` implementation that keeps records in memory.
    pub struct CapturingLog {
        max_level: log::LevelFilter,
        records: Arc<Mutex<Vec<CapturedLogRecord>>>,
    }

    impl CapturingLog {
        /// Keep records at or above `max_level`.
        pub fn new(max_level: log::LevelFilter) -> Self {
            Self {
                max_level,
                records: Arc::default(),
            }
        }

        /// Leak into a `&'static` logger, as `log` expects.
        pub fn leak(self) -> &'static Self {
            Box::leak(Box::new(self))
        }

        /// All records, oldest first.
        pub fn records(&self) -> Vec<CapturedLogRecord> {
            self.records.lock().clone()
        }
    }

    struct KeyValueCollector(Vec<(String, String)>);

    impl<'kvs> log::kv::VisitSource<'kvs> for KeyValueCollector {
        fn visit_pair(
            &mut self,
            key: log::kv::Key<'kvs>,
            value: log::kv::Value<'kvs>,
        ) -> Result<(), log::kv::Error> {
            self.0.push((key.to_string(), value.to_string()));
            Ok(())
        }
    }

    impl log::Log for CapturingLog {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.level() <= self.max_level
        }

        fn log(&self, record: &log::Record<'_>) {
            if !self.enabled(record.metadata()) {
                return;
            }
            let mut collector = KeyValueCollector(Vec::new());
            let _ = record.key_values().visit(&mut collector);
            self.records.lock().push(CapturedLogRecord {
                level: record.level(),
                target: record.target().to_owned(),
                message: record.args().to_string(),
                key_values: collector.0,
            });
        }

        fn flush(&self) {}
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
