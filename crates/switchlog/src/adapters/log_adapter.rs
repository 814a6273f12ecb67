//! `log` adapter.
//!
//! Forwards records to a `log::Log` implementation, by default whatever the
//! process installed with `log::set_logger`. The facade logger name becomes
//! the record target. Named properties, mapped context and the nested stack
//! (under `ndc`) are attached as `log::kv` pairs; the error chain is attached
//! under `error`.

use switchlog_core::LogLevel;
use switchlog_settings::LogFacadeSettings;

use super::{error_chain, key_values, to_log_level};
use crate::capability::{Backend, ContextSupport, LogEvent, Structure};

/// Hands records to a `log::Log` implementation.
pub struct LogBackend {
    logger: &'static dyn log::Log,
}

impl LogBackend {
    /// Bind to the process-wide `log` logger.
    ///
    /// With `require_logger` set, binding fails while `log::max_level()` is
    /// `Off` (no logger installed, or one that accepts nothing).
    pub fn probe(settings: &LogFacadeSettings) -> Result<Self, String> {
        if settings.require_logger && log::max_level() == log::LevelFilter::Off {
            return Err("no `log` logger is installed (max level is off)".to_string());
        }
        Ok(Self::new(log::logger()))
    }

    /// Bind to a specific logger.
    pub fn new(logger: &'static dyn log::Log) -> Self {
        Self { logger }
    }
}

/// Key/value pairs exposed to `log` as a `Source`.
struct Pairs<'a>(&'a [(String, String)]);

impl log::kv::Source for Pairs<'_> {
    fn visit<'kvs>(
        &'kvs self,
        visitor: &mut dyn log::kv::VisitSource<'kvs>,
    ) -> Result<(), log::kv::Error> {
        for (key, value) in self.0 {
            visitor.visit_pair(
                log::kv::Key::from_str(key),
                log::kv::Value::from(value.as_str()),
            )?;
        }
        Ok(())
    }

    fn count(&self) -> usize {
        self.0.len()
    }
}

impl Backend for LogBackend {
    type Handle = Box<str>;

    fn name(&self) -> &'static str {
        "log"
    }

    fn logger(&self, name: &str) -> Self::Handle {
        Box::from(name)
    }

    fn is_enabled(&self, handle: &Self::Handle, level: LogLevel) -> bool {
        self.logger.enabled(
            &log::Metadata::builder()
                .level(to_log_level(level))
                .target(handle)
                .build(),
        )
    }

    fn write(&self, handle: &Self::Handle, event: &LogEvent<'_>) {
        let mut pairs = key_values(event.properties, event.context);
        if let Some(error) = event.error {
            pairs.push(("error".to_owned(), error_chain(error)));
        }
        let source = Pairs(&pairs);

        self.logger.log(
            &log::Record::builder()
                .level(to_log_level(event.level))
                .target(handle)
                .args(format_args!("{}", event.message))
                .key_values(&source)
                .build(),
        );
    }

    fn structure(&self) -> Structure {
        Structure::Properties
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
    use crate::testing::CapturingLog;

    fn bound(max: log::LevelFilter) -> (CapabilitySet, &'static CapturingLog) {
        let sink = CapturingLog::new(max).leak();
        (CapabilitySet::from_backend(LogBackend::new(sink)), sink)
    }

    #[test]
    fn probe_requires_installed_logger() {
        // This test binary never installs a global `log` logger.
        let err = LogBackend::probe(&LogFacadeSettings::default())
            .map(|_| ())
            .unwrap_err();
        assert!(err.contains("no `log` logger"));
    }

    #[test]
    fn probe_can_be_relaxed() {
        let settings = LogFacadeSettings {
            require_logger: false,
        };
        assert!(LogBackend::probe(&settings).is_ok());
    }

    #[test]
    fn enablement_asks_the_logger() {
        let (caps, _sink) = bound(log::LevelFilter::Warn);
        let handle = caps.get_logger("app");
        assert!(!caps.is_enabled(&handle, LogLevel::Info));
        assert!(caps.is_enabled(&handle, LogLevel::Warn));
        assert!(caps.is_enabled(&handle, LogLevel::Fatal));
    }

    #[test]
    fn record_carries_target_and_properties() {
        let (caps, sink) = bound(log::LevelFilter::Trace);
        let handle = caps.get_logger("app::auth");
        let _ = caps
            .write(
                &handle,
                LogLevel::Info,
                || "{user} did {action}".into(),
                None,
                &[&"alice", &"login"],
            )
            .unwrap();

        let records = sink.records();
        let record = records.last().unwrap();
        assert_eq!(record.level, log::Level::Info);
        assert_eq!(record.target, "app::auth");
        assert_eq!(record.message, "alice did login");
        assert_eq!(record.value("user"), Some("alice"));
        assert_eq!(record.value("action"), Some("login"));
    }

    #[test]
    fn fatal_is_written_at_error() {
        let (caps, sink) = bound(log::LevelFilter::Trace);
        let handle = caps.get_logger("core");
        let err = std::io::Error::other("disk gone");
        let _ = caps
            .write(&handle, LogLevel::Fatal, || "halting".into(), Some(&err), &[])
            .unwrap();

        let record = sink.records().pop().unwrap();
        assert_eq!(record.level, log::Level::Error);
        assert_eq!(record.value("error"), Some("disk gone"));
    }

    #[test]
    fn context_is_attached_as_key_values() {
        context::sync_scope(|| {
            let (caps, sink) = bound(log::LevelFilter::Trace);
            let handle = caps.get_logger("ctx");
            let _outer = caps.push_nested("req-9");
            let _tenant = caps.push_mapped("tenant", "acme");
            let _ = caps
                .write(&handle, LogLevel::Debug, || "step".into(), None, &[])
                .unwrap();

            let record = sink.records().pop().unwrap();
            assert_eq!(record.value("tenant"), Some("acme"));
            assert_eq!(record.value("ndc"), Some("req-9"));
        });
    }
}
