//! `log4rs` adapter.
//!
//! Owns a private `log4rs::Logger` with a single appender (a console appender
//! with a pattern encoder unless the caller supplies one). `log4rs` reads
//! diagnostic context from `log-mdc`, so for the duration of each write the
//! named properties, the mapped context and the nested stack (under `ndc`) are
//! mirrored into the thread's MDC and then restored.

use log4rs::append::Append;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use switchlog_core::LogLevel;
use switchlog_settings::{ConsoleStream, Log4rsSettings};

use super::{error_chain, key_values, to_log_level};
use crate::capability::{Backend, ContextSupport, LogEvent, Structure};

const APPENDER_NAME: &str = "switchlog";

/// Writes through a privately owned `log4rs` logger.
pub struct Log4rsBackend {
    logger: log4rs::Logger,
}

impl Log4rsBackend {
    /// Build a console appender from settings.
    pub fn probe(settings: &Log4rsSettings) -> Result<Self, String> {
        let target = match settings.stream {
            ConsoleStream::Stderr => Target::Stderr,
            ConsoleStream::Stdout => Target::Stdout,
        };
        let appender = ConsoleAppender::builder()
            .target(target)
            .encoder(Box::new(PatternEncoder::new(&settings.pattern)))
            .build();
        Self::with_appender(Box::new(appender), settings.level)
    }

    /// Route every record at or above `level` to `appender`.
    pub fn with_appender(appender: Box<dyn Append>, level: LogLevel) -> Result<Self, String> {
        let config = Config::builder()
            .appender(Appender::builder().build(APPENDER_NAME, appender))
            .build(
                Root::builder()
                    .appender(APPENDER_NAME)
                    .build(to_log_level(level).to_level_filter()),
            )
            .map_err(|e| format!("invalid log4rs configuration: {e}"))?;
        Ok(Self {
            logger: log4rs::Logger::new(config),
        })
    }
}

/// Restores the MDC entries it overwrote when dropped.
struct MdcMirror {
    saved: Vec<(String, Option<String>)>,
}

impl MdcMirror {
    fn install(pairs: Vec<(String, String)>) -> Self {
        let saved = pairs
            .into_iter()
            .map(|(key, value)| {
                let previous = log_mdc::insert(key.clone(), value);
                (key, previous)
            })
            .collect();
        Self { saved }
    }
}

impl Drop for MdcMirror {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            let _ = match previous {
                Some(value) => log_mdc::insert(key, value),
                None => log_mdc::remove(key.as_str()),
            };
        }
    }
}

impl Backend for Log4rsBackend {
    type Handle = Box<str>;

    fn name(&self) -> &'static str {
        "log4rs"
    }

    fn logger(&self, name: &str) -> Self::Handle {
        Box::from(name)
    }

    fn is_enabled(&self, handle: &Self::Handle, level: LogLevel) -> bool {
        log::Log::enabled(
            &self.logger,
            &log::Metadata::builder()
                .level(to_log_level(level))
                .target(handle)
                .build(),
        )
    }

    fn write(&self, handle: &Self::Handle, event: &LogEvent<'_>) {
        let message = match event.error {
            Some(error) => format!("{}\n{}", event.message, error_chain(error)),
            None => event.message.to_owned(),
        };
        let _mirror = MdcMirror::install(key_values(event.properties, event.context));
        log::Log::log(
            &self.logger,
            &log::Record::builder()
                .level(to_log_level(event.level))
                .target(handle)
                .args(format_args!("{message}"))
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
    use std::sync::Arc;

    use parking_lot::Mutex;
    use switchlog_core::context;

    use super::*;
    use crate::capability::CapabilitySet;

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    struct Seen {
        target: String,
        message: String,
        user: Option<String>,
        tenant: Option<String>,
        ndc: Option<String>,
    }

    /// Appender that records what the MDC held while the record was appended.
    #[derive(Debug, Default)]
    struct MdcProbe {
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl Append for MdcProbe {
        fn append(&self, record: &log::Record<'_>) -> anyhow::Result<()> {
            let mdc = |key: &str| log_mdc::get(key, |v| v.map(str::to_owned));
            self.seen.lock().push(Seen {
                target: record.target().to_owned(),
                message: record.args().to_string(),
                user: mdc("user"),
                tenant: mdc("tenant"),
                ndc: mdc("ndc"),
            });
            Ok(())
        }

        fn flush(&self) {}
    }

    fn probed(level: LogLevel) -> (CapabilitySet, Arc<Mutex<Vec<Seen>>>) {
        let probe = MdcProbe::default();
        let seen = Arc::clone(&probe.seen);
        let backend = Log4rsBackend::with_appender(Box::new(probe), level).unwrap();
        (CapabilitySet::from_backend(backend), seen)
    }

    #[test]
    fn probe_builds_console_logger() {
        assert!(Log4rsBackend::probe(&Log4rsSettings::default()).is_ok());
    }

    #[test]
    fn root_level_drives_enablement() {
        let (caps, _seen) = probed(LogLevel::Warn);
        let handle = caps.get_logger("app");
        assert!(!caps.is_enabled(&handle, LogLevel::Info));
        assert!(caps.is_enabled(&handle, LogLevel::Warn));
        assert!(caps.is_enabled(&handle, LogLevel::Fatal));
    }

    #[test]
    fn properties_are_visible_in_mdc_during_append() {
        let (caps, seen) = probed(LogLevel::Trace);
        let handle = caps.get_logger("app::auth");
        let _ = caps
            .write(
                &handle,
                LogLevel::Info,
                || "{user} logged in".into(),
                None,
                &[&"alice"],
            )
            .unwrap();

        let seen = seen.lock().pop().unwrap();
        assert_eq!(seen.target, "app::auth");
        assert_eq!(seen.message, "alice logged in");
        assert_eq!(seen.user.as_deref(), Some("alice"));
    }

    #[test]
    fn mdc_is_restored_after_write() {
        let _existing = log_mdc::insert("user", "pre-existing");
        let (caps, _seen) = probed(LogLevel::Trace);
        let handle = caps.get_logger("app");
        let _ = caps
            .write(&handle, LogLevel::Info, || "{user} {tenant}".into(), None, &[&"bob", &"t1"])
            .unwrap();

        assert_eq!(
            log_mdc::get("user", |v| v.map(str::to_owned)).as_deref(),
            Some("pre-existing")
        );
        assert_eq!(log_mdc::get("tenant", |v| v.map(str::to_owned)), None);
        let _ = log_mdc::remove("user");
    }

    #[test]
    fn flow_context_is_mirrored() {
        context::sync_scope(|| {
            let (caps, seen) = probed(LogLevel::Trace);
            let handle = caps.get_logger("ctx");
            let _req = caps.push_nested("req-3");
            let _tenant = caps.push_mapped("tenant", "acme");
            let _ = caps
                .write(&handle, LogLevel::Warn, || "slow".into(), None, &[])
                .unwrap();

            let seen = seen.lock().pop().unwrap();
            assert_eq!(seen.tenant.as_deref(), Some("acme"));
            assert_eq!(seen.ndc.as_deref(), Some("req-3"));
        });
    }

    #[test]
    fn error_is_appended_to_message() {
        let (caps, seen) = probed(LogLevel::Trace);
        let handle = caps.get_logger("app");
        let err = std::io::Error::other("refused");
        let _ = caps
            .write(&handle, LogLevel::Fatal, || "cannot start".into(), Some(&err), &[])
            .unwrap();
        assert_eq!(seen.lock().pop().unwrap().message, "cannot start\nrefused");
    }
}
