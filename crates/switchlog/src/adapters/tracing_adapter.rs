//! `tracing` adapter.
//!
//! Records become `tracing` events on the current dispatcher. The logger name,
//! named properties, diagnostic context and error chain travel as event fields
//! so any subscriber layer can filter or format them. `Fatal` is emitted at
//! `ERROR`, the most severe level `tracing` has.
//!
//! Every event carries this module's target. The facade logger name is only
//! the `logger` field, so per-target filter directives (`EnvFilter` and
//! friends) do not see it; enablement is decided by level alone.

use switchlog_core::LogLevel;
use switchlog_settings::TracingSettings;
use tracing::Level;

use super::{context_prefix, error_chain, join_properties};
use crate::capability::{Backend, ContextSupport, LogEvent, Structure};

/// Emits events through whatever `tracing` subscriber is current.
#[derive(Debug, Default)]
pub struct TracingBackend;

impl TracingBackend {
    /// Check that events would go somewhere.
    ///
    /// With `require_subscriber` set, binding fails while the current dispatcher
    /// is the no-op subscriber.
    pub fn probe(settings: &TracingSettings) -> Result<Self, String> {
        if settings.require_subscriber && !subscriber_installed() {
            return Err("no tracing subscriber is installed".to_string());
        }
        Ok(Self)
    }
}

/// True when the current dispatcher is something other than `NoSubscriber`.
pub fn subscriber_installed() -> bool {
    tracing::dispatcher::get_default(|dispatch| !dispatch.is::<tracing::subscriber::NoSubscriber>())
}

const fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error | LogLevel::Fatal => Level::ERROR,
    }
}

// `tracing` needs the level as a constant at each call site.
macro_rules! emit_at {
    ($level:expr, $($fields:tt)*) => {
        match $level {
            Level::TRACE => tracing::event!(Level::TRACE, $($fields)*),
            Level::DEBUG => tracing::event!(Level::DEBUG, $($fields)*),
            Level::INFO => tracing::event!(Level::INFO, $($fields)*),
            Level::WARN => tracing::event!(Level::WARN, $($fields)*),
            _ => tracing::event!(Level::ERROR, $($fields)*),
        }
    };
}

impl Backend for TracingBackend {
    type Handle = Box<str>;

    fn name(&self) -> &'static str {
        "tracing"
    }

    fn logger(&self, name: &str) -> Self::Handle {
        Box::from(name)
    }

    fn is_enabled(&self, _handle: &Self::Handle, level: LogLevel) -> bool {
        match tracing_level(level) {
            Level::TRACE => tracing::enabled!(Level::TRACE),
            Level::DEBUG => tracing::enabled!(Level::DEBUG),
            Level::INFO => tracing::enabled!(Level::INFO),
            Level::WARN => tracing::enabled!(Level::WARN),
            _ => tracing::enabled!(Level::ERROR),
        }
    }

    fn write(&self, handle: &Self::Handle, event: &LogEvent<'_>) {
        let properties = join_properties(event.properties);
        let context = Some(context_prefix(event.context))
            .map(|c| c.trim_end().to_owned())
            .filter(|c| !c.is_empty());
        let error = event.error.map(error_chain);
        let fatal = event.level == LogLevel::Fatal;

        emit_at!(
            tracing_level(event.level),
            logger = &**handle,
            properties = properties.as_deref(),
            context = context.as_deref(),
            error = error.as_deref(),
            fatal,
            "{}",
            event.message
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
