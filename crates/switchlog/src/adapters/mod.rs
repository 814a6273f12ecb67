//! Backend adapters.
//!
//! | Adapter | Structure | Context |
//! |---|---|---|
//! | [`console::ConsoleBackend`] | simulated | flow |
//! | `tracing_adapter::TracingBackend` | properties | flow |
//! | `log_adapter::LogBackend` | properties | flow |
//! | `env_logger_adapter::EnvLoggerBackend` | simulated | none |
//! | `log4rs_adapter::Log4rsBackend` | properties | flow (mirrored into MDC) |
//!
//! Third-party adapters are compiled only with their Cargo feature.

use std::error::Error;
use std::fmt::Write as _;

use switchlog_core::{DiagnosticContext, LogLevel};

pub mod console;
#[cfg(feature = "env-logger-backend")]
pub mod env_logger_adapter;
#[cfg(feature = "log-backend")]
pub mod log_adapter;
#[cfg(feature = "log4rs-backend")]
pub mod log4rs_adapter;
#[cfg(feature = "tracing-backend")]
pub mod tracing_adapter;

/// Key under which nested context is exported to key/value backends.
pub const NESTED_CONTEXT_KEY: &str = "ndc";

/// Map onto `log`'s levels. `log` has no fatal level.
#[cfg(any(
    feature = "log-backend",
    feature = "env-logger-backend",
    feature = "log4rs-backend"
))]
pub(crate) fn to_log_level(level: LogLevel) -> log::Level {
    match level {
        LogLevel::Trace => log::Level::Trace,
        LogLevel::Debug => log::Level::Debug,
        LogLevel::Info => log::Level::Info,
        LogLevel::Warn => log::Level::Warn,
        LogLevel::Error | LogLevel::Fatal => log::Level::Error,
    }
}

/// Render an error and its sources, one per line after the first.
pub(crate) fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(out, "\n  caused by: {cause}");
        source = cause.source();
    }
    out
}

/// `[a b] {k=v, k2=v2}` rendering of a context snapshot, empty when there is nothing.
pub(crate) fn context_prefix(context: Option<&DiagnosticContext>) -> String {
    let Some(ctx) = context else {
        return String::new();
    };
    let mut out = String::new();
    if let Some(nested) = ctx.nested_text() {
        let _ = write!(out, "[{nested}] ");
    }
    if !ctx.mapped().is_empty() {
        out.push('{');
        for (i, (key, value)) in ctx.mapped().iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{key}={value}");
        }
        out.push_str("} ");
    }
    out
}

/// `k=v k2=v2` rendering of structured properties.
#[cfg(feature = "tracing-backend")]
pub(crate) fn join_properties(properties: &[(String, String)]) -> Option<String> {
    if properties.is_empty() {
        return None;
    }
    let mut out = String::new();
    for (key, value) in properties {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "{key}={value}");
    }
    Some(out)
}

/// Every key/value pair a backend with key/value support should carry:
/// properties first, then mapped context, then the nested stack under [`NESTED_CONTEXT_KEY`].
#[cfg(any(feature = "log-backend", feature = "log4rs-backend"))]
pub(crate) fn key_values(
    properties: &[(String, String)],
    context: Option<&DiagnosticContext>,
) -> Vec<(String, String)> {
    let mut pairs = properties.to_vec();
    if let Some(ctx) = context {
        pairs.extend(ctx.mapped().iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(nested) = ctx.nested_text() {
            pairs.push((NESTED_CONTEXT_KEY.to_owned(), nested));
        }
    }
    pairs
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
