//! # switchlog
//!
//! A logging facade whose backend is chosen when the process is configured,
//! never per call.
//!
//! - [`binder`]: probes a [`BackendKind`] and binds its [`CapabilitySet`]
//! - [`adapters`]: console, `tracing`, `log`, `env_logger` and `log4rs` backends
//! - [`dispatcher`]: [`Logger`], the level-gated write path with lazy messages
//! - [`helpers`]: `info`, `warn_format`, `error_err` and friends on [`Logger`]
//! - [`provider`]: [`LogProvider`], named loggers and context scopes
//! - [`testing`]: in-memory backends and capture utilities
//!
//! A process usually binds once at startup:
//!
//! ```text
//! switchlog::init_from_settings(switchlog::get_settings())?;
//! let log = switchlog::logger("app::db");
//! log.info_format("connected to {host}", &[&host])?;
//! ```
//!
//! and code that runs before that (or in a process that never binds) falls
//! back to a console provider.

#![deny(unsafe_code)]

pub mod adapters;
pub mod binder;
pub mod capability;
pub mod dispatcher;
pub mod helpers;
pub mod provider;
pub mod testing;

use std::sync::OnceLock;

pub use binder::BackendCatalog;
pub use capability::{Backend, CapabilitySet, ContextSupport, LogEvent, LoggerHandle, Structure};
pub use dispatcher::{FAILED_TO_GENERATE_LOG_MESSAGE, IntoMessage, Logger, ProducerFailure};
pub use provider::LogProvider;
pub use switchlog_core::{
    BackendKind, BackendUnavailable, DiagnosticContext, FormatError, FormatErrorKind, LogError,
    LogLevel, Result, ScopeToken, context,
};
pub use switchlog_settings::{LoggingSettings, get_settings, load_settings};

/// Process-wide provider.
static PROVIDER: OnceLock<LogProvider> = OnceLock::new();

/// Install the process-wide provider. Only the first call succeeds.
pub fn init_provider(provider: LogProvider) -> Result<()> {
    PROVIDER
        .set(provider)
        .map_err(|_| LogError::AlreadyInitialized)
}

/// Bind the backend named in `settings` and install it process-wide.
pub fn init_from_settings(settings: &LoggingSettings) -> Result<()> {
    if PROVIDER.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }
    init_provider(LogProvider::from_settings(settings)?)
}

/// Bind from the global settings (file and environment) and install process-wide.
pub fn init() -> Result<()> {
    init_from_settings(get_settings())
}

/// The process-wide provider.
///
/// Falls back to a console provider with default settings when nothing was
/// installed.
pub fn provider() -> &'static LogProvider {
    PROVIDER.get_or_init(LogProvider::console)
}

/// Logger for `name` from the process-wide provider.
pub fn logger(name: &str) -> Logger {
    provider().logger(name)
}

/// Logger named after `T` from the process-wide provider.
pub fn logger_for<T: ?Sized>() -> Logger {
    provider().logger_for::<T>()
}

/// Push a nested context entry through the process-wide provider.
pub fn open_nested_context(message: &str) -> ScopeToken {
    provider().open_nested_context(message)
}

/// Set a mapped context entry through the process-wide provider.
pub fn open_mapped_context(key: &str, value: &str) -> ScopeToken {
    provider().open_mapped_context(key, value)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
