//! `env_logger` adapter.
//!
//! Owns a private `env_logger::Logger` built from settings; nothing is
//! installed globally, so this adapter can coexist with whatever `log` logger
//! the process has. `env_logger` has no notion of diagnostic context or
//! structured properties, so pushes are no-ops and named placeholders are only
//! rendered. An attached error is appended to the message.

use env_logger::{Builder, Env};
use switchlog_core::LogLevel;
use switchlog_settings::EnvLoggerSettings;

use super::{error_chain, to_log_level};
use crate::capability::{Backend, LogEvent};

/// Writes through a privately owned `env_logger` instance.
pub struct EnvLoggerBackend {
    logger: env_logger::Logger,
}

impl EnvLoggerBackend {
    /// Build the logger from settings.
    pub fn probe(settings: &EnvLoggerSettings) -> Result<Self, String> {
        if settings.filter.trim().is_empty() {
            return Err("env_logger filter directives are empty".to_string());
        }
        Ok(Self::from_builder(builder_for(settings)))
    }

    /// Wrap a caller-configured builder.
    pub fn from_builder(mut builder: Builder) -> Self {
        Self {
            logger: builder.build(),
        }
    }
}

/// `env_logger` builder for the given settings.
///
/// With `respect_rust_log`, `RUST_LOG` wins over the configured filter.
pub fn builder_for(settings: &EnvLoggerSettings) -> Builder {
    if settings.respect_rust_log {
        Builder::from_env(Env::default().default_filter_or(settings.filter.as_str()))
    } else {
        let mut builder = Builder::new();
        let _ = builder.parse_filters(&settings.filter);
        builder
    }
}

impl Backend for EnvLoggerBackend {
    type Handle = Box<str>;

    fn name(&self) -> &'static str {
        "env_logger"
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
        log::Log::log(
            &self.logger,
            &log::Record::builder()
                .level(to_log_level(event.level))
                .target(handle)
                .args(format_args!("{message}"))
                .build(),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
