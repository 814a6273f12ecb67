//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`,
//! so a settings file only needs the fields it changes.

use serde::{Deserialize, Serialize};
use switchlog_core::{BackendKind, LogLevel};

use crate::errors::{Result, SettingsError};

/// Root settings for the logging facade.
///
/// ```json
/// {
///   "backend": "log4rs",
///   "log4rs": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Which backend to bind. Defaults to the console.
    pub backend: BackendKind,
    /// Console adapter options.
    pub console: ConsoleSettings,
    /// `tracing` adapter options.
    pub tracing: TracingSettings,
    /// `log` adapter options.
    pub log: LogFacadeSettings,
    /// `env_logger` adapter options.
    pub env_logger: EnvLoggerSettings,
    /// `log4rs` adapter options.
    pub log4rs: Log4rsSettings,
}

impl LoggingSettings {
    /// Settings that select `backend` and keep every other default.
    pub fn for_backend(backend: BackendKind) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Reject values no backend could use.
    pub fn validate(&self) -> Result<()> {
        if self.env_logger.filter.trim().is_empty() {
            return Err(SettingsError::InvalidValue {
                name: "envLogger.filter".into(),
                value: self.env_logger.filter.clone(),
            });
        }
        if self.log4rs.pattern.is_empty() {
            return Err(SettingsError::InvalidValue {
                name: "log4rs.pattern".into(),
                value: String::new(),
            });
        }
        Ok(())
    }
}

/// Output stream for the console and `log4rs` adapters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleStream {
    /// Standard error.
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
}

impl ConsoleStream {
    /// Parse `stderr`/`stdout` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "stderr" => Some(Self::Stderr),
            "stdout" => Some(Self::Stdout),
            _ => None,
        }
    }
}

/// Console adapter options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleSettings {
    /// Lowest level written.
    pub min_level: LogLevel,
    /// Color each line by level.
    pub color: bool,
    /// Destination stream.
    pub stream: ConsoleStream,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Trace,
            color: true,
            stream: ConsoleStream::Stderr,
        }
    }
}

/// `tracing` adapter options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TracingSettings {
    /// Refuse to bind while no subscriber is installed.
    pub require_subscriber: bool,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            require_subscriber: true,
        }
    }
}

/// `log` adapter options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogFacadeSettings {
    /// Refuse to bind while `log::max_level()` is `Off`.
    pub require_logger: bool,
}

impl Default for LogFacadeSettings {
    fn default() -> Self {
        Self {
            require_logger: true,
        }
    }
}

/// `env_logger` adapter options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvLoggerSettings {
    /// Filter directives used when `RUST_LOG` is unset, e.g. `info,hyper=warn`.
    pub filter: String,
    /// Let `RUST_LOG` replace [`filter`](Self::filter).
    pub respect_rust_log: bool,
}

impl Default for EnvLoggerSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            respect_rust_log: true,
        }
    }
}

/// `log4rs` adapter options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Log4rsSettings {
    /// Root logger level. `fatal` is treated as `error`.
    pub level: LogLevel,
    /// `log4rs` pattern encoder string.
    pub pattern: String,
    /// Destination stream.
    pub stream: ConsoleStream,
}

impl Default for Log4rsSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            pattern: "{d(%Y-%m-%d %H:%M:%S)} {l:<5} {t} {X(ndc)(-)} - {m}{n}".to_string(),
            stream: ConsoleStream::Stderr,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults_bind_console() {
        let settings = LoggingSettings::default();
        assert_eq!(settings.backend, BackendKind::Console);
        assert_eq!(settings.console.min_level, LogLevel::Trace);
        assert!(settings.tracing.require_subscriber);
        assert!(settings.log.require_logger);
        assert_eq!(settings.env_logger.filter, "info");
        assert_eq!(settings.log4rs.level, LogLevel::Info);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: LoggingSettings =
            serde_json::from_str(r#"{"backend": "env-logger", "console": {"color": false}}"#)
                .unwrap();
        assert_eq!(settings.backend, BackendKind::EnvLogger);
        assert!(!settings.console.color);
        assert_eq!(settings.console.stream, ConsoleStream::Stderr);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(LoggingSettings::default()).unwrap();
        assert_eq!(json["console"]["minLevel"], "trace");
        assert_eq!(json["envLogger"]["respectRustLog"], true);
        assert_eq!(json["tracing"]["requireSubscriber"], true);
    }

    #[test]
    fn for_backend_sets_only_backend() {
        let settings = LoggingSettings::for_backend(BackendKind::Log4rs);
        assert_eq!(settings.backend, BackendKind::Log4rs);
        assert_eq!(settings.log4rs, Log4rsSettings::default());
    }

    #[test]
    fn validate_rejects_empty_filter() {
        let mut settings = LoggingSettings::default();
        settings.env_logger.filter = "  ".into();
        assert_matches!(
            settings.validate(),
            Err(SettingsError::InvalidValue { ref name, .. }) if name == "envLogger.filter"
        );
    }

    #[test]
    fn validate_rejects_empty_pattern() {
        let mut settings = LoggingSettings::default();
        settings.log4rs.pattern.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn stream_parse() {
        assert_eq!(ConsoleStream::parse("STDOUT"), Some(ConsoleStream::Stdout));
        assert_eq!(ConsoleStream::parse("stderr"), Some(ConsoleStream::Stderr));
        assert_eq!(ConsoleStream::parse("file"), None);
    }
}
