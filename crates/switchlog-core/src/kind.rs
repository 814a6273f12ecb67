//! The backend selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which logging backend a provider binds to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Built-in console/stream output. Always available.
    #[default]
    Console,
    /// Events emitted through the `tracing` dispatcher.
    Tracing,
    /// Records handed to whatever `log` logger the process installed.
    Log,
    /// A privately owned `env_logger` instance.
    EnvLogger,
    /// A privately owned `log4rs` instance.
    Log4rs,
}

impl BackendKind {
    /// Every backend kind.
    pub const ALL: [Self; 5] = [
        Self::Console,
        Self::Tracing,
        Self::Log,
        Self::EnvLogger,
        Self::Log4rs,
    ];

    /// Kebab-case name, as used in settings files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Tracing => "tracing",
            Self::Log => "log",
            Self::EnvLogger => "env-logger",
            Self::Log4rs => "log4rs",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend '{0}'")]
pub struct ParseBackendError(pub String);

impl FromStr for BackendKind {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "console" => Ok(Self::Console),
            "tracing" => Ok(Self::Tracing),
            "log" => Ok(Self::Log),
            "env-logger" | "envlogger" => Ok(Self::EnvLogger),
            "log4rs" => Ok(Self::Log4rs),
            _ => Err(ParseBackendError(s.to_owned())),
        }
    }
}
