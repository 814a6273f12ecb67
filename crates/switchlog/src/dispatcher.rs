//! Level-gated dispatch.
//!
//! [`Logger`] is the handle application code writes through. Every call asks
//! the bound backend whether its level is enabled before doing anything else;
//! the message producer only runs once that answer is yes.
//!
//! A producer that fails (returns `Err` or panics) never takes the caller down.
//! The record is still written, with an empty message, and one extra `Error`
//! record reports the failure.

use std::borrow::Cow;
use std::error::Error;
use std::fmt::{self, Display};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use switchlog_core::{FormatError, LogLevel};

use crate::capability::{CapabilitySet, LoggerHandle};

/// Boxed error a message producer may fail with.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Message of the record written when a producer fails.
pub const FAILED_TO_GENERATE_LOG_MESSAGE: &str = "failed to generate log message";

/// Why a message producer did not yield text.
#[derive(Debug, thiserror::Error)]
pub enum ProducerFailure {
    /// The producer returned an error.
    #[error("message producer returned an error")]
    Failed(#[source] BoxError),
    /// The producer panicked.
    #[error("message producer panicked: {0}")]
    Panicked(String),
}

/// Anything a message producer may return.
pub trait IntoMessage {
    /// Convert into the message template.
    fn into_message(self) -> Result<String, ProducerFailure>;
}

impl IntoMessage for String {
    fn into_message(self) -> Result<String, ProducerFailure> {
        Ok(self)
    }
}

impl IntoMessage for &str {
    fn into_message(self) -> Result<String, ProducerFailure> {
        Ok(self.to_owned())
    }
}

impl IntoMessage for Cow<'_, str> {
    fn into_message(self) -> Result<String, ProducerFailure> {
        Ok(self.into_owned())
    }
}

impl<S, E> IntoMessage for Result<S, E>
where
    S: Into<String>,
    E: Into<BoxError>,
{
    fn into_message(self) -> Result<String, ProducerFailure> {
        self.map(Into::into)
            .map_err(|e| ProducerFailure::Failed(e.into()))
    }
}

/// A named logger bound to the provider's backend.
#[derive(Clone)]
pub struct Logger {
    capabilities: Arc<CapabilitySet>,
    handle: LoggerHandle,
}

impl Logger {
    pub(crate) fn new(capabilities: Arc<CapabilitySet>, name: &str) -> Self {
        let handle = capabilities.get_logger(name);
        Self {
            capabilities,
            handle,
        }
    }

    /// Logger name.
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Name of the backend this logger writes to.
    pub fn backend_name(&self) -> &'static str {
        self.capabilities.backend_name()
    }

    /// Whether a record at `level` would be written right now.
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.capabilities.is_enabled(&self.handle, level)
    }

    /// Enablement query without a message; never writes.
    pub fn probe(&self, level: LogLevel) -> bool {
        self.is_enabled(level)
    }

    /// Write one record if `level` is enabled.
    ///
    /// `producer` runs at most once, and only when the level is enabled. The
    /// template it returns is rendered against `args`. Returns whether the
    /// record was written; a template that does not match its arguments is
    /// returned as [`FormatError`].
    pub fn log<F, M>(
        &self,
        level: LogLevel,
        producer: F,
        error: Option<&(dyn Error + 'static)>,
        args: &[&dyn Display],
    ) -> Result<bool, FormatError>
    where
        F: FnOnce() -> M,
        M: IntoMessage,
    {
        let mut failure = None;
        let wrote = self.capabilities.write(
            &self.handle,
            level,
            || match produce(producer) {
                Ok(text) => text,
                Err(err) => {
                    failure = Some(err);
                    String::new()
                }
            },
            error,
            args,
        )?;
        if let Some(failure) = failure {
            self.log_generation_failure(&failure);
        }
        Ok(wrote)
    }

    fn log_generation_failure(&self, failure: &ProducerFailure) {
        let error: &(dyn Error + 'static) = failure;
        let _ = self.capabilities.write(
            &self.handle,
            LogLevel::Error,
            || FAILED_TO_GENERATE_LOG_MESSAGE.to_owned(),
            Some(error),
            &[],
        );
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("backend", &self.backend_name())
            .finish()
    }
}

fn produce<F, M>(producer: F) -> Result<String, ProducerFailure>
where
    F: FnOnce() -> M,
    M: IntoMessage,
{
    match panic::catch_unwind(AssertUnwindSafe(|| producer().into_message())) {
        Ok(message) => message,
        Err(payload) => Err(ProducerFailure::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
