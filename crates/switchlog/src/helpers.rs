//! Per-level shorthands on [`Logger`].
//!
//! For every level there is an enablement check, a plain write, a lazy write,
//! a template write and a template write with an attached error. All of them
//! go through [`Logger::log`], so they share its gating and its handling of
//! failing producers.

use std::error::Error;
use std::fmt::Display;

use switchlog_core::{FormatError, LogLevel};

use crate::dispatcher::{IntoMessage, Logger};

macro_rules! level_helpers {
    ($(
        $level:ident: $is_enabled:ident, $plain:ident, $lazy:ident, $format:ident, $err:ident;
    )*) => {
        impl Logger {
            $(
                #[doc = concat!("Whether `", stringify!($level), "` records would be written.")]
                pub fn $is_enabled(&self) -> bool {
                    self.is_enabled(LogLevel::$level)
                }

                #[doc = concat!("Write plain text at `", stringify!($level), "`; braces are not interpreted.")]
                pub fn $plain(&self, message: &str) {
                    let _ = self.log(LogLevel::$level, || message, None, &[]);
                }

                #[doc = concat!("Write at `", stringify!($level), "`, building the text only if enabled.")]
                pub fn $lazy<F, M>(&self, producer: F)
                where
                    F: FnOnce() -> M,
                    M: IntoMessage,
                {
                    let _ = self.log(LogLevel::$level, producer, None, &[]);
                }

                #[doc = concat!("Render `template` against `args` and write at `", stringify!($level), "`.")]
                pub fn $format(&self, template: &str, args: &[&dyn Display]) -> Result<(), FormatError> {
                    self.log(LogLevel::$level, || template, None, args).map(|_| ())
                }

                #[doc = concat!("Like [`Logger::", stringify!($format), "`], with an attached error.")]
                pub fn $err(
                    &self,
                    error: &(dyn Error + 'static),
                    template: &str,
                    args: &[&dyn Display],
                ) -> Result<(), FormatError> {
                    self.log(LogLevel::$level, || template, Some(error), args).map(|_| ())
                }
            )*
        }
    };
}

level_helpers! {
    Trace: is_trace_enabled, trace, trace_lazy, trace_format, trace_err;
    Debug: is_debug_enabled, debug, debug_lazy, debug_format, debug_err;
    Info: is_info_enabled, info, info_lazy, info_format, info_err;
    Warn: is_warn_enabled, warn, warn_lazy, warn_format, warn_err;
    Error: is_error_enabled, error, error_lazy, error_format, error_err;
    Fatal: is_fatal_enabled, fatal, fatal_lazy, fatal_format, fatal_err;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
