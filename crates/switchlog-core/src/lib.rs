//! # switchlog-core
//!
//! Foundation types shared by every switchlog crate:
//!
//! - [`LogLevel`] and [`BackendKind`]: the level ordering and the backend selector
//! - [`errors`]: binding and formatting failures
//! - [`formatter`]: named-placeholder templates rendered positionally
//! - [`context`]: scoped nested/mapped diagnostic context that follows the logical flow

#![deny(unsafe_code)]

pub mod context;
pub mod errors;
pub mod formatter;
pub mod kind;
pub mod level;

pub use context::{DiagnosticContext, ScopeToken};
pub use errors::{BackendUnavailable, FormatError, FormatErrorKind, LogError, Result};
pub use formatter::{FormattedMessage, format_structured};
pub use kind::BackendKind;
pub use level::LogLevel;
