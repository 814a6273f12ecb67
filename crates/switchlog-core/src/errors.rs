//! Error types for binding backends and formatting message templates.
//!
//! - [`BackendUnavailable`]: raised once, when a provider is bound
//! - [`FormatError`]: raised synchronously by the formatting helpers
//! - [`LogError`]: the union, for callers that handle both

use thiserror::Error;

use crate::kind::BackendKind;

/// The requested backend cannot be used in this process.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("logging backend '{kind}' is unavailable: {reason}")]
pub struct BackendUnavailable {
    /// Backend that was requested.
    pub kind: BackendKind,
    /// Why the binder rejected it.
    pub reason: String,
}

impl BackendUnavailable {
    /// Create a new unavailability error.
    pub fn new(kind: BackendKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// What went wrong while rendering a template.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormatErrorKind {
    /// A positional placeholder points past the supplied arguments.
    #[error("placeholder {{{index}}} has no argument ({supplied} supplied)")]
    MissingArgument {
        /// Referenced index.
        index: usize,
        /// Number of arguments supplied.
        supplied: usize,
    },
    /// A placeholder body is not `index[,alignment][:format]`.
    #[error("invalid placeholder '{{{placeholder}}}'")]
    InvalidPlaceholder {
        /// Text between the braces.
        placeholder: String,
    },
    /// An alignment wider than [`crate::formatter::MAX_ALIGNMENT`].
    #[error("alignment {alignment} is out of range")]
    AlignmentOutOfRange {
        /// Requested alignment.
        alignment: i32,
    },
    /// A `{` is never closed.
    #[error("unclosed '{{' at byte {position}")]
    UnclosedPlaceholder {
        /// Byte offset of the opening brace.
        position: usize,
    },
    /// A lone `}` that is not part of `}}`.
    #[error("unexpected '}}' at byte {position}")]
    UnexpectedClosingBrace {
        /// Byte offset of the brace.
        position: usize,
    },
}

/// A template's placeholders do not reconcile with its arguments.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cannot format message template '{template}': {kind}")]
pub struct FormatError {
    template: String,
    kind: FormatErrorKind,
}

impl FormatError {
    /// Wrap a rendering failure with the template that caused it.
    pub fn new(template: impl Into<String>, kind: FormatErrorKind) -> Self {
        Self {
            template: template.into(),
            kind,
        }
    }

    /// The template as the caller supplied it.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The underlying failure.
    pub fn kind(&self) -> &FormatErrorKind {
        &self.kind
    }
}

/// Any failure surfaced by the facade.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LogError {
    /// Binding failed.
    #[error(transparent)]
    BackendUnavailable(#[from] BackendUnavailable),
    /// Formatting failed.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The process-wide provider was already set.
    #[error("the global log provider is already initialized")]
    AlreadyInitialized,
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, LogError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
