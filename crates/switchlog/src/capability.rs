//! The capability contract every backend implements, and its bound form.
//!
//! A [`Backend`] is statically typed: its logger handle type is its own. The
//! binder erases it into a [`CapabilitySet`], a table of shared closures that the
//! dispatcher can call without knowing which backend sits behind it. The set is
//! built once per backend selection and never mutated afterwards.

use std::any::Any;
use std::error::Error;
use std::fmt::{self, Display};
use std::sync::Arc;

use switchlog_core::context::{self, DiagnosticContext, ScopeToken};
use switchlog_core::{FormatError, LogLevel, format_structured};

/// How a backend receives positional arguments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Structure {
    /// Rendered text only; placeholder names are discarded.
    #[default]
    Simulated,
    /// Rendered text plus `name = value` pairs for each named placeholder.
    Properties,
}

/// Whether a backend can attach diagnostic context to its records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContextSupport {
    /// Pushes are accepted and ignored.
    #[default]
    None,
    /// Pushes go to the flow-scoped context stack, and each write carries a snapshot.
    Flow,
}

/// One record as handed to a backend's write operation.
#[derive(Clone, Copy, Debug)]
pub struct LogEvent<'a> {
    /// Severity.
    pub level: LogLevel,
    /// Logger name the record was written through.
    pub logger: &'a str,
    /// Rendered message text.
    pub message: &'a str,
    /// Attached error, if any.
    pub error: Option<&'a (dyn Error + 'static)>,
    /// Named placeholder values (empty for [`Structure::Simulated`] backends).
    pub properties: &'a [(String, String)],
    /// Diagnostic context at the time of the call (only for [`ContextSupport::Flow`]).
    pub context: Option<&'a DiagnosticContext>,
}

/// The fixed contract a logging backend exposes to the binder.
pub trait Backend: Send + Sync + 'static {
    /// Backend-specific state for one named logger.
    type Handle: Send + Sync + 'static;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Create the handle for a named logger.
    fn logger(&self, name: &str) -> Self::Handle;

    /// Ask the backend whether `level` is enabled for `handle`.
    fn is_enabled(&self, handle: &Self::Handle, level: LogLevel) -> bool;

    /// Write one record. Only called after `is_enabled` returned true.
    fn write(&self, handle: &Self::Handle, event: &LogEvent<'_>);

    /// How positional arguments reach this backend.
    fn structure(&self) -> Structure {
        Structure::Simulated
    }

    /// Whether this backend attaches diagnostic context.
    fn context_support(&self) -> ContextSupport {
        ContextSupport::None
    }
}

/// Opaque handle identifying a named logger inside the bound backend.
#[derive(Clone)]
pub struct LoggerHandle {
    name: Arc<str>,
    state: Arc<dyn Any + Send + Sync>,
}

impl LoggerHandle {
    fn new<H: Send + Sync + 'static>(name: &str, state: H) -> Self {
        Self {
            name: Arc::from(name),
            state: Arc::new(state),
        }
    }

    /// Logger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn state<H: 'static>(&self) -> Option<&H> {
        self.state.downcast_ref::<H>()
    }
}

impl fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

type GetLoggerFn = Box<dyn Fn(&str) -> LoggerHandle + Send + Sync>;
type IsEnabledFn = Box<dyn Fn(&LoggerHandle, LogLevel) -> bool + Send + Sync>;
type WriteFn = Box<dyn Fn(&LoggerHandle, &LogEvent<'_>) + Send + Sync>;
type PushNestedFn = Box<dyn Fn(&str) -> ScopeToken + Send + Sync>;
type PushMappedFn = Box<dyn Fn(&str, &str) -> ScopeToken + Send + Sync>;

fn flow_push_pair() -> (PushNestedFn, PushMappedFn) {
    (
        Box::new(|message: &str| context::push_nested(message)),
        Box::new(|key: &str, value: &str| context::push_mapped(key, value)),
    )
}

fn noop_push_pair() -> (PushNestedFn, PushMappedFn) {
    (
        Box::new(|_: &str| ScopeToken::noop()),
        Box::new(|_: &str, _: &str| ScopeToken::noop()),
    )
}

/// Bound operations for one backend.
pub struct CapabilitySet {
    backend_name: &'static str,
    structure: Structure,
    context_support: ContextSupport,
    get_logger: GetLoggerFn,
    is_enabled: IsEnabledFn,
    write: WriteFn,
    push_nested: PushNestedFn,
    push_mapped: PushMappedFn,
}

impl CapabilitySet {
    /// Bind a backend's operations into a capability table.
    ///
    /// Backends without context support get push operations that return
    /// no-op tokens.
    pub fn from_backend<B: Backend>(backend: B) -> Self {
        let backend_name = backend.name();
        let structure = backend.structure();
        let context_support = backend.context_support();
        let backend = Arc::new(backend);

        let get_logger: GetLoggerFn = {
            let backend = Arc::clone(&backend);
            Box::new(move |name: &str| LoggerHandle::new(name, backend.logger(name)))
        };
        let is_enabled: IsEnabledFn = {
            let backend = Arc::clone(&backend);
            Box::new(move |handle: &LoggerHandle, level: LogLevel| {
                handle
                    .state::<B::Handle>()
                    .is_some_and(|state| backend.is_enabled(state, level))
            })
        };
        let write: WriteFn = Box::new(move |handle: &LoggerHandle, event: &LogEvent<'_>| {
            if let Some(state) = handle.state::<B::Handle>() {
                backend.write(state, event);
            }
        });
        let (push_nested, push_mapped) = match context_support {
            ContextSupport::Flow => flow_push_pair(),
            ContextSupport::None => noop_push_pair(),
        };

        Self {
            backend_name,
            structure,
            context_support,
            get_logger,
            is_enabled,
            write,
            push_nested,
            push_mapped,
        }
    }

    /// Name of the bound backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }

    /// How positional arguments reach the bound backend.
    pub fn structure(&self) -> Structure {
        self.structure
    }

    /// Whether the bound backend attaches diagnostic context.
    pub fn context_support(&self) -> ContextSupport {
        self.context_support
    }

    /// Create a handle for a named logger.
    pub fn get_logger(&self, name: &str) -> LoggerHandle {
        (self.get_logger)(name)
    }

    /// Ask the backend whether `level` is enabled. Never cached.
    pub fn is_enabled(&self, handle: &LoggerHandle, level: LogLevel) -> bool {
        (self.is_enabled)(handle, level)
    }

    /// Push a nested context entry through the bound operation.
    pub fn push_nested(&self, message: &str) -> ScopeToken {
        (self.push_nested)(message)
    }

    /// Push a mapped context entry through the bound operation.
    pub fn push_mapped(&self, key: &str, value: &str) -> ScopeToken {
        (self.push_mapped)(key, value)
    }

    /// Gate, render, enrich and write one record.
    ///
    /// `message` is only called when the level is enabled. Returns whether the
    /// record reached the backend.
    pub fn write<F>(
        &self,
        handle: &LoggerHandle,
        level: LogLevel,
        message: F,
        error: Option<&(dyn Error + 'static)>,
        args: &[&dyn Display],
    ) -> Result<bool, FormatError>
    where
        F: FnOnce() -> String,
    {
        if !self.is_enabled(handle, level) {
            return Ok(false);
        }

        let template = message();
        let formatted = format_structured(&template, args)?;
        let properties = match self.structure {
            Structure::Properties => formatted.properties(args),
            Structure::Simulated => Vec::new(),
        };
        let context = match self.context_support {
            ContextSupport::Flow => Some(context::snapshot()).filter(|ctx| !ctx.is_empty()),
            ContextSupport::None => None,
        };

        (self.write)(
            handle,
            &LogEvent {
                level,
                logger: handle.name(),
                message: &formatted.text,
                error,
                properties: &properties,
                context: context.as_ref(),
            },
        );
        Ok(true)
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySet")
            .field("backend", &self.backend_name)
            .field("structure", &self.structure)
            .field("context_support", &self.context_support)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::testing::MemoryBackend;

    #[test]
    fn disabled_level_skips_message() {
        let backend = MemoryBackend::new(LogLevel::Warn);
        let records = backend.records();
        let caps = CapabilitySet::from_backend(backend);
        let handle = caps.get_logger("svc");
        let called = Cell::new(false);

        let wrote = caps
            .write(
                &handle,
                LogLevel::Info,
                || {
                    called.set(true);
                    "hidden".into()
                },
                None,
                &[],
            )
            .unwrap();

        assert!(!wrote);
        assert!(!called.get());
        assert!(records.is_empty());
    }

    #[test]
    fn properties_follow_structure() {
        let simulated = MemoryBackend::new(LogLevel::Trace).with_structure(Structure::Simulated);
        let sim_records = simulated.records();
        let caps = CapabilitySet::from_backend(simulated);
        let handle = caps.get_logger("a");
        let _ = caps
            .write(&handle, LogLevel::Info, || "{user}".into(), None, &[&"bob"])
            .unwrap();
        assert!(sim_records.last().unwrap().properties.is_empty());

        let structured = MemoryBackend::new(LogLevel::Trace).with_structure(Structure::Properties);
        let records = structured.records();
        let caps = CapabilitySet::from_backend(structured);
        let handle = caps.get_logger("b");
        let _ = caps
            .write(&handle, LogLevel::Info, || "{user}".into(), None, &[&"bob"])
            .unwrap();
        let record = records.last().unwrap();
        assert_eq!(record.message, "bob");
        assert_eq!(record.properties, vec![("user".to_owned(), "bob".to_owned())]);
    }

    #[test]
    fn no_context_support_yields_noop_tokens() {
        let caps = CapabilitySet::from_backend(
            MemoryBackend::new(LogLevel::Trace).with_context_support(ContextSupport::None),
        );
        let token = caps.push_mapped("tenant", "X");
        assert!(token.is_noop());
        assert_eq!(context::mapped_value("tenant"), None);
        token.release();
    }

    #[test]
    fn flow_context_is_pushed_and_snapshotted() {
        context::sync_scope(|| {
            let backend = MemoryBackend::new(LogLevel::Trace);
            let records = backend.records();
            let caps = CapabilitySet::from_backend(backend);
            let handle = caps.get_logger("ctx");

            let _token = caps.push_mapped("tenant", "X");
            let _ = caps.write(&handle, LogLevel::Info, || "m".into(), None, &[]).unwrap();

            let record = records.last().unwrap();
            let ctx = record.context.as_ref().unwrap();
            assert_eq!(ctx.get("tenant"), Some("X"));
        });
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let first = CapabilitySet::from_backend(MemoryBackend::new(LogLevel::Trace));
        let second = CapabilitySet::from_backend(crate::adapters::console::ConsoleBackend::with_writer(
            &switchlog_settings::ConsoleSettings::default(),
            std::io::sink(),
        ));
        let handle = second.get_logger("console");
        assert!(!first.is_enabled(&handle, LogLevel::Fatal));
    }

    #[test]
    fn debug_output_names_backend() {
        let caps = CapabilitySet::from_backend(MemoryBackend::new(LogLevel::Trace));
        let text = format!("{caps:?}");
        assert!(text.contains("memory"));
    }
}
