//! The object application code gets loggers from.
//!
//! A [`LogProvider`] owns one bound [`CapabilitySet`] for its whole lifetime
//! and caches one [`Logger`] per name.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use switchlog_core::{BackendKind, BackendUnavailable, ScopeToken};
use switchlog_settings::{ConsoleSettings, LoggingSettings};

use crate::adapters::console::ConsoleBackend;
use crate::binder::{self, BackendCatalog};
use crate::capability::{Backend, CapabilitySet};
use crate::dispatcher::Logger;

/// Hands out named loggers bound to a single backend.
pub struct LogProvider {
    capabilities: Arc<CapabilitySet>,
    loggers: DashMap<String, Logger>,
}

impl LogProvider {
    /// Provider over an already bound capability set.
    pub fn new(capabilities: CapabilitySet) -> Self {
        Self {
            capabilities: Arc::new(capabilities),
            loggers: DashMap::new(),
        }
    }

    /// Provider over a backend value.
    pub fn from_backend<B: Backend>(backend: B) -> Self {
        Self::new(CapabilitySet::from_backend(backend))
    }

    /// Console provider with default console settings.
    pub fn console() -> Self {
        Self::from_backend(ConsoleBackend::new(&ConsoleSettings::default()))
    }

    /// Probe and bind `kind` with the adapters compiled into this build.
    pub fn bind(kind: BackendKind, settings: &LoggingSettings) -> Result<Self, BackendUnavailable> {
        binder::bind(kind, settings).map(Self::new)
    }

    /// Probe and bind `kind` through a custom catalog.
    pub fn bind_with(
        catalog: &BackendCatalog,
        kind: BackendKind,
        settings: &LoggingSettings,
    ) -> Result<Self, BackendUnavailable> {
        catalog.bind(kind, settings).map(Self::new)
    }

    /// Bind the backend named by `settings.backend`.
    pub fn from_settings(settings: &LoggingSettings) -> Result<Self, BackendUnavailable> {
        Self::bind(settings.backend, settings)
    }

    /// Name of the bound backend.
    pub fn backend_name(&self) -> &'static str {
        self.capabilities.backend_name()
    }

    /// The bound capability set.
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Logger for `name`, created on first request and cached afterwards.
    ///
    /// First requests for the same name are serialized, so the backend is
    /// asked for each name at most once.
    pub fn logger(&self, name: &str) -> Logger {
        if let Some(logger) = self.loggers.get(name) {
            return logger.clone();
        }
        self.loggers
            .entry(name.to_owned())
            .or_insert_with(|| Logger::new(Arc::clone(&self.capabilities), name))
            .clone()
    }

    /// Logger named after the full path of `T`.
    pub fn logger_for<T: ?Sized>(&self) -> Logger {
        self.logger(type_name::<T>())
    }

    /// Number of cached loggers.
    pub fn cached_loggers(&self) -> usize {
        self.loggers.len()
    }

    /// Push a nested context entry until the token is released.
    pub fn open_nested_context(&self, message: &str) -> ScopeToken {
        self.capabilities.push_nested(message)
    }

    /// Set `key` in the mapped context until the token is released.
    pub fn open_mapped_context(&self, key: &str, value: &str) -> ScopeToken {
        self.capabilities.push_mapped(key, value)
    }
}

impl fmt::Debug for LogProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogProvider")
            .field("backend", &self.backend_name())
            .field("loggers", &self.loggers.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Barrier;
    use std::thread;

    use parking_lot::Mutex;
    use switchlog_core::{LogLevel, context};

    use super::*;
    use crate::capability::{ContextSupport, LogEvent};
    use crate::testing::MemoryBackend;

    struct PaymentService;

    /// Counts handle creations per logger name.
    #[derive(Clone, Default)]
    struct CountingBackend {
        created: Arc<Mutex<HashMap<String, usize>>>,
    }

    impl Backend for CountingBackend {
        type Handle = ();

        fn name(&self) -> &'static str {
            "counting"
        }

        fn logger(&self, name: &str) -> Self::Handle {
            // Widen the window between lookup and insert.
            thread::yield_now();
            *self.created.lock().entry(name.to_owned()).or_default() += 1;
        }

        fn is_enabled(&self, _handle: &Self::Handle, _level: LogLevel) -> bool {
            true
        }

        fn write(&self, _handle: &Self::Handle, _event: &LogEvent<'_>) {}
    }

    #[test]
    fn loggers_are_cached_by_name() {
        let provider = LogProvider::from_backend(MemoryBackend::new(LogLevel::Info));
        let a = provider.logger("db");
        let b = provider.logger("db");
        let _c = provider.logger("http");
        assert_eq!(a.name(), b.name());
        assert_eq!(provider.cached_loggers(), 2);
    }

    #[test]
    fn concurrent_first_requests_create_one_handle_per_name() {
        let backend = CountingBackend::default();
        let created = Arc::clone(&backend.created);
        let provider = LogProvider::from_backend(backend);
        let names = ["db", "http", "cache", "queue"];
        let threads = 8;
        let barrier = Barrier::new(threads);

        thread::scope(|s| {
            for _ in 0..threads {
                let _ = s.spawn(|| {
                    let _ = barrier.wait();
                    for name in names {
                        assert_eq!(provider.logger(name).name(), name);
                    }
                });
            }
        });

        assert_eq!(provider.cached_loggers(), names.len());
        let created = created.lock();
        for name in names {
            assert_eq!(created.get(name), Some(&1), "{name}");
        }
    }

    #[test]
    fn logger_for_uses_type_path() {
        let provider = LogProvider::from_backend(MemoryBackend::new(LogLevel::Info));
        let log = provider.logger_for::<PaymentService>();
        assert!(log.name().ends_with("provider::tests::PaymentService"));
    }

    #[test]
    fn context_scopes_go_through_bound_backend() {
        context::sync_scope(|| {
            let provider = LogProvider::from_backend(MemoryBackend::new(LogLevel::Info));
            let token = provider.open_mapped_context("tenant", "acme");
            assert_eq!(context::mapped_value("tenant").as_deref(), Some("acme"));
            token.release();
            assert_eq!(context::mapped_value("tenant"), None);

            let nested = provider.open_nested_context("req-1");
            assert_eq!(context::nested_messages(), vec!["req-1".to_owned()]);
            drop(nested);
            assert!(context::nested_messages().is_empty());
        });
    }

    #[test]
    fn unsupported_context_yields_noop_tokens() {
        let provider = LogProvider::from_backend(
            MemoryBackend::new(LogLevel::Info).with_context_support(ContextSupport::None),
        );
        let token = provider.open_nested_context("ignored");
        assert!(token.is_noop());
        assert!(context::nested_messages().is_empty());
    }

    #[test]
    fn from_settings_binds_console_by_default() {
        let provider = LogProvider::from_settings(&LoggingSettings::default()).unwrap();
        assert_eq!(provider.backend_name(), "console");
    }

    #[test]
    fn bind_with_custom_catalog() {
        let mut catalog = BackendCatalog::empty();
        catalog.register(BackendKind::Log, |_: &LoggingSettings| {
            Ok(CapabilitySet::from_backend(MemoryBackend::new(LogLevel::Trace)))
        });
        let provider =
            LogProvider::bind_with(&catalog, BackendKind::Log, &LoggingSettings::default()).unwrap();
        assert_eq!(provider.backend_name(), "memory");

        let err = LogProvider::bind_with(&catalog, BackendKind::Tracing, &LoggingSettings::default())
            .unwrap_err();
        assert_eq!(err.kind, BackendKind::Tracing);
    }

    #[test]
    fn debug_reports_backend() {
        let provider = LogProvider::console();
        assert!(format!("{provider:?}").contains("console"));
    }
}
