//! Backend selection: one probe per [`BackendKind`].
//!
//! A probe inspects the runtime (is a subscriber installed, does the
//! configuration build) and either returns a bound [`CapabilitySet`] or says
//! why the backend cannot be used. Binding happens once, eagerly, and never
//! falls back to a different kind.

use std::collections::HashMap;
use std::fmt;

use switchlog_core::{BackendKind, BackendUnavailable};
use switchlog_settings::LoggingSettings;
use tracing::{debug, warn};

use crate::adapters::console::ConsoleBackend;
use crate::capability::{Backend, CapabilitySet};

/// Probe for one backend kind.
pub type Probe =
    Box<dyn Fn(&LoggingSettings) -> Result<CapabilitySet, BackendUnavailable> + Send + Sync>;

/// Backend kinds this build can bind, and how to probe each one.
pub struct BackendCatalog {
    probes: HashMap<BackendKind, Probe>,
}

impl BackendCatalog {
    /// Catalog with nothing registered.
    pub fn empty() -> Self {
        Self {
            probes: HashMap::new(),
        }
    }

    /// Catalog with the console adapter plus every adapter compiled into this build.
    pub fn compiled() -> Self {
        let mut catalog = Self::empty();
        catalog.register(BackendKind::Console, |settings: &LoggingSettings| {
            Ok(CapabilitySet::from_backend(ConsoleBackend::new(
                &settings.console,
            )))
        });

        #[cfg(feature = "tracing-backend")]
        catalog.register(BackendKind::Tracing, |settings: &LoggingSettings| {
            use crate::adapters::tracing_adapter::TracingBackend;
            probed(BackendKind::Tracing, TracingBackend::probe(&settings.tracing))
        });

        #[cfg(feature = "log-backend")]
        catalog.register(BackendKind::Log, |settings: &LoggingSettings| {
            use crate::adapters::log_adapter::LogBackend;
            probed(BackendKind::Log, LogBackend::probe(&settings.log))
        });

        #[cfg(feature = "env-logger-backend")]
        catalog.register(BackendKind::EnvLogger, |settings: &LoggingSettings| {
            use crate::adapters::env_logger_adapter::EnvLoggerBackend;
            probed(
                BackendKind::EnvLogger,
                EnvLoggerBackend::probe(&settings.env_logger),
            )
        });

        #[cfg(feature = "log4rs-backend")]
        catalog.register(BackendKind::Log4rs, |settings: &LoggingSettings| {
            use crate::adapters::log4rs_adapter::Log4rsBackend;
            probed(BackendKind::Log4rs, Log4rsBackend::probe(&settings.log4rs))
        });

        catalog
    }

    /// Add or replace the probe for `kind`.
    pub fn register<F>(&mut self, kind: BackendKind, probe: F)
    where
        F: Fn(&LoggingSettings) -> Result<CapabilitySet, BackendUnavailable>
            + Send
            + Sync
            + 'static,
    {
        let _ = self.probes.insert(kind, Box::new(probe));
    }

    /// Whether a probe exists for `kind`.
    pub fn is_registered(&self, kind: BackendKind) -> bool {
        self.probes.contains_key(&kind)
    }

    /// Kinds with a registered probe, in declaration order.
    pub fn kinds(&self) -> Vec<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .filter(|kind| self.is_registered(*kind))
            .collect()
    }

    /// Probe `kind` once and bind it.
    pub fn bind(
        &self,
        kind: BackendKind,
        settings: &LoggingSettings,
    ) -> Result<CapabilitySet, BackendUnavailable> {
        let result = match self.probes.get(&kind) {
            Some(probe) => probe(settings),
            None => Err(BackendUnavailable::new(
                kind,
                "not compiled into this build",
            )),
        };
        match &result {
            Ok(caps) => debug!(
                backend = %kind,
                adapter = caps.backend_name(),
                structure = ?caps.structure(),
                context = ?caps.context_support(),
                "logging backend bound"
            ),
            Err(err) => warn!(backend = %kind, reason = %err.reason, "logging backend unavailable"),
        }
        result
    }
}

impl Default for BackendCatalog {
    fn default() -> Self {
        Self::compiled()
    }
}

impl fmt::Debug for BackendCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendCatalog")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(any(
    feature = "tracing-backend",
    feature = "log-backend",
    feature = "env-logger-backend",
    feature = "log4rs-backend"
))]
fn probed<B: Backend>(
    kind: BackendKind,
    backend: Result<B, String>,
) -> Result<CapabilitySet, BackendUnavailable> {
    backend
        .map(CapabilitySet::from_backend)
        .map_err(|reason| BackendUnavailable::new(kind, reason))
}

/// Bind `kind` with the adapters compiled into this build.
pub fn bind(
    kind: BackendKind,
    settings: &LoggingSettings,
) -> Result<CapabilitySet, BackendUnavailable> {
    BackendCatalog::compiled().bind(kind, settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
