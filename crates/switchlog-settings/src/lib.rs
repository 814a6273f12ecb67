//! # switchlog-settings
//!
//! Configuration for the switchlog facade: which backend to bind and how each
//! adapter is tuned.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`LoggingSettings::default()`]
//! 2. **User file**: `$SWITCHLOG_SETTINGS` or `~/.switchlog/settings.json`
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `SWITCHLOG_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings, load_settings_from_path,
    settings_path,
};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
static SETTINGS: OnceLock<LoggingSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from disk with env var overrides. If
/// loading fails, the failure is logged and compiled defaults are used.
pub fn get_settings() -> &'static LoggingSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load logging settings, using defaults");
            LoggingSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: LoggingSettings) -> std::result::Result<(), LoggingSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
