//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`LoggingSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `SWITCHLOG_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use switchlog_core::{BackendKind, LogLevel};
use tracing::debug;

use crate::errors::Result;
use crate::types::{ConsoleStream, LoggingSettings};

/// Env var naming an explicit settings file.
pub const SETTINGS_PATH_VAR: &str = "SWITCHLOG_SETTINGS";

/// Resolve the settings file: `$SWITCHLOG_SETTINGS`, else `~/.switchlog/settings.json`.
pub fn settings_path() -> PathBuf {
    if let Some(explicit) = std::env::var(SETTINGS_PATH_VAR).ok().filter(|v| !v.is_empty()) {
        return PathBuf::from(explicit);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".switchlog").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<LoggingSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or invalid values, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<LoggingSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<LoggingSettings> {
    let defaults = serde_json::to_value(LoggingSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading logging settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "logging settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut LoggingSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable source.
///
/// Invalid values are logged and ignored (the file/default value stays).
pub fn apply_overrides(settings: &mut LoggingSettings, lookup: impl Fn(&str) -> Option<String>) {
    let vars = EnvReader { lookup };

    if let Some(v) = vars.parsed("SWITCHLOG_BACKEND", |s| s.parse::<BackendKind>().ok()) {
        settings.backend = v;
    }

    // ── Console ─────────────────────────────────────────────────────
    if let Some(v) = vars.parsed("SWITCHLOG_CONSOLE_LEVEL", parse_level) {
        settings.console.min_level = v;
    }
    if let Some(v) = vars.parsed("SWITCHLOG_CONSOLE_COLOR", parse_bool) {
        settings.console.color = v;
    }
    if let Some(v) = vars.parsed("SWITCHLOG_CONSOLE_STREAM", ConsoleStream::parse) {
        settings.console.stream = v;
    }

    // ── env_logger ──────────────────────────────────────────────────
    if let Some(v) = vars.string("SWITCHLOG_ENV_FILTER") {
        settings.env_logger.filter = v;
    }

    // ── log4rs ──────────────────────────────────────────────────────
    if let Some(v) = vars.parsed("SWITCHLOG_LOG4RS_LEVEL", parse_level) {
        settings.log4rs.level = v;
    }
    if let Some(v) = vars.string("SWITCHLOG_LOG4RS_PATTERN") {
        settings.log4rs.pattern = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a level name strictly (no fallback to `info`).
pub fn parse_level(val: &str) -> Option<LogLevel> {
    val.parse().ok()
}

// ── Variable readers (thin wrappers) ────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn parsed<T>(&self, name: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let val = self.string(name)?;
        let result = parse(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid logging env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
