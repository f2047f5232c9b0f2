//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`Jet9Settings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults,
//!    then reset out-of-range numbers to their defaults
//! 3. Apply `JET9_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{ClientSettings, Jet9Settings, ServerSettings};

/// Accepted `maxBodyBytes` values.
pub const MAX_BODY_BYTES: RangeInclusive<u64> = 1..=1 << 30;

/// Accepted values for every `*TimeoutSecs` setting.
pub const TIMEOUT_SECS: RangeInclusive<u64> = 1..=3600;

/// Resolve the path to the settings file (`~/.jet9/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".jet9").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<Jet9Settings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; a file with invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<Jet9Settings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults with the file at `path` merged over them, no env overrides.
pub fn load_file_layer(path: &Path) -> Result<Jet9Settings> {
    let defaults = serde_json::to_value(Jet9Settings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: Jet9Settings = serde_json::from_value(merged)?;
    enforce_bounds(&mut settings);
    Ok(settings)
}

/// Reset out-of-range numeric values to their defaults, with a warning.
pub fn enforce_bounds(settings: &mut Jet9Settings) {
    let server = ServerSettings::default();
    let client = ClientSettings::default();

    let body = u64::try_from(settings.server.max_body_bytes).unwrap_or(u64::MAX);
    if !MAX_BODY_BYTES.contains(&body) {
        warn!(key = "server.maxBodyBytes", value = body, "out of range, using default");
        settings.server.max_body_bytes = server.max_body_bytes;
    }
    bound_secs(
        "server.handlerTimeoutSecs",
        &mut settings.server.handler_timeout_secs,
        server.handler_timeout_secs,
    );
    bound_secs(
        "server.shutdownTimeoutSecs",
        &mut settings.server.shutdown_timeout_secs,
        server.shutdown_timeout_secs,
    );
    bound_secs(
        "client.timeoutSecs",
        &mut settings.client.timeout_secs,
        client.timeout_secs,
    );
}

fn bound_secs(key: &str, value: &mut u64, default: u64) {
    if !TIMEOUT_SECS.contains(value) {
        warn!(key, value = *value, "out of range, using default");
        *value = default;
    }
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

/// Apply `JET9_*` environment variable overrides.
pub fn apply_env_overrides(settings: &mut Jet9Settings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides looked up through `lookup`.
///
/// Invalid values are ignored with a warning and leave the file/default
/// value in place.
pub fn apply_overrides_from(settings: &mut Jet9Settings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read("JET9_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("JET9_PORT").and_then(|v| parsed("JET9_PORT", &v, parse_u16)) {
        settings.server.port = v;
    }
    if let Some(v) = read("JET9_MAX_BODY_BYTES")
        .and_then(|v| parsed("JET9_MAX_BODY_BYTES", &v, |s| parse_within(s, &MAX_BODY_BYTES)))
        .and_then(|v| usize::try_from(v).ok())
    {
        settings.server.max_body_bytes = v;
    }
    if let Some(v) = read("JET9_HANDLER_TIMEOUT_SECS")
        .and_then(|v| parsed("JET9_HANDLER_TIMEOUT_SECS", &v, |s| parse_within(s, &TIMEOUT_SECS)))
    {
        settings.server.handler_timeout_secs = v;
    }
    if let Some(v) = read("JET9_SHUTDOWN_TIMEOUT_SECS")
        .and_then(|v| parsed("JET9_SHUTDOWN_TIMEOUT_SECS", &v, |s| parse_within(s, &TIMEOUT_SECS)))
    {
        settings.server.shutdown_timeout_secs = v;
    }

    // ── Client ──────────────────────────────────────────────────────
    if let Some(v) = read("JET9_API_HOST") {
        settings.client.host = v;
    }
    if let Some(v) = read("JET9_AUTHTOKEN") {
        settings.client.authtoken = Some(v);
    }
    if let Some(v) = read("JET9_CLIENT_TIMEOUT_SECS")
        .and_then(|v| parsed("JET9_CLIENT_TIMEOUT_SECS", &v, |s| parse_within(s, &TIMEOUT_SECS)))
    {
        settings.client.timeout_secs = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read("JET9_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read("JET9_LOG_JSON").and_then(|v| parsed("JET9_LOG_JSON", &v, parse_bool)) {
        settings.logging.json = v;
    }

    // ── Modules ─────────────────────────────────────────────────────
    if let Some(v) = read("JET9_MODULES") {
        settings.modules = Some(parse_list(&v));
    }
}

// ── Pure parsing functions ──────────────────────────────────────────

/// Parse a boolean: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a port number (`0` allowed for auto-assign).
pub fn parse_u16(val: &str) -> Option<u16> {
    val.parse().ok()
}

/// Parse a `u64` within `min..=max`.
pub fn parse_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn parse_within(val: &str, range: &RangeInclusive<u64>) -> Option<u64> {
    parse_range(val, *range.start(), *range.end())
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parsed<T>(name: &str, val: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let result = parse(val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid env var, ignoring");
    }
    result
}
