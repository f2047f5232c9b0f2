//! # jet9-logging
//!
//! Structured logging with `tracing`.
//!
//! The filter is built from [`LoggingSettings`]: a default level plus
//! per-target overrides. `RUST_LOG`, when set, replaces it entirely.
//! Output is either JSON lines or the human-readable formatter.

#![deny(unsafe_code)]

use jet9_settings::LoggingSettings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

/// Logging setup failure.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// A global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Build the `EnvFilter` directive string, e.g. `info,jet9_rpc=debug`.
pub fn filter_directives(settings: &LoggingSettings) -> String {
    let mut directives = settings.level.to_lowercase();
    for (target, level) in &settings.module_levels {
        directives.push(',');
        directives.push_str(target);
        directives.push('=');
        directives.push_str(&level.to_lowercase());
    }
    directives
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(settings)));

    if settings.json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_filter(env_filter);
        tracing_subscriber::registry().with(fmt_layer).try_init()?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(env_filter);
        tracing_subscriber::registry().with(fmt_layer).try_init()?;
    }

    tracing::debug!(json = settings.json, level = %settings.level, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives() {
        let settings = LoggingSettings::default();
        assert_eq!(filter_directives(&settings), "info");
    }

    #[test]
    fn module_overrides_are_appended_in_order() {
        let mut settings = LoggingSettings {
            level: "WARN".into(),
            ..LoggingSettings::default()
        };
        let _ = settings
            .module_levels
            .insert("jet9_rpc".into(), "DEBUG".into());
        let _ = settings
            .module_levels
            .insert("jet9_client".into(), "trace".into());
        assert_eq!(
            filter_directives(&settings),
            "warn,jet9_client=trace,jet9_rpc=debug"
        );
    }

    #[test]
    fn second_init_fails_cleanly() {
        let settings = LoggingSettings::default();
        let _ = init_logging(&settings);
        assert!(matches!(init_logging(&settings), Err(LoggingError::Init(_))));
    }
}
