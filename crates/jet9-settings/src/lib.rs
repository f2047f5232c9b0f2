//! # jet9-settings
//!
//! Configuration with layered sources for the jet9 server and client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`Jet9Settings::default()`]
//! 2. **User file** — `~/.jet9/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `JET9_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{ClientSettings, Jet9Settings, LoggingSettings, ServerSettings};
