//! Settings type definitions.
//!
//! All types use camelCase keys and `#[serde(default)]`, so a partial JSON
//! file only needs the keys it changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root settings type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Jet9Settings {
    /// Listener settings.
    pub server: ServerSettings,
    /// Outbound client settings.
    pub client: ClientSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
    /// Allow-list of module names to load. `None` loads every module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<String>>,
}

/// Listener settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` = auto-assign).
    pub port: u16,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Upper bound on a single action invocation.
    pub handler_timeout_secs: u64,
    /// How long in-flight requests get to finish on shutdown.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8888,
            max_body_bytes: 1024 * 1024,
            handler_timeout_secs: 60,
            shutdown_timeout_secs: 30,
        }
    }
}

/// Outbound client settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Base URL, `http://` or `https://`.
    pub host: String,
    /// Token sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authtoken: Option<String>,
    /// Request timeout.
    pub timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            host: "http://127.0.0.1:8888".to_string(),
            authtoken: None,
            timeout_secs: 30,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level (`trace`..`error`).
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Per-target level overrides, e.g. `{"jet9_rpc": "debug"}`.
    pub module_levels: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            module_levels: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Jet9Settings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8888);
        assert_eq!(settings.server.max_body_bytes, 1024 * 1024);
        assert_eq!(settings.server.handler_timeout_secs, 60);
        assert_eq!(settings.client.host, "http://127.0.0.1:8888");
        assert_eq!(settings.logging.level, "info");
        assert!(settings.modules.is_none());
    }

    #[test]
    fn camel_case_keys() {
        let json = serde_json::to_value(Jet9Settings::default()).unwrap();
        assert!(json["server"].get("maxBodyBytes").is_some());
        assert!(json["server"].get("handlerTimeoutSecs").is_some());
        assert!(json["client"].get("timeoutSecs").is_some());
        assert!(json.get("modules").is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: Jet9Settings =
            serde_json::from_str(r#"{"server": {"port": 9000}, "modules": ["dns"]}"#).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.modules, Some(vec!["dns".to_string()]));
    }
}
