//! Server configuration.

use std::time::Duration;

use jet9_settings::ServerSettings;
use serde::{Deserialize, Serialize};

use crate::shutdown::DEFAULT_SHUTDOWN_TIMEOUT;

/// Configuration for the jet9 server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
    /// Upper bound on a single action invocation, in seconds.
    pub handler_timeout_secs: u64,
    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// `host:port` string passed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Handler timeout as a [`Duration`].
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_body_bytes: 1024 * 1024,
            handler_timeout_secs: 60,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT.as_secs(),
        }
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            max_body_bytes: settings.max_body_bytes,
            handler_timeout_secs: settings.handler_timeout_secs,
            shutdown_timeout_secs: settings.shutdown_timeout_secs,
        }
    }
}
