//! Server configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::server::error::Error;

/// HTTP server configuration.
///
/// Every numeric field is positive once a `ServerConfig` exists; partial input
/// goes through [`PartialConfig`] and falls back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Absolute per-connection deadline, in seconds.
    pub request_timeout_secs: u64,
    /// Slowest accepted body upload, in bytes per second.
    pub minimum_transfer_speed: u64,
    /// Largest accepted `Content-Length`, in bytes.
    pub max_content_length: usize,
    /// Emit an access log line per response.
    pub logging: bool,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            minimum_transfer_speed: 100,
            max_content_length: 10 * 1024 * 1024,
            logging: false,
            max_connections: 1024,
        }
    }
}

impl ServerConfig {
    /// The connection deadline as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Load a configuration from a JSON document of [`PartialConfig`] options.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let partial: PartialConfig = serde_json::from_str(json)?;
        Ok(partial.into())
    }
}

/// User-supplied configuration where every option may be left out.
///
/// Unset options, and numeric options set to zero, take the
/// [`ServerConfig::default`] value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialConfig {
    pub request_timeout_seconds: Option<u64>,
    pub minimum_transfer_speed_bytes_per_sec: Option<u64>,
    pub max_content_length_bytes: Option<usize>,
    pub logging_enabled: Option<bool>,
    pub max_connections: Option<usize>,
}

impl From<PartialConfig> for ServerConfig {
    fn from(partial: PartialConfig) -> Self {
        let defaults = ServerConfig::default();
        Self {
            request_timeout_secs: positive_or(partial.request_timeout_seconds, defaults.request_timeout_secs),
            minimum_transfer_speed: positive_or(
                partial.minimum_transfer_speed_bytes_per_sec,
                defaults.minimum_transfer_speed,
            ),
            max_content_length: positive_or(partial.max_content_length_bytes, defaults.max_content_length),
            logging: partial.logging_enabled.unwrap_or(defaults.logging),
            max_connections: positive_or(partial.max_connections, defaults.max_connections),
        }
    }
}

fn positive_or<T: Default + PartialEq>(value: Option<T>, default: T) -> T {
    match value {
        Some(v) if v != T::default() => v,
        _ => default,
    }
}
