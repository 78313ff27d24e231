//! Bridge configuration.
//!
//! All settings are grouped into one [`BridgeConfig`] value that is passed
//! explicitly at startup. Every field has a default, so a configuration file
//! only needs to name what it changes:
//!
//! ```json
//! {
//!   "network": { "ssid": "workshop", "password": "hunter22" },
//!   "client": { "host": "192.168.1.100", "port": 3000 },
//!   "startup": { "networkRetry": { "maxAttempts": 20, "delayMs": 500 } }
//! }
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::heading::HeadingReference;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Read error: {0}")]
    ReadError(#[from] std::io::Error),

    /// The file is not valid configuration JSON.
    #[error("Invalid data: {0}")]
    InvalidData(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("Invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
}

/// Top-level configuration for either role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    pub network: NetworkConfig,
    pub client: ClientConfig,
    pub server: ServerConfig,
    pub startup: StartupConfig,
    pub simulator: SimulatorConfig,
}

/// Network credentials. Device targets use them to associate; on a host
/// the operating system owns the link and they are informational.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkConfig {
    pub ssid: String,
    pub password: String,
}

impl std::fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings for the device client role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Peer host name or address.
    pub host: String,
    pub port: u16,
    /// WebSocket path on the peer.
    pub path: String,
    /// Minimum time between two sensor read + transmit cycles.
    pub send_interval_ms: u64,
    /// Wait before each reconnect attempt.
    pub reconnect_interval_ms: u64,
    /// Upper bound on TCP connect plus WebSocket handshake.
    pub connect_timeout_ms: u64,
    /// Pause between a RESET command and closing the connection.
    pub restart_delay_ms: u64,
    /// Axis convention for heading labels.
    pub heading_reference: HeadingReference,
    /// Readings per calibration capture; 0 acknowledges CALIBRATE only.
    pub calibration_samples: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: 3000,
            path: "/ws".to_string(),
            send_interval_ms: 500,
            reconnect_interval_ms: 3000,
            connect_timeout_ms: 5000,
            restart_delay_ms: 300,
            heading_reference: HeadingReference::Compass,
            calibration_samples: 20,
        }
    }
}

impl ClientConfig {
    /// WebSocket URL of the peer.
    pub fn url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

/// Settings for the broadcast server role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// WebSocket path clients must request.
    pub path: String,
    /// Pause between broadcasts; 0 broadcasts on every loop iteration.
    pub broadcast_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            path: "/ws".to_string(),
            broadcast_interval_ms: 0,
        }
    }
}

impl ServerConfig {
    /// `None` when broadcasting is unthrottled.
    pub fn broadcast_interval(&self) -> Option<Duration> {
        (self.broadcast_interval_ms > 0).then(|| Duration::from_millis(self.broadcast_interval_ms))
    }
}

/// Retry behaviour for a startup precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Total attempts including the first; `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Fixed wait between attempts.
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub const fn bounded(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            delay_ms,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt < max,
            None => true,
        }
    }
}

/// Retry policies for the startup steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartupConfig {
    pub network_retry: RetryPolicy,
    pub sensor_retry: RetryPolicy,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            network_retry: RetryPolicy::default(),
            sensor_retry: RetryPolicy {
                max_attempts: None,
                delay_ms: 1000,
            },
        }
    }
}

/// Parameters of the simulated magnetometer used on hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatorConfig {
    /// Total field strength in µT.
    pub strength_ut: f32,
    pub start_bearing_deg: f32,
    /// Bearing advance per read.
    pub step_deg: f32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            strength_ut: 48.0,
            start_bearing_deg: 0.0,
            step_deg: 8.0,
        }
    }
}

impl BridgeConfig {
    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Check the settings the client role uses.
    pub fn validate_client(&self) -> Result<(), ConfigError> {
        if self.client.host.trim().is_empty() {
            return Err(invalid("client.host", "must not be empty"));
        }
        if self.client.port == 0 {
            return Err(invalid("client.port", "must not be 0"));
        }
        if !self.client.path.starts_with('/') {
            return Err(invalid("client.path", "must start with '/'"));
        }
        if self.client.send_interval_ms == 0 {
            return Err(invalid("client.sendIntervalMs", "must be greater than 0"));
        }
        if self.client.reconnect_interval_ms == 0 {
            return Err(invalid("client.reconnectIntervalMs", "must be greater than 0"));
        }
        if self.client.connect_timeout_ms == 0 {
            return Err(invalid("client.connectTimeoutMs", "must be greater than 0"));
        }
        for (field, policy) in [
            ("startup.networkRetry.maxAttempts", &self.startup.network_retry),
            ("startup.sensorRetry.maxAttempts", &self.startup.sensor_retry),
        ] {
            if policy.max_attempts == Some(0) {
                return Err(invalid(field, "must be at least 1"));
            }
        }
        Ok(())
    }

    /// Check the settings the server role uses.
    pub fn validate_server(&self) -> Result<(), ConfigError> {
        if !self.server.path.starts_with('/') {
            return Err(invalid("server.path", "must start with '/'"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.client.url(), "ws://192.168.1.100:3000/ws");
        assert_eq!(config.client.send_interval(), Duration::from_millis(500));
        assert_eq!(config.client.reconnect_interval(), Duration::from_secs(3));
        assert_eq!(config.client.restart_delay(), Duration::from_millis(300));
        assert_eq!(config.client.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.server.broadcast_interval(), None);
        assert!(config.validate_client().is_ok());
        assert!(config.validate_server().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BridgeConfig::from_json(
            r#"{
                "network": { "ssid": "workshop", "password": "hunter22" },
                "client": { "host": "10.0.0.7", "headingReference": "mathematical" },
                "server": { "broadcastIntervalMs": 100 },
                "startup": { "networkRetry": { "maxAttempts": 20 } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.network.ssid, "workshop");
        assert_eq!(config.client.host, "10.0.0.7");
        assert_eq!(config.client.port, 3000);
        assert_eq!(config.client.heading_reference, HeadingReference::Mathematical);
        assert_eq!(
            config.server.broadcast_interval(),
            Some(Duration::from_millis(100))
        );
        assert_eq!(config.startup.network_retry.max_attempts, Some(20));
        assert_eq!(config.startup.network_retry.delay_ms, 500);
    }

    #[test]
    fn test_invalid_json() {
        let err = BridgeConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidData(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = BridgeConfig::default();
        config.client.send_interval_ms = 0;
        assert!(matches!(
            config.validate_client(),
            Err(ConfigError::InvalidSetting { field: "client.sendIntervalMs", .. })
        ));

        let mut config = BridgeConfig::default();
        config.client.path = "ws".to_string();
        assert!(config.validate_client().is_err());

        let mut config = BridgeConfig::default();
        config.client.connect_timeout_ms = 0;
        assert!(config.validate_client().is_err());

        let mut config = BridgeConfig::default();
        config.startup.sensor_retry = RetryPolicy::bounded(0, 10);
        assert!(config.validate_client().is_err());

        let mut config = BridgeConfig::default();
        config.server.path = "ws".to_string();
        assert!(config.validate_server().is_err());
    }

    #[test]
    fn test_server_ignores_client_settings() {
        let config = BridgeConfig::from_json(
            r#"{ "client": { "host": "", "sendIntervalMs": 0 } }"#,
        )
        .unwrap();
        assert!(config.validate_client().is_err());
        assert!(config.validate_server().is_ok());
    }

    #[test]
    fn test_retry_policy() {
        let forever = RetryPolicy::default();
        assert!(forever.allows_retry_after(1_000_000));

        let bounded = RetryPolicy::bounded(3, 10);
        assert!(bounded.allows_retry_after(1));
        assert!(bounded.allows_retry_after(2));
        assert!(!bounded.allows_retry_after(3));
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let network = NetworkConfig {
            ssid: "workshop".to_string(),
            password: "hunter22".to_string(),
        };
        let debug = format!("{:?}", network);
        assert!(debug.contains("workshop"));
        assert!(!debug.contains("hunter22"));
    }
}
