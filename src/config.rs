//! Bridge configuration.
//!
//! Loaded from a JSON5 file. The three connection sections (`broker`,
//! `directory`, `sensor_db`) are required; `pipeline` and `logging` have
//! defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BridgeError, Result};

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// MQTT broker connection settings.
    pub broker: BrokerConfig,

    /// Document store holding the Site Records.
    pub directory: DirectoryConfig,

    /// Time-series store receiving the enriched measurements.
    pub sensor_db: SensorDbConfig,

    /// Pipeline behavior.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Load configuration from a JSON5 file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BridgeError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = json5::from_str(&content).map_err(|e| {
            BridgeError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a JSON5 string (without touching the
    /// filesystem).
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = json5::from_str(content)
            .map_err(|e| BridgeError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.broker.host.is_empty() {
            return Err(BridgeError::config("broker.host must not be empty"));
        }
        if self.directory.host.is_empty() {
            return Err(BridgeError::config("directory.host must not be empty"));
        }
        if self.directory.db_name.is_empty() || self.directory.collection.is_empty() {
            return Err(BridgeError::config(
                "directory.db_name and directory.collection must not be empty",
            ));
        }
        if self.sensor_db.host.is_empty() {
            return Err(BridgeError::config("sensor_db.host must not be empty"));
        }
        if self.sensor_db.db_name.is_empty() {
            return Err(BridgeError::config("sensor_db.db_name must not be empty"));
        }
        Ok(())
    }
}

/// MQTT broker connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker hostname or IP address.
    pub host: String,

    /// Broker port.
    pub port: u16,

    /// MQTT client identifier.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Keep-alive interval in seconds.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_client_id() -> String {
    "mqtt-bridge-epcis".to_string()
}

fn default_keep_alive_secs() -> u64 {
    30
}

/// Username/password pair for the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Document store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Store hostname or IP address.
    pub host: String,

    /// Store port.
    pub port: u16,

    /// Authentication credentials.
    pub credentials: Credentials,

    /// Database holding the sites collection.
    pub db_name: String,

    /// Collection holding the Site Records.
    pub collection: String,
}

/// Credentials and TLS settings for the time-series store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorDbCredentials {
    pub username: String,
    pub password: String,

    /// Use HTTPS when talking to the store.
    #[serde(default)]
    pub ssl: bool,

    /// Verify the store's TLS certificate.
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
}

fn default_true() -> bool {
    true
}

/// Time-series store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorDbConfig {
    /// Store hostname or IP address.
    pub host: String,

    /// Store port.
    pub port: u16,

    /// Authentication and TLS settings.
    pub credentials: SensorDbCredentials,

    /// Target database name.
    pub db_name: String,
}

/// Pipeline behavior settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// What to do when a site is found but no sensor mapping matches the
    /// topic's MAC.
    #[serde(default)]
    pub on_unmapped_sensor: UnmappedSensorPolicy,
}

/// Policy for messages whose sensor MAC has no mapping in the Site Record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedSensorPolicy {
    /// Forward with the five topic-derived tags, without `bizLocation`.
    #[default]
    Forward,
    /// Drop the message and log a warning.
    Drop,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
