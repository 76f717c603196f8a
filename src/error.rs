//! Error types for the bridge.

use thiserror::Error;

/// Result type alias using [`BridgeError`].
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur in the bridge.
///
/// Startup errors (configuration, unreachable stores, broker refusal) are
/// fatal; everything per-message is contained in the pipeline and surfaces
/// as a logged drop instead of one of these.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Site directory cannot be reached.
    #[error("Site directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// Site directory query failed.
    #[error("Site directory query failed: {0}")]
    DirectoryQuery(String),

    /// Sensor DB cannot be reached.
    #[error("Sensor DB unavailable: {0}")]
    SinkUnavailable(String),

    /// Sensor DB rejected or failed a write.
    #[error("Sensor DB write failed: {0}")]
    SinkWrite(String),

    /// MQTT client or connection error.
    #[error("MQTT error: {0}")]
    Mqtt(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an MQTT error.
    pub fn mqtt(msg: impl Into<String>) -> Self {
        Self::Mqtt(msg.into())
    }
}
