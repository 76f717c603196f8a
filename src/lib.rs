//! MQTT bridge that enriches sensor telemetry with EPCIS site metadata.
//!
//! The bridge subscribes to sensor topics derived from a site directory,
//! resolves location metadata per message, appends it to the InfluxDB
//! line-protocol payload, and forwards the result to the time-series store.
//!
//! # Topic format
//!
//! ```text
//! <company>/<site>/<country>/<city>/<sensorMAC>[/<sensorType>]
//! ```
//!
//! # Enrichment
//!
//! For the topic `acme/plantA/DE/Bremen/AA:BB:CC:DD:EE:FF/temp` and payload
//! `temp,unit=C value=21.5 1000000000`, the forwarded line is:
//!
//! ```text
//! temp,unit=C,company=acme,site=plantA,country=DE,city=Bremen,sID=AA:BB:CC:DD:EE:FF,bizLocation=hall1 value=21.5 1000000000
//! ```

pub mod config;
pub mod directory;
pub mod enrich;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod sink;
pub mod topic;

// Re-export commonly used types at the crate root
pub use config::{BridgeConfig, LogFormat, LoggingConfig, UnmappedSensorPolicy};
pub use directory::{MongoDirectory, SensorMapping, SiteDirectory, SiteRecord};
pub use error::{BridgeError, Result};
pub use feed::{InboundMessage, MessageFeed};
pub use pipeline::{DropReason, Outcome, Pipeline};
pub use sink::{InfluxSink, MeasurementSink};
pub use topic::TopicTags;

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| {
                    BridgeError::config(format!("Failed to initialize tracing: {}", e))
                })?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| {
                    BridgeError::config(format!("Failed to initialize tracing: {}", e))
                })?;
        }
    }

    Ok(())
}
