//! Time-series sink.
//!
//! Enriched measurements are written to InfluxDB v1 as raw line protocol
//! over HTTP, one line per write, with second-resolution timestamps. There
//! is no batching and no retry; a failed write drops that message.

use async_trait::async_trait;

use crate::config::SensorDbConfig;
use crate::error::{BridgeError, Result};

/// Sink contract for line-protocol measurement writes.
#[async_trait]
pub trait MeasurementSink: Send + Sync {
    /// Write a single line-protocol measurement.
    async fn write_line(&self, line: &str) -> Result<()>;
}

/// InfluxDB v1 HTTP sink.
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: String,
    ping_url: String,
    db_name: String,
    username: String,
    password: String,
}

impl InfluxSink {
    /// Build the sink from configuration. Does not contact the store; call
    /// [`ping`](Self::ping) at startup to verify reachability.
    pub fn new(config: &SensorDbConfig) -> Result<Self> {
        let scheme = if config.credentials.ssl { "https" } else { "http" };
        let base = format!("{}://{}:{}", scheme, config.host, config.port);

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.credentials.verify_ssl)
            .build()
            .map_err(|e| BridgeError::SinkUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            write_url: format!("{}/write", base),
            ping_url: format!("{}/ping", base),
            db_name: config.db_name.clone(),
            username: config.credentials.username.clone(),
            password: config.credentials.password.clone(),
        })
    }

    /// Check that the store is reachable. Fatal at startup if it is not.
    pub async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .get(&self.ping_url)
            .send()
            .await
            .map_err(|e| BridgeError::SinkUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BridgeError::SinkUnavailable(format!(
                "ping returned {}",
                response.status()
            )));
        }

        tracing::debug!(url = %self.ping_url, "Sensor DB reachable");
        Ok(())
    }
}

#[async_trait]
impl MeasurementSink for InfluxSink {
    async fn write_line(&self, line: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.write_url)
            .query(&[("db", self.db_name.as_str()), ("precision", "s")])
            .basic_auth(&self.username, Some(&self.password))
            .body(line.to_string())
            .send()
            .await
            .map_err(|e| BridgeError::SinkWrite(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BridgeError::SinkWrite(format!(
                "write returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
