//! MQTT to InfluxDB bridge with EPCIS site enrichment.
//!
//! Startup order: configuration, tracing, site directory (subscription
//! derivation is fatal if the directory is unreachable), sensor DB ping,
//! broker connect and subscribe, then the run loop until Ctrl+C.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use mqtt_bridge_epcis::config::BridgeConfig;
use mqtt_bridge_epcis::directory::{MongoDirectory, SiteDirectory};
use mqtt_bridge_epcis::feed::MessageFeed;
use mqtt_bridge_epcis::init_tracing;
use mqtt_bridge_epcis::pipeline::Pipeline;
use mqtt_bridge_epcis::sink::InfluxSink;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(about = "MQTT to InfluxDB bridge with EPCIS site enrichment")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, default_value = "epcis-bridge.json5")]
    config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = BridgeConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting bridge");

    // Site directory; unreachable at launch is fatal.
    let directory = MongoDirectory::connect(&config.directory).await?;
    let subscriptions = directory
        .list_subscriptions()
        .await
        .context("Failed to derive subscription list from site directory")?;

    tracing::info!(topics = subscriptions.len(), "Derived subscription list");

    // Time-series sink; unreachable at launch is fatal.
    let sink = InfluxSink::new(&config.sensor_db)?;
    sink.ping().await.context("Sensor DB unreachable")?;

    // Broker connection and subscriptions.
    let mut feed = MessageFeed::connect(&config.broker).await?;
    feed.subscribe(&subscriptions).await?;

    let pipeline = Pipeline::new(directory, sink, config.pipeline.on_unmapped_sensor);

    tracing::info!("Bridge running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            message = feed.recv() => {
                pipeline.handle(&message.topic, &message.payload).await;
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
                break;
            }
        }
    }

    tracing::info!("Received shutdown signal");

    // Close the broker connection best-effort; no message draining.
    feed.disconnect().await;

    tracing::info!("Goodbye!");

    Ok(())
}
