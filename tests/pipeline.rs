//! End-to-end pipeline tests against in-memory directory and sink doubles.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mqtt_bridge_epcis::config::UnmappedSensorPolicy;
use mqtt_bridge_epcis::directory::{SensorMapping, SiteDirectory, SiteRecord};
use mqtt_bridge_epcis::error::{BridgeError, Result};
use mqtt_bridge_epcis::pipeline::{DropReason, Outcome, Pipeline};
use mqtt_bridge_epcis::sink::MeasurementSink;

/// In-memory site directory.
struct MemoryDirectory {
    sites: Vec<SiteRecord>,
}

#[async_trait]
impl SiteDirectory for MemoryDirectory {
    async fn list_subscriptions(&self) -> Result<Vec<(String, u8)>> {
        Ok(self.sites.iter().map(|s| (s.topic.clone(), 0)).collect())
    }

    async fn find_site(
        &self,
        company: &str,
        site_name: &str,
        city: &str,
    ) -> Result<Option<SiteRecord>> {
        Ok(self
            .sites
            .iter()
            .find(|s| s.company == company && s.site_name == site_name && s.city == city)
            .cloned())
    }
}

/// Sink that records every written line.
#[derive(Clone, Default)]
struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl MeasurementSink for RecordingSink {
    async fn write_line(&self, line: &str) -> Result<()> {
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

/// Sink that rejects every write.
struct FailingSink;

#[async_trait]
impl MeasurementSink for FailingSink {
    async fn write_line(&self, _line: &str) -> Result<()> {
        Err(BridgeError::SinkWrite("connection reset".to_string()))
    }
}

fn bremen_site() -> SiteRecord {
    SiteRecord {
        company: "acme".to_string(),
        site_name: "plantA".to_string(),
        city: "Bremen".to_string(),
        topic: "acme/plantA/DE/Bremen/#".to_string(),
        sensors: vec![SensorMapping {
            mac: "AA:BB:CC:DD:EE:FF".to_string(),
            biz_location: "hall1".to_string(),
        }],
    }
}

fn pipeline_with(
    sites: Vec<SiteRecord>,
    policy: UnmappedSensorPolicy,
) -> (Pipeline<MemoryDirectory, RecordingSink>, RecordingSink) {
    let sink = RecordingSink::default();
    let pipeline = Pipeline::new(MemoryDirectory { sites }, sink.clone(), policy);
    (pipeline, sink)
}

const TOPIC: &str = "acme/plantA/DE/Bremen/AA:BB:CC:DD:EE:FF/temp";
const PAYLOAD: &[u8] = b"temp,unit=C value=21.5 1000000000";

const ENRICHED: &str = concat!(
    "temp,unit=C,company=acme,site=plantA,country=DE,city=Bremen,",
    "sID=AA:BB:CC:DD:EE:FF,bizLocation=hall1 value=21.5 1000000000"
);

#[tokio::test]
async fn test_full_enrichment() {
    let (pipeline, sink) = pipeline_with(vec![bremen_site()], UnmappedSensorPolicy::Forward);

    let outcome = pipeline.handle(TOPIC, PAYLOAD).await;

    assert!(outcome.is_forwarded());
    assert_eq!(sink.lines(), vec![ENRICHED.to_string()]);
}

#[tokio::test]
async fn test_site_miss_drops_without_write() {
    let (pipeline, sink) = pipeline_with(vec![bremen_site()], UnmappedSensorPolicy::Forward);

    let outcome = pipeline
        .handle("other/plantB/FR/Paris/AA:BB:CC:DD:EE:FF/temp", PAYLOAD)
        .await;

    assert!(matches!(
        outcome,
        Outcome::Dropped(DropReason::SiteNotFound { .. })
    ));
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_unmapped_sensor_forwards_five_tags() {
    let (pipeline, sink) = pipeline_with(vec![bremen_site()], UnmappedSensorPolicy::Forward);

    let outcome = pipeline
        .handle("acme/plantA/DE/Bremen/00:11:22:33:44:55/temp", PAYLOAD)
        .await;

    assert!(outcome.is_forwarded());

    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("sID=00:11:22:33:44:55"));
    assert!(!lines[0].contains("bizLocation"));
}

#[tokio::test]
async fn test_unmapped_sensor_drop_policy() {
    let (pipeline, sink) = pipeline_with(vec![bremen_site()], UnmappedSensorPolicy::Drop);

    let outcome = pipeline
        .handle("acme/plantA/DE/Bremen/00:11:22:33:44:55/temp", PAYLOAD)
        .await;

    assert!(matches!(
        outcome,
        Outcome::Dropped(DropReason::UnmappedSensor { .. })
    ));
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_malformed_topic_drops() {
    let (pipeline, sink) = pipeline_with(vec![bremen_site()], UnmappedSensorPolicy::Forward);

    let outcome = pipeline.handle("acme/plantA/DE/Bremen", PAYLOAD).await;

    assert!(matches!(
        outcome,
        Outcome::Dropped(DropReason::MalformedTopic(_))
    ));
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_invalid_payload_drops() {
    let (pipeline, sink) = pipeline_with(vec![bremen_site()], UnmappedSensorPolicy::Forward);

    let outcome = pipeline.handle(TOPIC, &[0xff, 0xfe, 0xfd]).await;

    assert!(matches!(
        outcome,
        Outcome::Dropped(DropReason::InvalidPayload)
    ));

    let outcome = pipeline.handle(TOPIC, b"").await;

    assert!(matches!(
        outcome,
        Outcome::Dropped(DropReason::InvalidPayload)
    ));
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_sink_failure_is_contained() {
    let pipeline = Pipeline::new(
        MemoryDirectory {
            sites: vec![bremen_site()],
        },
        FailingSink,
        UnmappedSensorPolicy::Forward,
    );

    let outcome = pipeline.handle(TOPIC, PAYLOAD).await;

    assert!(matches!(outcome, Outcome::Dropped(DropReason::SinkError(_))));
}

#[tokio::test]
async fn test_reprocessing_is_idempotent() {
    let (pipeline, sink) = pipeline_with(vec![bremen_site()], UnmappedSensorPolicy::Forward);

    pipeline.handle(TOPIC, PAYLOAD).await;
    pipeline.handle(TOPIC, PAYLOAD).await;

    let lines = sink.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], lines[1]);
    assert_eq!(lines[0], ENRICHED);
}

#[tokio::test]
async fn test_subscription_derivation() {
    let directory = MemoryDirectory {
        sites: vec![bremen_site()],
    };

    let subscriptions = directory.list_subscriptions().await.unwrap();

    assert_eq!(
        subscriptions,
        vec![("acme/plantA/DE/Bremen/#".to_string(), 0)]
    );
}

#[tokio::test]
async fn test_empty_directory_yields_empty_subscriptions() {
    let directory = MemoryDirectory { sites: Vec::new() };

    let subscriptions = directory.list_subscriptions().await.unwrap();

    assert!(subscriptions.is_empty());
}
