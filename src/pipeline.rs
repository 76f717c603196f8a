//! Per-message enrichment pipeline.
//!
//! Each message moves `Received → Enriched → Forwarded`, or
//! `Received → Dropped` on any failure. There is no retry: drops are logged
//! and the feed loop continues unaffected.

use std::fmt;

use crate::config::UnmappedSensorPolicy;
use crate::directory::SiteDirectory;
use crate::enrich::enrich_line;
use crate::sink::MeasurementSink;
use crate::topic::TopicTags;

/// Why a message was dropped instead of forwarded.
#[derive(Debug)]
pub enum DropReason {
    /// Topic had fewer than five segments.
    MalformedTopic(String),
    /// Payload was not valid UTF-8 text (or was empty).
    InvalidPayload,
    /// No Site Record matched (company, siteName, city).
    SiteNotFound {
        company: String,
        site: String,
        city: String,
    },
    /// Site found but no sensor mapping matched and the policy is `drop`.
    UnmappedSensor { mac: String },
    /// Directory lookup failed.
    DirectoryError(String),
    /// Sink write failed.
    SinkError(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MalformedTopic(topic) => {
                write!(f, "topic '{}' has fewer than five segments", topic)
            }
            DropReason::InvalidPayload => write!(f, "payload is not valid UTF-8 text"),
            DropReason::SiteNotFound {
                company,
                site,
                city,
            } => write!(f, "no site record for ({}, {}, {})", company, site, city),
            DropReason::UnmappedSensor { mac } => {
                write!(f, "no sensor mapping for MAC {}", mac)
            }
            DropReason::DirectoryError(e) => write!(f, "directory lookup failed: {}", e),
            DropReason::SinkError(e) => write!(f, "sink write failed: {}", e),
        }
    }
}

/// Outcome of processing one message.
#[derive(Debug)]
pub enum Outcome {
    /// The enriched line that was written to the sink.
    Forwarded(String),
    /// The message was discarded.
    Dropped(DropReason),
}

impl Outcome {
    /// Whether the message reached the sink.
    pub fn is_forwarded(&self) -> bool {
        matches!(self, Outcome::Forwarded(_))
    }
}

/// Enrichment pipeline connecting the feed to the sink.
pub struct Pipeline<D, S> {
    directory: D,
    sink: S,
    on_unmapped_sensor: UnmappedSensorPolicy,
}

impl<D: SiteDirectory, S: MeasurementSink> Pipeline<D, S> {
    pub fn new(directory: D, sink: S, on_unmapped_sensor: UnmappedSensorPolicy) -> Self {
        Self {
            directory,
            sink,
            on_unmapped_sensor,
        }
    }

    /// Process one (topic, payload) event end to end.
    ///
    /// All failures are contained in the returned [`Outcome`]; nothing here
    /// propagates an error back to the feed loop.
    pub async fn handle(&self, topic: &str, payload: &[u8]) -> Outcome {
        let outcome = self.process(topic, payload).await;

        match &outcome {
            Outcome::Forwarded(line) => {
                tracing::debug!(line = %line, "Forwarded measurement");
            }
            Outcome::Dropped(reason) => {
                tracing::warn!(topic = %topic, reason = %reason, "Dropping message");
            }
        }

        outcome
    }

    async fn process(&self, topic: &str, payload: &[u8]) -> Outcome {
        let Some(tags) = TopicTags::parse(topic) else {
            return Outcome::Dropped(DropReason::MalformedTopic(topic.to_string()));
        };

        let text = match std::str::from_utf8(payload) {
            Ok(text) if !text.is_empty() => text,
            _ => return Outcome::Dropped(DropReason::InvalidPayload),
        };

        let (company, site_name, city) = tags.site_key();
        let site = match self.directory.find_site(company, site_name, city).await {
            Ok(Some(site)) => site,
            Ok(None) => {
                // Do not forward unenriched data.
                return Outcome::Dropped(DropReason::SiteNotFound {
                    company: company.to_string(),
                    site: site_name.to_string(),
                    city: city.to_string(),
                });
            }
            Err(e) => return Outcome::Dropped(DropReason::DirectoryError(e.to_string())),
        };

        let biz_location = site.biz_location_for(&tags.sensor_mac);
        if biz_location.is_none() && self.on_unmapped_sensor == UnmappedSensorPolicy::Drop {
            return Outcome::Dropped(DropReason::UnmappedSensor {
                mac: tags.sensor_mac.clone(),
            });
        }

        let line = enrich_line(text, &tags, biz_location);

        match self.sink.write_line(&line).await {
            Ok(()) => Outcome::Forwarded(line),
            Err(e) => Outcome::Dropped(DropReason::SinkError(e.to_string())),
        }
    }
}
