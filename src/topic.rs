//! Topic parsing.
//!
//! Incoming topic format:
//! ```text
//! <company>/<site>/<country>/<city>/<sensorMAC>[/<sensorType>]
//! ```
//!
//! The five leading segments become line-protocol tags; a trailing
//! sensor-type segment is accepted but unused.

/// Tags derived from the five leading topic segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTags {
    pub company: String,
    pub site: String,
    pub country: String,
    pub city: String,
    pub sensor_mac: String,
}

impl TopicTags {
    /// Parse a topic into tags.
    ///
    /// Returns `None` if the topic has fewer than five `/`-separated
    /// segments.
    pub fn parse(topic: &str) -> Option<Self> {
        let segments: Vec<&str> = topic.split('/').collect();
        if segments.len() < 5 {
            return None;
        }

        Some(Self {
            company: segments[0].to_string(),
            site: segments[1].to_string(),
            country: segments[2].to_string(),
            city: segments[3].to_string(),
            sensor_mac: segments[4].to_string(),
        })
    }

    /// Directory lookup key: (company, siteName, city).
    ///
    /// The city comes from segment 3, skipping the country segment. This is
    /// a fixed contract with the site directory schema, not adjacent-field
    /// selection.
    pub fn site_key(&self) -> (&str, &str, &str) {
        (&self.company, &self.site, &self.city)
    }
}
