//! Site directory lookup.
//!
//! Site Records are created and maintained by an external administrative
//! process; the bridge only reads them. The directory is consulted once at
//! startup to derive the subscription list and once per message to resolve
//! the `bizLocation` tag.

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

use crate::config::DirectoryConfig;
use crate::error::{BridgeError, Result};

/// Delivery QoS paired with every derived subscription (at-most-once).
pub const DEFAULT_QOS: u8 = 0;

/// Sensor-to-location mapping inside a Site Record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorMapping {
    /// Sensor hardware identifier.
    pub mac: String,

    /// Business-location label (e.g., a work cell name).
    #[serde(rename = "bizLocation")]
    pub biz_location: String,
}

/// A site stored in the directory, identified by (company, siteName, city).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRecord {
    pub company: String,

    #[serde(rename = "siteName")]
    pub site_name: String,

    pub city: String,

    /// Subscription topic covering this site's sensors.
    pub topic: String,

    /// Ordered sensor mappings; the first matching MAC wins.
    #[serde(default)]
    pub sensors: Vec<SensorMapping>,
}

impl SiteRecord {
    /// Resolve the business location for a sensor MAC.
    ///
    /// The match is case-sensitive and exact. `None` means the message is
    /// forwarded without a `bizLocation` tag (or dropped, depending on the
    /// configured policy) — it is not an error.
    pub fn biz_location_for(&self, mac: &str) -> Option<&str> {
        self.sensors
            .iter()
            .find(|mapping| mapping.mac == mac)
            .map(|mapping| mapping.biz_location.as_str())
    }
}

/// Read-only lookup contract for the site directory.
#[async_trait]
pub trait SiteDirectory: Send + Sync {
    /// Enumerate all Site Records and return each topic paired with the
    /// default QoS. Order is directory-iteration order and not guaranteed
    /// stable. An empty directory yields an empty list.
    async fn list_subscriptions(&self) -> Result<Vec<(String, u8)>>;

    /// Exact-match lookup on (company, siteName, city).
    ///
    /// The directory is not guaranteed unique on this key; the first match
    /// wins. `None` is a per-message miss, not an error.
    async fn find_site(
        &self,
        company: &str,
        site_name: &str,
        city: &str,
    ) -> Result<Option<SiteRecord>>;
}

/// MongoDB-backed site directory.
pub struct MongoDirectory {
    sites: Collection<SiteRecord>,
}

impl MongoDirectory {
    /// Connect to the document store and open the sites collection.
    pub async fn connect(config: &DirectoryConfig) -> Result<Self> {
        tracing::debug!(
            host = %config.host,
            port = config.port,
            db = %config.db_name,
            collection = %config.collection,
            "Connecting to site directory"
        );

        let options = ClientOptions::builder()
            .hosts(vec![ServerAddress::Tcp {
                host: config.host.clone(),
                port: Some(config.port),
            }])
            .credential(
                Credential::builder()
                    .username(config.credentials.username.clone())
                    .password(config.credentials.password.clone())
                    .build(),
            )
            .app_name("mqtt-bridge-epcis".to_string())
            .build();

        let client = Client::with_options(options)
            .map_err(|e| BridgeError::DirectoryUnavailable(e.to_string()))?;

        let sites = client
            .database(&config.db_name)
            .collection(&config.collection);

        Ok(Self { sites })
    }
}

#[async_trait]
impl SiteDirectory for MongoDirectory {
    async fn list_subscriptions(&self) -> Result<Vec<(String, u8)>> {
        let mut cursor = self
            .sites
            .find(doc! {})
            .await
            .map_err(|e| BridgeError::DirectoryUnavailable(e.to_string()))?;

        let mut subscriptions = Vec::new();
        while let Some(site) = cursor
            .try_next()
            .await
            .map_err(|e| BridgeError::DirectoryUnavailable(e.to_string()))?
        {
            subscriptions.push((site.topic, DEFAULT_QOS));
        }

        Ok(subscriptions)
    }

    async fn find_site(
        &self,
        company: &str,
        site_name: &str,
        city: &str,
    ) -> Result<Option<SiteRecord>> {
        self.sites
            .find_one(doc! {
                "company": company,
                "siteName": site_name,
                "city": city,
            })
            .await
            .map_err(|e| BridgeError::DirectoryQuery(e.to_string()))
    }
}
