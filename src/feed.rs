//! MQTT subscription feed.
//!
//! Wraps the rumqttc client and event loop behind a pull-based `recv()`:
//! the run loop takes one (topic, payload) event at a time and processes it
//! to completion before polling for the next, so delivery semantics are
//! exactly what the broker provides at QoS 0.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS, SubscribeFilter};

use crate::config::BrokerConfig;
use crate::error::{BridgeError, Result};

/// A raw (topic, payload) event from the broker.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Blocking-style subscription feed over an MQTT connection.
pub struct MessageFeed {
    client: AsyncClient,
    event_loop: EventLoop,
}

impl MessageFeed {
    /// Connect to the broker.
    ///
    /// Returns once the broker acknowledges the connection; a refused or
    /// failed connection is fatal at startup.
    pub async fn connect(config: &BrokerConfig) -> Result<Self> {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, mut event_loop) = AsyncClient::new(options, 64);

        // Wait for the CONNACK before handing the feed out.
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                    tracing::info!(code = ?ack.code, "Connected to MQTT broker");
                    break;
                }
                Ok(_) => {}
                Err(e) => return Err(BridgeError::mqtt(e.to_string())),
            }
        }

        Ok(Self { client, event_loop })
    }

    /// Subscribe to the derived topic list.
    ///
    /// An empty list is legal: the feed then has nothing to deliver.
    pub async fn subscribe(&self, subscriptions: &[(String, u8)]) -> Result<()> {
        if subscriptions.is_empty() {
            tracing::warn!("Site directory yielded no topics to subscribe to");
            return Ok(());
        }

        let filters: Vec<SubscribeFilter> = subscriptions
            .iter()
            .map(|(topic, qos)| SubscribeFilter::new(topic.clone(), qos_level(*qos)))
            .collect();

        tracing::info!(topics = filters.len(), "Subscribing to site topics");

        self.client
            .subscribe_many(filters)
            .await
            .map_err(|e| BridgeError::mqtt(e.to_string()))?;

        Ok(())
    }

    /// Receive the next published message.
    ///
    /// Transient event-loop errors after startup are logged and polled
    /// again after a short delay; rumqttc reconnects internally.
    pub async fn recv(&mut self) -> InboundMessage {
        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    return InboundMessage {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    };
                }
                Ok(Event::Incoming(Incoming::SubAck(ack))) => {
                    tracing::debug!(granted = ?ack.return_codes, "Subscription acknowledged");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "MQTT event loop error");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    /// Best-effort disconnect on shutdown.
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            tracing::warn!(error = %e, "Error disconnecting MQTT client");
        }
    }
}

fn qos_level(qos: u8) -> QoS {
    match qos {
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtMostOnce,
    }
}
