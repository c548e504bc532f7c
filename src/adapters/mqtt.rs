//! MQTT status side channel.
//!
//! Implements [`StatusPublisher`] over `EspMqttClient`.  Publishing only
//! enqueues into the client's outbox (QoS 0, not retained); the MQTT task
//! does the network I/O, so the sampling thread never blocks on the broker.

use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
use log::{debug, info, warn};

use crate::api;
use crate::app::ports::StatusPublisher;
use crate::app::status::StatusView;

pub struct MqttPublisher {
    client: EspMqttClient<'static>,
    topic: &'static str,
}

impl MqttPublisher {
    pub fn connect(url: &str, client_id: &str, topic: &'static str) -> anyhow::Result<Self> {
        let config = MqttClientConfiguration {
            client_id: Some(client_id),
            ..Default::default()
        };
        let client = EspMqttClient::new_cb(url, &config, |event| match event.payload() {
            EventPayload::Connected(_) => info!("MQTT: connected"),
            EventPayload::Disconnected => warn!("MQTT: disconnected"),
            EventPayload::Error(e) => debug!("MQTT: {:?}", e),
            _ => {}
        })?;
        info!("MQTT: publishing status to '{}' via {}", topic, url);
        Ok(Self {
            client,
            topic,
        })
    }
}

impl StatusPublisher for MqttPublisher {
    fn publish(&mut self, status: &StatusView) {
        let payload = api::status_json(status);
        if let Err(e) = self.client.enqueue(self.topic, QoS::AtMostOnce, false, &payload) {
            debug!("MQTT: publish dropped ({})", e);
        }
    }
}
