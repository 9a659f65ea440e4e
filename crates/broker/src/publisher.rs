use {
    anyhow::Result,
    async_trait::async_trait,
    rumqttc::{AsyncClient, QoS},
    tracing::debug,
};

use mqttgram_common::BrokerPublish;

/// Publish wrapper over the shared MQTT client.
///
/// Single attempt, QoS 0, no queuing of unsent messages. The client
/// serializes its own I/O, so the wrapper is freely shared across tasks.
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    #[must_use]
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BrokerPublish for MqttPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await?;
        debug!(topic, bytes = payload.len(), "published to broker");
        Ok(())
    }
}
