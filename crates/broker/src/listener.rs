use std::{sync::Arc, time::Duration};

use {
    rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS},
    secrecy::ExposeSecret,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {
    mqttgram_common::{ChatOutbound, ClassifiedPayload, MediaKind},
    mqttgram_config::BrokerConfig,
    mqttgram_media::Fetch,
};

use crate::classify::{attachment_filename, classify};

/// Keepalive interval for the broker connection.
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Pause before re-polling after a connection error. rumqttc reconnects
/// on the next poll, so this is the only backoff the loop applies.
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

/// Bound on queued client requests (subscribes/publishes awaiting the
/// event loop).
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Build the shared MQTT client and its event loop from config.
pub fn connect(config: &BrokerConfig, client_id: &str) -> (AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(client_id, &config.host, config.port);
    options.set_keep_alive(KEEP_ALIVE);
    if let Some(auth) = &config.auth {
        options.set_credentials(&auth.username, auth.password.expose_secret());
        info!("broker authentication enabled");
    }
    AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY)
}

/// Broker-side listener: owns the event loop, re-applies the full
/// subscription set on every connect, classifies each inbound publish and
/// forwards it to the chat side.
pub struct BrokerListener {
    client: AsyncClient,
    topics: Vec<String>,
    chat: Arc<dyn ChatOutbound>,
    fetcher: Arc<dyn Fetch>,
}

impl BrokerListener {
    #[must_use]
    pub fn new(
        client: AsyncClient,
        topics: Vec<String>,
        chat: Arc<dyn ChatOutbound>,
        fetcher: Arc<dyn Fetch>,
    ) -> Self {
        Self {
            client,
            topics,
            chat,
            fetcher,
        }
    }

    /// Run until cancelled. Connection errors never end the loop — the
    /// client reconnects on the next poll, indefinitely.
    pub async fn run(&self, mut event_loop: EventLoop, cancel: CancellationToken) {
        info!("starting broker listener loop");

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("broker listener stopped");
                    return;
                }
                event = event_loop.poll() => event,
            };

            match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code == ConnectReturnCode::Success {
                        info!("connected to broker");
                        self.subscribe_all().await;
                    } else {
                        error!(code = ?ack.code, "broker refused connection");
                    }
                },
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!(topic = %publish.topic, bytes = publish.payload.len(), "broker message received");
                    if let Err(e) = route_publish(
                        &publish.topic,
                        &publish.payload,
                        self.chat.as_ref(),
                        self.fetcher.as_ref(),
                    )
                    .await
                    {
                        // Dropped; the loop keeps processing later messages.
                        error!(topic = %publish.topic, error = %e, "failed to forward broker message");
                    }
                },
                Ok(_) => {},
                Err(e) => {
                    warn!(error = %e, "broker connection error, retrying");
                    tokio::time::sleep(RECONNECT_PAUSE).await;
                },
            }
        }
    }

    /// (Re-)apply the full configured subscription set, in order. Each
    /// subscription is independent: one failure is logged and does not
    /// stop the rest.
    async fn subscribe_all(&self) {
        for topic in &self.topics {
            match self.client.subscribe(topic.as_str(), QoS::AtMostOnce).await {
                Ok(()) => info!(topic = %topic, "subscribed"),
                Err(e) => error!(topic = %topic, error = %e, "subscribe failed"),
            }
        }
    }
}

/// Classify one inbound publish and deliver it to the chat side.
///
/// Media references are fetched first, then attached. Any fetch or send
/// failure is returned for the caller to log; the message is dropped
/// either way.
pub async fn route_publish(
    topic: &str,
    payload: &[u8],
    chat: &dyn ChatOutbound,
    fetcher: &dyn Fetch,
) -> anyhow::Result<()> {
    match classify(payload) {
        ClassifiedPayload::Text(text) => {
            chat.send_text(&format!("Topic: {topic}\nMessage: {text}"))
                .await
        },
        ClassifiedPayload::Media { url, kind } => {
            let body = fetcher.fetch(&url).await?;
            let filename = attachment_filename(&url);
            let caption = format!("Topic: {topic}");
            match kind {
                MediaKind::Image => chat.send_image(body.to_vec(), &filename, &caption).await,
                MediaKind::Animation => {
                    chat.send_animation(body.to_vec(), &filename, &caption).await
                },
            }
        },
    }
}
