use std::{sync::Arc, time::Duration};

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{AllowedUpdate, ChatId, Message, ReplyParameters, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {mqttgram_common::BrokerPublish, mqttgram_config::TelegramConfig};

use crate::{access, error::Result};

/// Client timeout, longer than the long-poll timeout (30 s) so the HTTP
/// client does not abort the request before Telegram responds.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(45);

/// Long-poll timeout passed to getUpdates, in seconds.
const POLL_TIMEOUT_SECS: u32 = 30;

/// Pause after a recoverable poll failure.
const POLL_RETRY_PAUSE: Duration = Duration::from_secs(5);

/// Build the bot, verify credentials, and clear any webhook so long
/// polling works.
pub async fn build_bot(config: &TelegramConfig) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(CLIENT_TIMEOUT)
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    let me = bot.get_me().await?;
    bot.delete_webhook().send().await?;
    info!(username = ?me.username, "telegram bot connected (webhook cleared)");

    Ok(bot)
}

/// Inbound chat loop: long-polls for updates, filters by the configured
/// identity, and forwards accepted text to the broker.
pub struct ChatListener {
    bot: Bot,
    chat_id: ChatId,
    input_topic: String,
    publisher: Arc<dyn BrokerPublish>,
}

impl ChatListener {
    #[must_use]
    pub fn new(
        bot: Bot,
        chat_id: i64,
        input_topic: String,
        publisher: Arc<dyn BrokerPublish>,
    ) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
            input_topic,
            publisher,
        }
    }

    /// Poll until cancelled or a fatal transport error.
    ///
    /// Recoverable getUpdates failures are retried in place after a short
    /// pause; only an error that cannot heal (another instance already
    /// polling this token) is returned to the supervisor.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        info!("starting chat listener loop");
        let mut offset: i32 = 0;

        loop {
            let poll = async {
                self.bot
                    .get_updates()
                    .offset(offset)
                    .timeout(POLL_TIMEOUT_SECS)
                    .allowed_updates(vec![AllowedUpdate::Message])
                    .await
            };

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("chat listener stopped");
                    return Ok(());
                }
                result = poll => result,
            };

            match result {
                Ok(updates) => {
                    for update in updates {
                        offset = update.id.as_offset();
                        if let UpdateKind::Message(message) = update.kind {
                            self.handle_message(message).await;
                        }
                    }
                },
                Err(e) if is_fatal_poll_error(&e) => {
                    error!(error = %e, "chat polling cannot recover");
                    return Err(e.into());
                },
                Err(e) => {
                    warn!(error = %e, "getUpdates failed, retrying");
                    tokio::time::sleep(POLL_RETRY_PAUSE).await;
                },
            }
        }
    }

    async fn handle_message(&self, message: Message) {
        let Some(text) = message.text() else {
            debug!(chat_id = message.chat.id.0, "ignoring non-text message");
            return;
        };

        if let Err(denied) = access::check_access(self.chat_id, message.chat.id) {
            warn!(chat_id = message.chat.id.0, reason = %denied, "dropped chat message");
            return;
        }

        let published = forward_text(self.publisher.as_ref(), &self.input_topic, text).await;
        self.reply_to(&message, &publish_reply_text(&self.input_topic, published))
            .await;
    }

    /// Reply in-thread. Reply failures go through normal error logging
    /// only; the publish outcome already happened.
    async fn reply_to(&self, message: &Message, text: &str) {
        let params = ReplyParameters::new(message.id).allow_sending_without_reply();
        if let Err(e) = self
            .bot
            .send_message(message.chat.id, text)
            .reply_parameters(params)
            .await
        {
            warn!(error = %e, "failed to send chat reply");
        }
    }
}

/// Publish one authorized chat message verbatim; returns whether the
/// publish succeeded so the caller can pick the reply.
async fn forward_text(publisher: &dyn BrokerPublish, input_topic: &str, text: &str) -> bool {
    match publisher.publish(input_topic, text.as_bytes()).await {
        Ok(()) => {
            info!(topic = %input_topic, "chat message published to broker");
            true
        },
        Err(e) => {
            error!(topic = %input_topic, error = %e, "publish failed");
            false
        },
    }
}

/// The single reply an authorized sender gets for each message.
fn publish_reply_text(input_topic: &str, published: bool) -> String {
    if published {
        format!("Sent to `{input_topic}`")
    } else {
        "ERROR - publishing to MQTT failed".to_string()
    }
}

/// Polling cannot heal from another instance consuming this token's
/// updates; credential problems surface earlier, at `build_bot`.
fn is_fatal_poll_error(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::Api(ApiError::TerminatedByOtherGetUpdates)
    )
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use {anyhow::Result as AnyResult, async_trait::async_trait};

    use super::*;

    #[derive(Default)]
    struct FakePublisher {
        fail: bool,
        published: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl BrokerPublish for FakePublisher {
        async fn publish(&self, topic: &str, payload: &[u8]) -> AnyResult<()> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload.to_vec()));
            if self.fail {
                anyhow::bail!("client rejected publish");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn authorized_text_is_published_verbatim() {
        let publisher = FakePublisher::default();
        let published = forward_text(&publisher, "telegram/input", "on").await;

        assert!(published);
        assert_eq!(
            *publisher.published.lock().unwrap(),
            vec![("telegram/input".to_string(), b"on".to_vec())]
        );
    }

    #[tokio::test]
    async fn publish_failure_is_reported_not_retried() {
        let publisher = FakePublisher {
            fail: true,
            ..Default::default()
        };
        let published = forward_text(&publisher, "telegram/input", "on").await;

        assert!(!published);
        assert_eq!(publisher.published.lock().unwrap().len(), 1);
    }

    #[test]
    fn success_reply_names_the_input_topic() {
        let reply = publish_reply_text("telegram/input", true);
        assert!(reply.contains("telegram/input"));
    }

    #[test]
    fn failure_reply_is_generic() {
        let reply = publish_reply_text("telegram/input", false);
        assert!(!reply.contains("telegram/input"));
        assert!(reply.contains("ERROR"));
    }

    #[test]
    fn conflict_is_fatal() {
        let err = RequestError::Api(ApiError::TerminatedByOtherGetUpdates);
        assert!(is_fatal_poll_error(&err));
    }

    #[test]
    fn io_errors_are_recoverable() {
        let err = RequestError::Io(std::io::Error::other("boom"));
        assert!(!is_fatal_poll_error(&err));
    }
}
