//! mqttgram — bidirectional MQTT ↔ Telegram bridge.
//!
//! Two independent loops run for the process lifetime: the broker
//! listener (subscribe, classify, forward to the chat) and the chat
//! listener (long-poll, filter by identity, publish to the broker). They
//! share only the two outbound wrappers and the underlying clients.

use std::sync::Arc;

use {
    clap::Parser,
    tokio_util::sync::CancellationToken,
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    mqttgram_broker::{BrokerListener, MqttPublisher},
    mqttgram_common::{BrokerPublish, ChatOutbound},
    mqttgram_config::BridgeConfig,
    mqttgram_media::{Fetch, HttpFetcher},
    mqttgram_telegram::{ChatListener, TelegramOutbound, build_bot},
};

#[derive(Parser)]
#[command(name = "mqttgram", about = "Bidirectional MQTT ↔ Telegram bridge")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

/// Initialise tracing. `RUST_LOG` wins over the flag/`LOG_LEVEL` default.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = BridgeConfig::from_env()?;
    info!(
        host = %config.broker.host,
        port = config.broker.port,
        topics = ?config.broker.topics_output,
        input_topic = %config.broker.topic_input,
        "starting bridge"
    );

    let bot = build_bot(&config.telegram).await?;
    let outbound: Arc<dyn ChatOutbound> =
        Arc::new(TelegramOutbound::new(bot.clone(), config.telegram.chat_id));
    let fetcher: Arc<dyn Fetch> = Arc::new(HttpFetcher::new()?);

    let (client, event_loop) = mqttgram_broker::connect(&config.broker, "mqttgram");
    let publisher: Arc<dyn BrokerPublish> = Arc::new(MqttPublisher::new(client.clone()));

    let cancel = CancellationToken::new();

    let listener = BrokerListener::new(
        client,
        config.broker.topics_output.clone(),
        outbound,
        fetcher,
    );
    let broker_cancel = cancel.clone();
    let broker_task = tokio::spawn(async move { listener.run(event_loop, broker_cancel).await });

    let chat = ChatListener::new(
        bot,
        config.telegram.chat_id,
        config.broker.topic_input.clone(),
        publisher,
    );
    let chat_cancel = cancel.clone();
    let chat_task = tokio::spawn(async move { chat.run(chat_cancel).await });

    // Neither task returns in normal operation: the broker loop reconnects
    // indefinitely and the chat loop retries recoverable poll errors in
    // place. Whichever ends first decides the process exit.
    tokio::select! {
        result = broker_task => {
            error!("broker listener task ended unexpectedly");
            result?;
            anyhow::bail!("broker listener task ended unexpectedly");
        }
        result = chat_task => {
            match result? {
                Ok(()) => Ok(()),
                Err(e) => {
                    error!(error = %e, "chat listener failed");
                    Err(e.into())
                },
            }
        }
    }
}
