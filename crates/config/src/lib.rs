//! Environment-driven configuration for the bridge.
//!
//! All settings are read once at process start; there is no hot reload.
//! [`BridgeConfig::from_env`] reads the process environment;
//! [`BridgeConfig::from_env_with`] takes an injectable lookup so tests
//! never mutate the real environment.

use {
    secrecy::{ExposeSecret, Secret},
    thiserror::Error,
    tracing::warn,
};

const DEFAULT_BROKER_HOST: &str = "localhost";
const DEFAULT_BROKER_PORT: u16 = 1883;
const DEFAULT_TOPICS_OUTPUT: &str = "telegram/output/#,mt32/#";
const DEFAULT_TOPIC_INPUT: &str = "telegram/input";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum Error {
    #[error("{var} is required")]
    Missing { var: &'static str },

    #[error("{var}: invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Telegram side settings.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,

    /// Sole chat allowed to send commands and receive forwarded messages.
    pub chat_id: i64,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Optional broker credentials. Only used when both user and password are
/// present in the environment.
#[derive(Clone)]
pub struct BrokerAuth {
    pub username: String,
    pub password: Secret<String>,
}

impl std::fmt::Debug for BrokerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Broker side settings.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub auth: Option<BrokerAuth>,

    /// Topic filters forwarded to the chat, re-subscribed in this order on
    /// every successful (re)connect.
    pub topics_output: Vec<String>,

    /// Topic that authorized chat messages are published to.
    pub topic_input: String,
}

/// Full bridge configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub telegram: TelegramConfig,
    pub broker: BrokerConfig,

    /// Default tracing filter, used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl BridgeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Load using a custom variable lookup.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = require(&lookup, "TELEGRAM_TOKEN")?;
        let chat_id = parse("TELEGRAM_CHAT_ID", require(&lookup, "TELEGRAM_CHAT_ID")?)?;

        let host = lookup("MQTT_BROKER").unwrap_or_else(|| DEFAULT_BROKER_HOST.to_string());
        let port = match lookup("MQTT_PORT") {
            Some(raw) => parse("MQTT_PORT", raw)?,
            None => DEFAULT_BROKER_PORT,
        };

        let auth = broker_auth(lookup("MQTT_USER"), lookup("MQTT_PASS"));

        let raw_topics =
            lookup("MQTT_TOPICS_OUTPUT").unwrap_or_else(|| DEFAULT_TOPICS_OUTPUT.to_string());
        let topics_output = split_topics(&raw_topics);
        if topics_output.is_empty() {
            return Err(Error::Invalid {
                var: "MQTT_TOPICS_OUTPUT",
                value: raw_topics,
                reason: "no topic filters".into(),
            });
        }

        let topic_input =
            lookup("MQTT_TOPIC_INPUT").unwrap_or_else(|| DEFAULT_TOPIC_INPUT.to_string());
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            telegram: TelegramConfig {
                token: Secret::new(token),
                chat_id,
            },
            broker: BrokerConfig {
                host,
                port,
                auth,
                topics_output,
                topic_input,
            },
            log_level,
        })
    }
}

fn require(lookup: impl Fn(&str) -> Option<String>, var: &'static str) -> Result<String> {
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Missing { var }),
    }
}

fn parse<T>(var: &'static str, raw: String) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| Error::Invalid {
        var,
        value: raw,
        reason: e.to_string(),
    })
}

/// Credentials are only enabled when both halves are present.
fn broker_auth(user: Option<String>, pass: Option<String>) -> Option<BrokerAuth> {
    match (user, pass) {
        (Some(username), Some(password)) => Some(BrokerAuth {
            username,
            password: Secret::new(password),
        }),
        (Some(_), None) => {
            warn!("MQTT_USER set without MQTT_PASS; broker auth disabled");
            None
        },
        (None, Some(_)) => {
            warn!("MQTT_PASS set without MQTT_USER; broker auth disabled");
            None
        },
        (None, None) => None,
    }
}

/// Comma-split a filter list, trimming entries and skipping empty ones.
fn split_topics(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashMap};

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<BridgeConfig> {
        let vars = env(pairs);
        BridgeConfig::from_env_with(|name| vars.get(name).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[("TELEGRAM_TOKEN", "123:ABC"), ("TELEGRAM_CHAT_ID", "42")];

    #[test]
    fn minimal_env_uses_defaults() {
        let cfg = load(MINIMAL).unwrap();
        assert_eq!(cfg.telegram.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.telegram.chat_id, 42);
        assert_eq!(cfg.broker.host, "localhost");
        assert_eq!(cfg.broker.port, 1883);
        assert!(cfg.broker.auth.is_none());
        assert_eq!(cfg.broker.topics_output, vec!["telegram/output/#", "mt32/#"]);
        assert_eq!(cfg.broker.topic_input, "telegram/input");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = load(&[("TELEGRAM_CHAT_ID", "42")]).unwrap_err();
        assert!(matches!(err, Error::Missing { var: "TELEGRAM_TOKEN" }));
    }

    #[test]
    fn missing_chat_id_is_an_error() {
        let err = load(&[("TELEGRAM_TOKEN", "123:ABC")]).unwrap_err();
        assert!(matches!(err, Error::Missing { var: "TELEGRAM_CHAT_ID" }));
    }

    #[test]
    fn non_numeric_chat_id_is_an_error() {
        let err = load(&[("TELEGRAM_TOKEN", "123:ABC"), ("TELEGRAM_CHAT_ID", "nope")]).unwrap_err();
        assert!(matches!(err, Error::Invalid { var: "TELEGRAM_CHAT_ID", .. }));
    }

    #[test]
    fn negative_chat_id_parses() {
        // Group chats have negative ids.
        let cfg = load(&[("TELEGRAM_TOKEN", "t"), ("TELEGRAM_CHAT_ID", "-100123")]).unwrap();
        assert_eq!(cfg.telegram.chat_id, -100_123);
    }

    #[test]
    fn topic_list_is_split_and_trimmed_in_order() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("MQTT_TOPICS_OUTPUT", " a/# , b/status ,, c "));
        let cfg = load(&pairs).unwrap();
        assert_eq!(cfg.broker.topics_output, vec!["a/#", "b/status", "c"]);
    }

    #[test]
    fn empty_topic_list_is_an_error() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("MQTT_TOPICS_OUTPUT", " , "));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(err, Error::Invalid { var: "MQTT_TOPICS_OUTPUT", .. }));
    }

    #[test]
    fn broker_endpoint_overrides() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("MQTT_BROKER", "broker.lan"));
        pairs.push(("MQTT_PORT", "8883"));
        let cfg = load(&pairs).unwrap();
        assert_eq!(cfg.broker.host, "broker.lan");
        assert_eq!(cfg.broker.port, 8883);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("MQTT_PORT", "eighty"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(err, Error::Invalid { var: "MQTT_PORT", .. }));
    }

    #[test]
    fn auth_requires_both_halves() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("MQTT_USER", "bridge"));
        let cfg = load(&pairs).unwrap();
        assert!(cfg.broker.auth.is_none());

        pairs.push(("MQTT_PASS", "hunter2"));
        let cfg = load(&pairs).unwrap();
        let auth = cfg.broker.auth.unwrap();
        assert_eq!(auth.username, "bridge");
        assert_eq!(auth.password.expose_secret(), "hunter2");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("MQTT_USER", "bridge"));
        pairs.push(("MQTT_PASS", "hunter2"));
        let cfg = load(&pairs).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("123:ABC"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
