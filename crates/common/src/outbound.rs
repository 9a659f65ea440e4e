use {anyhow::Result, async_trait::async_trait};

/// Outbound chat surface shared by both loops.
///
/// Implementations target the single configured destination chat; callers
/// never address a recipient. Each call is a single attempt — on failure
/// the caller logs and drops that message, no queue, no retry.
#[async_trait]
pub trait ChatOutbound: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;

    async fn send_image(&self, bytes: Vec<u8>, filename: &str, caption: &str) -> Result<()>;

    async fn send_animation(&self, bytes: Vec<u8>, filename: &str, caption: &str) -> Result<()>;
}

/// Broker publish surface used by the chat listener loop.
#[async_trait]
pub trait BrokerPublish: Send + Sync {
    /// Publish `payload` on `topic`. Single attempt; an error means the
    /// client refused or failed the publish and the caller decides the
    /// user-visible reply.
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()>;
}
