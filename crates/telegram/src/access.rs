use teloxide::types::ChatId;

/// Reason an inbound chat message was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// Sender is not the configured destination chat.
    UnauthorizedSender,
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnauthorizedSender => write!(f, "sender is not the configured chat"),
        }
    }
}

/// Decide whether an inbound message may drive the bridge.
///
/// Only the single configured destination chat is authorized. Everyone
/// else is dropped without a reply; a warn-level log is the only effect.
pub fn check_access(allowed: ChatId, sender: ChatId) -> Result<(), AccessDenied> {
    if sender == allowed {
        Ok(())
    } else {
        Err(AccessDenied::UnauthorizedSender)
    }
}
