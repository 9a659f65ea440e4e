/// Attachment family for a matched media reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Animation,
}

/// Outcome of classifying an inbound broker payload.
///
/// Derived deterministically from the payload bytes; classification is
/// total and never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedPayload {
    /// Plain text, already trimmed.
    Text(String),
    /// A direct link to a remote image or animation.
    Media { url: String, kind: MediaKind },
}
