use std::sync::LazyLock;

use regex::Regex;

use mqttgram_common::{ClassifiedPayload, MediaKind};

/// Anchored matcher for direct media links: http(s) scheme, any path, a
/// known image extension, optional query string, nothing else.
static MEDIA_URL: LazyLock<Regex> = LazyLock::new(|| {
    // Pattern is a literal; construction cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)^https?://.+\.(jpg|jpeg|png|gif|webp)(\?.*)?$").expect("media url pattern")
});

/// Decide whether an inbound broker payload is a direct media link or
/// plain text.
///
/// Total function: invalid UTF-8 is replaced, never fatal. The payload is
/// trimmed before matching, and the trimmed form is what gets forwarded.
pub fn classify(payload: &[u8]) -> ClassifiedPayload {
    let text = String::from_utf8_lossy(payload);
    let trimmed = text.trim();

    match MEDIA_URL.captures(trimmed) {
        Some(caps) => {
            let kind = if caps[1].eq_ignore_ascii_case("gif") {
                MediaKind::Animation
            } else {
                MediaKind::Image
            };
            ClassifiedPayload::Media {
                url: trimmed.to_string(),
                kind,
            }
        },
        None => ClassifiedPayload::Text(trimmed.to_string()),
    }
}

/// Attachment name for a matched media URL: `snapshot.{ext}`.
pub fn attachment_filename(url: &str) -> String {
    let ext = MEDIA_URL
        .captures(url)
        .map_or_else(|| "bin".to_string(), |caps| caps[1].to_ascii_lowercase());
    format!("snapshot.{ext}")
}
