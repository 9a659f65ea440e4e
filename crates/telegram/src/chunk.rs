/// Telegram rejects messages longer than this many characters; payloads
/// relayed from the broker can exceed it.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Split `text` into chunks that fit the message size limit, preferring a
/// newline and then a space as the split point.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 {
        return Vec::new();
    }

    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut window_end = max_len;
        while !remaining.is_char_boundary(window_end) {
            window_end -= 1;
        }
        if window_end == 0 {
            // A single char wider than the window; emit it whole.
            window_end = remaining
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(remaining.len());
        }

        let window = &remaining[..window_end];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&at| at > 0)
            .unwrap_or(window_end);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start_matches(['\n', ' ']);
    }

    chunks
}
