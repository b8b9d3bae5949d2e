//! Free-text helpers.

/// Truncate a string to at most `max_chars` characters, never splitting a
/// character. Oversized platform text (buyer names, item titles) is
/// truncated to its column limit rather than rejected.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => s.get(..byte_idx).unwrap_or(s).to_string(),
        None => s.to_string(),
    }
}
