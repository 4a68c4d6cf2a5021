/// Byte offset just past the first `max_chars` characters of `text`.
///
/// Returns `text.len()` when the text is shorter. Never splits a character.
pub(crate) fn char_boundary_after(text: &str, max_chars: usize) -> usize {
    text.char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// Truncate `text` to at most `max_chars` characters, ending with `marker`
/// when anything was cut. The result, marker included, never exceeds
/// `max_chars` characters unless the marker alone is longer.
pub fn truncate_with_marker(text: &str, max_chars: usize, marker: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(marker.chars().count());
    let end = char_boundary_after(text, keep);
    format!("{}{marker}", &text[..end])
}
