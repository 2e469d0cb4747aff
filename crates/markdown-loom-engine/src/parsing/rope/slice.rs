use xi_rope::Rope;

use super::span::Span;

/// Extracts the text for a span from the rope as an owned String.
///
/// This allocates; prefer working with spans where possible.
pub fn slice_to_string(rope: &Rope, sp: Span) -> String {
    let len = rope.len();
    let start = sp.start.min(len);
    let end = sp.end.min(len).max(start);
    rope.slice_to_cow(start..end).into_owned()
}

/// Truncates `s` to at most `max` bytes (on a char boundary) with a "..." suffix.
///
/// Used for human-readable outlines.
pub fn preview(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let cut = floor_char_boundary(s, max);
    let mut out = s[..cut].to_string();
    out.push_str("...");
    out
}

/// Largest char boundary in `s` that is `<= index`.
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
