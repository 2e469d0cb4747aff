/// `~~struck~~`. Exactly two tildes open; the first following `~~` closes.
pub struct Strikethrough;

impl Strikethrough {
    pub const DELIM: &'static str = "~~";

    /// Returns `(content_len, total_len)` for a strikethrough at the start of `rest`.
    pub fn scan(rest: &str) -> Option<(usize, usize)> {
        let body = rest.strip_prefix(Self::DELIM)?;
        if body.starts_with('~') {
            return None;
        }
        let close = body.find(Self::DELIM)?;
        if close == 0 || body[..close].trim().is_empty() {
            return None;
        }
        Some((close, close + 2 * Self::DELIM.len()))
    }
}
