/// Footnote references `[^label]`.
pub struct FootnoteRef;

impl FootnoteRef {
    pub const OPEN: &'static str = "[^";
    pub const CLOSE: char = ']';

    /// Returns `(label, total_len)` for a reference at the start of `rest`.
    pub fn scan(rest: &str) -> Option<(&str, usize)> {
        let body = rest.strip_prefix(Self::OPEN)?;
        let close = body.find(Self::CLOSE)?;
        let label = &body[..close];
        if label.is_empty() || label.contains(char::is_whitespace) || label.contains('[') {
            return None;
        }
        Some((label, Self::OPEN.len() + close + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_label() {
        assert_eq!(FootnoteRef::scan("[^note] x"), Some(("note", 7)));
    }

    #[test]
    fn rejects_empty_or_spaced_labels() {
        assert_eq!(FootnoteRef::scan("[^]"), None);
        assert_eq!(FootnoteRef::scan("[^a b]"), None);
        assert_eq!(FootnoteRef::scan("[^open"), None);
    }
}
