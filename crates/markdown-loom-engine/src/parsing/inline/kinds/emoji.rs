/// Emoji shortcodes `:name:`.
pub struct Emoji;

const SHORTCODES: &[(&str, &str)] = &[
    ("+1", "👍"),
    ("-1", "👎"),
    ("book", "📖"),
    ("bug", "🐛"),
    ("check", "✔️"),
    ("clap", "👏"),
    ("crab", "🦀"),
    ("eyes", "👀"),
    ("fire", "🔥"),
    ("heart", "❤️"),
    ("memo", "📝"),
    ("rocket", "🚀"),
    ("smile", "😄"),
    ("sparkles", "✨"),
    ("star", "⭐"),
    ("tada", "🎉"),
    ("thinking", "🤔"),
    ("thumbsdown", "👎"),
    ("thumbsup", "👍"),
    ("warning", "⚠️"),
    ("white_check_mark", "✅"),
    ("x", "❌"),
];

impl Emoji {
    pub const COLON: u8 = b':';

    /// Returns `(name, total_len)` for a shortcode at the start of `rest`.
    pub fn scan(rest: &str) -> Option<(&str, usize)> {
        let body = rest.strip_prefix(':')?;
        let end = body
            .bytes()
            .position(|b| !(b.is_ascii_alphanumeric() || matches!(b, b'_' | b'+' | b'-')))?;
        if end == 0 || body.as_bytes()[end] != Self::COLON {
            return None;
        }
        let name = &body[..end];
        let known = SHORTCODES.iter().any(|(n, _)| *n == name);
        if !known && !name.as_bytes()[0].is_ascii_alphabetic() {
            return None;
        }
        Some((name, end + 2))
    }

    /// Display form of a shortcode, falling back to the literal `:name:`.
    pub fn resolve(name: &str) -> String {
        SHORTCODES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, e)| (*e).to_string())
            .unwrap_or_else(|| format!(":{name}:"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_and_resolves() {
        assert_eq!(Emoji::scan(":tada: yay"), Some(("tada", 6)));
        assert_eq!(Emoji::resolve("tada"), "🎉");
        assert_eq!(Emoji::resolve("nope"), ":nope:");
    }

    #[test]
    fn rejects_non_shortcodes() {
        assert_eq!(Emoji::scan("::"), None);
        assert_eq!(Emoji::scan(":a b:"), None);
        assert_eq!(Emoji::scan(":open"), None);
        assert_eq!(Emoji::scan(":30:"), None);
        assert_eq!(Emoji::scan(":+1:"), Some(("+1", 4)));
    }
}
