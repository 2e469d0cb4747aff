use std::sync::OnceLock;

use regex::Regex;

use crate::ast::node::CodeBlockInfo;

/// Fenced and indented code blocks.
pub struct CodeFence;

impl CodeFence {
    pub const BACKTICK: char = '`';
    pub const TILDE: char = '~';
    pub const MIN_FENCE: usize = 3;
    /// Leading spaces that make a line indented code.
    pub const INDENT: &'static str = "    ";

    fn open_re() -> &'static Regex {
        static OPEN_RE: OnceLock<Regex> = OnceLock::new();
        OPEN_RE.get_or_init(|| Regex::new(r"^( {0,3})(`{3,}|~{3,})(.*)$").expect("Invalid fence regex"))
    }

    /// Parses an opening fence line. Backtick fences may not carry a backtick
    /// in their info string.
    pub fn open(line: &str) -> Option<CodeBlockInfo> {
        let caps = Self::open_re().captures(line)?;
        let indent = caps.get(1)?.as_str().len();
        let fence = caps.get(2)?.as_str();
        let info = caps.get(3)?.as_str();
        let fence_char = fence.chars().next()?;
        if fence_char == Self::BACKTICK && info.contains(Self::BACKTICK) {
            return None;
        }
        let language = info.split_whitespace().next().map(str::to_string);
        Some(CodeBlockInfo {
            fenced: true,
            fence_char,
            fence_len: fence.len(),
            info: info.to_string(),
            language,
            open_indent: indent,
            closed: false,
        })
    }

    /// True if `line` closes a fence opened with `info`: the same character,
    /// at least as many, at most three spaces of indentation.
    pub fn closes(info: &CodeBlockInfo, line: &str) -> bool {
        let indent = line.bytes().take_while(|b| *b == b' ').count();
        if indent > 3 {
            return false;
        }
        let rest = line[indent..].trim_end();
        let run = rest.chars().take_while(|c| *c == info.fence_char).count();
        run >= info.fence_len && run * info.fence_char.len_utf8() == rest.len()
    }

    /// Payload of an indented code line, if the line is one.
    pub fn indented(line: &str) -> Option<&str> {
        let rest = line.strip_prefix(Self::INDENT)?;
        (!rest.trim().is_empty()).then_some(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn open_backtick_fence_with_language() {
        let info = CodeFence::open("```js").unwrap();
        assert_eq!(info.fence_char, '`');
        assert_eq!(info.fence_len, 3);
        assert_eq!(info.language.as_deref(), Some("js"));
        assert_eq!(info.open_marker(), "```js");
    }

    #[test]
    fn open_keeps_raw_info_string() {
        let info = CodeFence::open("  ~~~~ rust ignore").unwrap();
        assert_eq!(info.open_indent, 2);
        assert_eq!(info.info, " rust ignore");
        assert_eq!(info.language.as_deref(), Some("rust"));
        assert_eq!(info.open_marker(), "  ~~~~ rust ignore");
    }

    #[test]
    fn not_fences() {
        assert!(CodeFence::open("``not").is_none());
        assert!(CodeFence::open("``` a`b").is_none());
        assert!(CodeFence::open("    ```").is_none());
    }

    #[rstest]
    #[case("```", "```", true)]
    #[case("```", "`````", true)]
    #[case("````", "```", false)]
    #[case("```", "~~~", false)]
    #[case("```", "   ```  ", true)]
    #[case("```", "    ```", false)]
    #[case("```", "``` x", false)]
    fn closing_rules(#[case] open: &str, #[case] line: &str, #[case] closes: bool) {
        let info = CodeFence::open(open).unwrap();
        assert_eq!(CodeFence::closes(&info, line), closes);
    }

    #[test]
    fn indented_code_lines() {
        assert_eq!(CodeFence::indented("    let x;"), Some("let x;"));
        assert_eq!(CodeFence::indented("      deeper"), Some("  deeper"));
        assert_eq!(CodeFence::indented("   three"), None);
        assert_eq!(CodeFence::indented("     "), None);
    }
}
