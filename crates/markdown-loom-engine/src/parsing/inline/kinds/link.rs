use crate::parsing::link_refs::LinkRefs;

use super::Escape;

/// Links `[text](dest "title")`, `[text][ref]`, `[text]` and the image forms
/// prefixed with `!`.
pub struct Link;

/// A resolved link or image, with byte offsets relative to the opening `[`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatch {
    /// Offset of the label text, just after `[`.
    pub label_start: usize,
    /// Offset of the closing `]`.
    pub label_end: usize,
    /// Total source length from `[` through the end of the destination.
    pub len: usize,
    pub url: String,
    pub title: Option<String>,
}

impl Link {
    pub const OPEN: u8 = b'[';
    pub const CLOSE: u8 = b']';
    pub const IMAGE: u8 = b'!';

    /// Matches a link starting at the `[` that begins `s`.
    pub fn scan(s: &str, refs: &LinkRefs) -> Option<LinkMatch> {
        let bytes = s.as_bytes();
        if bytes.first() != Some(&Self::OPEN) {
            return None;
        }
        let label_end = Self::matching_bracket(s)?;
        let label = &s[1..label_end];
        let after = label_end + 1;

        if bytes.get(after) == Some(&b'(')
            && let Some((len, url, title)) = Self::inline_destination(&s[after..])
        {
            return Some(LinkMatch {
                label_start: 1,
                label_end,
                len: after + len,
                url,
                title,
            });
        }

        // `[text][ref]` or collapsed `[text][]`
        if bytes.get(after) == Some(&Self::OPEN)
            && let Some(ref_close) = Self::matching_bracket(&s[after..])
        {
            let reference = &s[after + 1..after + ref_close];
            let key = if reference.trim().is_empty() { label } else { reference };
            let def = refs.get(key)?;
            return Some(LinkMatch {
                label_start: 1,
                label_end,
                len: after + ref_close + 1,
                url: def.url.clone(),
                title: def.title.clone(),
            });
        }

        let def = refs.get(label)?;
        Some(LinkMatch {
            label_start: 1,
            label_end,
            len: after,
            url: def.url.clone(),
            title: def.title.clone(),
        })
    }

    /// Offset of the `]` matching the `[` at offset 0. Escaped brackets and
    /// brackets inside code spans do not count.
    fn matching_bracket(s: &str) -> Option<usize> {
        let bytes = s.as_bytes();
        let mut depth = 0usize;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                Escape::BACKSLASH if bytes.get(i + 1).is_some_and(|b| Escape::is_escapable(*b)) => {
                    i += 2;
                    continue;
                }
                b'`' => {
                    let run = bytes[i..].iter().take_while(|b| **b == b'`').count();
                    let fence = "`".repeat(run);
                    if let Some(close) = s[i + run..].find(&fence) {
                        i += run + close + run;
                        continue;
                    }
                    i += run;
                    continue;
                }
                Self::OPEN => depth += 1,
                Self::CLOSE => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// Parses `(dest "title")` at the start of `s`, returning its length.
    fn inline_destination(s: &str) -> Option<(usize, String, Option<String>)> {
        let bytes = s.as_bytes();
        let mut i = 1;
        i += skip_spaces(&bytes[i..]);

        let url = if bytes.get(i) == Some(&b'<') {
            let close = s[i + 1..].find(['>', '\n'])?;
            if bytes[i + 1 + close] != b'>' {
                return None;
            }
            let url = unescape(&s[i + 1..i + 1 + close]);
            i += close + 2;
            url
        } else {
            let start = i;
            let mut parens = 0usize;
            while i < bytes.len() {
                match bytes[i] {
                    Escape::BACKSLASH if bytes.get(i + 1).is_some_and(|b| Escape::is_escapable(*b)) => {
                        i += 2;
                        continue;
                    }
                    b'(' => parens += 1,
                    b')' if parens == 0 => break,
                    b')' => parens -= 1,
                    b if b.is_ascii_whitespace() => break,
                    _ => {}
                }
                i += 1;
            }
            if parens != 0 {
                return None;
            }
            unescape(&s[start..i])
        };

        let ws = skip_spaces(&bytes[i..]);
        let mut title = None;
        if ws > 0 || matches!(bytes.get(i), Some(b'"' | b'\'' | b'(')) {
            i += ws;
            if let Some(open) = bytes.get(i).copied().filter(|b| matches!(b, b'"' | b'\'' | b'(')) {
                let close = if open == b'(' { b')' } else { open };
                let body_start = i + 1;
                let mut j = body_start;
                while j < bytes.len() && bytes[j] != close {
                    if bytes[j] == Escape::BACKSLASH {
                        j += 1;
                    }
                    j += 1;
                }
                if j >= bytes.len() {
                    return None;
                }
                title = Some(unescape(&s[body_start..j]));
                i = j + 1;
                i += skip_spaces(&bytes[i..]);
            }
        }

        if bytes.get(i) != Some(&b')') {
            return None;
        }
        Some((i + 1, url, title))
    }
}

fn skip_spaces(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_whitespace()).count()
}

/// Removes backslashes before escapable punctuation.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(next) = chars.peek().copied()
            && next.is_ascii_punctuation()
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn refs() -> LinkRefs {
        LinkRefs::scan("[docs]: /docs \"Docs\"")
    }

    #[test]
    fn inline_link_with_title() {
        let m = Link::scan("[a](http://x.y \"T\") rest", &LinkRefs::default()).unwrap();
        assert_eq!(m.label_end, 2);
        assert_eq!(m.len, 19);
        assert_eq!(m.url, "http://x.y");
        assert_eq!(m.title.as_deref(), Some("T"));
    }

    #[test]
    fn balanced_parens_and_angle_destinations() {
        let m = Link::scan("[a](/p(1))", &LinkRefs::default()).unwrap();
        assert_eq!(m.url, "/p(1)");
        let m = Link::scan("[a](<with space>)", &LinkRefs::default()).unwrap();
        assert_eq!(m.url, "with space");
    }

    #[test]
    fn reference_forms() {
        let full = Link::scan("[text][DOCS]", &refs()).unwrap();
        assert_eq!(full.url, "/docs");
        assert_eq!(full.len, 12);
        let collapsed = Link::scan("[docs][]", &refs()).unwrap();
        assert_eq!(collapsed.len, 8);
        let shortcut = Link::scan("[Docs] after", &refs()).unwrap();
        assert_eq!(shortcut.len, 6);
        assert_eq!(shortcut.title.as_deref(), Some("Docs"));
    }

    #[test]
    fn malformed_links_do_not_match() {
        assert!(Link::scan("[a](", &LinkRefs::default()).is_none());
        assert!(Link::scan("[a](b", &LinkRefs::default()).is_none());
        assert!(Link::scan("[unclosed", &refs()).is_none());
        assert!(Link::scan("[missing]", &refs()).is_none());
    }

    #[test]
    fn nested_brackets_in_label() {
        let m = Link::scan("[a [b] c](/u)", &LinkRefs::default()).unwrap();
        assert_eq!(m.label_end, 8);
    }

    #[test]
    fn unescape_punctuation_only() {
        assert_eq!(unescape(r"a\*b\q"), r"a*b\q");
    }
}
