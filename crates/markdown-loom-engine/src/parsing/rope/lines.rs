use xi_rope::Rope;

use super::span::Span;

/// Zero-width and invisible marks stripped from source text before scanning.
pub const INVISIBLE_MARKS: [char; 6] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{00AD}',
];

/// A reference to a single line in the rope with its byte span.
#[derive(Debug, Clone)]
pub struct LineRef {
    /// Byte span of the line content (excludes the terminating newline).
    pub span: Span,
    /// The line text without its newline.
    pub text: String,
}

/// Removes invisible marks and carriage returns so every line ends in a bare `\n`.
pub fn sanitize(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if INVISIBLE_MARKS.contains(&c) {
            continue;
        }
        if c == '\r' {
            if chars.peek() != Some(&'\n') {
                out.push('\n');
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Returns the lines of `rope` with their byte spans.
///
/// Follows `str::split('\n')` semantics: an empty rope yields one empty line and a
/// trailing newline yields a trailing empty line, so every caret position in the
/// document belongs to some line.
pub fn lines_with_spans(rope: &Rope) -> Vec<LineRef> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    let mut ends_with_newline = true;
    for raw in rope.lines_raw(..) {
        let start = offset;
        offset += raw.len();
        let text = raw.strip_suffix('\n').unwrap_or(&*raw);
        ends_with_newline = raw.ends_with('\n');
        out.push(LineRef {
            span: Span::at(start, text.len()),
            text: text.to_string(),
        });
    }
    if ends_with_newline {
        out.push(LineRef {
            span: Span::at(offset, 0),
            text: String::new(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rope_has_one_line() {
        let lines = lines_with_spans(&Rope::from(""));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].span, Span::new(0, 0));
    }

    #[test]
    fn trailing_newline_yields_empty_line() {
        let lines = lines_with_spans(&Rope::from("a\nbc\n"));
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "bc", ""]);
        assert_eq!(lines[1].span, Span::new(2, 4));
        assert_eq!(lines[2].span, Span::new(5, 5));
    }

    #[test]
    fn sanitize_strips_marks_and_carriage_returns() {
        assert_eq!(sanitize("a\u{200B}b\r\nc\rd"), "ab\nc\nd");
    }
}
