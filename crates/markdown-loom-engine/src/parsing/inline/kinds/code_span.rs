use crate::parsing::inline::cursor::Cursor;

/// Code span inline type with owned delimiter constant.
///
/// Code spans are raw zones: nothing else is parsed inside them.
pub struct CodeSpan;

/// A matched code span: source length and decoded content.
#[derive(Debug, PartialEq, Eq)]
pub struct CodeSpanMatch {
    pub len: usize,
    pub content: String,
}

impl CodeSpan {
    pub const TICK: u8 = b'`';

    /// Matches a code span at the cursor. An opening run of N backticks is
    /// closed only by a run of exactly N. An unclosed run yields `Err(N)` so
    /// the caller can take the whole run as literal text.
    pub fn scan(cur: &Cursor<'_>) -> Result<CodeSpanMatch, usize> {
        let mut probe = cur.clone();
        let open = probe.eat_run(Self::TICK);
        let inner_start = probe.i;
        while !probe.eof() {
            if probe.peek() == Some(Self::TICK) {
                let close_start = probe.i;
                let close = probe.eat_run(Self::TICK);
                if close == open {
                    let raw = &cur.s[inner_start..close_start];
                    return Ok(CodeSpanMatch {
                        len: probe.i - cur.i,
                        content: Self::decode(raw),
                    });
                }
            } else {
                probe.bump_char();
            }
        }
        Err(open)
    }

    /// Newlines become spaces; one surrounding space pair is stripped when the
    /// content is not all spaces.
    fn decode(raw: &str) -> String {
        let content = raw.replace('\n', " ");
        let blank = content.bytes().all(|b| b == b' ');
        if !blank && content.len() >= 2 && content.starts_with(' ') && content.ends_with(' ') {
            content[1..content.len() - 1].to_string()
        } else {
            content
        }
    }
}
