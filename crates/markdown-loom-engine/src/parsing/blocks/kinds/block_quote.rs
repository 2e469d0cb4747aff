/// Blockquote block type with owned delimiter constant.
///
/// All blockquote syntax knowledge lives here, not in the classifier.
pub struct BlockQuote;

impl BlockQuote {
    pub const PREFIX: char = '>';
    /// Prefix written before each non-empty child line.
    pub const LINE_PREFIX: &'static str = "> ";

    /// Strips one level of quote prefix, returning the byte offset where the
    /// quoted content begins, or `None` if the line is not a quote line.
    ///
    /// Handles `> text`, `>text` and up to three spaces of indentation.
    pub fn strip_prefix(s: &str) -> Option<usize> {
        let b = s.as_bytes();
        let indent = b.iter().take_while(|c| **c == b' ').count();
        if indent > 3 || b.get(indent) != Some(&(Self::PREFIX as u8)) {
            return None;
        }
        let mut i = indent + 1;
        if b.get(i) == Some(&b' ') {
            i += 1;
        }
        Some(i)
    }

    /// Prefixes each line of `body`; empty lines get a bare `>`.
    pub fn prefix_lines(body: &str) -> String {
        body.split('\n')
            .map(|line| {
                if line.is_empty() {
                    Self::PREFIX.to_string()
                } else {
                    format!("{}{line}", Self::LINE_PREFIX)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
