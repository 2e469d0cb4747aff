use crate::parsing::link_refs::LinkRefs;

/// Paragraph block type.
///
/// Paragraphs have no delimiters. They are the default leaf block when no
/// other opener matches, and also carry blank lines (as empty paragraphs) and
/// link reference definitions (as a single text run).
pub struct Paragraph;

impl Paragraph {
    /// Content of a paragraph synthesized only to host the caret.
    pub const PLACEHOLDER: &'static str = "\u{200D}";

    /// Link reference definition lines are kept verbatim, not tokenized.
    pub fn is_verbatim(line: &str) -> bool {
        LinkRefs::is_definition(line)
    }
}
