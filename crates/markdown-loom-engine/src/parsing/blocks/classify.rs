use crate::ast::node::{BlockType, CodeBlockInfo};
use crate::options::Extensions;

use super::kinds::{
    BlockQuote, CodeFence, FootnoteDefinition, Heading, HtmlBlock, ListMarker, Paragraph, Table, ThematicBreak,
};

/// Classification of a single line from local facts only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Blank,
    Heading { level: u8, marker_len: usize },
    /// Offset where the quoted content starts.
    BlockQuote { content_start: usize },
    ThematicBreak,
    FenceOpen(CodeBlockInfo),
    ListItem(ListMarker),
    IndentedCode,
    TableRow,
    FootnoteDefinition { label: String, marker_len: usize },
    HtmlBlock,
    LinkDefinition,
    Paragraph,
}

impl LineClass {
    pub fn block_type(&self) -> BlockType {
        match self {
            LineClass::Blank => BlockType::Blank,
            LineClass::Heading { level, .. } => BlockType::Heading(*level),
            LineClass::BlockQuote { .. } => BlockType::BlockQuote,
            LineClass::ThematicBreak => BlockType::ThematicBreak,
            LineClass::FenceOpen(_) | LineClass::IndentedCode => BlockType::CodeBlock,
            LineClass::ListItem(m) if m.task.is_some() => BlockType::TaskListItem,
            LineClass::ListItem(m) => BlockType::ListItem { ordered: m.ordered() },
            LineClass::TableRow => BlockType::Table,
            LineClass::FootnoteDefinition { .. } => BlockType::FootnoteDefinition,
            LineClass::HtmlBlock => BlockType::HtmlBlock,
            LineClass::LinkDefinition | LineClass::Paragraph => BlockType::Paragraph,
        }
    }
}

/// Line context the classifier cannot see on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineContext {
    /// The previous line was a list item, so indentation is not code.
    pub in_list: bool,
    /// Table rows may start here.
    pub allow_table: bool,
}

/// Classifies lines in the block parser's detection order.
pub struct MarkdownLineClassifier {
    pub extensions: Extensions,
}

impl MarkdownLineClassifier {
    pub fn new(extensions: Extensions) -> Self {
        Self { extensions }
    }

    pub fn classify(&self, line: &str, ctx: LineContext) -> LineClass {
        if line.trim().is_empty() {
            return LineClass::Blank;
        }
        if let Some((level, marker_len)) = Heading::parse(line) {
            return LineClass::Heading { level, marker_len };
        }
        if let Some(content_start) = BlockQuote::strip_prefix(line) {
            return LineClass::BlockQuote { content_start };
        }
        if ThematicBreak::matches(line) {
            return LineClass::ThematicBreak;
        }
        if let Some(info) = CodeFence::open(line) {
            return LineClass::FenceOpen(info);
        }
        if let Some(marker) = ListMarker::parse(line, self.extensions.task_lists) {
            return LineClass::ListItem(marker);
        }
        if !ctx.in_list && CodeFence::indented(line).is_some() {
            return LineClass::IndentedCode;
        }
        if ctx.allow_table && self.extensions.tables && Table::looks_like_row(line) {
            return LineClass::TableRow;
        }
        if self.extensions.footnotes
            && let Some((label, marker_len)) = FootnoteDefinition::parse(line)
        {
            return LineClass::FootnoteDefinition { label, marker_len };
        }
        if HtmlBlock::matches(line) {
            return LineClass::HtmlBlock;
        }
        if Paragraph::is_verbatim(line) {
            return LineClass::LinkDefinition;
        }
        LineClass::Paragraph
    }
}

/// Block type implied by the first line of `text`, outside any list context.
pub fn detect_block_type(text: &str, extensions: Extensions) -> BlockType {
    let first = text.split('\n').next().unwrap_or_default();
    let ctx = LineContext {
        in_list: false,
        allow_table: true,
    };
    MarkdownLineClassifier::new(extensions).classify(first, ctx).block_type()
}
