use serde::Serialize;

use crate::ast::id::NodeId;
use crate::parsing::rope::Span;

/// Payload of a code block with no content lines, so the block still has a
/// text inline to host the caret.
pub const CODE_SENTINEL: &str = "\u{200B}";

/// Column alignment parsed from a table divider row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

/// List-level attributes shared by every item of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListInfo {
    pub ordered: bool,
    /// First ordinal for ordered lists (1 for bullet lists).
    pub start: u32,
    pub tight: bool,
    /// `.`/`)` for ordered lists, the bullet character otherwise.
    pub delimiter: char,
}

impl ListInfo {
    pub fn bullet(delimiter: char) -> Self {
        Self {
            ordered: false,
            start: 1,
            tight: true,
            delimiter,
        }
    }

    pub fn ordered(start: u32, delimiter: char) -> Self {
        Self {
            ordered: true,
            start,
            tight: true,
            delimiter,
        }
    }
}

/// Fence attributes of a code block, derived from its opening marker line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlockInfo {
    pub fenced: bool,
    pub fence_char: char,
    pub fence_len: usize,
    /// Full info string after the fence.
    pub info: String,
    /// First word of the info string.
    pub language: Option<String>,
    /// Leading spaces before the opening fence.
    pub open_indent: usize,
    /// Whether a closing fence line was seen.
    pub closed: bool,
}

impl CodeBlockInfo {
    pub fn indented() -> Self {
        Self {
            fenced: false,
            fence_char: '`',
            fence_len: 0,
            info: String::new(),
            language: None,
            open_indent: 4,
            closed: true,
        }
    }

    /// The opening fence line, reconstructed.
    pub fn open_marker(&self) -> String {
        let mut s = " ".repeat(self.open_indent);
        s.extend(std::iter::repeat_n(self.fence_char, self.fence_len));
        s.push_str(&self.info);
        s
    }

    /// The closing fence line, reconstructed.
    pub fn close_marker(&self) -> String {
        std::iter::repeat_n(self.fence_char, self.fence_len).collect()
    }
}

/// The kind of a block, with kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Document,
    Paragraph,
    Heading { level: u8 },
    BlockQuote,
    List(ListInfo),
    ListItem,
    TaskListItem { checked: bool },
    CodeBlock(CodeBlockInfo),
    Table { alignments: Vec<Alignment> },
    TableRow,
    TableHeader,
    TableCell,
    ThematicBreak,
    HtmlBlock,
    FootnoteDefinition { label: String },
}

impl BlockKind {
    /// Blocks that own child blocks rather than an inline run.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            BlockKind::Document
                | BlockKind::BlockQuote
                | BlockKind::List(_)
                | BlockKind::ListItem
                | BlockKind::TaskListItem { .. }
                | BlockKind::Table { .. }
                | BlockKind::TableRow
                | BlockKind::TableHeader
                | BlockKind::TableCell
        )
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_container()
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, BlockKind::ListItem | BlockKind::TaskListItem { .. })
    }

    pub fn is_table_cell(&self) -> bool {
        matches!(self, BlockKind::TableCell | BlockKind::TableHeader)
    }

    /// Block kinds an inline merge must not silently cross.
    pub fn is_merge_boundary(&self) -> bool {
        self.is_list_item() || self.is_table_cell() || matches!(self, BlockKind::BlockQuote)
    }

    /// Short lowercase tag, matching the serialized `type` names.
    pub fn tag(&self) -> &'static str {
        match self {
            BlockKind::Document => "document",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading { .. } => "heading",
            BlockKind::BlockQuote => "blockQuote",
            BlockKind::List(_) => "list",
            BlockKind::ListItem => "listItem",
            BlockKind::TaskListItem { .. } => "taskListItem",
            BlockKind::CodeBlock(_) => "codeBlock",
            BlockKind::Table { .. } => "table",
            BlockKind::TableRow => "tableRow",
            BlockKind::TableHeader => "tableHeader",
            BlockKind::TableCell => "tableCell",
            BlockKind::ThematicBreak => "thematicBreak",
            BlockKind::HtmlBlock => "htmlBlock",
            BlockKind::FootnoteDefinition { .. } => "footnoteDefinition",
        }
    }
}

/// The block type detected from a line of text, used to notice when an edit
/// changes what a block is (`# ` typed at the start of a paragraph, say).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Blank,
    Paragraph,
    Heading(u8),
    BlockQuote,
    ListItem { ordered: bool },
    TaskListItem,
    CodeBlock,
    Table,
    ThematicBreak,
    HtmlBlock,
    FootnoteDefinition,
}

/// The kind of an inline node, with kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InlineKind {
    Text,
    /// Structural syntax: list bullets, heading hashes, code fence lines.
    Marker,
    Emphasis,
    Strong,
    CodeSpan,
    Link { url: String, title: Option<String> },
    Autolink { url: String },
    Image { url: String, alt: String, title: Option<String> },
    Strikethrough,
    FootnoteRef { label: String },
    Emoji { name: String },
    SoftBreak,
    HardBreak,
    RawHtml,
    Entity { decoded: String },
}

impl InlineKind {
    /// Bytes of opening syntax before the first child of a composite inline.
    pub fn open_len(&self, symbolic: &str) -> usize {
        match self {
            InlineKind::Emphasis => 1,
            InlineKind::Strong | InlineKind::Strikethrough => 2,
            InlineKind::Link { .. } => usize::from(symbolic.starts_with('[')),
            _ => 0,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            InlineKind::Text => "text",
            InlineKind::Marker => "marker",
            InlineKind::Emphasis => "emphasis",
            InlineKind::Strong => "strong",
            InlineKind::CodeSpan => "codeSpan",
            InlineKind::Link { .. } => "link",
            InlineKind::Autolink { .. } => "autolink",
            InlineKind::Image { .. } => "image",
            InlineKind::Strikethrough => "strikethrough",
            InlineKind::FootnoteRef { .. } => "footnoteRef",
            InlineKind::Emoji { .. } => "emoji",
            InlineKind::SoftBreak => "softBreak",
            InlineKind::HardBreak => "hardBreak",
            InlineKind::RawHtml => "rawHTML",
            InlineKind::Entity { .. } => "entity",
        }
    }
}

/// Source and display forms of an inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InlineText {
    /// The literal source substring, e.g. `**bold**`.
    pub symbolic: String,
    /// The decoded display content, e.g. `bold`.
    pub semantic: String,
}

impl InlineText {
    pub fn same(s: impl Into<String>) -> Self {
        let s = s.into();
        Self {
            symbolic: s.clone(),
            semantic: s,
        }
    }

    pub fn new(symbolic: impl Into<String>, semantic: impl Into<String>) -> Self {
        Self {
            symbolic: symbolic.into(),
            semantic: semantic.into(),
        }
    }
}

/// An inline node. Composite kinds (emphasis, strong, strikethrough, link) own
/// their content as `children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inline {
    pub id: NodeId,
    pub kind: InlineKind,
    /// The block whose inline run contains this node.
    pub block_id: NodeId,
    pub text: InlineText,
    /// Position local to the owning block's text.
    pub span: Span,
    pub children: Vec<Inline>,
}

impl Inline {
    pub fn new(id: NodeId, kind: InlineKind, block_id: NodeId, text: InlineText, start: usize) -> Self {
        let span = Span::at(start, text.symbolic.len());
        Self {
            id,
            kind,
            block_id,
            text,
            span,
            children: Vec::new(),
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self.kind, InlineKind::Marker)
    }

    pub fn symbolic(&self) -> &str {
        &self.text.symbolic
    }

    /// Re-targets this inline and its descendants to `block_id`.
    pub fn set_block(&mut self, block_id: NodeId) {
        self.block_id = block_id;
        for child in &mut self.children {
            child.set_block(block_id);
        }
    }

    /// Shifts this inline and its descendants by `delta` bytes.
    pub fn shift(&mut self, delta: usize) {
        self.span = self.span.shifted(delta);
        for child in &mut self.children {
            child.shift(delta);
        }
    }

    /// Depth-first search for `id` among this inline and its descendants.
    pub fn find(&self, id: NodeId) -> Option<&Inline> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// Concatenated symbolic text of an inline run.
pub fn symbolic_text(inlines: &[Inline]) -> String {
    inlines.iter().map(|i| i.symbolic()).collect()
}

/// Concatenated symbolic text of the non-marker inlines of a run.
pub fn content_text(inlines: &[Inline]) -> String {
    inlines
        .iter()
        .filter(|i| !i.is_marker())
        .map(|i| i.symbolic())
        .collect()
}

/// Byte length of the leading marker inlines of a run.
pub fn marker_len(inlines: &[Inline]) -> usize {
    inlines
        .iter()
        .take_while(|i| i.is_marker())
        .map(|i| i.symbolic().len())
        .sum()
}

/// A block as stored in the [`Ast`](crate::ast::Ast) arena: children are held by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub id: NodeId,
    pub kind: BlockKind,
    /// Serialized source form. Provisional until normalized.
    pub text: String,
    /// Absolute position in the document text.
    pub span: Span,
    pub inlines: Vec<Inline>,
    pub children: Vec<NodeId>,
}

/// An owned block subtree: what the parser produces and what edits splice in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockNode {
    pub id: NodeId,
    pub kind: BlockKind,
    pub text: String,
    pub span: Span,
    pub inlines: Vec<Inline>,
    pub children: Vec<BlockNode>,
    /// Leading indentation of the source line. Only meaningful while the parser
    /// nests list items; ignored once the node is in a tree.
    #[serde(skip)]
    pub indent: usize,
}

impl BlockNode {
    pub fn new(id: NodeId, kind: BlockKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            id,
            kind,
            text: text.into(),
            span,
            inlines: Vec::new(),
            children: Vec::new(),
            indent: 0,
        }
    }

    pub fn with_children(mut self, children: Vec<BlockNode>) -> Self {
        self.children = children;
        self
    }

    /// Pre-order iterator over this node and all descendants.
    pub fn walk(&self) -> Vec<&BlockNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}
