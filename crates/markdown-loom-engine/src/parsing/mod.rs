pub mod blocks;
pub mod inline;
pub mod link_refs;
pub mod rope;

use tracing::debug;
use xi_rope::Rope;

use crate::ast::Ast;
use crate::ast::id::{IdGenerator, NodeId};
use crate::ast::node::{BlockKind, BlockNode, Inline};
use crate::options::{Extensions, ParseOptions};

use blocks::{BlockParser, InlineContext, attach_inlines, merge_blocks};
use inline::InlineParser;
use link_refs::LinkRefs;
use rope::{Span, lines_with_spans, sanitize};

/// Result of a full document parse.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub ast: Ast,
    /// Link reference definitions collected from the whole document; fragment
    /// re-parses of this document consult the same table.
    pub refs: LinkRefs,
    /// The sanitized source the tree was built from.
    pub text: String,
}

/// Parses a whole document into an arena rooted at a `document` block.
///
/// Block text is left as parsed; run the normalizer for canonical text.
pub fn parse_document(source: &str, options: &ParseOptions, ids: &mut dyn IdGenerator) -> ParsedDocument {
    let text = sanitize(source);
    let refs = LinkRefs::scan(&text);
    let blocks = parse_blocks(&text, 0, &refs, options, ids);
    debug!(blocks = blocks.len(), refs = refs.len(), bytes = text.len(), "parsed document");

    let root = BlockNode::new(ids.next_id(), BlockKind::Document, text.as_str(), Span::new(0, text.len()))
        .with_children(blocks);
    ParsedDocument {
        ast: Ast::from_node(root),
        refs,
        text,
    }
}

/// Parses `source` as a fragment whose first byte sits at `offset` in the
/// document. Block parser state starts fresh; `refs` comes from the document.
pub fn reparse_fragment(
    source: &str,
    offset: usize,
    refs: &LinkRefs,
    options: &ParseOptions,
    ids: &mut dyn IdGenerator,
) -> Vec<BlockNode> {
    let text = sanitize(source);
    parse_blocks(&text, offset, refs, options, ids)
}

/// Parses `text` as the inline run of a block of `owner_kind`. Code blocks
/// take their text literally.
pub fn parse_inline_run(
    text: &str,
    owner: NodeId,
    owner_kind: &BlockKind,
    offset: usize,
    refs: &LinkRefs,
    extensions: Extensions,
    ids: &mut dyn IdGenerator,
) -> Vec<Inline> {
    if matches!(owner_kind, BlockKind::CodeBlock(_)) {
        return vec![blocks::leaf::plain(text, offset, owner, ids)];
    }
    InlineParser::new(refs, extensions, owner, ids).parse(text, offset)
}

fn parse_blocks(
    text: &str,
    base: usize,
    refs: &LinkRefs,
    options: &ParseOptions,
    ids: &mut dyn IdGenerator,
) -> Vec<BlockNode> {
    let rope = Rope::from(text);
    let mut parser = BlockParser::new(options.clone());
    let mut nodes = Vec::new();
    for line in lines_with_spans(&rope) {
        if let Some(out) = parser.line(&line.text, base + line.span.start, ids) {
            nodes.extend(out);
        }
    }
    if let Some(out) = parser.flush(ids) {
        nodes.extend(out);
    }

    let mut nodes = merge_blocks(nodes, ids);
    let cx = InlineContext {
        refs,
        extensions: options.extensions,
    };
    for node in &mut nodes {
        attach_inlines(node, cx, ids);
        settle(node, text, base);
    }
    nodes
}

/// Gives containers a span covering their children and the provisional text
/// of the source lines they span.
fn settle(node: &mut BlockNode, text: &str, base: usize) {
    for child in &mut node.children {
        settle(child, text, base);
        node.span = node.span.cover(child.span);
    }
    if node.kind.is_container()
        && let Some(src) = text.get(node.span.start - base..node.span.end - base)
    {
        node.text = src.to_string();
    }
}
