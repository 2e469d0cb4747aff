//! Inline runs for leaf blocks.
//!
//! Structural syntax (heading hashes, footnote labels, fence lines) becomes
//! `marker` inlines ahead of the content so the concatenated symbolic text of a
//! leaf always equals its serialized form.

use crate::ast::id::{IdGenerator, NodeId};
use crate::ast::node::{BlockKind, BlockNode, CODE_SENTINEL, CodeBlockInfo, Inline, InlineKind, InlineText};
use crate::options::Extensions;
use crate::parsing::inline::InlineParser;
use crate::parsing::link_refs::LinkRefs;
use crate::parsing::rope::Span;

use super::kinds::{FootnoteDefinition, Heading, Paragraph};

/// Shared inputs for building inline runs.
#[derive(Clone, Copy)]
pub struct InlineContext<'a> {
    pub refs: &'a LinkRefs,
    pub extensions: Extensions,
}

/// Builds inlines for every leaf in `node`'s subtree that has none yet.
pub fn attach_inlines(node: &mut BlockNode, cx: InlineContext<'_>, ids: &mut dyn IdGenerator) {
    if node.kind.is_leaf() && node.inlines.is_empty() {
        node.inlines = leaf_inlines(&node.kind, &node.text, node.id, cx, ids);
    }
    for child in &mut node.children {
        attach_inlines(child, cx, ids);
    }
}

/// The inline run for a leaf of `kind` whose serialized text is `text`.
/// For code blocks `text` is the payload only.
pub fn leaf_inlines(
    kind: &BlockKind,
    text: &str,
    block_id: NodeId,
    cx: InlineContext<'_>,
    ids: &mut dyn IdGenerator,
) -> Vec<Inline> {
    let mut inlines = match kind {
        BlockKind::Heading { .. } => {
            let marker_len = Heading::parse(text).map_or(0, |(_, len)| len);
            marker_then_content(text, marker_len, block_id, cx, ids)
        }
        BlockKind::FootnoteDefinition { .. } => {
            let marker_len = FootnoteDefinition::parse(text).map_or(0, |(_, len)| len);
            marker_then_content(text, marker_len, block_id, cx, ids)
        }
        BlockKind::ThematicBreak => vec![marker(text, 0, block_id, ids)],
        BlockKind::HtmlBlock => vec![Inline::new(
            ids.next_id(),
            InlineKind::RawHtml,
            block_id,
            InlineText::same(text),
            0,
        )],
        BlockKind::CodeBlock(info) => {
            let payload = (!text.is_empty()).then_some(text);
            return code_block_inlines(block_id, info, payload, None, ids);
        }
        BlockKind::Paragraph if Paragraph::is_verbatim(text) => vec![plain(text, 0, block_id, ids)],
        _ => InlineParser::new(cx.refs, cx.extensions, block_id, ids).parse(text, 0),
    };
    if inlines.iter().all(Inline::is_marker) && !matches!(kind, BlockKind::ThematicBreak | BlockKind::HtmlBlock) {
        let at = inlines.last().map_or(0, |i| i.span.end);
        inlines.push(plain("", at, block_id, ids));
    }
    inlines
}

fn marker_then_content(
    text: &str,
    marker_len: usize,
    block_id: NodeId,
    cx: InlineContext<'_>,
    ids: &mut dyn IdGenerator,
) -> Vec<Inline> {
    let (head, body) = text.split_at(marker_len.min(text.len()));
    let mut out = Vec::new();
    if !head.is_empty() {
        out.push(marker(head, 0, block_id, ids));
    }
    out.extend(InlineParser::new(cx.refs, cx.extensions, block_id, ids).parse(body, head.len()));
    out
}

pub fn marker(text: &str, at: usize, block_id: NodeId, ids: &mut dyn IdGenerator) -> Inline {
    Inline::new(ids.next_id(), InlineKind::Marker, block_id, InlineText::same(text), at)
}

pub fn plain(text: &str, at: usize, block_id: NodeId, ids: &mut dyn IdGenerator) -> Inline {
    Inline::new(ids.next_id(), InlineKind::Text, block_id, InlineText::same(text), at)
}

/// Fence marker, payload text and (when closed) closing marker.
///
/// `payload` of `None` stands for a block with no content lines; it gets the
/// sentinel text inline. `close` overrides the closing fence line, which
/// otherwise is synthesized from `info` when the block is closed.
pub fn code_block_inlines(
    block_id: NodeId,
    info: &CodeBlockInfo,
    payload: Option<&str>,
    close: Option<&str>,
    ids: &mut dyn IdGenerator,
) -> Vec<Inline> {
    if !info.fenced {
        let text = payload.unwrap_or(CODE_SENTINEL);
        let mut body = plain(text, 0, block_id, ids);
        if payload.is_none() {
            body.span = Span::at(0, 0);
        }
        return vec![body];
    }
    let open = info.open_marker();
    let text_start = open.len() + 1;
    let mut out = vec![marker(&open, 0, block_id, ids)];
    let mut body = plain(payload.unwrap_or(CODE_SENTINEL), text_start, block_id, ids);
    let close_start = match payload {
        Some(p) => text_start + p.len() + 1,
        None => {
            body.span = Span::at(text_start, 0);
            text_start
        }
    };
    out.push(body);
    if info.closed {
        let close = close.map_or_else(|| info.close_marker(), str::to_string);
        out.push(marker(&close, close_start, block_id, ids));
    }
    out
}

/// True if `inline` is the empty-code sentinel.
pub fn is_sentinel(inline: &Inline) -> bool {
    inline.text.symbolic == CODE_SENTINEL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::id::SequentialIds;
    use crate::ast::node::symbolic_text;
    use pretty_assertions::assert_eq;

    fn build(kind: BlockKind, text: &str) -> Vec<Inline> {
        let refs = LinkRefs::default();
        let cx = InlineContext {
            refs: &refs,
            extensions: Extensions::default(),
        };
        leaf_inlines(&kind, text, NodeId(1), cx, &mut SequentialIds::default())
    }

    #[test]
    fn heading_marker_then_content() {
        let inlines = build(BlockKind::Heading { level: 2 }, "## Hello *you*");
        assert!(inlines[0].is_marker());
        assert_eq!(inlines[0].text.symbolic, "## ");
        assert_eq!(symbolic_text(&inlines), "## Hello *you*");
        assert_eq!(inlines[1].span.start, 3);
    }

    #[test]
    fn empty_leaves_get_a_caret_host() {
        let para = build(BlockKind::Paragraph, "");
        assert_eq!(para.len(), 1);
        assert_eq!(para[0].kind, InlineKind::Text);
        let heading = build(BlockKind::Heading { level: 1 }, "# ");
        assert_eq!(heading.len(), 2);
        assert_eq!(heading[1].span, Span::at(2, 0));
    }

    #[test]
    fn link_definition_stays_single_text() {
        let inlines = build(BlockKind::Paragraph, "[a]: /b \"t\"");
        assert_eq!(inlines.len(), 1);
        assert_eq!(inlines[0].kind, InlineKind::Text);
    }

    #[test]
    fn fenced_code_inlines() {
        let info = crate::parsing::blocks::kinds::CodeFence::open("```js").unwrap();
        let mut closed = info.clone();
        closed.closed = true;
        let inlines = code_block_inlines(NodeId(1), &closed, Some("let x = 1"), None, &mut SequentialIds::default());
        let shape: Vec<_> = inlines.iter().map(|i| (i.kind.tag(), i.text.symbolic.as_str(), i.span.start)).collect();
        assert_eq!(
            shape,
            vec![("marker", "```js", 0), ("text", "let x = 1", 6), ("marker", "```", 16)]
        );

        let empty = code_block_inlines(NodeId(1), &info, None, None, &mut SequentialIds::default());
        assert_eq!(empty.len(), 2);
        assert!(is_sentinel(&empty[1]));
        assert!(empty[1].span.is_empty());
    }
}
