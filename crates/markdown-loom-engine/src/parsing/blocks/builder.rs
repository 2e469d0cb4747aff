use tracing::trace;

use crate::ast::id::IdGenerator;
use crate::ast::node::{BlockKind, BlockNode, CodeBlockInfo, Inline, InlineKind, InlineText, ListInfo};
use crate::options::ParseOptions;
use crate::parsing::rope::Span;

use super::{
    classify::{LineClass, LineContext, MarkdownLineClassifier},
    kinds::{Bullet, CodeFence, ListMarker, Table},
    leaf::{code_block_inlines, marker, plain},
};

/// A fenced code block that has been opened but not yet closed.
#[derive(Debug)]
struct OpenFence {
    info: CodeBlockInfo,
    start: usize,
    end: usize,
    lines: Vec<String>,
}

impl OpenFence {
    fn finish(self, close: Option<&str>, ids: &mut dyn IdGenerator) -> BlockNode {
        let OpenFence {
            mut info,
            start,
            end,
            lines,
        } = self;
        info.closed = close.is_some();
        let payload = (!lines.is_empty()).then(|| lines.join("\n"));
        let id = ids.next_id();
        let inlines = code_block_inlines(id, &info, payload.as_deref(), close, ids);
        let mut node = BlockNode::new(id, BlockKind::CodeBlock(info), payload.unwrap_or_default(), Span::new(start, end));
        node.inlines = inlines;
        node
    }
}

#[derive(Debug, Default)]
enum TableState {
    #[default]
    None,
    /// A header-looking line waiting for its divider.
    Pending { line: String, offset: usize },
    Open(BlockNode),
}

/// Streaming, line-at-a-time block parser.
///
/// Most lines become blocks immediately. Cross-line state covers an open fenced
/// code block, a table being accumulated, and a run of quote lines, whose
/// content is fed to a nested parser. Adjacent blocks of the same container
/// kind are coalesced afterwards by [`merge_blocks`](super::merge::merge_blocks).
pub struct BlockParser {
    classifier: MarkdownLineClassifier,
    options: ParseOptions,
    fence: Option<OpenFence>,
    table: TableState,
    quote: Option<Box<BlockParser>>,
    in_list: bool,
}

impl BlockParser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            classifier: MarkdownLineClassifier::new(options.extensions),
            options,
            fence: None,
            table: TableState::None,
            quote: None,
            in_list: false,
        }
    }

    /// Feeds one line (without its newline) starting at absolute `offset`.
    /// Returns the blocks this line completes, if any.
    pub fn line(&mut self, text: &str, offset: usize, ids: &mut dyn IdGenerator) -> Option<Vec<BlockNode>> {
        let mut out = Vec::new();
        self.push_line(text, offset, ids, &mut out);
        (!out.is_empty()).then_some(out)
    }

    /// Drains everything still accumulating at end of input.
    pub fn flush(&mut self, ids: &mut dyn IdGenerator) -> Option<Vec<BlockNode>> {
        let mut out = Vec::new();
        if let Some(fence) = self.fence.take() {
            out.push(fence.finish(None, ids));
        }
        self.flush_table(ids, &mut out);
        self.flush_quote(ids, &mut out);
        (!out.is_empty()).then_some(out)
    }

    fn push_line(&mut self, text: &str, offset: usize, ids: &mut dyn IdGenerator, out: &mut Vec<BlockNode>) {
        if let Some(fence) = self.fence.as_mut() {
            fence.end = offset + text.len();
            if CodeFence::closes(&fence.info, text) {
                if let Some(fence) = self.fence.take() {
                    out.push(fence.finish(Some(text), ids));
                }
            } else {
                fence.lines.push(text.to_string());
            }
            return;
        }

        let quote_start = super::kinds::BlockQuote::strip_prefix(text);
        match std::mem::take(&mut self.table) {
            TableState::Pending { line, offset: header_offset } => {
                if quote_start.is_none() && Table::is_divider(text) {
                    let table = self.start_table(&line, header_offset, text, offset, ids);
                    self.table = TableState::Open(table);
                    return;
                }
                self.detect(&line, header_offset, false, ids, out);
            }
            TableState::Open(mut table) => {
                if quote_start.is_none() && !text.trim().is_empty() && Table::has_pipe(text) {
                    let row = self.table_row(text, offset, BlockKind::TableCell, ids);
                    table.span.end = offset + text.len();
                    table.children.push(row);
                    self.table = TableState::Open(table);
                    return;
                }
                out.push(table);
            }
            TableState::None => {}
        }

        if let Some(content_start) = quote_start {
            self.quote_line(text, offset, content_start, ids, out);
            return;
        }
        self.flush_quote(ids, out);
        self.detect(text, offset, true, ids, out);
    }

    fn detect(&mut self, text: &str, offset: usize, allow_table: bool, ids: &mut dyn IdGenerator, out: &mut Vec<BlockNode>) {
        let ctx = LineContext {
            in_list: self.in_list,
            allow_table,
        };
        let class = self.classifier.classify(text, ctx);
        trace!(offset, ?class, "classified line");
        self.in_list = matches!(class, LineClass::ListItem(_));
        let span = Span::at(offset, text.len());

        match class {
            LineClass::Blank => out.push(BlockNode::new(ids.next_id(), BlockKind::Paragraph, "", span)),
            LineClass::Heading { level, .. } => {
                out.push(BlockNode::new(ids.next_id(), BlockKind::Heading { level }, text, span));
            }
            LineClass::BlockQuote { content_start } => {
                self.quote_line(text, offset, content_start, ids, out);
            }
            LineClass::ThematicBreak => {
                let mut node = BlockNode::new(ids.next_id(), BlockKind::ThematicBreak, text, span);
                node.inlines = vec![marker(text, 0, node.id, ids)];
                out.push(node);
            }
            LineClass::FenceOpen(info) => {
                self.fence = Some(OpenFence {
                    info,
                    start: offset,
                    end: offset + text.len(),
                    lines: Vec::new(),
                });
            }
            LineClass::ListItem(m) => out.push(self.list_line(text, offset, &m, ids)),
            LineClass::IndentedCode => {
                let payload = &text[CodeFence::INDENT.len()..];
                let info = CodeBlockInfo::indented();
                let id = ids.next_id();
                let inlines = code_block_inlines(id, &info, Some(payload), None, ids);
                let mut node = BlockNode::new(id, BlockKind::CodeBlock(info), payload, span);
                node.inlines = inlines;
                out.push(node);
            }
            LineClass::TableRow => {
                self.table = TableState::Pending {
                    line: text.to_string(),
                    offset,
                };
            }
            LineClass::FootnoteDefinition { label, .. } => {
                out.push(BlockNode::new(ids.next_id(), BlockKind::FootnoteDefinition { label }, text, span));
            }
            LineClass::HtmlBlock => out.push(BlockNode::new(ids.next_id(), BlockKind::HtmlBlock, text, span)),
            LineClass::LinkDefinition => {
                let mut node = BlockNode::new(ids.next_id(), BlockKind::Paragraph, text, span);
                node.inlines = vec![plain(text, 0, node.id, ids)];
                out.push(node);
            }
            LineClass::Paragraph => out.push(BlockNode::new(ids.next_id(), BlockKind::Paragraph, text, span)),
        }
    }

    /// A single-item list; the merge pass stitches consecutive ones together.
    fn list_line(&self, text: &str, offset: usize, m: &ListMarker, ids: &mut dyn IdGenerator) -> BlockNode {
        let item_kind = match m.task {
            Some(checked) => BlockKind::TaskListItem { checked },
            None => BlockKind::ListItem,
        };
        let info = match m.bullet {
            Bullet::Unordered(c) => ListInfo::bullet(c),
            Bullet::Ordered { number, delimiter } => ListInfo::ordered(number, delimiter),
        };
        let span = Span::at(offset, text.len());
        let content = &text[m.len..];
        let para = BlockNode::new(
            ids.next_id(),
            BlockKind::Paragraph,
            content,
            Span::new(offset + m.len, offset + text.len()),
        );

        let item_id = ids.next_id();
        let mut item = BlockNode::new(item_id, item_kind, text, span).with_children(vec![para]);
        item.inlines = vec![Inline::new(
            ids.next_id(),
            InlineKind::Marker,
            item_id,
            InlineText::same(&text[m.indent..m.len]),
            m.indent,
        )];
        item.indent = m.indent;

        let mut list = BlockNode::new(ids.next_id(), BlockKind::List(info), text, span).with_children(vec![item]);
        list.indent = m.indent;
        list
    }

    fn quote_line(
        &mut self,
        text: &str,
        offset: usize,
        content_start: usize,
        ids: &mut dyn IdGenerator,
        out: &mut Vec<BlockNode>,
    ) {
        let options = self.options.clone();
        let inner = self.quote.get_or_insert_with(|| Box::new(BlockParser::new(options)));
        if let Some(children) = inner.line(&text[content_start..], offset + content_start, ids) {
            out.push(wrap_quote(children, Span::at(offset, text.len()), ids));
        }
    }

    fn flush_quote(&mut self, ids: &mut dyn IdGenerator, out: &mut Vec<BlockNode>) {
        if let Some(mut inner) = self.quote.take()
            && let Some(children) = inner.flush(ids)
        {
            let span = children
                .iter()
                .fold(children[0].span, |acc, c| acc.cover(c.span));
            out.push(wrap_quote(children, span, ids));
        }
    }

    fn flush_table(&mut self, ids: &mut dyn IdGenerator, out: &mut Vec<BlockNode>) {
        match std::mem::take(&mut self.table) {
            TableState::Pending { line, offset } => self.detect(&line, offset, false, ids, out),
            TableState::Open(table) => out.push(table),
            TableState::None => {}
        }
    }

    fn start_table(
        &self,
        header: &str,
        header_offset: usize,
        divider: &str,
        divider_offset: usize,
        ids: &mut dyn IdGenerator,
    ) -> BlockNode {
        let alignments = Table::alignments(divider);
        let header_row = self.table_row(header, header_offset, BlockKind::TableHeader, ids);
        BlockNode::new(
            ids.next_id(),
            BlockKind::Table { alignments },
            header,
            Span::new(header_offset, divider_offset + divider.len()),
        )
        .with_children(vec![header_row])
    }

    /// A row of cells, each holding one paragraph per `<br>`-separated line.
    fn table_row(&self, line: &str, offset: usize, cell_kind: BlockKind, ids: &mut dyn IdGenerator) -> BlockNode {
        let cells = Table::split_cells(line)
            .into_iter()
            .map(|cell| {
                let cell_start = offset + cell.span.start;
                let paragraphs = Table::split_br(&cell.text)
                    .into_iter()
                    .map(|(text, sp)| {
                        BlockNode::new(ids.next_id(), BlockKind::Paragraph, text, sp.shifted(cell_start))
                    })
                    .collect();
                BlockNode::new(ids.next_id(), cell_kind.clone(), cell.text, cell.span.shifted(offset))
                    .with_children(paragraphs)
            })
            .collect();
        BlockNode::new(ids.next_id(), BlockKind::TableRow, line, Span::at(offset, line.len())).with_children(cells)
    }
}

fn wrap_quote(children: Vec<BlockNode>, line: Span, ids: &mut dyn IdGenerator) -> BlockNode {
    let span = children.iter().fold(line, |acc, c| acc.cover(c.span));
    BlockNode::new(ids.next_id(), BlockKind::BlockQuote, "", span).with_children(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::id::SequentialIds;
    use pretty_assertions::assert_eq;

    fn feed(lines: &[&str]) -> Vec<BlockNode> {
        let mut ids = SequentialIds::default();
        let mut parser = BlockParser::new(ParseOptions::default());
        let mut out = Vec::new();
        let mut offset = 0;
        for line in lines {
            out.extend(parser.line(line, offset, &mut ids).unwrap_or_default());
            offset += line.len() + 1;
        }
        out.extend(parser.flush(&mut ids).unwrap_or_default());
        out
    }

    fn tags(nodes: &[BlockNode]) -> Vec<&'static str> {
        nodes.iter().map(|n| n.kind.tag()).collect()
    }

    #[test]
    fn fenced_code_block_closes_on_matching_fence() {
        let out = feed(&["```js", "let x = 1", "```"]);
        assert_eq!(out.len(), 1);
        match &out[0].kind {
            BlockKind::CodeBlock(info) => {
                assert!(info.fenced);
                assert!(info.closed);
                assert_eq!(info.language.as_deref(), Some("js"));
            }
            other => panic!("expected code block, got {other:?}"),
        }
        assert_eq!(out[0].text, "let x = 1");
        assert_eq!(out[0].span, Span::new(0, 19));
    }

    #[test]
    fn longer_fence_is_not_closed_by_shorter() {
        let out = feed(&["````", "a", "```", "b"]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "a\n```\nb");
        assert!(matches!(&out[0].kind, BlockKind::CodeBlock(info) if !info.closed));
    }

    #[test]
    fn fence_swallows_blank_and_marker_lines() {
        let out = feed(&["~~~", "", "# not heading", "~~~", "after"]);
        assert_eq!(tags(&out), vec!["codeBlock", "paragraph"]);
        assert_eq!(out[0].text, "\n# not heading");
    }

    #[test]
    fn each_list_line_is_a_single_item_list() {
        let out = feed(&["- a", "- b"]);
        assert_eq!(tags(&out), vec!["list", "list"]);
        let item = &out[0].children[0];
        assert_eq!(item.inlines[0].text.symbolic, "- ");
        assert_eq!(item.children[0].text, "a");
        assert_eq!(item.children[0].span, Span::new(2, 3));
    }

    #[test]
    fn task_items_short_circuit() {
        let out = feed(&["- [x] done"]);
        assert_eq!(out[0].children[0].kind, BlockKind::TaskListItem { checked: true });
        assert_eq!(out[0].children[0].children[0].text, "done");
    }

    #[test]
    fn table_needs_divider() {
        let out = feed(&["a | b", "not a divider"]);
        assert_eq!(tags(&out), vec!["paragraph", "paragraph"]);
        assert_eq!(out[0].text, "a | b");
    }

    #[test]
    fn table_rows_and_cells() {
        let out = feed(&["| h1 | h2 |", "| :-- | --: |", "| a | b<br>c |", "tail"]);
        assert_eq!(tags(&out), vec!["table", "paragraph"]);
        let table = &out[0];
        assert_eq!(table.children.len(), 2);
        assert_eq!(table.children[0].children[0].kind, BlockKind::TableHeader);
        let cell = &table.children[1].children[1];
        assert_eq!(cell.kind, BlockKind::TableCell);
        assert_eq!(cell.children.len(), 2);
        assert_eq!(cell.children[1].text, "c");
        assert_eq!(cell.children[1].span.start, 37);
    }

    #[test]
    fn table_flushes_at_end_of_input() {
        let out = feed(&["a | b", "--- | ---"]);
        assert_eq!(tags(&out), vec!["table"]);
    }

    #[test]
    fn pending_header_flushes_as_paragraph() {
        let out = feed(&["a | b"]);
        assert_eq!(tags(&out), vec!["paragraph"]);
    }

    #[test]
    fn quote_lines_wrap_content() {
        let out = feed(&["> a", ">", "> > b", "c"]);
        assert_eq!(tags(&out), vec!["blockQuote", "blockQuote", "blockQuote", "paragraph"]);
        assert_eq!(out[0].children[0].text, "a");
        assert_eq!(out[0].children[0].span, Span::new(2, 3));
        assert_eq!(tags(&out[2].children), vec!["blockQuote"]);
    }

    #[test]
    fn fence_inside_quote_spans_lines() {
        let out = feed(&["> ```", "> code", "> ```"]);
        assert_eq!(out.len(), 1);
        assert_eq!(tags(&out[0].children), vec!["codeBlock"]);
        assert_eq!(out[0].children[0].text, "code");
    }

    #[test]
    fn indented_code_outside_lists_only() {
        let out = feed(&["    code", "- item", "    more"]);
        assert_eq!(tags(&out), vec!["codeBlock", "list", "paragraph"]);
        assert_eq!(out[0].text, "code");
    }

    #[test]
    fn blank_lines_are_empty_paragraphs() {
        let out = feed(&["a", "", "b"]);
        assert_eq!(tags(&out), vec!["paragraph", "paragraph", "paragraph"]);
        assert_eq!(out[1].text, "");
    }
}
