//! Canonical serialization of a block tree.
//!
//! Structural edits work on nodes, not text, so after each one the normalizer
//! re-synthesizes every block's `text` and `span` from its inlines and
//! children: list markers (renumbered), quote prefixes, table pipes and the
//! divider row. Parsing the output yields a tree of the same shape.

use crate::ast::Ast;
use crate::ast::id::NodeId;
use crate::ast::node::{Alignment, BlockKind, CODE_SENTINEL, Inline};
use crate::options::ParseOptions;
use crate::parsing::blocks::kinds::{BlockQuote, CodeFence, ListMarker, Paragraph, Table};
use crate::parsing::rope::Span;

/// Rewrites every block's text and span; returns the document text.
pub fn normalize(ast: &mut Ast, options: &ParseOptions) -> String {
    let root = ast.root();
    Normalizer { ast, options }.render(root, 0)
}

/// Serialized text of a leaf from its inline run.
pub fn leaf_text(inlines: &[Inline]) -> String {
    inlines.iter().map(rendered).collect()
}

/// Serialized form of an inline: caret-host placeholders render as nothing.
pub fn rendered(inline: &Inline) -> &str {
    match inline.symbolic() {
        CODE_SENTINEL | Paragraph::PLACEHOLDER if !inline.is_marker() => "",
        s => s,
    }
}

/// Recomputes block-local spans of an inline run from symbolic lengths.
pub fn layout_inlines(inlines: &mut [Inline], start: usize) -> usize {
    let mut pos = start;
    for inline in inlines {
        let len = rendered(inline).len();
        inline.span = Span::at(pos, len);
        let open = inline.kind.open_len(&inline.text.symbolic);
        layout_inlines(&mut inline.children, pos + open);
        pos += len;
    }
    pos
}

struct Normalizer<'a> {
    ast: &'a mut Ast,
    options: &'a ParseOptions,
}

impl Normalizer<'_> {
    /// Renders `id` with its span starting at zero; children are positioned
    /// relative to it. `depth` is the list nesting depth.
    fn render(&mut self, id: NodeId, depth: usize) -> String {
        let Some(kind) = self.ast.kind(id).cloned() else {
            return String::new();
        };
        let text = match &kind {
            BlockKind::Document => self.join_children(id, depth),
            BlockKind::List(_) => self.join_children(id, depth),
            BlockKind::ListItem | BlockKind::TaskListItem { .. } => self.render_item(id, depth),
            BlockKind::BlockQuote => self.render_quote(id),
            BlockKind::Table { alignments } => self.render_table(id, alignments),
            BlockKind::TableRow => self.render_row(id),
            BlockKind::TableCell | BlockKind::TableHeader => self.render_cell(id),
            BlockKind::CodeBlock(info) if info.fenced => self.render_leaf(id, |inlines| {
                let (open, body, close) = fence_parts(inlines);
                let mut s = open.to_string();
                if let Some(body) = body {
                    s.push('\n');
                    s.push_str(body);
                }
                if let Some(close) = close {
                    s.push('\n');
                    s.push_str(close);
                }
                s
            }),
            BlockKind::CodeBlock(_) => self.render_leaf(id, |inlines| {
                leaf_text(inlines)
                    .split('\n')
                    .map(|line| format!("{}{line}", CodeFence::INDENT))
                    .collect::<Vec<_>>()
                    .join("\n")
            }),
            _ => self.render_leaf(id, leaf_text),
        };
        if let Some(block) = self.ast.block_mut(id) {
            block.text = text.clone();
            block.span = Span::at(0, text.len());
        }
        text
    }

    fn render_leaf(&mut self, id: NodeId, serialize: impl Fn(&[Inline]) -> String) -> String {
        let Some(block) = self.ast.block_mut(id) else {
            return String::new();
        };
        let text = serialize(&block.inlines);
        if let BlockKind::CodeBlock(info) = &block.kind {
            layout_code(&mut block.inlines, info.fenced);
        } else {
            layout_inlines(&mut block.inlines, 0);
        }
        text
    }

    /// Children separated by newlines.
    fn join_children(&mut self, id: NodeId, depth: usize) -> String {
        let mut out = String::new();
        for (i, child) in self.ast.children(id).to_vec().into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let text = self.render(child, depth);
            self.shift(child, out.len());
            out.push_str(&text);
        }
        out
    }

    fn render_item(&mut self, id: NodeId, depth: usize) -> String {
        let marker = self.item_marker(id);
        let indent = " ".repeat(self.options.list_indent * depth);
        let prefix = format!("{indent}{marker}");
        if let Some(block) = self.ast.block_mut(id)
            && let Some(m) = block.inlines.iter_mut().find(|i| i.is_marker())
        {
            m.text.symbolic = marker.clone();
            m.text.semantic = marker;
            m.span = Span::at(indent.len(), m.text.symbolic.len());
        }

        let mut out = prefix.clone();
        let mut first = true;
        for child in self.ast.children(id).to_vec() {
            let nested = matches!(self.ast.kind(child), Some(BlockKind::List(_)));
            if nested {
                let text = self.render(child, depth + 1);
                out.push('\n');
                self.shift(child, out.len());
                out.push_str(&text);
            } else {
                let text = self.render(child, depth);
                if !first {
                    out.push('\n');
                    out.push_str(&" ".repeat(prefix.len()));
                }
                self.shift(child, out.len());
                out.push_str(&text);
            }
            first = false;
        }
        out
    }

    /// The marker for an item from its existing marker inline, renumbered
    /// for its position and carrying its checkbox state.
    fn item_marker(&self, id: NodeId) -> String {
        let Some(block) = self.ast.block(id) else {
            return String::new();
        };
        let existing = block.inlines.iter().find(|i| i.is_marker()).map(|i| i.symbolic());
        let task = match block.kind {
            BlockKind::TaskListItem { checked } => Some(checked),
            _ => None,
        };
        let ordinal = self.ast.parent_of(id).and_then(|list| match self.ast.kind(list) {
            Some(BlockKind::List(info)) if info.ordered => {
                let idx = self.ast.index_in_parent(id).unwrap_or(0) as u32;
                Some((info.start + idx, info.delimiter))
            }
            _ => None,
        });
        ListMarker::rewrite(existing, ordinal, task)
    }

    fn render_quote(&mut self, id: NodeId) -> String {
        let mut out = String::new();
        for (i, child) in self.ast.children(id).to_vec().into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let text = self.render(child, 0);
            let prefix = if text.is_empty() || text.starts_with('\n') {
                BlockQuote::PREFIX.len_utf8()
            } else {
                BlockQuote::LINE_PREFIX.len()
            };
            self.shift(child, out.len() + prefix);
            out.push_str(&BlockQuote::prefix_lines(&text));
        }
        out
    }

    fn render_cell(&mut self, id: NodeId) -> String {
        let mut out = String::new();
        for (i, child) in self.ast.children(id).to_vec().into_iter().enumerate() {
            if i > 0 {
                out.push_str(Table::BR);
            }
            let text = self.render(child, 0).replace('\n', Table::BR);
            self.shift(child, out.len());
            out.push_str(&text);
        }
        out
    }

    fn render_row(&mut self, id: NodeId) -> String {
        let mut out = String::from("|");
        for child in self.ast.children(id).to_vec() {
            let text = self.render(child, 0);
            out.push(' ');
            self.shift(child, out.len());
            out.push_str(&text);
            out.push_str(" |");
        }
        out
    }

    fn render_table(&mut self, id: NodeId, alignments: &[Alignment]) -> String {
        let rows = self.ast.children(id).to_vec();
        let mut rendered = Vec::with_capacity(rows.len());
        let mut widths: Vec<usize> = Vec::new();
        for row in &rows {
            let text = self.render(*row, 0);
            for (col, cell) in self.ast.children(*row).iter().enumerate() {
                let w = self.ast.block(*cell).map_or(0, |c| c.text.chars().count());
                if col >= widths.len() {
                    widths.push(w);
                } else {
                    widths[col] = widths[col].max(w);
                }
            }
            rendered.push(text);
        }

        let divider = {
            let cells: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(col, w)| Table::divider_cell(alignments.get(col).copied().unwrap_or(Alignment::None), *w))
                .collect();
            format!("| {} |", cells.join(" | "))
        };

        let mut out = String::new();
        for (i, (row, text)) in rows.iter().zip(rendered).enumerate() {
            if i > 0 {
                out.push('\n');
            }
            self.shift(*row, out.len());
            out.push_str(&text);
            if i == 0 {
                out.push('\n');
                out.push_str(&divider);
            }
        }
        out
    }

    /// Moves every span in the subtree at `id` by `delta`.
    fn shift(&mut self, id: NodeId, delta: usize) {
        if delta == 0 {
            return;
        }
        for d in self.ast.descendants(id) {
            if let Some(block) = self.ast.block_mut(d) {
                block.span = block.span.shifted(delta);
            }
        }
    }
}

/// Opening line, payload and closing line of a fenced code block's run.
/// A sentinel payload means no content lines.
pub fn fence_parts(inlines: &[Inline]) -> (&str, Option<&str>, Option<&str>) {
    let open = inlines.first().filter(|i| i.is_marker()).map_or("", |i| i.symbolic());
    let body_idx = inlines.iter().position(|i| !i.is_marker());
    let body = body_idx
        .map(|i| inlines[i].symbolic())
        .filter(|s| *s != CODE_SENTINEL);
    let close = body_idx
        .and_then(|i| inlines.get(i + 1))
        .filter(|i| i.is_marker())
        .map(|i| i.symbolic());
    (open, body, close)
}

fn layout_code(inlines: &mut [Inline], fenced: bool) {
    let mut pos = if fenced { 0 } else { CodeFence::INDENT.len() };
    for (i, inline) in inlines.iter_mut().enumerate() {
        let len = rendered(inline).len();
        if fenced && i > 0 && !(len == 0 && !inline.is_marker()) {
            pos += 1;
        }
        inline.span = Span::at(pos, len);
        pos += len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::id::SequentialIds;
    use crate::ast::query::flatten_leaves;
    use crate::parsing::parse_document;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn round_trip(src: &str) -> (Ast, String) {
        let options = ParseOptions::default();
        let mut ast = parse_document(src, &options, &mut SequentialIds::default()).ast;
        let text = normalize(&mut ast, &options);
        (ast, text)
    }

    #[rstest]
    #[case("hello world")]
    #[case("# Title\n\nbody *em* and **strong**")]
    #[case("- a\n- b\n  - c\n- d")]
    #[case("1. one\n2. two")]
    #[case("- [ ] todo\n- [x] done")]
    #[case("> quoted\n>\n> > nested")]
    #[case("```rust\nfn main() {}\n```")]
    #[case("````\n```\n````")]
    #[case("    indented\n    code")]
    #[case("***\n<div>\n[^1]: note")]
    #[case("a\n\n\nb\n")]
    fn canonical_input_round_trips(#[case] src: &str) {
        let (_, text) = round_trip(src);
        assert_eq!(text, src);
    }

    #[test]
    fn ordered_lists_are_renumbered() {
        let (_, text) = round_trip("3. a\n3. b\n3. c");
        assert_eq!(text, "3. a\n4. b\n5. c");
    }

    #[test]
    fn table_gets_canonical_pipes_and_divider() {
        let (_, text) = round_trip("h1|header two\n:-|-:\nx|y<br>z");
        assert_snapshot!(text, @r"
        | h1 | header two |
        | :-- | ---------: |
        | x | y<br>z |
        ");
    }

    #[test]
    fn spans_match_text_lengths() {
        let (ast, text) = round_trip("# T\n- a\n- **b**\n\n| x |\n| --- |\n| y |");
        for id in ast.descendants(ast.root()) {
            let block = ast.block(id).unwrap();
            assert_eq!(block.span.len(), block.text.len(), "block {}", block.kind.tag());
        }
        for id in flatten_leaves(&ast) {
            let block = ast.block(id).unwrap();
            if !matches!(block.kind, BlockKind::TableCell | BlockKind::TableHeader) {
                assert_eq!(&text[block.span.start..block.span.end], block.text);
            }
        }
    }

    #[test]
    fn nested_list_item_positions() {
        let (ast, text) = round_trip("- a\n  - b");
        let b = flatten_leaves(&ast)[1];
        let block = ast.block(b).unwrap();
        assert_eq!(&text[block.span.start..block.span.end], "b");
    }

    #[test]
    fn fenced_code_inline_layout() {
        let (ast, _) = round_trip("```js\nlet x = 1\n```");
        let block = ast.block(flatten_leaves(&ast)[0]).unwrap();
        let starts: Vec<usize> = block.inlines.iter().map(|i| i.span.start).collect();
        assert_eq!(starts, vec![0, 6, 16]);
        assert_eq!(block.text, "```js\nlet x = 1\n```");
    }

    #[test]
    fn normalize_then_parse_is_stable() {
        let options = ParseOptions::default();
        let src = "* a\n    * b\n10) x\n> - q\n|a|b|\n|-|-|\n|1|2|";
        let (_, first) = round_trip(src);
        let mut again = parse_document(&first, &options, &mut SequentialIds::default()).ast;
        let second = normalize(&mut again, &options);
        assert_eq!(first, second);
    }
}
