//! Enter-key splits: plain blocks, list and task items, block quotes.

use crate::ast::id::NodeId;
use crate::ast::mutation::{Split, split_block_pure};
use crate::ast::node::{BlockKind, BlockNode};
use crate::ast::normalize::leaf_text;
use crate::parsing::blocks::kinds::{ListMarker, Paragraph};
use crate::parsing::blocks::leaf::marker;
use crate::parsing::rope::Span;

use crate::editing::effect::Effect;
use crate::editing::error::{EditError, EditResult, OrPrecondition};
use crate::editing::session::Session;

impl Session<'_> {
    /// Splits the leaf owning `inline` at `caret`. Both halves are re-parsed
    /// as fragments, so a heading's right half becomes whatever its text says.
    pub fn split(&mut self, inline: NodeId, caret: usize) -> EditResult<Effect> {
        let (block, _) = self.resolve(inline)?;
        match &block.kind {
            BlockKind::CodeBlock(_) => return self.split_code_block(inline, caret),
            kind if kind.is_container() => return Err(EditError::Precondition("cannot split a container")),
            _ => {}
        }
        let Split { left, right } = split_block_pure(&block, inline, caret, None, self.reparse(), self.ids)
            .or_precondition("inline not in block")?;
        let left_text = leaf_text(&left.inlines);
        let right_text = leaf_text(&right.inlines);

        let mut nodes = self.fragment(&left_text, block.span.start);
        self.adopt(block.id, &mut nodes);
        let right_start = block.span.start + left_text.len() + 1;
        let right_nodes = self.fragment(&right_text, right_start);
        let first_right = right_nodes.first().map(|n| n.id);
        nodes.extend(right_nodes);

        let ids = self.replace("split", block.id, nodes)?;
        let caret = first_right.and_then(|r| self.caret_start(r));
        let mut effect = Effect::new().replaced(block.id, &ids);
        if !ids.contains(&block.id) {
            effect = effect.removed([block.id]);
        }
        Ok(effect.with_caret(caret))
    }

    pub fn split_list_item(&mut self, inline: NodeId, caret: usize) -> EditResult<Effect> {
        self.split_item(inline, caret, false)
    }

    pub fn split_task_list_item(&mut self, inline: NodeId, caret: usize) -> EditResult<Effect> {
        self.split_item(inline, caret, true)
    }

    /// The left half stays in the item; the right half opens a new sibling
    /// item that also takes over the item's nested lists.
    fn split_item(&mut self, inline: NodeId, caret: usize, task: bool) -> EditResult<Effect> {
        let (block, _) = self.resolve(inline)?;
        let item = self.marker_item(block.id).or_precondition("not the first block of a list item")?;
        let item_kind = self.kind(item)?;
        if task != matches!(item_kind, BlockKind::TaskListItem { .. }) {
            return Err(EditError::Precondition("list item flavour mismatch"));
        }
        let Split { left, right } = split_block_pure(&block, inline, caret, None, self.reparse(), self.ids)
            .or_precondition("inline not in block")?;
        let right_text = leaf_text(&right.inlines);
        self.replace("split item", block.id, vec![left])?;

        let mut body = self.fragment(&right_text, 0);
        let nested: Vec<NodeId> = self
            .ast
            .children(item)
            .iter()
            .skip(1)
            .copied()
            .filter(|c| matches!(self.ast.kind(*c), Some(BlockKind::List(_))))
            .collect();
        for id in nested {
            body.push(self.detach("split item", id)?);
        }

        let existing = self.item_marker(item);
        let (kind, marker_text) = if task {
            let text = ListMarker::rewrite(existing.as_deref(), None, Some(false));
            (BlockKind::TaskListItem { checked: false }, text)
        } else {
            (BlockKind::ListItem, existing.unwrap_or_else(|| ListMarker::fresh(None, None).render()))
        };
        let id = self.fresh();
        let mut new_item = BlockNode::new(id, kind, "", Span::default()).with_children(body);
        new_item.inlines = vec![marker(&marker_text, 0, id, self.ids)];

        let list = self.parent(item)?;
        let index = self.index(item)? + 1;
        self.insert_at("split item", list, index, vec![new_item])?;
        let caret = self.caret_start(id);
        Ok(Effect::new()
            .current(item, item)
            .next(item, id)
            .with_caret(caret))
    }

    /// Splits inside a block quote, keeping both halves in the innermost
    /// quote holding the caret.
    ///
    /// Without an inline, the caret is taken to be at the end of the deepest
    /// last-nested quote under `quote`; if that quote has no paragraph, an
    /// empty placeholder paragraph is added to split.
    pub fn split_block_quote(&mut self, quote: NodeId, inline: Option<NodeId>, caret: usize) -> EditResult<Effect> {
        if self.kind(quote)? != BlockKind::BlockQuote {
            return Err(EditError::Precondition("not a block quote"));
        }
        let (inline, caret) = match inline {
            Some(inline) => {
                let (block, _) = self.resolve(inline)?;
                if !self.ast.ancestors(block.id).any(|a| a == quote) {
                    return Err(EditError::Precondition("inline is not inside the quote"));
                }
                (inline, caret)
            }
            None => self.quote_caret_host(quote)?,
        };
        let (block, _) = self.resolve(inline)?;
        if matches!(block.kind, BlockKind::CodeBlock(_)) {
            return self.split_code_block(inline, caret);
        }
        let Split { left, right } = split_block_pure(&block, inline, caret, None, self.reparse(), self.ids)
            .or_precondition("inline not in block")?;
        let right_id = right.id;
        let host = self.parent(block.id)?;
        self.replace("split quote", block.id, vec![left, right])?;
        let caret = self.caret_start(right_id);
        Ok(Effect::new()
            .current(host, host)
            .next(block.id, right_id)
            .with_caret(caret))
    }

    /// The end of the last paragraph of the deepest trailing quote under
    /// `quote`, synthesizing a placeholder paragraph if there is none.
    fn quote_caret_host(&mut self, quote: NodeId) -> EditResult<(NodeId, usize)> {
        let mut q = quote;
        while let Some(last) = self.ast.children(q).last().copied()
            && self.ast.kind(last) == Some(&BlockKind::BlockQuote)
        {
            q = last;
        }
        let paragraph = self
            .ast
            .children(q)
            .iter()
            .rev()
            .copied()
            .find(|c| self.ast.kind(*c) == Some(&BlockKind::Paragraph));
        let paragraph = match paragraph {
            Some(p) => p,
            None => {
                let node = self.leaf(BlockKind::Paragraph, Paragraph::PLACEHOLDER);
                let id = node.id;
                self.ast.push_child(q, node).or_precondition("unknown block")?;
                id
            }
        };
        let caret = self.caret_end(paragraph).or_precondition("paragraph without inlines")?;
        Ok((caret.inline, caret.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::ops::fixture::Doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn heading_right_half_reparses_as_paragraph() {
        let mut doc = Doc::new("# Title");
        let heading = doc.leaf(0);
        let inline = doc.inline(0);
        doc.session().split(inline, 2).unwrap();
        assert_eq!(doc.text(), "# Ti\ntle");
        assert_eq!(doc.leaf(0), heading);
        assert_eq!(doc.ast.kind(doc.leaf(1)), Some(&BlockKind::Paragraph));
    }

    #[test]
    fn split_item_hands_nested_lists_to_new_item() {
        let mut doc = Doc::new("- ab\n  - c");
        let inline = doc.inline(0);
        doc.session().split_list_item(inline, 1).unwrap();
        assert_eq!(doc.text(), "- a\n- b\n  - c");
    }

    #[test]
    fn ordered_split_gets_next_number() {
        let mut doc = Doc::new("1. ab");
        let inline = doc.inline(0);
        doc.session().split_list_item(inline, 1).unwrap();
        assert_eq!(doc.text(), "1. a\n2. b");
    }

    #[test]
    fn quote_split_stays_in_innermost_quote() {
        let mut doc = Doc::new("> a\n> > bc");
        let outer = doc.holder(0);
        let inline = doc.inline(1);
        doc.session().split_block_quote(outer, Some(inline), 1).unwrap();
        assert_eq!(doc.text(), "> a\n> > b\n> > c");
    }

    #[test]
    fn quote_split_without_inline_appends_line() {
        let mut doc = Doc::new("> a");
        let quote = doc.holder(0);
        let effect = doc.session().split_block_quote(quote, None, 0).unwrap();
        assert_eq!(doc.text(), "> a\n>");
        assert_eq!(effect.caret.map(|c| c.offset), Some(0));
    }

    #[test]
    fn containers_do_not_split() {
        let mut doc = Doc::new("- a");
        let item = doc.holder(0);
        let marker = doc.ast.block(item).unwrap().inlines[0].id;
        assert!(doc.session().split(marker, 0).is_err());
    }
}
