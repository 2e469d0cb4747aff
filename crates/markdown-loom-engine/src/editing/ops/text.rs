//! Typing: in-place inline re-parse, or a block re-parse when the text now
//! reads as a different kind of block.

use std::collections::HashSet;

use tracing::debug;

use crate::ast::id::NodeId;
use crate::ast::node::{Block, BlockKind, BlockNode, BlockType};
use crate::ast::normalize::{leaf_text, rendered};
use crate::ast::query::get_inline_at_position;
use crate::ast::reconcile::reconcile_inlines;
use crate::parsing::blocks::{detect_block_type, leaf_inlines};
use crate::parsing::rope::floor_char_boundary;

use crate::editing::effect::{Caret, Effect};
use crate::editing::error::{EditError, EditResult, OrPrecondition};
use crate::editing::session::{Session, invariant, rekey_node};

/// A type change noticed after an edit: re-parse `target` from `text`.
pub(crate) struct Retype {
    pub target: NodeId,
    pub text: String,
    /// Caret offset into `text`.
    pub caret: usize,
}

impl Session<'_> {
    /// Replaces inline `inline`'s symbolic text with `symbolic`, the caret
    /// landing `caret` bytes into the new text.
    pub fn input(&mut self, inline: NodeId, symbolic: &str, caret: usize) -> EditResult<Effect> {
        let (block, target) = self.resolve(inline)?;
        match &block.kind {
            BlockKind::CodeBlock(_) => return self.input_code_block(inline, symbolic, caret),
            kind if kind.is_list_item() => return self.input_item_marker(&block, symbolic, caret),
            kind if kind.is_container() => return Err(EditError::Precondition("inline of a container")),
            _ => {}
        }
        let text = leaf_text(&block.inlines);
        let start = target.span.start.min(text.len());
        let end = target.span.end.clamp(start, text.len());
        let new_text = format!("{}{symbolic}{}", &text[..start], &text[end..]);
        let caret = start + floor_char_boundary(symbolic, caret.min(symbolic.len()));
        self.commit_leaf_text(&block, new_text, caret)
    }

    /// `input` with `text` inserted `at` bytes into the inline.
    pub fn insert_text(&mut self, inline: NodeId, at: usize, text: &str) -> EditResult<Effect> {
        let (_, target) = self.resolve(inline)?;
        let current = rendered(&target);
        let at = floor_char_boundary(current, at.min(current.len()));
        let symbolic = format!("{}{text}{}", &current[..at], &current[at..]);
        self.input(inline, &symbolic, at + text.len())
    }

    /// Re-parses `text` in place of `target`, caret `caret` bytes into it.
    ///
    /// A list item that stays a single item of the same flavour is swapped in
    /// place; any other item result is cut out of its list, splitting the list
    /// around it. Everything else is replaced where it stands, which inside a
    /// table cell means inside the cell.
    pub fn transform_block(&mut self, target: NodeId, text: &str, caret: usize) -> EditResult<Effect> {
        let block = self.block(target)?.clone();
        if self.ast.parent_of(target).is_none() {
            return Err(EditError::Precondition("cannot transform the document"));
        }
        let abs = block.span.start + floor_char_boundary(text, caret.min(text.len()));
        let mut nodes = self.fragment(text, block.span.start);
        debug!(
            block = %target,
            from = block.kind.tag(),
            to = nodes.first().map(|n| n.kind.tag()),
            "transforming block"
        );
        if block.kind.is_list_item() {
            return self.transform_item(&block, nodes, abs);
        }
        self.adopt(target, &mut nodes);
        let ids = self.replace("transform", target, nodes)?;
        let caret = self.caret_in(&ids, abs);
        let mut effect = Effect::new().replaced(target, &ids);
        if !ids.contains(&target) {
            effect = effect.removed([target]);
        }
        Ok(effect.with_caret(caret))
    }

    fn transform_item(&mut self, item: &Block, mut nodes: Vec<BlockNode>, abs: usize) -> EditResult<Effect> {
        let list = self.parent(item.id)?;
        let BlockKind::List(info) = self.kind(list)? else {
            return Err(invariant(format!("item {} outside a list", item.id)));
        };
        let mut nested = Vec::new();
        for child in item.children.iter().skip(1) {
            nested.push(self.ast.to_node(*child).or_precondition("unknown block")?);
        }

        let single = match nodes.as_slice() {
            [only] => matches!(&only.kind, BlockKind::List(new) if new.ordered == info.ordered)
                && only.children.len() == 1,
            _ => false,
        };
        if single {
            let mut new_item = nodes.remove(0).children.remove(0);
            self.adopt(item.id, std::slice::from_mut(&mut new_item));
            new_item.children.extend(nested);
            let id = new_item.id;
            self.replace("transform", item.id, vec![new_item])?;
            let caret = self.caret_in(&[id], abs);
            let mut effect = Effect::new().current(item.id, id);
            if id != item.id {
                effect = effect.removed([item.id]);
            }
            return Ok(effect.with_caret(caret));
        }

        let cut = self.cut_item("transform", item.id)?;
        nodes.extend(nested);
        let ids = self.insert_at("transform", cut.parent, cut.index, nodes)?;
        let caret = self.caret_in(&ids, abs);
        Ok(Effect::new()
            .current(cut.parent, cut.parent)
            .removed([item.id])
            .removed(cut.removed)
            .with_caret(caret))
    }

    /// Edits of a list item's marker inline: the item is re-detected from the
    /// new marker followed by its first paragraph.
    fn input_item_marker(&mut self, item: &Block, symbolic: &str, caret: usize) -> EditResult<Effect> {
        let first = item.children.first().copied().or_precondition("item without content")?;
        let content = self.block(first).map(|b| leaf_text(&b.inlines))?;
        let text = format!("{symbolic}{content}");
        let current = self.current_type(first);
        let detected = detect_block_type(&text, self.options.parse.extensions);
        if detected != current {
            return self.transform_block(item.id, &text, caret);
        }
        let marker = self
            .ast
            .block_mut(item.id)
            .and_then(|b| b.inlines.iter_mut().find(|i| i.is_marker()))
            .or_precondition("item without marker")?;
        marker.text.symbolic = symbolic.to_string();
        marker.text.semantic = symbolic.to_string();
        let caret = Caret::new(marker.id, caret.min(symbolic.len()));
        Ok(Effect::new().current(item.id, item.id).with_caret(Some(caret)))
    }

    /// The re-detection that follows any change to a leaf's text. A list
    /// item's first leaf is detected together with the item marker; table
    /// cells only ever hold paragraphs.
    pub(crate) fn retype(&self, leaf: NodeId, text: &str, caret: usize) -> Option<Retype> {
        if self.cell_of(leaf).is_some() {
            return None;
        }
        let (target, full, prefix) = match self.marker_item(leaf) {
            Some(item) => {
                let marker = self.item_marker(item).unwrap_or_default();
                (item, format!("{marker}{text}"), marker.len())
            }
            None => (leaf, text.to_string(), 0),
        };
        let current = self.current_type(leaf);
        let detected = detect_block_type(&full, self.options.parse.extensions);
        if detected == current || matches!(detected, BlockType::Blank | BlockType::Table) {
            return None;
        }
        debug!(block = %leaf, ?current, ?detected, "block type changed");
        Some(Retype {
            target,
            text: full,
            caret: prefix + caret,
        })
    }

    /// Sets a leaf's text: re-typed if it now reads as another block kind,
    /// otherwise inline-parsed in place with inline ids carried over.
    pub(crate) fn commit_leaf_text(&mut self, block: &Block, text: String, caret: usize) -> EditResult<Effect> {
        if let Some(retype) = self.retype(block.id, &text, caret) {
            return self.transform_block(retype.target, &retype.text, retype.caret);
        }
        let mut inlines = leaf_inlines(&block.kind, &text, block.id, self.reparse().inline_cx(), self.ids);
        reconcile_inlines(&block.inlines, &mut inlines, &mut HashSet::new(), &self.options.reconcile);
        let caret = get_inline_at_position(&inlines, caret).map(|hit| Caret::new(hit.inline.id, hit.offset));
        let target = self.ast.block_mut(block.id).or_precondition("unknown block")?;
        target.inlines = inlines;
        target.text = text;
        Ok(Effect::new().current(block.id, block.id).with_caret(caret))
    }

    /// Flips a task item's checkbox. The item keeps its id.
    pub fn toggle_task(&mut self, item: NodeId) -> EditResult<Effect> {
        let block = self.ast.block_mut(item).or_precondition("unknown block")?;
        let BlockKind::TaskListItem { checked } = block.kind else {
            return Err(EditError::Precondition("not a task item"));
        };
        block.kind = BlockKind::TaskListItem { checked: !checked };
        Ok(Effect::new().current(item, item))
    }

    /// Re-keys `node` with a fresh id. Used where a block changes nesting
    /// depth and its render context with it.
    pub(crate) fn renew(&mut self, node: &mut BlockNode) -> NodeId {
        let id = self.fresh();
        rekey_node(node, id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::ops::fixture::Doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn inline_edit_keeps_block_and_inline_ids() {
        let mut doc = Doc::new("hello");
        let (leaf, inline) = (doc.leaf(0), doc.inline(0));
        let effect = doc.session().insert_text(inline, 5, "!").unwrap();
        assert_eq!(doc.text(), "hello!");
        assert_eq!(doc.leaf(0), leaf);
        assert_eq!(doc.inline(0), inline);
        assert_eq!(effect.caret, Some(Caret::new(inline, 6)));
    }

    #[test]
    fn emphasis_appears_while_typing() {
        let mut doc = Doc::new("*a");
        let inline = doc.inline(0);
        doc.session().insert_text(inline, 2, "*").unwrap();
        let block = doc.ast.block(doc.leaf(0)).unwrap();
        assert!(matches!(block.inlines[0].kind, crate::ast::node::InlineKind::Emphasis));
    }

    #[test]
    fn hash_space_makes_heading() {
        let mut doc = Doc::new("Title");
        let inline = doc.inline(0);
        doc.session().input(inline, "## Title", 3).unwrap();
        assert_eq!(doc.ast.kind(doc.leaf(0)), Some(&BlockKind::Heading { level: 2 }));
        assert_eq!(doc.text(), "## Title");
    }

    #[test]
    fn table_row_text_is_not_retyped() {
        let mut doc = Doc::new("x");
        let inline = doc.inline(0);
        doc.session().input(inline, "| a |", 5).unwrap();
        assert_eq!(doc.ast.kind(doc.leaf(0)), Some(&BlockKind::Paragraph));
    }

    #[test]
    fn middle_item_turned_paragraph_splits_list() {
        let mut doc = Doc::new("- a\n- b\n- c");
        let item = doc.holder(1);
        doc.session().transform_block(item, "b", 1).unwrap();
        assert_eq!(doc.text(), "- a\nb\n- c");
        assert!(!doc.ast.contains(item));
    }

    #[test]
    fn checkbox_typed_after_marker_makes_task_item() {
        let mut doc = Doc::new("- a");
        let inline = doc.inline(0);
        doc.session().input(inline, "[ ] a", 4).unwrap();
        assert_eq!(doc.text(), "- [ ] a");
        assert_eq!(doc.ast.kind(doc.holder(0)), Some(&BlockKind::TaskListItem { checked: false }));
    }

    #[test]
    fn marker_edit_renumbers_in_place() {
        let mut doc = Doc::new("1. a");
        let item = doc.holder(0);
        let marker = doc.ast.block(item).unwrap().inlines[0].id;
        doc.session().input(marker, "5. ", 3).unwrap();
        assert!(doc.ast.contains(item));
    }

    #[test]
    fn toggle_flips_checkbox() {
        let mut doc = Doc::new("- [ ] a");
        let item = doc.holder(0);
        doc.session().toggle_task(item).unwrap();
        assert_eq!(doc.text(), "- [x] a");
        let para = doc.leaf(0);
        assert!(doc.session().toggle_task(para).is_err());
    }
}
