//! Enter and Backspace: picks the structural operation for the caret's
//! context.

use crate::ast::id::NodeId;
use crate::ast::node::{BlockKind, Inline};
use crate::ast::normalize::leaf_text;
use crate::ast::query::{flatten_inlines, flatten_leaves, get_last_inline};

use crate::editing::effect::Effect;
use crate::editing::error::{EditError, EditResult, OrPrecondition};
use crate::editing::session::Session;

impl Session<'_> {
    /// Enter with the caret `caret` bytes into `inline`.
    pub fn enter(&mut self, inline: NodeId, caret: usize) -> EditResult<Effect> {
        let (block, _) = self.resolve(inline)?;
        if matches!(block.kind, BlockKind::CodeBlock(_)) {
            return self.enter_code_block(inline, caret);
        }
        if block.kind.is_list_item() {
            let first = self.caret_start(block.id).or_precondition("item without content")?;
            return self.enter(first.inline, 0);
        }
        if self.cell_of(block.id).is_some() {
            return self.split_table_cell_at_caret(inline, caret);
        }
        let empty = leaf_text(&block.inlines).is_empty();
        if let Some(item) = self.marker_item(block.id) {
            let task = matches!(self.kind(item)?, BlockKind::TaskListItem { .. });
            return match (empty, task) {
                (true, _) => self.outdent_any(item, 0),
                (false, true) => self.split_task_list_item(inline, caret),
                (false, false) => self.split_list_item(inline, caret),
            };
        }
        let parent = self.parent(block.id)?;
        if self.kind(parent)? == BlockKind::BlockQuote {
            let last = self.ast.children(parent).last() == Some(&block.id);
            if empty && last {
                return self.outdent_block_quote(block.id, 0);
            }
            return self.split_block_quote(parent, Some(inline), caret);
        }
        self.split(inline, caret)
    }

    /// Backspace with the caret at the start of `inline`.
    pub fn backspace(&mut self, inline: NodeId) -> EditResult<Effect> {
        let (block, target) = self.resolve(inline)?;
        if matches!(block.kind, BlockKind::CodeBlock(_)) {
            if self.is_code_payload(inline) {
                return self.merge_code_block_content(inline);
            }
            return Err(EditError::Precondition("backspace on a fence line"));
        }
        if block.kind.is_list_item() {
            return self.outdent_any(block.id, 0);
        }
        if let Some(prev) = previous_content(&block.inlines, &target) {
            return self.merge_inline(prev, inline);
        }

        if let Some(cell) = self.cell_of(block.id) {
            let prev = self.ast.prev_sibling(block.id).filter(|p| self.ast.parent_of(*p) == Some(cell));
            return match prev.and_then(|p| self.ast.block(p)).and_then(get_last_inline).map(|i| i.id) {
                Some(last) => self.merge_inline_in_cell(last, inline),
                None => self.merge_table_cell(cell),
            };
        }
        if let Some(item) = self.marker_item(block.id) {
            return self.outdent_any(item, 0);
        }
        let parent = self.parent(block.id)?;
        if self.kind(parent)? == BlockKind::BlockQuote && self.ast.children(parent).first() == Some(&block.id) {
            return self.outdent_block_quote(block.id, 0);
        }

        let leaves = flatten_leaves(self.ast);
        let index = leaves.iter().position(|l| *l == block.id).or_precondition("not a leaf")?;
        let prev_leaf = index
            .checked_sub(1)
            .map(|i| leaves[i])
            .or_precondition("nothing before the first block")?;
        match self.block(prev_leaf).ok().and_then(get_last_inline).map(|i| i.id) {
            Some(last) => self.merge_inline(last, inline),
            None => {
                // Nothing to join with (a thematic break, say): drop it.
                let gone = self.remove_leaf(prev_leaf)?;
                let caret = self.caret_start(block.id);
                Ok(Effect::new().removed(gone).with_caret(caret))
            }
        }
    }

    fn outdent_any(&mut self, item: NodeId, caret: usize) -> EditResult<Effect> {
        match self.kind(item)? {
            BlockKind::TaskListItem { .. } => self.outdent_task_list_item(item, caret),
            _ => self.outdent_list_item(item, caret),
        }
    }
}

/// The content inline just before `target` in the same run.
fn previous_content(inlines: &[Inline], target: &Inline) -> Option<NodeId> {
    let flat = flatten_inlines(inlines);
    let at = flat.iter().position(|i| i.id == target.id)?;
    flat[..at].iter().rev().find(|i| !i.is_marker()).map(|i| i.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::ops::fixture::Doc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("hello", 2, "he\nllo")]
    #[case("- ab", 1, "- a\n- b")]
    #[case("- [x] ab", 1, "- [x] a\n- [ ] b")]
    #[case("> ab", 1, "> a\n> b")]
    fn enter_splits_by_context(#[case] src: &str, #[case] caret: usize, #[case] expected: &str) {
        let mut doc = Doc::new(src);
        let inline = doc.inline(0);
        doc.session().enter(inline, caret).unwrap();
        assert_eq!(doc.text(), expected);
    }

    #[test]
    fn enter_on_empty_item_leaves_list() {
        let mut doc = Doc::new("- a\n- ");
        let inline = doc.inline(1);
        doc.session().enter(inline, 0).unwrap();
        assert_eq!(doc.text(), "- a\n");
    }

    #[test]
    fn backspace_joins_paragraphs() {
        let mut doc = Doc::new("one\ntwo");
        let inline = doc.inline(1);
        let effect = doc.session().backspace(inline).unwrap();
        assert_eq!(doc.text(), "onetwo");
        assert_eq!(effect.caret.map(|c| c.offset), Some(3));
    }

    #[test]
    fn backspace_at_item_start_outdents() {
        let mut doc = Doc::new("- a\n  - b");
        let inline = doc.inline(1);
        doc.session().backspace(inline).unwrap();
        assert_eq!(doc.text(), "- a\n- b");
    }

    #[test]
    fn backspace_at_first_block_is_rejected() {
        let mut doc = Doc::new("only");
        let inline = doc.inline(0);
        assert!(doc.session().backspace(inline).is_err());
    }
}
