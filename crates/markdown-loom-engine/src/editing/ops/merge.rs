//! Backspace merges between inlines and blocks.

use crate::ast::id::NodeId;
use crate::ast::mutation::{MergeCase, merge_inline_pure, remove_block_cascade};
use crate::ast::node::{BlockKind, BlockNode};
use crate::ast::normalize::leaf_text;
use crate::ast::query::{get_inline_merge_owner, precedes};
use crate::parsing::blocks::kinds::ListMarker;
use crate::parsing::blocks::leaf::marker;
use crate::parsing::rope::Span;

use crate::editing::effect::{Caret, Effect};
use crate::editing::error::{EditError, EditResult, OrPrecondition, splice_failed};
use crate::editing::session::Session;

impl Session<'_> {
    /// Merges two inlines, in whichever order they arrive.
    ///
    /// When the right block goes away its emptied containers go with it; a
    /// block quote left holding nothing but nested quotes is unwrapped and
    /// quotes that end up adjacent are joined. The merged text is then
    /// re-detected for a change of block type.
    pub fn merge_inline(&mut self, a: NodeId, b: NodeId) -> EditResult<Effect> {
        let (ab, ai) = self.resolve(a)?;
        let (bb, bi) = self.resolve(b)?;
        let in_order = if ab.id == bb.id {
            ai.span.start <= bi.span.start
        } else {
            precedes(self.ast, ab.id, bb.id)
        };
        let (left, lb, right, rb) = if in_order { (a, ab, b, bb) } else { (b, bb, a, ab) };

        match (&lb.kind, &rb.kind) {
            (BlockKind::CodeBlock(_), _) if lb.id == rb.id => return self.merge_code_block_content(right),
            (BlockKind::CodeBlock(_), _) => return self.absorb_into_code(lb.id, rb.id),
            (_, BlockKind::CodeBlock(_)) => return Err(EditError::Precondition("cannot merge into a code block")),
            _ => {}
        }

        let merge = merge_inline_pure(self.ast, left, right, self.reparse(), self.ids)
            .or_precondition("inlines cannot merge")?;
        let right_parent = self.ast.parent_of(rb.id);
        let merged_text = leaf_text(&merge.block.inlines);
        let (caret_inline, caret_offset) = merge.caret;
        self.replace("merge", lb.id, vec![merge.block])?;

        let mut effect = Effect::new().current(lb.id, lb.id);
        if let Some(removed) = merge.removed {
            let gone = self.remove_leaf(removed)?;
            effect = effect.removed(gone);
        }
        if merge.case == MergeCase::CrossBlock
            && let Some(quote) = right_parent
        {
            let (parent, gone) = self.unwrap_hollow_quote(quote)?;
            if let Some(parent) = parent {
                effect = effect.current(parent, parent).removed(gone);
            }
        }

        let caret_local = self
            .ast
            .block(lb.id)
            .and_then(|b| b.inlines.iter().find_map(|i| i.find(caret_inline)))
            .map_or(0, |i| i.span.start + caret_offset);
        if let Some(retype) = self.retype(lb.id, &merged_text, caret_local) {
            let retyped = self.transform_block(retype.target, &retype.text, retype.caret)?;
            return Ok(retyped.removed(effect.render.removed));
        }
        Ok(effect.with_caret(Some(Caret::new(caret_inline, caret_offset))))
    }

    /// `merge_inline` restricted to two inlines of the same table cell.
    pub fn merge_inline_in_cell(&mut self, a: NodeId, b: NodeId) -> EditResult<Effect> {
        let (ab, _) = self.resolve(a)?;
        let (bb, _) = self.resolve(b)?;
        let owner = self.cell_of(ab.id).or_precondition("inline is not in a table cell")?;
        if get_inline_merge_owner(self.ast, bb.id) != Some(owner) {
            return Err(EditError::Precondition("inlines are in different cells"));
        }
        self.merge_inline(a, b)
    }

    /// Removes a leaf and the containers it empties. A list item that still
    /// holds nested lists hands their items to its own list instead.
    pub(crate) fn remove_leaf(&mut self, id: NodeId) -> EditResult<Vec<NodeId>> {
        let Some(item) = self.marker_item(id) else {
            return Ok(remove_block_cascade(self.ast, id));
        };
        if self.ast.children(item).len() == 1 {
            return Ok(remove_block_cascade(self.ast, id));
        }
        let list = self.parent(item)?;
        let index = self.index(item)?;
        let mut lifted = Vec::new();
        for child in self.ast.children(item).iter().skip(1).copied().collect::<Vec<_>>() {
            let node = self.ast.to_node(child).or_precondition("unknown block")?;
            if matches!(node.kind, BlockKind::List(_)) {
                lifted.extend(node.children);
            } else {
                let wrapper_id = self.fresh();
                let text = ListMarker::fresh(None, None).render();
                let mut wrapper =
                    BlockNode::new(wrapper_id, BlockKind::ListItem, "", Span::default()).with_children(vec![node]);
                wrapper.inlines = vec![marker(&text, 0, wrapper_id, self.ids)];
                lifted.push(wrapper);
            }
        }
        self.ast
            .splice_children(list, index..index + 1, lifted)
            .ok_or_else(|| splice_failed("merge", list))?;
        Ok(vec![id, item])
    }

    /// Unwraps `quote` if it survived with only nested quotes as children,
    /// then joins adjacent quotes at its level. Returns the container that
    /// changed and the removed quote ids.
    fn unwrap_hollow_quote(&mut self, quote: NodeId) -> EditResult<(Option<NodeId>, Vec<NodeId>)> {
        if self.ast.kind(quote) != Some(&BlockKind::BlockQuote) {
            return Ok((None, Vec::new()));
        }
        let children = self.ast.children(quote).to_vec();
        let hollow = !children.is_empty()
            && children
                .iter()
                .all(|c| self.ast.kind(*c) == Some(&BlockKind::BlockQuote));
        if !hollow {
            return Ok((None, Vec::new()));
        }
        let parent = self.parent(quote)?;
        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            nodes.push(self.ast.to_node(child).or_precondition("unknown block")?);
        }
        self.replace("unnest quote", quote, nodes)?;
        let mut removed = vec![quote];
        removed.extend(self.coalesce_quotes(parent)?);
        Ok((Some(parent), removed))
    }

    /// Joins runs of adjacent block quotes under `parent` into the first of
    /// each run.
    pub(crate) fn coalesce_quotes(&mut self, parent: NodeId) -> EditResult<Vec<NodeId>> {
        let mut removed = Vec::new();
        let mut i = 1;
        while i < self.ast.children(parent).len() {
            let children = self.ast.children(parent);
            let (prev, cur) = (children[i - 1], children[i]);
            let both = [prev, cur]
                .iter()
                .all(|c| self.ast.kind(*c) == Some(&BlockKind::BlockQuote));
            if !both {
                i += 1;
                continue;
            }
            let moved = self.detach("coalesce quotes", cur)?;
            for child in moved.children {
                self.ast.push_child(prev, child).ok_or_else(|| splice_failed("coalesce quotes", prev))?;
            }
            removed.push(cur);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::ops::fixture::Doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn arguments_in_either_order() {
        let mut doc = Doc::new("one\ntwo");
        let (a, b) = (doc.inline(0), doc.inline(1));
        doc.session().merge_inline(b, a).unwrap();
        assert_eq!(doc.text(), "onetwo");
    }

    #[test]
    fn paragraph_joins_list_item() {
        let mut doc = Doc::new("- a\nb");
        let item = doc.holder(0);
        let (a, b) = (doc.inline(0), doc.inline(1));
        doc.session().merge_inline(a, b).unwrap();
        assert_eq!(doc.text(), "- ab");
        assert!(doc.ast.contains(item));
    }

    #[test]
    fn hollow_quote_is_unwrapped() {
        let mut doc = Doc::new("a\n> b\n> > c");
        let (a, b) = (doc.inline(0), doc.inline(1));
        let outer = doc.holder(1);
        let effect = doc.session().merge_inline(a, b).unwrap();
        assert_eq!(doc.text(), "ab\n> c");
        assert!(!doc.ast.contains(outer));
        assert!(effect.render.removed.contains(&outer));
    }

    #[test]
    fn merged_text_is_retyped() {
        let mut doc = Doc::new("__\n_");
        let (a, b) = (doc.inline(0), doc.inline(1));
        doc.session().merge_inline(a, b).unwrap();
        assert_eq!(doc.ast.kind(doc.leaf(0)), Some(&BlockKind::ThematicBreak));
    }

    #[test]
    fn cells_do_not_merge_across() {
        let mut doc = Doc::new("| a | b |\n| --- | --- |");
        let (a, b) = (doc.inline(0), doc.inline(1));
        assert!(matches!(
            doc.session().merge_inline_in_cell(a, b),
            Err(EditError::Precondition(_))
        ));
    }

    #[test]
    fn removing_item_leaf_lifts_nested_items() {
        let mut doc = Doc::new("- a\n  - b\n- c");
        let a = doc.leaf(0);
        let gone = doc.session().remove_leaf(a).unwrap();
        assert_eq!(gone.len(), 2);
        assert_eq!(doc.text(), "- b\n- c");
    }

    #[test]
    fn adjacent_quotes_coalesce() {
        let mut doc = Doc::new("> a\nx\n> b");
        let x = doc.leaf(1);
        doc.session().remove_leaf(x).unwrap();
        let root = doc.ast.root();
        let gone = doc.session().coalesce_quotes(root).unwrap();
        assert_eq!(gone.len(), 1);
        assert_eq!(doc.text(), "> a\n> b");
    }
}
