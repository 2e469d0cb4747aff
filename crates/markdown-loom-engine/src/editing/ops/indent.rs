//! Nesting changes for list items and block quote children.
//!
//! Items that change depth get a fresh id; their content blocks and inlines
//! keep theirs, so the caret stays where it was.

use crate::ast::id::NodeId;
use crate::ast::node::{BlockKind, BlockNode};
use crate::parsing::rope::Span;

use crate::editing::effect::Effect;
use crate::editing::error::{EditError, EditResult, OrPrecondition, splice_failed};
use crate::editing::session::{Session, invariant};

impl Session<'_> {
    pub fn indent_list_item(&mut self, item: NodeId, caret: usize) -> EditResult<Effect> {
        self.indent_item(item, caret, false)
    }

    pub fn indent_task_list_item(&mut self, item: NodeId, caret: usize) -> EditResult<Effect> {
        self.indent_item(item, caret, true)
    }

    pub fn outdent_list_item(&mut self, item: NodeId, caret: usize) -> EditResult<Effect> {
        self.outdent_item(item, caret, false)
    }

    pub fn outdent_task_list_item(&mut self, item: NodeId, caret: usize) -> EditResult<Effect> {
        self.outdent_item(item, caret, true)
    }

    fn check_item(&self, item: NodeId, task: bool) -> EditResult<()> {
        match self.kind(item)? {
            BlockKind::TaskListItem { .. } if task => Ok(()),
            BlockKind::ListItem if !task => Ok(()),
            _ => Err(EditError::Precondition("not a list item of that flavour")),
        }
    }

    /// Nests `item` under its previous sibling, in that sibling's trailing
    /// sublist if it has one.
    fn indent_item(&mut self, item: NodeId, caret: usize, task: bool) -> EditResult<Effect> {
        self.check_item(item, task)?;
        let prev = self.ast.prev_sibling(item).or_precondition("no previous item to nest under")?;
        let list = self.parent(item)?;
        let BlockKind::List(info) = self.kind(list)? else {
            return Err(invariant(format!("item {item} outside a list")));
        };
        let sublist = self
            .ast
            .children(prev)
            .last()
            .copied()
            .filter(|c| matches!(self.ast.kind(*c), Some(BlockKind::List(_))));

        let mut node = self.detach("indent", item)?;
        let id = self.renew(&mut node);
        match sublist {
            Some(sub) => {
                self.ast.push_child(sub, node).ok_or_else(|| splice_failed("indent", sub))?;
            }
            None => {
                let mut nested = info.clone();
                nested.start = 1;
                let list_id = self.fresh();
                let wrapper = BlockNode::new(list_id, BlockKind::List(nested), "", Span::default()).with_children(vec![node]);
                self.ast.push_child(prev, wrapper).ok_or_else(|| splice_failed("indent", prev))?;
            }
        }
        let caret = self.caret_at(id, caret);
        Ok(Effect::new().current(prev, prev).removed([item]).with_caret(caret))
    }

    /// Lifts a nested item next to the item that holds its list, taking its
    /// following siblings along as its own children. A top-level item leaves
    /// the list altogether: its content becomes ordinary blocks and the list
    /// splits around it.
    fn outdent_item(&mut self, item: NodeId, caret: usize, task: bool) -> EditResult<Effect> {
        self.check_item(item, task)?;
        let list = self.parent(item)?;
        let BlockKind::List(info) = self.kind(list)? else {
            return Err(invariant(format!("item {item} outside a list")));
        };
        let holder = self.parent(list)?;
        if !self.kind(holder)?.is_list_item() {
            return self.extract_item(item, caret);
        }

        let outer = self.parent(holder)?;
        let k = self.index(item)?;
        let len = self.ast.children(list).len();
        let mut tail = self
            .ast
            .splice_children(list, k..len, Vec::new())
            .ok_or_else(|| splice_failed("outdent", list))?;
        if tail.is_empty() {
            return Err(invariant(format!("outdent: empty cut from list {list}")));
        }
        let mut node = tail.remove(0);
        if !tail.is_empty() {
            match node.children.last_mut() {
                Some(last) if matches!(last.kind, BlockKind::List(_)) => last.children.extend(tail),
                _ => {
                    let mut rest = info.clone();
                    rest.start = 1;
                    let list_id = self.fresh();
                    node.children
                        .push(BlockNode::new(list_id, BlockKind::List(rest), "", Span::default()).with_children(tail));
                }
            }
        }
        let id = self.renew(&mut node);

        let mut effect = Effect::new().current(outer, outer).removed([item]);
        if self.ast.children(list).is_empty() {
            self.detach("outdent", list)?;
            effect = effect.removed([list]);
        }
        let index = self.index(holder)? + 1;
        self.insert_at("outdent", outer, index, vec![node])?;
        let caret = self.caret_at(id, caret);
        Ok(effect.with_caret(caret))
    }

    /// Takes a top-level item out of its list. Its non-list children become
    /// blocks of the list's container (an empty paragraph if it had none) and
    /// its nested lists follow as lists of their own.
    fn extract_item(&mut self, item: NodeId, caret: usize) -> EditResult<Effect> {
        let cut = self.cut_item("outdent", item)?;
        let (lists, mut content): (Vec<BlockNode>, Vec<BlockNode>) = cut
            .item
            .children
            .into_iter()
            .partition(|c| matches!(c.kind, BlockKind::List(_)));
        if content.is_empty() {
            content.push(self.empty_paragraph());
        }
        let first = content[0].id;
        content.extend(lists);
        self.insert_at("outdent", cut.parent, cut.index, content)?;
        let caret = self.caret_at(first, caret);
        Ok(Effect::new()
            .current(cut.parent, cut.parent)
            .removed([item])
            .removed(cut.removed)
            .with_caret(caret))
    }

    /// Wraps `child` of a block quote in a nested quote. The wrapper takes
    /// over `child`'s id; the child itself is re-keyed.
    pub fn indent_block_quote(&mut self, child: NodeId, caret: usize) -> EditResult<Effect> {
        let quote = self.parent(child)?;
        if self.kind(quote)? != BlockKind::BlockQuote {
            return Err(EditError::Precondition("not inside a block quote"));
        }
        let index = self.index(child)?;
        let mut node = self.detach("indent quote", child)?;
        let inner = self.renew(&mut node);
        let wrapper = BlockNode::new(child, BlockKind::BlockQuote, "", Span::default()).with_children(vec![node]);
        self.insert_at("indent quote", quote, index, vec![wrapper])?;
        let caret = self.caret_at(inner, caret);
        Ok(Effect::new().current(quote, quote).with_caret(caret))
    }

    /// Lifts `child` out of its quote to the quote's own level; children after
    /// it stay quoted in a fresh quote that follows.
    pub fn outdent_block_quote(&mut self, child: NodeId, caret: usize) -> EditResult<Effect> {
        let quote = self.parent(child)?;
        if self.kind(quote)? != BlockKind::BlockQuote {
            return Err(EditError::Precondition("not inside a block quote"));
        }
        let parent = self.parent(quote)?;
        let k = self.index(child)?;
        let len = self.ast.children(quote).len();
        let mut tail = self
            .ast
            .splice_children(quote, k..len, Vec::new())
            .ok_or_else(|| splice_failed("outdent quote", quote))?;
        if tail.is_empty() {
            return Err(invariant(format!("outdent quote: empty cut from {quote}")));
        }
        let lifted = tail.remove(0);
        let mut nodes = vec![lifted];
        if !tail.is_empty() {
            let rest = self.fresh();
            nodes.push(BlockNode::new(rest, BlockKind::BlockQuote, "", Span::default()).with_children(tail));
        }

        let mut effect = Effect::new().current(parent, parent);
        let mut index = self.index(quote)? + 1;
        if self.ast.children(quote).is_empty() {
            index -= 1;
            self.detach("outdent quote", quote)?;
            effect = effect.removed([quote]);
        }
        self.insert_at("outdent quote", parent, index, nodes)?;
        let caret = self.caret_at(child, caret);
        Ok(effect.with_caret(caret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::ops::fixture::Doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn indent_nests_under_previous_item() {
        let mut doc = Doc::new("- a\n- b");
        let b = doc.holder(1);
        let para = doc.leaf(1);
        let effect = doc.session().indent_list_item(b, 0).unwrap();
        assert_eq!(doc.text(), "- a\n  - b");
        assert!(!doc.ast.contains(b));
        assert_eq!(doc.leaf(1), para);
        assert!(effect.render.removed.contains(&b));
    }

    #[test]
    fn indent_joins_existing_sublist() {
        let mut doc = Doc::new("- a\n  - x\n- b");
        let b = doc.holder(2);
        doc.session().indent_list_item(b, 0).unwrap();
        assert_eq!(doc.text(), "- a\n  - x\n  - b");
    }

    #[test]
    fn first_item_cannot_indent() {
        let mut doc = Doc::new("- a\n- b");
        let a = doc.holder(0);
        assert!(matches!(doc.session().indent_list_item(a, 0), Err(EditError::Precondition(_))));
    }

    #[test]
    fn flavour_must_match() {
        let mut doc = Doc::new("- [ ] a\n- [ ] b");
        let b = doc.holder(1);
        assert!(doc.session().indent_list_item(b, 0).is_err());
        doc.session().indent_task_list_item(b, 0).unwrap();
        assert_eq!(doc.text(), "- [ ] a\n  - [ ] b");
    }

    #[test]
    fn outdent_nested_takes_following_siblings() {
        let mut doc = Doc::new("- a\n  - b\n  - c");
        let b = doc.holder(1);
        doc.session().outdent_list_item(b, 0).unwrap();
        assert_eq!(doc.text(), "- a\n- b\n  - c");
    }

    #[test]
    fn outdent_top_level_splits_list() {
        let mut doc = Doc::new("- a\n- b\n- c");
        let b = doc.holder(1);
        doc.session().outdent_list_item(b, 0).unwrap();
        assert_eq!(doc.text(), "- a\nb\n- c");
    }

    #[test]
    fn outdent_top_level_keeps_nested_list() {
        let mut doc = Doc::new("- a\n  - b");
        let a = doc.holder(0);
        doc.session().outdent_list_item(a, 0).unwrap();
        assert_eq!(doc.text(), "a\n- b");
    }

    #[test]
    fn indent_then_outdent_restores_depth() {
        let mut doc = Doc::new("- a\n- b\n- c");
        let b = doc.holder(1);
        doc.session().indent_list_item(b, 0).unwrap();
        let b = doc.holder(1);
        doc.session().outdent_list_item(b, 0).unwrap();
        assert_eq!(doc.text(), "- a\n- b\n- c");
    }

    #[test]
    fn quote_indent_gives_wrapper_the_child_id() {
        let mut doc = Doc::new("> a\n> b");
        let b = doc.leaf(1);
        doc.session().indent_block_quote(b, 0).unwrap();
        assert_eq!(doc.text(), "> a\n> > b");
        assert_eq!(doc.ast.kind(b), Some(&BlockKind::BlockQuote));
        assert_ne!(doc.leaf(1), b);
    }

    #[test]
    fn quote_outdent_splits_around_child() {
        let mut doc = Doc::new("> a\n> b\n> c");
        let b = doc.leaf(1);
        doc.session().outdent_block_quote(b, 0).unwrap();
        assert_eq!(doc.text(), "> a\nb\n> c");
    }

    #[test]
    fn quote_outdent_of_only_child_removes_quote() {
        let mut doc = Doc::new("> a");
        let quote = doc.holder(0);
        let a = doc.leaf(0);
        let effect = doc.session().outdent_block_quote(a, 0).unwrap();
        assert_eq!(doc.text(), "a");
        assert!(effect.render.removed.contains(&quote));
    }
}
