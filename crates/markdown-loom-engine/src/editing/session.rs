//! The state an edit runs against, and the lookups every operation shares.

use std::collections::HashSet;

use crate::ast::id::{IdGenerator, NodeId};
use crate::ast::mutation::Reparse;
use crate::ast::node::{Block, BlockKind, BlockNode, BlockType, Inline};
use crate::ast::normalize::rendered;
use crate::ast::query::{first_inline_in, get_inline_at_position, get_inline_by_id, last_inline_in};
use crate::ast::reconcile::{reconcile_blocks, reconcile_inlines};
use crate::ast::Ast;
use crate::options::EngineOptions;
use crate::parsing::link_refs::LinkRefs;
use crate::parsing::reparse_fragment;
use crate::parsing::rope::{Span, floor_char_boundary};

use super::effect::Caret;
use super::error::{EditError, EditResult, OrPrecondition, splice_failed};

/// Mutable access to one document for the duration of one edit.
pub(crate) struct Session<'a> {
    pub ast: &'a mut Ast,
    pub refs: &'a LinkRefs,
    pub options: &'a EngineOptions,
    pub ids: &'a mut dyn IdGenerator,
}

/// An item cut out of its list; see [`Session::cut_item`].
pub(crate) struct ItemCut {
    pub item: BlockNode,
    /// Container the list lives in.
    pub parent: NodeId,
    /// Where the item's replacement goes in `parent`.
    pub index: usize,
    /// The list itself, if cutting the item emptied it.
    pub removed: Vec<NodeId>,
}

/// Rendered length of an inline, the range a caret inside it may take.
pub(crate) fn visible_len(inline: &Inline) -> usize {
    rendered(inline).len()
}

/// Block-local offset of `caret` bytes into `inline`.
pub(crate) fn local_offset(inline: &Inline, caret: usize) -> usize {
    inline.span.start + floor_char_boundary(rendered(inline), caret.min(visible_len(inline)))
}

/// Gives `node` a new id, re-targeting its inlines.
pub(crate) fn rekey_node(node: &mut BlockNode, id: NodeId) {
    node.id = id;
    for inline in &mut node.inlines {
        inline.set_block(id);
    }
}

pub(crate) fn invariant(what: impl Into<String>) -> EditError {
    EditError::Invariant(what.into())
}

impl<'a> Session<'a> {
    pub fn reparse(&self) -> Reparse<'a> {
        let options: &'a EngineOptions = self.options;
        Reparse {
            refs: self.refs,
            options: &options.parse,
        }
    }

    pub fn fresh(&mut self) -> NodeId {
        self.ids.next_id()
    }

    pub fn block(&self, id: NodeId) -> EditResult<&Block> {
        self.ast.block(id).or_precondition("unknown block")
    }

    pub fn kind(&self, id: NodeId) -> EditResult<BlockKind> {
        self.block(id).map(|b| b.kind.clone())
    }

    pub fn parent(&self, id: NodeId) -> EditResult<NodeId> {
        self.ast.parent_of(id).or_precondition("block has no parent")
    }

    pub fn index(&self, id: NodeId) -> EditResult<usize> {
        self.ast
            .index_in_parent(id)
            .ok_or_else(|| invariant(format!("block {id} missing from its parent")))
    }

    /// The inline and its owning block, cloned so the arena stays free to
    /// mutate.
    pub fn resolve(&self, inline: NodeId) -> EditResult<(Block, Inline)> {
        get_inline_by_id(self.ast, inline)
            .map(|(b, i)| (b.clone(), i.clone()))
            .or_precondition("unknown inline")
    }

    /// Blocks parsed from `text` as if it started at absolute `start`.
    pub fn fragment(&mut self, text: &str, start: usize) -> Vec<BlockNode> {
        reparse_fragment(text, start, self.refs, &self.options.parse, self.ids)
    }

    /// An inline-parsed leaf with a fresh id.
    pub fn leaf(&mut self, kind: BlockKind, text: &str) -> BlockNode {
        let id = self.fresh();
        self.reparse().leaf(id, kind, text, 0, self.ids)
    }

    pub fn empty_paragraph(&mut self) -> BlockNode {
        self.leaf(BlockKind::Paragraph, "")
    }

    /// Hands `old`'s id to the first node of the same kind, carrying inline
    /// and child ids over where they still match.
    pub fn adopt(&self, old: NodeId, nodes: &mut [BlockNode]) {
        let Some(prev) = self.ast.block(old) else {
            return;
        };
        let Some(node) = nodes.iter_mut().find(|n| n.kind.tag() == prev.kind.tag()) else {
            return;
        };
        rekey_node(node, old);
        reconcile_inlines(&prev.inlines, &mut node.inlines, &mut HashSet::new(), &self.options.reconcile);
        reconcile_blocks(self.ast, old, &mut node.children, &mut HashSet::new(), &self.options.reconcile);
    }

    /// Replaces `target` with `nodes`; returns the inserted ids.
    pub fn replace(&mut self, op: &str, target: NodeId, nodes: Vec<BlockNode>) -> EditResult<Vec<NodeId>> {
        let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        self.ast
            .replace(target, nodes)
            .ok_or_else(|| splice_failed(op, target))?;
        Ok(ids)
    }

    pub fn insert_at(&mut self, op: &str, parent: NodeId, index: usize, nodes: Vec<BlockNode>) -> EditResult<Vec<NodeId>> {
        let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        self.ast
            .splice_children(parent, index..index, nodes)
            .ok_or_else(|| splice_failed(op, parent))?;
        Ok(ids)
    }

    pub fn detach(&mut self, op: &str, id: NodeId) -> EditResult<BlockNode> {
        self.ast.detach(id).ok_or_else(|| splice_failed(op, id))
    }

    /// Caret at the start of the first content inline under `id`.
    pub fn caret_start(&self, id: NodeId) -> Option<Caret> {
        first_inline_in(self.ast, id).map(|i| Caret::new(i.id, 0))
    }

    /// Caret at the end of the last content inline under `id`.
    pub fn caret_end(&self, id: NodeId) -> Option<Caret> {
        last_inline_in(self.ast, id).map(|i| Caret::at_end(i.id, visible_len(i)))
    }

    /// Caret at block-local `offset` of the first leaf under `id`.
    pub fn caret_at(&self, id: NodeId, offset: usize) -> Option<Caret> {
        let leaf = self
            .ast
            .descendants(id)
            .into_iter()
            .find(|d| self.ast.kind(*d).is_some_and(BlockKind::is_leaf))?;
        let block = self.ast.block(leaf)?;
        get_inline_at_position(&block.inlines, offset).map(|hit| Caret::new(hit.inline.id, hit.offset))
    }

    /// Caret at absolute `offset` among freshly parsed `roots`: the first
    /// leaf whose span touches it, else the end of the last leaf.
    pub fn caret_in(&self, roots: &[NodeId], offset: usize) -> Option<Caret> {
        let leaves: Vec<&Block> = roots
            .iter()
            .flat_map(|r| self.ast.descendants(*r))
            .filter_map(|d| self.ast.block(d))
            .filter(|b| b.kind.is_leaf())
            .collect();
        let Some(leaf) = leaves.iter().find(|b| b.span.touches(offset)) else {
            return roots.last().and_then(|r| self.caret_end(*r));
        };
        let local = offset.saturating_sub(leaf.span.start);
        get_inline_at_position(&leaf.inlines, local).map(|hit| Caret::new(hit.inline.id, hit.offset))
    }

    /// The list item whose first child is `leaf`, i.e. whose marker the
    /// leaf's text follows.
    pub fn marker_item(&self, leaf: NodeId) -> Option<NodeId> {
        let item = self.ast.parent_of(leaf)?;
        (self.ast.kind(item)?.is_list_item() && self.ast.children(item).first() == Some(&leaf)).then_some(item)
    }

    /// Nearest table cell or header at or above `id`.
    pub fn cell_of(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ast.ancestors(id))
            .find(|a| self.ast.kind(*a).is_some_and(BlockKind::is_table_cell))
    }

    pub fn item_marker(&self, item: NodeId) -> Option<String> {
        self.ast
            .block(item)?
            .inlines
            .iter()
            .find(|i| i.is_marker())
            .map(|i| i.symbolic().to_string())
    }

    /// What the block at `leaf` currently is, in detection terms. A list
    /// item's first leaf reports the item.
    pub fn current_type(&self, leaf: NodeId) -> BlockType {
        if let Some(item) = self.marker_item(leaf) {
            return match self.ast.kind(item) {
                Some(BlockKind::TaskListItem { .. }) => BlockType::TaskListItem,
                _ => {
                    let ordered = self
                        .ast
                        .parent_of(item)
                        .and_then(|l| self.ast.kind(l))
                        .is_some_and(|k| matches!(k, BlockKind::List(info) if info.ordered));
                    BlockType::ListItem { ordered }
                }
            };
        }
        match self.ast.kind(leaf) {
            Some(BlockKind::Heading { level }) => BlockType::Heading(*level),
            Some(BlockKind::CodeBlock(_)) => BlockType::CodeBlock,
            Some(BlockKind::ThematicBreak) => BlockType::ThematicBreak,
            Some(BlockKind::HtmlBlock) => BlockType::HtmlBlock,
            Some(BlockKind::FootnoteDefinition { .. }) => BlockType::FootnoteDefinition,
            _ => BlockType::Paragraph,
        }
    }

    /// Cuts `item` out of its list. Items after it move to a fresh list
    /// inserted right after the original; the original goes if it empties.
    pub fn cut_item(&mut self, op: &str, item: NodeId) -> EditResult<ItemCut> {
        let list = self.parent(item)?;
        let BlockKind::List(info) = self.kind(list)? else {
            return Err(invariant(format!("{op}: item {item} is not in a list")));
        };
        let parent = self.parent(list)?;
        let list_index = self.index(list)?;
        let k = self.index(item)?;
        let len = self.ast.children(list).len();
        let mut tail = self
            .ast
            .splice_children(list, k..len, Vec::new())
            .ok_or_else(|| splice_failed(op, list))?;
        if tail.is_empty() {
            return Err(invariant(format!("{op}: empty cut from list {list}")));
        }
        let cut = tail.remove(0);

        if !tail.is_empty() {
            let mut rest = info.clone();
            if info.ordered {
                rest.start = info.start + k as u32 + 1;
            }
            let id = self.fresh();
            let node = BlockNode::new(id, BlockKind::List(rest), "", Span::default()).with_children(tail);
            self.insert_at(op, parent, list_index + 1, vec![node])?;
        }

        let mut removed = Vec::new();
        let mut index = list_index + 1;
        if self.ast.children(list).is_empty() {
            self.detach(op, list)?;
            removed.push(list);
            index = list_index;
        }
        Ok(ItemCut {
            item: cut,
            parent,
            index,
            removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::id::SequentialIds;
    use crate::ast::normalize::normalize;
    use crate::ast::query::flatten_leaves;
    use crate::parsing::parse_document;
    use pretty_assertions::assert_eq;

    struct Doc {
        ast: Ast,
        refs: LinkRefs,
        options: EngineOptions,
        ids: SequentialIds,
    }

    impl Doc {
        fn new(src: &str) -> Self {
            let options = EngineOptions::default();
            let mut ids = SequentialIds::default();
            let doc = parse_document(src, &options.parse, &mut ids);
            Self {
                ast: doc.ast,
                refs: doc.refs,
                options,
                ids,
            }
        }

        fn session(&mut self) -> Session<'_> {
            Session {
                ast: &mut self.ast,
                refs: &self.refs,
                options: &self.options,
                ids: &mut self.ids,
            }
        }
    }

    #[test]
    fn cut_middle_item_splits_list() {
        let mut doc = Doc::new("1. a\n2. b\n3. c");
        let b = flatten_leaves(&doc.ast)[1];
        let item = doc.ast.parent_of(b).unwrap();
        let mut s = doc.session();
        let cut = s.cut_item("test", item).unwrap();
        assert_eq!(cut.item.id, item);
        assert_eq!(cut.index, 1);
        assert!(cut.removed.is_empty());
        let para = s.empty_paragraph();
        s.insert_at("test", cut.parent, cut.index, vec![para]).unwrap();
        let text = normalize(&mut doc.ast, &doc.options.parse);
        assert_eq!(text, "1. a\n\n3. c");
    }

    #[test]
    fn cut_only_item_removes_list() {
        let mut doc = Doc::new("- a");
        let a = flatten_leaves(&doc.ast)[0];
        let item = doc.ast.parent_of(a).unwrap();
        let list = doc.ast.parent_of(item).unwrap();
        let cut = doc.session().cut_item("test", item).unwrap();
        assert_eq!(cut.removed, vec![list]);
        assert_eq!(cut.index, 0);
        assert!(doc.ast.children(doc.ast.root()).is_empty());
    }

    #[test]
    fn current_type_reports_item_for_first_leaf() {
        let mut doc = Doc::new("1. a\n- [ ] t\n# h");
        let leaves = flatten_leaves(&doc.ast);
        let s = doc.session();
        assert_eq!(s.current_type(leaves[0]), BlockType::ListItem { ordered: true });
        assert_eq!(s.current_type(leaves[1]), BlockType::TaskListItem);
        assert_eq!(s.current_type(leaves[2]), BlockType::Heading(1));
    }

    #[test]
    fn adopt_keeps_id_for_same_kind() {
        let mut doc = Doc::new("# Title");
        let id = flatten_leaves(&doc.ast)[0];
        let mut s = doc.session();
        let mut nodes = s.fragment("## Title", 0);
        s.adopt(id, &mut nodes);
        assert_eq!(nodes[0].id, id);
        let mut other = s.fragment("plain", 0);
        s.adopt(id, &mut other);
        assert_ne!(other[0].id, id);
    }
}
