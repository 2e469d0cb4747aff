use std::collections::HashMap;
use std::ops::Range;

use crate::ast::id::NodeId;
use crate::ast::node::{Block, BlockKind, BlockNode};
use crate::parsing::rope::Span;

/// Arena of blocks keyed by id.
///
/// Containers list their children by id and a parent index is kept in step
/// with every structural change, so parent lookups are O(1). All structural
/// edits go through [`Ast::splice_children`] or the helpers built on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    root: NodeId,
    blocks: HashMap<NodeId, Block>,
    parents: HashMap<NodeId, NodeId>,
}

impl Ast {
    /// Builds an arena from an owned tree. The root node becomes the arena root.
    pub fn from_node(root: BlockNode) -> Self {
        let mut ast = Self {
            root: root.id,
            blocks: HashMap::new(),
            parents: HashMap::new(),
        };
        ast.insert_node(None, root);
        ast
    }

    /// An empty document holding `children`.
    pub fn document(id: NodeId, children: Vec<BlockNode>) -> Self {
        let end = children.last().map(|c| c.span.end).unwrap_or(0);
        let root = BlockNode::new(id, BlockKind::Document, "", Span::new(0, end)).with_children(children);
        Self::from_node(root)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn block(&self, id: NodeId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn block_mut(&mut self, id: NodeId) -> Option<&mut Block> {
        self.blocks.get_mut(&id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&BlockKind> {
        self.blocks.get(&id).map(|b| &b.kind)
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.blocks.get(&id).map(|b| b.children.as_slice()).unwrap_or(&[])
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent_of(id), |p| self.parent_of(*p))
    }

    /// Number of ancestors between `id` and the root.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Pre-order ids of `id` and all its descendants.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !self.contains(next) {
                continue;
            }
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Previous sibling of `id` under the same parent.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(id)?;
        let idx = self.index_in_parent(id)?;
        idx.checked_sub(1).map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(id)?;
        let idx = self.index_in_parent(id)?;
        self.children(parent).get(idx + 1).copied()
    }

    /// Clones the subtree rooted at `id` into an owned tree.
    pub fn to_node(&self, id: NodeId) -> Option<BlockNode> {
        let block = self.block(id)?;
        let mut node = BlockNode::new(block.id, block.kind.clone(), block.text.clone(), block.span);
        node.inlines = block.inlines.clone();
        for child in &block.children {
            node.children.push(self.to_node(*child)?);
        }
        Some(node)
    }

    /// Replaces `range` of `parent`'s children with `nodes`.
    ///
    /// Returns the detached subtrees, or `None` if `parent` is unknown or the
    /// range is out of bounds (in which case nothing changes).
    pub fn splice_children(
        &mut self,
        parent: NodeId,
        range: Range<usize>,
        nodes: Vec<BlockNode>,
    ) -> Option<Vec<BlockNode>> {
        let len = self.block(parent)?.children.len();
        if range.start > range.end || range.end > len {
            return None;
        }
        let removed_ids: Vec<NodeId> = self.block(parent)?.children[range.clone()].to_vec();
        let mut removed = Vec::with_capacity(removed_ids.len());
        for id in &removed_ids {
            if let Some(node) = self.take_subtree(*id) {
                removed.push(node);
            }
        }
        let new_ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        for node in nodes {
            self.insert_node(Some(parent), node);
        }
        if let Some(p) = self.blocks.get_mut(&parent) {
            p.children.splice(range, new_ids);
        }
        Some(removed)
    }

    /// Inserts `node` as the `index`-th child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, node: BlockNode) -> Option<NodeId> {
        let id = node.id;
        self.splice_children(parent, index..index, vec![node])?;
        Some(id)
    }

    pub fn push_child(&mut self, parent: NodeId, node: BlockNode) -> Option<NodeId> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, node)
    }

    /// Detaches the subtree rooted at `id`. The root cannot be detached.
    pub fn detach(&mut self, id: NodeId) -> Option<BlockNode> {
        let parent = self.parent_of(id)?;
        let idx = self.index_in_parent(id)?;
        self.splice_children(parent, idx..idx + 1, Vec::new())?.pop()
    }

    /// Replaces the block `id` (and its subtree) with `nodes` at the same place.
    pub fn replace(&mut self, id: NodeId, nodes: Vec<BlockNode>) -> Option<Vec<BlockNode>> {
        let parent = self.parent_of(id)?;
        let idx = self.index_in_parent(id)?;
        self.splice_children(parent, idx..idx + 1, nodes)
    }

    /// Moves the subtree at `id` to be the `index`-th child of `new_parent`,
    /// keeping every id. `index` is interpreted after the detach.
    pub fn move_to(&mut self, id: NodeId, new_parent: NodeId, index: usize) -> Option<()> {
        if id == new_parent || self.ancestors(new_parent).any(|a| a == id) {
            return None;
        }
        let node = self.detach(id)?;
        let index = index.min(self.children(new_parent).len());
        self.insert_child(new_parent, index, node).map(|_| ())
    }

    /// Renames block `old` to `new`, updating the parent, children and inline
    /// back-references.
    pub fn rekey(&mut self, old: NodeId, new: NodeId) -> Option<()> {
        if old == new {
            return Some(());
        }
        if self.contains(new) {
            return None;
        }
        let mut block = self.blocks.remove(&old)?;
        block.id = new;
        for inline in &mut block.inlines {
            inline.set_block(new);
        }
        for child in &block.children {
            self.parents.insert(*child, new);
        }
        if let Some(parent) = self.parents.remove(&old) {
            self.parents.insert(new, parent);
            if let Some(p) = self.blocks.get_mut(&parent) {
                for c in &mut p.children {
                    if *c == old {
                        *c = new;
                    }
                }
            }
        }
        if self.root == old {
            self.root = new;
        }
        self.blocks.insert(new, block);
        Some(())
    }

    fn insert_node(&mut self, parent: Option<NodeId>, node: BlockNode) {
        let BlockNode {
            id,
            kind,
            text,
            span,
            mut inlines,
            children,
            ..
        } = node;
        for inline in &mut inlines {
            inline.set_block(id);
        }
        let child_ids = children.iter().map(|c| c.id).collect();
        self.blocks.insert(
            id,
            Block {
                id,
                kind,
                text,
                span,
                inlines,
                children: child_ids,
            },
        );
        if let Some(p) = parent {
            self.parents.insert(id, p);
        }
        for child in children {
            self.insert_node(Some(id), child);
        }
    }

    fn take_subtree(&mut self, id: NodeId) -> Option<BlockNode> {
        let block = self.blocks.remove(&id)?;
        self.parents.remove(&id);
        let mut node = BlockNode::new(block.id, block.kind, block.text, block.span);
        node.inlines = block.inlines;
        for child in block.children {
            if let Some(c) = self.take_subtree(child) {
                node.children.push(c);
            }
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn para(id: u128) -> BlockNode {
        BlockNode::new(NodeId(id), BlockKind::Paragraph, format!("p{id}"), Span::default())
    }

    fn sample() -> Ast {
        let quote = BlockNode::new(NodeId(10), BlockKind::BlockQuote, "", Span::default())
            .with_children(vec![para(11), para(12)]);
        Ast::document(NodeId(1), vec![para(2), quote, para(3)])
    }

    #[test]
    fn parent_index_tracks_nesting() {
        let ast = sample();
        assert_eq!(ast.parent_of(NodeId(11)), Some(NodeId(10)));
        assert_eq!(ast.parent_of(NodeId(10)), Some(NodeId(1)));
        assert_eq!(ast.parent_of(NodeId(1)), None);
        assert_eq!(ast.depth(NodeId(12)), 2);
    }

    #[test]
    fn descendants_are_pre_order() {
        let ast = sample();
        let ids: Vec<u128> = ast.descendants(ast.root()).into_iter().map(|i| i.0).collect();
        assert_eq!(ids, vec![1, 2, 10, 11, 12, 3]);
    }

    #[test]
    fn splice_replaces_and_returns_removed() {
        let mut ast = sample();
        let removed = ast
            .splice_children(NodeId(1), 1..2, vec![para(20), para(21)])
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].children.len(), 2);
        assert!(!ast.contains(NodeId(11)));
        assert_eq!(ast.parent_of(NodeId(11)), None);
        assert_eq!(ast.children(NodeId(1)), &[NodeId(2), NodeId(20), NodeId(21), NodeId(3)]);
    }

    #[test]
    fn splice_out_of_bounds_is_rejected() {
        let mut ast = sample();
        assert!(ast.splice_children(NodeId(1), 2..9, vec![]).is_none());
        assert_eq!(ast.children(NodeId(1)).len(), 3);
    }

    #[test]
    fn move_keeps_ids_and_updates_parent() {
        let mut ast = sample();
        ast.move_to(NodeId(3), NodeId(10), 0).unwrap();
        assert_eq!(ast.parent_of(NodeId(3)), Some(NodeId(10)));
        assert_eq!(ast.children(NodeId(10))[0], NodeId(3));
    }

    #[test]
    fn move_into_own_subtree_is_rejected() {
        let mut ast = sample();
        assert!(ast.move_to(NodeId(10), NodeId(11), 0).is_none());
    }

    #[test]
    fn rekey_updates_all_references() {
        let mut ast = sample();
        ast.rekey(NodeId(10), NodeId(99)).unwrap();
        assert_eq!(ast.parent_of(NodeId(11)), Some(NodeId(99)));
        assert_eq!(ast.children(NodeId(1))[1], NodeId(99));
        assert!(ast.rekey(NodeId(2), NodeId(3)).is_none());
    }

    #[test]
    fn to_node_round_trips_subtree() {
        let ast = sample();
        let node = ast.to_node(NodeId(10)).unwrap();
        assert_eq!(node.children.iter().map(|c| c.id).collect::<Vec<_>>(), vec![NodeId(11), NodeId(12)]);
    }
}
