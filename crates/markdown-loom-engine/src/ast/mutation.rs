//! Pure, id-preserving primitives the edit catalog is built from.
//!
//! None of these touch the arena except [`remove_block_cascade`]; they take
//! blocks and return replacement subtrees for the caller to splice.

use std::collections::HashSet;

use crate::ast::Ast;
use crate::ast::id::{IdGenerator, NodeId};
use crate::ast::node::{Block, BlockKind, BlockNode, Inline};
use crate::ast::normalize::{layout_inlines, leaf_text};
use crate::ast::query::{get_inline_at_position, get_inline_by_id, get_inline_merge_owner, is_block_empty};
use crate::ast::reconcile::reconcile_inlines;
use crate::options::{ParseOptions, ReconcileOptions};
use crate::parsing::blocks::{InlineContext, leaf_inlines};
use crate::parsing::link_refs::LinkRefs;
use crate::parsing::rope::{Span, floor_char_boundary};

/// What re-parsing a fragment or an inline run needs from the document.
#[derive(Clone, Copy)]
pub struct Reparse<'a> {
    pub refs: &'a LinkRefs,
    pub options: &'a ParseOptions,
}

impl<'a> Reparse<'a> {
    pub fn inline_cx(&self) -> InlineContext<'a> {
        InlineContext {
            refs: self.refs,
            extensions: self.options.extensions,
        }
    }

    /// A leaf of `kind` holding `text`, inline-parsed, with the given id.
    pub fn leaf(&self, id: NodeId, kind: BlockKind, text: &str, start: usize, ids: &mut dyn IdGenerator) -> BlockNode {
        let mut node = BlockNode::new(id, kind, text, Span::at(start, text.len()));
        node.inlines = leaf_inlines(&node.kind, text, id, self.inline_cx(), ids);
        node
    }
}

/// The two halves of a split block.
#[derive(Debug, Clone)]
pub struct Split {
    /// Keeps the original id and kind.
    pub left: BlockNode,
    /// Fresh id.
    pub right: BlockNode,
}

/// Splits a leaf at `caret` bytes into inline `inline`.
///
/// Both halves are re-parsed from their text rather than sliced, so syntax
/// that only existed across the split point falls back to literal text on
/// each side. The right half is a paragraph unless `right_kind` says
/// otherwise.
pub fn split_block_pure(
    block: &Block,
    inline: NodeId,
    caret: usize,
    right_kind: Option<BlockKind>,
    reparse: Reparse<'_>,
    ids: &mut dyn IdGenerator,
) -> Option<Split> {
    let target = block.inlines.iter().find_map(|i| i.find(inline))?;
    let text = leaf_text(&block.inlines);
    let offset = floor_char_boundary(&text, (target.span.start + caret.min(target.span.len())).min(text.len()));
    let (left_text, right_text) = text.split_at(offset);

    let mut left = reparse.leaf(block.id, block.kind.clone(), left_text, block.span.start, ids);
    let mut used = HashSet::new();
    reconcile_inlines(&block.inlines, &mut left.inlines, &mut used, &ReconcileOptions::default());

    let right = reparse.leaf(
        ids.next_id(),
        right_kind.unwrap_or(BlockKind::Paragraph),
        right_text,
        block.span.start + offset,
        ids,
    );
    left.span = Span::at(block.span.start, left_text.len());
    Some(Split { left, right })
}

/// Which ownership case a merge fell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeCase {
    /// Two blocks under the same merge-boundary owner (one list item, one
    /// table cell, one quote).
    SameOwner,
    /// Two inlines of one block: the character before the boundary goes.
    SameBlock,
    /// Two blocks with different owners; the right one is removed.
    CrossBlock,
}

#[derive(Debug, Clone)]
pub struct Merge {
    pub case: MergeCase,
    /// The merged leaf, carrying the left block's id.
    pub block: BlockNode,
    /// The right block, when it was a different block and is now empty.
    pub removed: Option<NodeId>,
    /// Caret landing: inline id and offset inside it.
    pub caret: (NodeId, usize),
}

/// Merges the inline `left` with the inline `right` that follows it.
pub fn merge_inline_pure(
    ast: &Ast,
    left: NodeId,
    right: NodeId,
    reparse: Reparse<'_>,
    ids: &mut dyn IdGenerator,
) -> Option<Merge> {
    let (lb, li) = get_inline_by_id(ast, left)?;
    let (rb, ri) = get_inline_by_id(ast, right)?;
    if lb.kind.is_container() || rb.kind.is_container() {
        return None;
    }

    let (case, text, caret) = if lb.id == rb.id {
        let text = leaf_text(&lb.inlines);
        let boundary = ri.span.start.min(text.len());
        if boundary == 0 {
            return None;
        }
        let cut = floor_char_boundary(&text, boundary - 1);
        (MergeCase::SameBlock, format!("{}{}", &text[..cut], &text[boundary..]), cut)
    } else {
        let ltext = leaf_text(&lb.inlines);
        let rtext = leaf_text(&rb.inlines);
        let head = &ltext[..li.span.end.min(ltext.len())];
        let tail = &rtext[ri.span.start.min(rtext.len())..];
        let owner_l = get_inline_merge_owner(ast, lb.id);
        let case = if owner_l.is_some() && owner_l == get_inline_merge_owner(ast, rb.id) {
            MergeCase::SameOwner
        } else {
            MergeCase::CrossBlock
        };
        (case, format!("{head}{tail}"), head.len())
    };

    let mut block = reparse.leaf(lb.id, lb.kind.clone(), &text, lb.span.start, ids);
    let mut previous: Vec<Inline> = lb.inlines.clone();
    if rb.id != lb.id {
        let mut moved = rb.inlines.clone();
        layout_inlines(&mut moved, caret);
        previous.extend(moved);
    }
    let mut used = HashSet::new();
    reconcile_inlines(&previous, &mut block.inlines, &mut used, &ReconcileOptions::default());

    let hit = get_inline_at_position(&block.inlines, caret)?;
    let caret = (hit.inline.id, hit.offset);
    Some(Merge {
        case,
        removed: (rb.id != lb.id).then_some(rb.id),
        block,
        caret,
    })
}

/// Removes `id` and then every ancestor left empty by the removal, stopping
/// below the root. Returns removed ids, innermost first.
pub fn remove_block_cascade(ast: &mut Ast, id: NodeId) -> Vec<NodeId> {
    let mut removed = Vec::new();
    let mut current = id;
    while current != ast.root() {
        let Some(parent) = ast.parent_of(current) else {
            break;
        };
        if ast.detach(current).is_none() {
            break;
        }
        removed.push(current);
        if parent == ast.root() || !is_block_empty(ast, parent) {
            break;
        }
        current = parent;
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::id::SequentialIds;
    use crate::ast::node::symbolic_text;
    use crate::ast::query::{flatten_leaves, get_first_inline, get_last_inline};
    use crate::parsing::{ParsedDocument, parse_document};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    struct Fixture {
        doc: ParsedDocument,
        options: ParseOptions,
        ids: SequentialIds,
    }

    impl Fixture {
        fn new(src: &str) -> Self {
            let options = ParseOptions::default();
            let mut ids = SequentialIds::default();
            let doc = parse_document(src, &options, &mut ids);
            Self { doc, options, ids }
        }

        fn leaf(&self, n: usize) -> &Block {
            self.doc.ast.block(flatten_leaves(&self.doc.ast)[n]).unwrap()
        }

        fn split(&mut self, n: usize, offset: usize) -> Split {
            let block = self.leaf(n).clone();
            let hit = get_inline_at_position(&block.inlines, offset).unwrap();
            let (inline, caret) = (hit.inline.id, hit.offset);
            let reparse = Reparse {
                refs: &self.doc.refs,
                options: &self.options,
            };
            split_block_pure(&block, inline, caret, None, reparse, &mut self.ids).unwrap()
        }
    }

    #[test]
    fn split_reparses_each_side() {
        let mut f = Fixture::new("a **bold** z");
        let split = f.split(0, 5);
        assert_eq!(symbolic_text(&split.left.inlines), "a **b");
        assert_eq!(symbolic_text(&split.right.inlines), "old** z");
        assert!(split.left.inlines.iter().all(|i| i.children.is_empty()));
        assert_eq!(split.right.kind, BlockKind::Paragraph);
        assert_eq!(split.right.span.start, 5);
    }

    #[test]
    fn split_keeps_left_identity() {
        let mut f = Fixture::new("## Heading");
        let original = f.leaf(0).clone();
        let split = f.split(0, 5);
        assert_eq!(split.left.id, original.id);
        assert_eq!(split.left.kind, BlockKind::Heading { level: 2 });
        assert_eq!(split.left.inlines[0].id, original.inlines[0].id);
        assert_ne!(split.right.id, original.id);
    }

    #[rstest]
    #[case("hello world", 0)]
    #[case("hello world", 6)]
    #[case("hello world", 11)]
    #[case("a *b* [c](d) e", 4)]
    #[case("# Title here", 4)]
    fn split_then_merge_restores_text(#[case] src: &str, #[case] offset: usize) {
        let mut f = Fixture::new(src);
        let original = leaf_text(&f.leaf(0).inlines);
        let Split { left, right } = f.split(0, offset);
        let target = flatten_leaves(&f.doc.ast)[0];
        let mut ast = f.doc.ast.clone();
        ast.replace(target, vec![left.clone(), right.clone()]).unwrap();
        let l = get_last_inline(ast.block(left.id).unwrap()).unwrap().id;
        let r = get_first_inline(ast.block(right.id).unwrap()).unwrap().id;
        let reparse = Reparse {
            refs: &f.doc.refs,
            options: &f.options,
        };
        let merge = merge_inline_pure(&ast, l, r, reparse, &mut f.ids).unwrap();
        assert_eq!(merge.case, MergeCase::CrossBlock);
        assert_eq!(merge.removed, Some(right.id));
        assert_eq!(leaf_text(&merge.block.inlines), original);
        assert_eq!(merge.block.id, target);
    }

    #[test]
    fn same_block_merge_drops_boundary_character() {
        let f = Fixture::new("ab*c*");
        let block = f.leaf(0).clone();
        let (left, right) = (block.inlines[0].id, block.inlines[1].id);
        let mut ids = f.ids.clone();
        let reparse = Reparse {
            refs: &f.doc.refs,
            options: &f.options,
        };
        let merge = merge_inline_pure(&f.doc.ast, left, right, reparse, &mut ids).unwrap();
        assert_eq!(merge.case, MergeCase::SameBlock);
        assert_eq!(leaf_text(&merge.block.inlines), "a*c*");
        assert_eq!(merge.removed, None);
    }

    #[test]
    fn same_owner_merge_in_table_cell() {
        let f = Fixture::new("| a<br>b |\n| --- |");
        let (a, b) = (f.leaf(0).clone(), f.leaf(1).clone());
        let mut ids = f.ids.clone();
        let reparse = Reparse {
            refs: &f.doc.refs,
            options: &f.options,
        };
        let merge = merge_inline_pure(&f.doc.ast, a.inlines[0].id, b.inlines[0].id, reparse, &mut ids).unwrap();
        assert_eq!(merge.case, MergeCase::SameOwner);
        assert_eq!(leaf_text(&merge.block.inlines), "ab");
        assert_eq!(merge.caret, (merge.block.inlines[0].id, 1));
    }

    #[test]
    fn cascade_removes_emptied_containers() {
        let mut f = Fixture::new("- only\n\nafter");
        let para = flatten_leaves(&f.doc.ast)[0];
        let item = f.doc.ast.parent_of(para).unwrap();
        let list = f.doc.ast.parent_of(item).unwrap();
        let removed = remove_block_cascade(&mut f.doc.ast, para);
        assert_eq!(removed, vec![para, item, list]);
        assert_eq!(f.doc.ast.children(f.doc.ast.root()).len(), 2);
    }

    #[test]
    fn cascade_stops_at_non_empty_parent() {
        let mut f = Fixture::new("- a\n- b");
        let para = flatten_leaves(&f.doc.ast)[0];
        let item = f.doc.ast.parent_of(para).unwrap();
        let removed = remove_block_cascade(&mut f.doc.ast, para);
        assert_eq!(removed, vec![para, item]);
        assert_eq!(flatten_leaves(&f.doc.ast).len(), 1);
    }
}
