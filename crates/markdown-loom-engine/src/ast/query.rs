//! Read-only lookups over an [`Ast`].

use crate::ast::Ast;
use crate::ast::id::NodeId;
use crate::ast::node::{Block, BlockKind, Inline};

/// One entry of a pre-order flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatBlock {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub depth: usize,
}

/// An inline hit: the leaf inline and the caret offset inside it.
#[derive(Debug, Clone, Copy)]
pub struct InlineHit<'a> {
    pub inline: &'a Inline,
    pub offset: usize,
}

pub fn get_block_by_id(ast: &Ast, id: NodeId) -> Option<&Block> {
    ast.block(id)
}

/// Finds an inline anywhere in the tree, including inside composites.
/// Returns the owning block alongside it.
pub fn get_inline_by_id(ast: &Ast, id: NodeId) -> Option<(&Block, &Inline)> {
    ast.descendants(ast.root()).into_iter().find_map(|bid| {
        let block = ast.block(bid)?;
        block.inlines.iter().find_map(|i| i.find(id)).map(|i| (block, i))
    })
}

/// All blocks in document order with parent back-pointers. The root is
/// excluded.
pub fn flatten_blocks(ast: &Ast) -> Vec<FlatBlock> {
    fn walk(ast: &Ast, id: NodeId, depth: usize, out: &mut Vec<FlatBlock>) {
        for child in ast.children(id) {
            out.push(FlatBlock {
                id: *child,
                parent: Some(id),
                depth,
            });
            walk(ast, *child, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(ast, ast.root(), 0, &mut out);
    out
}

/// Leaf ids in document order.
pub fn flatten_leaves(ast: &Ast) -> Vec<NodeId> {
    flatten_blocks(ast)
        .into_iter()
        .filter(|f| ast.kind(f.id).is_some_and(BlockKind::is_leaf))
        .map(|f| f.id)
        .collect()
}

/// Leaf inlines of a run in order; composites are replaced by their content.
pub fn flatten_inlines(inlines: &[Inline]) -> Vec<&Inline> {
    let mut out = Vec::new();
    for inline in inlines {
        if inline.children.is_empty() {
            out.push(inline);
        } else {
            out.extend(flatten_inlines(&inline.children));
        }
    }
    out
}

pub fn get_parent_block(ast: &Ast, id: NodeId) -> Option<&Block> {
    ast.parent_of(id).and_then(|p| ast.block(p))
}

/// First content inline of a block, skipping markers.
pub fn get_first_inline(block: &Block) -> Option<&Inline> {
    flatten_inlines(&block.inlines).into_iter().find(|i| !i.is_marker())
}

/// Last content inline of a block, skipping markers.
pub fn get_last_inline(block: &Block) -> Option<&Inline> {
    flatten_inlines(&block.inlines).into_iter().rev().find(|i| !i.is_marker())
}

/// First content inline in a subtree, in document order.
pub fn first_inline_in(ast: &Ast, id: NodeId) -> Option<&Inline> {
    ast.descendants(id)
        .into_iter()
        .filter_map(|d| ast.block(d))
        .find_map(get_first_inline)
}

/// Last content inline in a subtree, in document order.
pub fn last_inline_in(ast: &Ast, id: NodeId) -> Option<&Inline> {
    ast.descendants(id)
        .into_iter()
        .rev()
        .filter_map(|d| ast.block(d))
        .find_map(get_last_inline)
}

/// Nearest list enclosing `id`.
pub fn get_list_from_block(ast: &Ast, id: NodeId) -> Option<NodeId> {
    ast.ancestors(id)
        .find(|a| matches!(ast.kind(*a), Some(BlockKind::List(_))))
}

/// The list whose item marker directly precedes `id`: `id` must be the first
/// child of a list item.
pub fn get_list_for_marker_merge(ast: &Ast, id: NodeId) -> Option<NodeId> {
    let item = ast.parent_of(id)?;
    if !ast.kind(item)?.is_list_item() || ast.children(item).first() != Some(&id) {
        return None;
    }
    get_list_from_block(ast, id)
}

/// Nearest ancestor of `id` that an inline merge must not silently cross.
pub fn get_inline_merge_owner(ast: &Ast, id: NodeId) -> Option<NodeId> {
    ast.ancestors(id)
        .find(|a| ast.kind(*a).is_some_and(BlockKind::is_merge_boundary))
}

/// Nearest ancestor list item of `id`.
pub fn enclosing_item(ast: &Ast, id: NodeId) -> Option<NodeId> {
    ast.ancestors(id).find(|a| ast.kind(*a).is_some_and(BlockKind::is_list_item))
}

/// Maps a block-local `offset` to a leaf inline. Content inlines win over
/// markers at a shared boundary; offsets past the end clamp to the last leaf.
pub fn get_inline_at_position(inlines: &[Inline], offset: usize) -> Option<InlineHit<'_>> {
    let leaves = flatten_inlines(inlines);
    let touching = || leaves.iter().copied().filter(|i| i.span.touches(offset));
    let hit = touching()
        .find(|i| !i.is_marker())
        .or_else(|| touching().next())
        .map(|inline| InlineHit {
            inline,
            offset: offset - inline.span.start,
        });
    if hit.is_some() {
        return hit;
    }
    if let Some(next) = leaves.iter().copied().find(|i| i.span.start > offset && !i.is_marker()) {
        return Some(InlineHit { inline: next, offset: 0 });
    }
    leaves.last().copied().map(|inline| InlineHit {
        inline,
        offset: inline.span.len(),
    })
}

/// Deepest leaf block whose span touches the absolute `offset`.
pub fn get_block_at_position(ast: &Ast, offset: usize) -> Option<NodeId> {
    flatten_blocks(ast)
        .into_iter()
        .filter(|f| {
            ast.block(f.id)
                .is_some_and(|b| b.kind.is_leaf() && b.span.touches(offset))
        })
        .map(|f| f.id)
        .next()
}

/// True if the block has no child blocks and, for a leaf, no inlines. A list
/// item's marker inline does not keep it alive.
pub fn is_block_empty(ast: &Ast, id: NodeId) -> bool {
    ast.block(id)
        .is_none_or(|b| b.children.is_empty() && (b.kind.is_container() || b.inlines.is_empty()))
}

/// Block-local start of an inline.
pub fn inline_start(ast: &Ast, inline: NodeId) -> Option<(NodeId, usize)> {
    let (block, i) = get_inline_by_id(ast, inline)?;
    Some((block.id, i.span.start))
}

/// True if `a` comes before `b` in document order.
pub fn precedes(ast: &Ast, a: NodeId, b: NodeId) -> bool {
    let order = ast.descendants(ast.root());
    let pos = |id| order.iter().position(|x| *x == id);
    matches!((pos(a), pos(b)), (Some(x), Some(y)) if x < y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::id::SequentialIds;
    use crate::options::ParseOptions;
    use crate::parsing::parse_document;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> Ast {
        parse_document(src, &ParseOptions::default(), &mut SequentialIds::default()).ast
    }

    fn leaf_texts(ast: &Ast) -> Vec<String> {
        flatten_leaves(ast)
            .into_iter()
            .filter_map(|id| ast.block(id).map(|b| b.text.clone()))
            .collect()
    }

    #[test]
    fn flatten_is_document_order() {
        let ast = parse("- a\n  - b\n- c");
        assert_eq!(leaf_texts(&ast), vec!["a", "b", "c"]);
        let flat = flatten_blocks(&ast);
        assert_eq!(flat[0].depth, 0);
        assert_eq!(flat[0].parent, Some(ast.root()));
    }

    #[test]
    fn first_and_last_skip_markers() {
        let ast = parse("## Title");
        let id = flatten_leaves(&ast)[0];
        let block = ast.block(id).unwrap();
        assert_eq!(get_first_inline(block).map(|i| i.text.symbolic.as_str()), Some("Title"));
        assert_eq!(get_last_inline(block).map(|i| i.text.symbolic.as_str()), Some("Title"));
    }

    #[test]
    fn inline_lookup_finds_nested() {
        let ast = parse("a **b** c");
        let block = ast.block(flatten_leaves(&ast)[0]).unwrap();
        let inner = block.inlines[1].children[0].id;
        let (owner, found) = get_inline_by_id(&ast, inner).unwrap();
        assert_eq!(owner.id, block.id);
        assert_eq!(found.text.symbolic, "b");
    }

    #[test]
    fn list_and_merge_owner_lookup() {
        let ast = parse("- a\n  - b");
        let leaves = flatten_leaves(&ast);
        let outer_list = ast.children(ast.root())[0];
        let inner_para = leaves[1];
        let inner_list = get_list_from_block(&ast, inner_para).unwrap();
        assert_ne!(inner_list, outer_list);
        assert_eq!(get_list_for_marker_merge(&ast, leaves[0]), Some(outer_list));
        let owner = get_inline_merge_owner(&ast, inner_para).unwrap();
        assert_eq!(ast.kind(owner), Some(&BlockKind::ListItem));
        assert_eq!(ast.parent_of(owner), Some(inner_list));
    }

    #[test]
    fn position_mapping_prefers_content_and_clamps() {
        let ast = parse("# ab");
        let block = ast.block(flatten_leaves(&ast)[0]).unwrap();
        let at_boundary = get_inline_at_position(&block.inlines, 2).unwrap();
        assert_eq!(at_boundary.inline.text.symbolic, "ab");
        assert_eq!(at_boundary.offset, 0);
        let past = get_inline_at_position(&block.inlines, 99).unwrap();
        assert_eq!(past.offset, 2);
    }

    #[test]
    fn block_at_position_and_order() {
        let ast = parse("one\ntwo");
        let leaves = flatten_leaves(&ast);
        assert_eq!(get_block_at_position(&ast, 5), Some(leaves[1]));
        assert!(precedes(&ast, leaves[0], leaves[1]));
        assert!(!precedes(&ast, leaves[1], leaves[0]));
        assert!(!is_block_empty(&ast, leaves[0]));
    }
}
