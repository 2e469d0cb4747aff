//! Coalescing of the per-line blocks the [`BlockParser`](super::BlockParser)
//! emits: consecutive list lines become one list (nesting deeper-indented items
//! under the previous item), consecutive quote lines one quote, and consecutive
//! indented code lines one code block.

use crate::ast::id::IdGenerator;
use crate::ast::node::{BlockKind, BlockNode, ListInfo};

use super::leaf::code_block_inlines;

pub fn merge_blocks(nodes: Vec<BlockNode>, ids: &mut dyn IdGenerator) -> Vec<BlockNode> {
    let mut out: Vec<BlockNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match out.last_mut() {
            Some(prev) if continues_list(prev, &node) => {
                if let BlockKind::List(info) = &node.kind {
                    let info = info.clone();
                    for item in node.children {
                        push_item(prev, item, &info, ids);
                    }
                }
            }
            Some(prev) if matches!(prev.kind, BlockKind::BlockQuote) && matches!(node.kind, BlockKind::BlockQuote) => {
                prev.span = prev.span.cover(node.span);
                prev.children.extend(node.children);
            }
            Some(prev) if is_indented_code(prev) && is_indented_code(&node) => {
                prev.text.push('\n');
                prev.text.push_str(&node.text);
                prev.span = prev.span.cover(node.span);
                if let BlockKind::CodeBlock(info) = &prev.kind {
                    prev.inlines = code_block_inlines(prev.id, info, Some(&prev.text), None, ids);
                }
            }
            _ => out.push(node),
        }
    }

    for node in &mut out {
        if node.kind.is_container() && !node.children.is_empty() {
            let children = std::mem::take(&mut node.children);
            node.children = merge_blocks(children, ids);
        }
    }
    out
}

fn is_indented_code(node: &BlockNode) -> bool {
    matches!(&node.kind, BlockKind::CodeBlock(info) if !info.fenced)
}

/// `next` continues `prev` if both are lists and `next` is either the same
/// flavour or indented under `prev`'s last item.
fn continues_list(prev: &BlockNode, next: &BlockNode) -> bool {
    let (BlockKind::List(a), BlockKind::List(b)) = (&prev.kind, &next.kind) else {
        return false;
    };
    let deeper = prev.children.last().is_some_and(|last| next.indent > last.indent);
    deeper || a.ordered == b.ordered
}

/// Appends `item` to `list`, or nests it under the last item when indented
/// past it.
fn push_item(list: &mut BlockNode, item: BlockNode, info: &ListInfo, ids: &mut dyn IdGenerator) {
    list.span = list.span.cover(item.span);
    let Some(last) = list.children.last_mut() else {
        list.children.push(item);
        return;
    };
    if item.indent <= last.indent {
        list.children.push(item);
        return;
    }

    last.span = last.span.cover(item.span);
    match last.children.last_mut() {
        Some(sub) if matches!(&sub.kind, BlockKind::List(sub_info) if sub_info.ordered == info.ordered) => {
            push_item(sub, item, info, ids);
        }
        _ => {
            let mut sub = BlockNode::new(ids.next_id(), BlockKind::List(info.clone()), "", item.span);
            sub.indent = item.indent;
            sub.children.push(item);
            last.children.push(sub);
        }
    }
}
