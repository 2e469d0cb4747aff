//! Identity preservation across re-parses.
//!
//! A re-parse builds a tree with fresh ids. Reconciliation walks it alongside
//! the previous tree and hands each new node the id of the best-scoring
//! previous node of the same kind, so renderers keyed by id see only the
//! nodes that really changed.

use std::collections::HashSet;

use tracing::debug;

use crate::ast::Ast;
use crate::ast::id::NodeId;
use crate::ast::node::{BlockNode, Inline, symbolic_text};
use crate::options::ReconcileOptions;

/// Returns `next` with ids carried over from `prev` wherever blocks and
/// inlines match.
pub fn reconcile_document(prev: &Ast, next: Ast, options: &ReconcileOptions) -> Ast {
    let Some(mut root) = next.to_node(next.root()) else {
        return next;
    };
    root.id = prev.root();
    for inline in &mut root.inlines {
        inline.set_block(root.id);
    }
    let mut used = HashSet::new();
    let reused = reconcile_blocks(prev, prev.root(), &mut root.children, &mut used, options);
    debug!(reused, "reconciled document");
    Ast::from_node(root)
}

/// Matches `nodes` against the children of `prev_parent`. Returns how many
/// block ids were reused.
pub fn reconcile_blocks(
    prev: &Ast,
    prev_parent: NodeId,
    nodes: &mut [BlockNode],
    used: &mut HashSet<NodeId>,
    options: &ReconcileOptions,
) -> usize {
    let candidates = prev.children(prev_parent).to_vec();
    let mut reused = 0;
    for node in nodes.iter_mut() {
        let key = node_key(node);
        let best = candidates
            .iter()
            .filter(|c| !used.contains(*c))
            .filter_map(|c| prev.block(*c))
            .filter(|b| b.kind.tag() == node.kind.tag())
            .map(|b| {
                let score = block_score(&ast_key(prev, b.id), b.span.start, &key, node.span.start, options);
                (b, score, b.span.start.abs_diff(node.span.start))
            })
            .filter(|(_, score, _)| *score > options.threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.2.cmp(&a.2)));

        let Some((old, _, _)) = best else {
            continue;
        };
        used.insert(old.id);
        node.id = old.id;
        reused += 1;
        for inline in &mut node.inlines {
            inline.set_block(old.id);
        }
        let mut used_inlines = HashSet::new();
        reconcile_inlines(&old.inlines, &mut node.inlines, &mut used_inlines, options);
        reused += reconcile_blocks(prev, old.id, &mut node.children, used, options);
    }
    reused
}

/// Matches inline runs the same way, recursing into composites.
pub fn reconcile_inlines(
    prev: &[Inline],
    next: &mut [Inline],
    used: &mut HashSet<NodeId>,
    options: &ReconcileOptions,
) {
    for inline in next.iter_mut() {
        let best = prev
            .iter()
            .filter(|p| !used.contains(&p.id) && p.kind.tag() == inline.kind.tag())
            .map(|p| {
                let score = inline_score(p, inline, options);
                (p, score, p.span.start.abs_diff(inline.span.start))
            })
            .filter(|(_, score, _)| *score >= options.threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.2.cmp(&a.2)));
        if let Some((old, _, _)) = best {
            used.insert(old.id);
            inline.id = old.id;
            reconcile_inlines(&old.children, &mut inline.children, used, options);
        }
    }
}

/// What a block is compared by: the symbolic text of every inline run in
/// its subtree, in document order. Unlike `Block::text` this is the same
/// before and after normalization (a fresh parse stores only the payload of
/// a code block as its text).
fn ast_key(ast: &Ast, id: NodeId) -> String {
    ast.descendants(id)
        .into_iter()
        .filter_map(|d| ast.block(d))
        .map(|b| symbolic_text(&b.inlines))
        .collect::<Vec<_>>()
        .join("\n")
}

fn node_key(node: &BlockNode) -> String {
    node.walk()
        .into_iter()
        .map(|n| symbolic_text(&n.inlines))
        .collect::<Vec<_>>()
        .join("\n")
}

fn block_score(old: &str, old_start: usize, new: &str, new_start: usize, options: &ReconcileOptions) -> f64 {
    let mut score = 0.0;
    if old_start.abs_diff(new_start) <= options.position_window {
        score += 1.0;
    }
    score += similarity(old, new);
    if old.len().abs_diff(new.len()) <= 10 {
        score += 0.5;
    }
    if old.starts_with(new) || new.starts_with(old) {
        score += 1.0;
    } else if old.ends_with(new) || new.ends_with(old) {
        score += 0.8;
    }
    score
}

fn inline_score(old: &Inline, new: &Inline, options: &ReconcileOptions) -> f64 {
    let (a, b) = (old.symbolic(), new.symbolic());
    let mut score = if a == b {
        3.0
    } else if a.starts_with(b) || b.starts_with(a) || a.ends_with(b) || b.ends_with(a) {
        2.0
    } else if within_edit_distance(a, b, 3) {
        1.0
    } else {
        0.0
    };
    if old.span.start.abs_diff(new.span.start) <= options.position_window {
        score += 0.5;
    }
    score
}

/// Share of aligned character positions that agree, over the longer string.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (a.trim(), b.trim());
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let longer = a.chars().count().max(b.chars().count());
    let same = a.chars().zip(b.chars()).filter(|(x, y)| x == y).count();
    same as f64 / longer as f64
}

/// Levenshtein distance of at most `max`, computed only for short strings.
pub fn within_edit_distance(a: &str, b: &str, max: usize) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max || a.len().max(b.len()) > 64 {
        return false;
    }
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut prev_diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let next = (row[j + 1] + 1).min(row[j] + 1).min(prev_diag + cost);
            prev_diag = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b.len()] <= max
}
