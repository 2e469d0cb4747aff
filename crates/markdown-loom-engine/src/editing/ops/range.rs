//! Edits spanning several leaves: multi-block paste and delete.

use serde::Serialize;

use crate::ast::id::NodeId;
use crate::ast::node::{Block, BlockKind, Inline};
use crate::ast::query::{flatten_leaves, precedes};
use crate::parsing::rope::floor_char_boundary;

use crate::editing::effect::Effect;
use crate::editing::error::{EditError, EditResult};
use crate::editing::session::{Session, local_offset};

/// A caret position: `offset` bytes into inline `inline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextPoint {
    pub inline: NodeId,
    pub offset: usize,
}

impl TextPoint {
    pub fn new(inline: NodeId, offset: usize) -> Self {
        Self { inline, offset }
    }
}

/// Byte offset into `block.text` of `offset` bytes into `inline`.
fn text_offset(block: &Block, inline: &Inline, offset: usize) -> usize {
    floor_char_boundary(&block.text, local_offset(inline, offset).min(block.text.len()))
}

impl Session<'_> {
    /// Replaces everything from `start` to `end` with `text`. The points may
    /// be in either order and in different blocks; every leaf after the
    /// start block up to the end block goes away, each from its own
    /// container, and the start block is parsed again from the joined text.
    pub fn paste_multi_block(&mut self, start: TextPoint, end: TextPoint, text: &str) -> EditResult<Effect> {
        let (sb, si) = self.resolve(start.inline)?;
        let (eb, ei) = self.resolve(end.inline)?;
        let s_off = text_offset(&sb, &si, start.offset);
        let e_off = text_offset(&eb, &ei, end.offset);
        let forward = if sb.id == eb.id { s_off <= e_off } else { precedes(self.ast, sb.id, eb.id) };
        let ((sb, s_off), (eb, e_off)) = if forward {
            ((sb, s_off), (eb, e_off))
        } else {
            ((eb, e_off), (sb, s_off))
        };

        let joined = format!("{}{text}{}", &sb.text[..s_off], &eb.text[e_off..]);
        let caret = s_off + text.len();

        let leaves = flatten_leaves(self.ast);
        let first = leaves.iter().position(|l| *l == sb.id);
        let last = leaves.iter().position(|l| *l == eb.id);
        let interior = match (first, last) {
            (Some(f), Some(l)) if f <= l => leaves[f + 1..=l].to_vec(),
            _ => return Err(EditError::Precondition("range endpoints are not leaves")),
        };
        let mut removed = Vec::new();
        for leaf in interior {
            if self.ast.contains(leaf) {
                removed.extend(self.remove_leaf(leaf)?);
            }
        }

        let effect = self.replace_leaf_text(&sb, &joined, caret)?;
        Ok(effect.removed(removed))
    }

    /// `paste_multi_block` with nothing pasted.
    pub fn delete_multi_block(&mut self, start: TextPoint, end: TextPoint) -> EditResult<Effect> {
        self.paste_multi_block(start, end, "")
    }

    /// Gives leaf `block` the serialized text `text`. Single-line text in a
    /// prose block goes through the ordinary typing path; anything else is
    /// parsed as a fragment in the block's place (inside a table cell, one
    /// paragraph per line).
    fn replace_leaf_text(&mut self, block: &Block, text: &str, caret: usize) -> EditResult<Effect> {
        let code = matches!(block.kind, BlockKind::CodeBlock(_));
        if !code && !text.contains('\n') {
            return self.commit_leaf_text(block, text.to_string(), caret);
        }
        let mut nodes = if self.cell_of(block.id).is_some() {
            text.split('\n').map(|line| self.leaf(BlockKind::Paragraph, line)).collect()
        } else {
            self.fragment(text, block.span.start)
        };
        self.adopt(block.id, &mut nodes);
        let ids = self.replace("paste", block.id, nodes)?;
        let caret = if ids.first().is_some_and(|id| self.cell_of(*id).is_some()) {
            self.caret_end(*ids.last().unwrap_or(&block.id))
        } else {
            self.caret_in(&ids, block.span.start + caret)
        };
        let mut effect = Effect::new().replaced(block.id, &ids);
        if !ids.contains(&block.id) {
            effect = effect.removed([block.id]);
        }
        Ok(effect.with_caret(caret))
    }
}
