use serde::Serialize;

use crate::ast::NodeId;

/// Where a rendered block goes relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Placement {
    /// Replace the anchor.
    Current,
    /// Insert before the anchor.
    Previous,
    /// Insert after the anchor.
    Next,
}

/// One render instruction: put `block` at `placement` relative to `anchor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderOp {
    pub placement: Placement,
    pub anchor: NodeId,
    pub block: NodeId,
}

/// Ordered render instructions plus the blocks the host should drop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderPatch {
    pub ops: Vec<RenderOp>,
    pub removed: Vec<NodeId>,
}

/// Which side of a boundary the caret sticks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Affinity {
    #[default]
    Start,
    End,
}

/// Where to focus next: an inline id and a byte offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caret {
    pub inline: NodeId,
    pub offset: usize,
    pub affinity: Affinity,
}

impl Caret {
    pub fn new(inline: NodeId, offset: usize) -> Self {
        Self {
            inline,
            offset,
            affinity: Affinity::Start,
        }
    }

    pub fn at_end(inline: NodeId, offset: usize) -> Self {
        Self {
            inline,
            offset,
            affinity: Affinity::End,
        }
    }
}

/// Result of a successful edit: what to re-render and where the caret goes.
///
/// `version` is the editor version after the edit; it is filled in by the
/// editor once the operation commits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Effect {
    pub render: RenderPatch,
    pub caret: Option<Caret>,
    pub version: u64,
}

impl Effect {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, placement: Placement, anchor: NodeId, block: NodeId) -> Self {
        self.render.ops.push(RenderOp {
            placement,
            anchor,
            block,
        });
        self
    }

    pub fn current(self, anchor: NodeId, block: NodeId) -> Self {
        self.push(Placement::Current, anchor, block)
    }

    pub fn previous(self, anchor: NodeId, block: NodeId) -> Self {
        self.push(Placement::Previous, anchor, block)
    }

    pub fn next(self, anchor: NodeId, block: NodeId) -> Self {
        self.push(Placement::Next, anchor, block)
    }

    /// Replaces `anchor` with `blocks` in order. An empty list is a removal.
    pub fn replaced(self, anchor: NodeId, blocks: &[NodeId]) -> Self {
        let Some((first, rest)) = blocks.split_first() else {
            return self.removed([anchor]);
        };
        let mut effect = self.current(anchor, *first);
        let mut prev = *first;
        for block in rest {
            effect = effect.next(prev, *block);
            prev = *block;
        }
        effect
    }

    pub fn removed(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        for id in ids {
            if !self.render.removed.contains(&id) {
                self.render.removed.push(id);
            }
        }
        self
    }

    pub fn with_caret(mut self, caret: Option<Caret>) -> Self {
        self.caret = caret;
        self
    }
}
