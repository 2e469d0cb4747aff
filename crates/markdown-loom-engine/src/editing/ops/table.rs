//! Table operations. Tables hold rows, rows hold cells (the first row holds
//! header cells), cells hold paragraphs.

use crate::ast::id::NodeId;
use crate::ast::mutation::{Split, split_block_pure};
use crate::ast::node::{Alignment, BlockKind, BlockNode};
use crate::ast::normalize::leaf_text;
use crate::parsing::rope::Span;

use crate::editing::effect::Effect;
use crate::editing::error::{EditError, EditResult, OrPrecondition};
use crate::editing::session::Session;

/// Where a new row goes relative to the one holding the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowSide {
    Above,
    Below,
}

impl Session<'_> {
    /// The table and row holding `cell`.
    fn cell_position(&self, cell: NodeId) -> EditResult<(NodeId, NodeId)> {
        if !self.kind(cell)?.is_table_cell() {
            return Err(EditError::Precondition("not a table cell"));
        }
        let row = self.parent(cell)?;
        let table = self.parent(row)?;
        Ok((table, row))
    }

    fn table_of(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ast.ancestors(id))
            .find(|a| matches!(self.ast.kind(*a), Some(BlockKind::Table { .. })))
    }

    fn new_cell(&mut self, header: bool) -> BlockNode {
        let kind = if header { BlockKind::TableHeader } else { BlockKind::TableCell };
        let id = self.fresh();
        let paragraph = self.empty_paragraph();
        BlockNode::new(id, kind, "", Span::default()).with_children(vec![paragraph])
    }

    /// True if every leaf under `id` has no text.
    fn is_blank(&self, id: NodeId) -> bool {
        self.ast
            .descendants(id)
            .into_iter()
            .filter_map(|d| self.ast.block(d))
            .filter(|b| b.kind.is_leaf())
            .all(|b| leaf_text(&b.inlines).is_empty())
    }

    /// Backspace at the start of a cell. The cell's first paragraph joins the
    /// previous cell's last one (across the row boundary from a row's first
    /// cell, which removes the row if that left it blank). A 1×1 table
    /// collapses into its content.
    pub fn merge_table_cell(&mut self, cell: NodeId) -> EditResult<Effect> {
        let (table, row) = self.cell_position(cell)?;
        let rows = self.ast.children(table).to_vec();
        let cells = self.ast.children(row).to_vec();
        let (r, c) = (self.index(row)?, self.index(cell)?);

        if rows.len() == 1 && cells.len() == 1 {
            let mut nodes = Vec::new();
            for child in self.ast.children(cell).to_vec() {
                nodes.push(self.ast.to_node(child).or_precondition("unknown block")?);
            }
            if nodes.is_empty() {
                nodes.push(self.empty_paragraph());
            }
            let ids = self.replace("collapse table", table, nodes)?;
            let caret = ids.first().and_then(|id| self.caret_start(*id));
            return Ok(Effect::new()
                .replaced(table, &ids)
                .removed([table])
                .with_caret(caret));
        }
        if r == 0 && c == 0 {
            return Err(EditError::Precondition("no cell before the first one"));
        }
        let prev_cell = if c > 0 {
            cells[c - 1]
        } else {
            self.ast.children(rows[r - 1]).last().copied().or_precondition("empty row")?
        };

        let source = self.ast.children(cell).first().copied().or_precondition("empty cell")?;
        let target = match self.ast.children(prev_cell).last().copied() {
            Some(t) => t,
            None => {
                let node = self.empty_paragraph();
                let id = node.id;
                self.ast.push_child(prev_cell, node).or_precondition("unknown block")?;
                id
            }
        };
        let target_block = self.block(target)?.clone();
        let left = leaf_text(&target_block.inlines);
        let right = self.block(source).map(|b| leaf_text(&b.inlines))?;
        let merged = self.commit_leaf_text(&target_block, format!("{left}{right}"), left.len())?;

        self.detach("merge cell", source)?;
        if self.ast.children(cell).is_empty() {
            let paragraph = self.empty_paragraph();
            self.ast.push_child(cell, paragraph).or_precondition("unknown block")?;
        }
        let mut effect = Effect::new().current(table, table).removed([source]);
        if c == 0 && self.is_blank(row) {
            self.detach("merge cell", row)?;
            effect = effect.removed([row]);
            if self.ast.children(table).is_empty() {
                self.detach("merge cell", table)?;
                effect = effect.removed([table]);
            }
        }
        Ok(effect.with_caret(merged.caret))
    }

    /// Adds an empty column right of `cell`'s column.
    pub fn add_table_column(&mut self, cell: NodeId) -> EditResult<Effect> {
        let (table, row) = self.cell_position(cell)?;
        let at = self.index(cell)? + 1;
        let mut caret_cell = None;
        for (i, r) in self.ast.children(table).to_vec().into_iter().enumerate() {
            let index = at.min(self.ast.children(r).len());
            let node = self.new_cell(i == 0);
            if r == row {
                caret_cell = Some(node.id);
            }
            self.insert_at("add column", r, index, vec![node])?;
        }
        if let Some(BlockKind::Table { alignments }) = self.ast.block_mut(table).map(|b| &mut b.kind) {
            let index = at.min(alignments.len());
            alignments.insert(index, Alignment::None);
        }
        let caret = caret_cell.and_then(|c| self.caret_start(c));
        Ok(Effect::new().current(table, table).with_caret(caret))
    }

    pub fn add_table_row(&mut self, cell: NodeId) -> EditResult<Effect> {
        self.add_row(cell, RowSide::Below)
    }

    /// Adds a row above `cell`'s row; the header row has nothing above it.
    pub fn add_table_row_above(&mut self, cell: NodeId) -> EditResult<Effect> {
        self.add_row(cell, RowSide::Above)
    }

    fn add_row(&mut self, cell: NodeId, side: RowSide) -> EditResult<Effect> {
        let (table, row) = self.cell_position(cell)?;
        let r = self.index(row)?;
        let index = match side {
            RowSide::Above if r == 0 => return Err(EditError::Precondition("cannot add a row above the header")),
            RowSide::Above => r,
            RowSide::Below => r + 1,
        };
        let width = self.ast.children(row).len();
        let cells: Vec<BlockNode> = (0..width).map(|_| self.new_cell(false)).collect();
        let id = self.fresh();
        let new_row = BlockNode::new(id, BlockKind::TableRow, "", Span::default()).with_children(cells);
        self.insert_at("add row", table, index, vec![new_row])?;
        let caret = self.caret_start(id);
        Ok(Effect::new().current(table, table).with_caret(caret))
    }

    /// Appends an empty paragraph to the cell and moves the caret there.
    pub fn split_table_cell(&mut self, cell: NodeId) -> EditResult<Effect> {
        let (table, _) = self.cell_position(cell)?;
        let paragraph = self.empty_paragraph();
        let id = paragraph.id;
        self.ast.push_child(cell, paragraph).or_precondition("unknown block")?;
        let caret = self.caret_start(id);
        Ok(Effect::new().current(table, table).with_caret(caret))
    }

    /// Splits the cell paragraph holding `inline` at `caret`; both halves
    /// stay in the cell.
    pub fn split_table_cell_at_caret(&mut self, inline: NodeId, caret: usize) -> EditResult<Effect> {
        let (block, _) = self.resolve(inline)?;
        let cell = self.cell_of(block.id).or_precondition("inline is not in a table cell")?;
        let (table, _) = self.cell_position(cell)?;
        let Split { left, right } =
            split_block_pure(&block, inline, caret, Some(BlockKind::Paragraph), self.reparse(), self.ids)
                .or_precondition("inline not in block")?;
        let right_id = right.id;
        self.replace("split cell", block.id, vec![left, right])?;
        let caret = self.caret_start(right_id);
        Ok(Effect::new().current(table, table).with_caret(caret))
    }

    /// Joins every paragraph of a cell into its first one, separated by a
    /// space.
    pub fn merge_blocks_in_cell(&mut self, cell: NodeId) -> EditResult<Effect> {
        let (table, _) = self.cell_position(cell)?;
        let children = self.ast.children(cell).to_vec();
        let [first, rest @ ..] = children.as_slice() else {
            return Err(EditError::Precondition("empty cell"));
        };
        if rest.is_empty() {
            return Err(EditError::Precondition("nothing to merge"));
        }
        let first_block = self.block(*first)?.clone();
        let parts: Vec<String> = children
            .iter()
            .filter_map(|c| self.ast.block(*c))
            .map(|b| leaf_text(&b.inlines))
            .filter(|t| !t.is_empty())
            .collect();
        let text = parts.join(" ");
        let caret = text.len();
        let merged = self.commit_leaf_text(&first_block, text, caret)?;
        for id in rest {
            self.detach("merge cell blocks", *id)?;
        }
        Ok(Effect::new()
            .current(table, table)
            .removed(rest.iter().copied())
            .with_caret(merged.caret))
    }

    pub fn insert_paragraph_above_table(&mut self, id: NodeId) -> EditResult<Effect> {
        self.paragraph_beside_table(id, RowSide::Above)
    }

    pub fn insert_paragraph_below_table(&mut self, id: NodeId) -> EditResult<Effect> {
        self.paragraph_beside_table(id, RowSide::Below)
    }

    /// Inserts an empty paragraph next to the table holding `id`.
    fn paragraph_beside_table(&mut self, id: NodeId, side: RowSide) -> EditResult<Effect> {
        let table = self.table_of(id).or_precondition("not inside a table")?;
        let parent = self.parent(table)?;
        let index = self.index(table)? + usize::from(side == RowSide::Below);
        let paragraph = self.empty_paragraph();
        let pid = paragraph.id;
        self.insert_at("paragraph beside table", parent, index, vec![paragraph])?;
        let caret = self.caret_start(pid);
        let effect = match side {
            RowSide::Above => Effect::new().previous(table, pid),
            RowSide::Below => Effect::new().next(table, pid),
        };
        Ok(effect.with_caret(caret))
    }
}
