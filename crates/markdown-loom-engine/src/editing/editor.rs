use relative_path::RelativePath;
use std::path::Path;
use tracing::{debug, warn};
use xi_rope::Rope;

use crate::ast::id::{IdGenerator, NodeId, UuidIds};
use crate::ast::normalize::normalize;
use crate::ast::query::get_inline_by_id;
use crate::ast::reconcile::reconcile_document;
use crate::ast::Ast;
use crate::io::{IoError, write_document};
use crate::options::EngineOptions;
use crate::parsing::link_refs::LinkRefs;
use crate::parsing::parse_document;
use crate::parsing::rope::slice_to_string;

use super::effect::Effect;
use super::error::{EditError, EditResult};
use super::ops::TextPoint;
use super::session::Session;

/// A saved editor state, for an external undo stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    ast: Ast,
    refs: LinkRefs,
    version: u64,
}

impl Snapshot {
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// One open document: its block tree and everything needed to edit it.
///
/// ## Transactions
///
/// Every operation runs against a session over the live tree, with the
/// tree cloned first. On success the tree is normalized (canonical text and
/// spans), link references are rescanned, the text buffer is refreshed and
/// the version goes up by one. On failure the clone is put back and the
/// operation returns `None`, leaving the editor exactly as it was:
///
/// - a **precondition** failure (unknown id, nothing to merge with, ...) is
///   an ordinary no-op and is logged at `debug`
/// - an **invariant** failure means the tree was about to be corrupted and
///   is logged at `warn`
///
/// ## Identity
///
/// Operations keep block and inline ids wherever the node survives, so a
/// host can patch its view from the returned [`Effect`] instead of
/// re-rendering. [`Editor::set_text`] re-parses from scratch and carries ids
/// over by reconciliation.
///
/// ## Usage
///
/// ```rust
/// use markdown_loom_engine::Editor;
/// use markdown_loom_engine::ast::query::flatten_leaves;
///
/// let mut editor = Editor::new("Title");
/// let leaf = flatten_leaves(editor.ast())[0];
/// let inline = editor.ast().block(leaf).unwrap().inlines[0].id;
///
/// // Typing "# " in front of a paragraph turns it into a heading.
/// let effect = editor.insert_text(inline, 0, "# ").unwrap();
/// assert_eq!(editor.text(), "# Title");
/// assert_eq!(effect.version, editor.version());
/// ```
pub struct Editor {
    ast: Ast,
    refs: LinkRefs,
    options: EngineOptions,
    ids: Box<dyn IdGenerator>,
    /// Bumped on every successful edit.
    version: u64,
    /// Canonical text of `ast`, refreshed after every edit.
    buffer: Rope,
}

impl Editor {
    /// Parses `source` with default options and random ids.
    pub fn new(source: &str) -> Self {
        Self::with_options(source, EngineOptions::default(), Box::new(UuidIds))
    }

    pub fn with_options(source: &str, options: EngineOptions, mut ids: Box<dyn IdGenerator>) -> Self {
        let parsed = parse_document(source, &options.parse, ids.as_mut());
        let mut ast = parsed.ast;
        let text = normalize(&mut ast, &options.parse);
        debug!(blocks = ast.len(), bytes = text.len(), "opened document");
        Self {
            ast,
            refs: LinkRefs::scan(&text),
            options,
            ids,
            version: 0,
            buffer: Rope::from(text.as_str()),
        }
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// The canonical document text.
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn rope(&self) -> &Rope {
        &self.buffer
    }

    /// The canonical source of one block, containers included.
    pub fn block_source(&self, id: NodeId) -> Option<String> {
        let block = self.ast.block(id)?;
        Some(slice_to_string(&self.buffer, block.span))
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn refs(&self) -> &LinkRefs {
        &self.refs
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Writes the canonical text to `path` under `root`.
    pub fn save_to(&self, root: &Path, path: &RelativePath) -> Result<(), IoError> {
        write_document(path, root, &self.text())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            ast: self.ast.clone(),
            refs: self.refs.clone(),
            version: self.version,
        }
    }

    /// Puts a snapshot back. The version moves forward, not back, so hosts
    /// keyed on it still see a change.
    pub fn restore(&mut self, snapshot: Snapshot) -> Effect {
        let gone = self.vanished(&snapshot.ast);
        self.ast = snapshot.ast;
        self.refs = snapshot.refs;
        self.commit();
        let root = self.ast.root();
        Effect {
            version: self.version,
            ..Effect::new().current(root, root).removed(gone)
        }
    }

    /// Replaces the whole text. The new tree takes over ids from the old one
    /// wherever blocks and inlines still match.
    pub fn set_text(&mut self, source: &str) -> Effect {
        let parsed = parse_document(source, &self.options.parse, self.ids.as_mut());
        let next = reconcile_document(&self.ast, parsed.ast, &self.options.reconcile);
        let gone = self.vanished(&next);
        self.ast = next;
        self.commit();
        let root = self.ast.root();
        Effect {
            version: self.version,
            ..Effect::new().current(root, root).removed(gone)
        }
    }

    /// Ids of the current tree missing from `next`.
    fn vanished(&self, next: &Ast) -> Vec<NodeId> {
        self.ast
            .descendants(self.ast.root())
            .into_iter()
            .filter(|id| !next.contains(*id))
            .collect()
    }

    fn commit(&mut self) {
        let text = normalize(&mut self.ast, &self.options.parse);
        self.refs = LinkRefs::scan(&text);
        self.buffer = Rope::from(text.as_str());
        self.version += 1;
    }

    fn run(&mut self, op: &'static str, edit: impl FnOnce(&mut Session<'_>) -> EditResult<Effect>) -> Option<Effect> {
        let before = self.ast.clone();
        let result = edit(&mut Session {
            ast: &mut self.ast,
            refs: &self.refs,
            options: &self.options,
            ids: self.ids.as_mut(),
        });
        let mut effect = match result {
            Ok(effect) => effect,
            Err(EditError::Precondition(why)) => {
                self.ast = before;
                debug!(op, why, "edit not applicable");
                return None;
            }
            Err(EditError::Invariant(what)) => {
                self.ast = before;
                warn!(op, %what, "edit abandoned");
                return None;
            }
        };

        self.commit();
        effect.version = self.version;
        effect.render.removed.retain(|id| !self.ast.contains(*id));
        if let Some(caret) = effect.caret
            && get_inline_by_id(&self.ast, caret.inline).is_none()
        {
            warn!(op, inline = %caret.inline, "caret target missing after edit");
            effect.caret = None;
        }
        debug!(
            op,
            version = self.version,
            ops = effect.render.ops.len(),
            removed = effect.render.removed.len(),
            "edit applied"
        );
        Some(effect)
    }

    pub fn input(&mut self, inline: NodeId, symbolic: &str, caret: usize) -> Option<Effect> {
        self.run("input", |s| s.input(inline, symbolic, caret))
    }

    pub fn insert_text(&mut self, inline: NodeId, at: usize, text: &str) -> Option<Effect> {
        self.run("insert_text", |s| s.insert_text(inline, at, text))
    }

    pub fn transform_block(&mut self, block: NodeId, text: &str, caret: usize) -> Option<Effect> {
        self.run("transform_block", |s| s.transform_block(block, text, caret))
    }

    pub fn enter(&mut self, inline: NodeId, caret: usize) -> Option<Effect> {
        self.run("enter", |s| s.enter(inline, caret))
    }

    pub fn backspace(&mut self, inline: NodeId) -> Option<Effect> {
        self.run("backspace", |s| s.backspace(inline))
    }

    pub fn split(&mut self, inline: NodeId, caret: usize) -> Option<Effect> {
        self.run("split", |s| s.split(inline, caret))
    }

    pub fn split_list_item(&mut self, inline: NodeId, caret: usize) -> Option<Effect> {
        self.run("split_list_item", |s| s.split_list_item(inline, caret))
    }

    pub fn split_task_list_item(&mut self, inline: NodeId, caret: usize) -> Option<Effect> {
        self.run("split_task_list_item", |s| s.split_task_list_item(inline, caret))
    }

    pub fn split_block_quote(&mut self, quote: NodeId, inline: Option<NodeId>, caret: usize) -> Option<Effect> {
        self.run("split_block_quote", |s| s.split_block_quote(quote, inline, caret))
    }

    pub fn merge_inline(&mut self, a: NodeId, b: NodeId) -> Option<Effect> {
        self.run("merge_inline", |s| s.merge_inline(a, b))
    }

    pub fn indent_list_item(&mut self, item: NodeId, caret: usize) -> Option<Effect> {
        self.run("indent_list_item", |s| s.indent_list_item(item, caret))
    }

    pub fn indent_task_list_item(&mut self, item: NodeId, caret: usize) -> Option<Effect> {
        self.run("indent_task_list_item", |s| s.indent_task_list_item(item, caret))
    }

    pub fn outdent_list_item(&mut self, item: NodeId, caret: usize) -> Option<Effect> {
        self.run("outdent_list_item", |s| s.outdent_list_item(item, caret))
    }

    pub fn outdent_task_list_item(&mut self, item: NodeId, caret: usize) -> Option<Effect> {
        self.run("outdent_task_list_item", |s| s.outdent_task_list_item(item, caret))
    }

    pub fn indent_block_quote(&mut self, child: NodeId, caret: usize) -> Option<Effect> {
        self.run("indent_block_quote", |s| s.indent_block_quote(child, caret))
    }

    pub fn outdent_block_quote(&mut self, child: NodeId, caret: usize) -> Option<Effect> {
        self.run("outdent_block_quote", |s| s.outdent_block_quote(child, caret))
    }

    pub fn toggle_task(&mut self, item: NodeId) -> Option<Effect> {
        self.run("toggle_task", |s| s.toggle_task(item))
    }

    pub fn merge_table_cell(&mut self, cell: NodeId) -> Option<Effect> {
        self.run("merge_table_cell", |s| s.merge_table_cell(cell))
    }

    pub fn add_table_column(&mut self, cell: NodeId) -> Option<Effect> {
        self.run("add_table_column", |s| s.add_table_column(cell))
    }

    pub fn add_table_row(&mut self, cell: NodeId) -> Option<Effect> {
        self.run("add_table_row", |s| s.add_table_row(cell))
    }

    pub fn add_table_row_above(&mut self, cell: NodeId) -> Option<Effect> {
        self.run("add_table_row_above", |s| s.add_table_row_above(cell))
    }

    pub fn split_table_cell(&mut self, cell: NodeId) -> Option<Effect> {
        self.run("split_table_cell", |s| s.split_table_cell(cell))
    }

    pub fn split_table_cell_at_caret(&mut self, inline: NodeId, caret: usize) -> Option<Effect> {
        self.run("split_table_cell_at_caret", |s| s.split_table_cell_at_caret(inline, caret))
    }

    pub fn merge_blocks_in_cell(&mut self, cell: NodeId) -> Option<Effect> {
        self.run("merge_blocks_in_cell", |s| s.merge_blocks_in_cell(cell))
    }

    pub fn merge_inline_in_cell(&mut self, a: NodeId, b: NodeId) -> Option<Effect> {
        self.run("merge_inline_in_cell", |s| s.merge_inline_in_cell(a, b))
    }

    pub fn insert_paragraph_above_table(&mut self, id: NodeId) -> Option<Effect> {
        self.run("insert_paragraph_above_table", |s| s.insert_paragraph_above_table(id))
    }

    pub fn insert_paragraph_below_table(&mut self, id: NodeId) -> Option<Effect> {
        self.run("insert_paragraph_below_table", |s| s.insert_paragraph_below_table(id))
    }

    pub fn paste_multi_block(&mut self, start: TextPoint, end: TextPoint, text: &str) -> Option<Effect> {
        self.run("paste_multi_block", |s| s.paste_multi_block(start, end, text))
    }

    pub fn delete_multi_block(&mut self, start: TextPoint, end: TextPoint) -> Option<Effect> {
        self.run("delete_multi_block", |s| s.delete_multi_block(start, end))
    }

    pub fn input_code_block(&mut self, inline: NodeId, symbolic: &str, caret: usize) -> Option<Effect> {
        self.run("input_code_block", |s| s.input_code_block(inline, symbolic, caret))
    }

    pub fn split_code_block(&mut self, inline: NodeId, caret: usize) -> Option<Effect> {
        self.run("split_code_block", |s| s.split_code_block(inline, caret))
    }

    pub fn merge_code_block_content(&mut self, inline: NodeId) -> Option<Effect> {
        self.run("merge_code_block_content", |s| s.merge_code_block_content(inline))
    }

    pub fn split_code_block_from_marker(&mut self, inline: NodeId, caret: usize) -> Option<Effect> {
        self.run("split_code_block_from_marker", |s| s.split_code_block_from_marker(inline, caret))
    }

    pub fn exit_code_block(&mut self, block: NodeId) -> Option<Effect> {
        self.run("exit_code_block", |s| s.exit_code_block(block))
    }

    pub fn unwrap_code_block(&mut self, block: NodeId) -> Option<Effect> {
        self.run("unwrap_code_block", |s| s.unwrap_code_block(block))
    }

    pub fn set_code_block_language(&mut self, block: NodeId, language: &str) -> Option<Effect> {
        self.run("set_code_block_language", |s| s.set_code_block_language(block, language))
    }

    pub fn sync_code_block_from_marker(&mut self, block: NodeId) -> Option<Effect> {
        self.run("sync_code_block_from_marker", |s| s.sync_code_block_from_marker(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::id::SequentialIds;
    use crate::ast::node::{BlockKind, Inline};
    use crate::ast::query::{flatten_leaves, get_first_inline};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn editor(src: &str) -> Editor {
        Editor::with_options(src, EngineOptions::default(), Box::new(SequentialIds::new()))
    }

    fn leaf(editor: &Editor, n: usize) -> NodeId {
        flatten_leaves(editor.ast())[n]
    }

    fn first_inline(editor: &Editor, n: usize) -> Inline {
        get_first_inline(editor.ast().block(leaf(editor, n)).unwrap()).unwrap().clone()
    }

    #[test]
    fn typing_hash_space_promotes_heading() {
        let mut ed = editor("Title");
        let inline = first_inline(&ed, 0);
        let effect = ed.input(inline.id, "# Title", 2).unwrap();
        assert_eq!(ed.text(), "# Title");
        assert_eq!(ed.ast().kind(leaf(&ed, 0)), Some(&BlockKind::Heading { level: 1 }));
        assert_eq!(effect.caret.map(|c| c.offset), Some(0));
        assert_eq!(ed.version(), 1);
    }

    #[test]
    fn typing_checkbox_promotes_task_item() {
        let mut ed = editor("- a");
        let inline = first_inline(&ed, 0);
        ed.input(inline.id, "[ ] a", 4).unwrap();
        assert_eq!(ed.text(), "- [ ] a");
        let item = ed.ast().parent_of(leaf(&ed, 0)).unwrap();
        assert_eq!(ed.ast().kind(item), Some(&BlockKind::TaskListItem { checked: false }));
    }

    #[test]
    fn plain_typing_keeps_ids() {
        let mut ed = editor("hello");
        let id = leaf(&ed, 0);
        let inline = first_inline(&ed, 0);
        ed.insert_text(inline.id, 5, " world").unwrap();
        assert_eq!(ed.text(), "hello world");
        assert_eq!(leaf(&ed, 0), id);
        assert_eq!(first_inline(&ed, 0).id, inline.id);
    }

    #[test]
    fn failed_edit_changes_nothing() {
        let mut ed = editor("- a\n- b");
        let before = ed.snapshot();
        let first_item = ed.ast().parent_of(leaf(&ed, 0)).unwrap();
        assert!(ed.indent_list_item(first_item, 0).is_none());
        assert!(ed.merge_inline(NodeId(9999), NodeId(9998)).is_none());
        assert_eq!(ed.version(), 0);
        assert_eq!(ed.ast(), &before.ast);
    }

    #[test]
    fn indent_gives_item_fresh_id() {
        let mut ed = editor("- a\n- b");
        let second = ed.ast().parent_of(leaf(&ed, 1)).unwrap();
        let effect = ed.indent_list_item(second, 0).unwrap();
        assert_eq!(ed.text(), "- a\n  - b");
        assert!(!ed.ast().contains(second));
        assert!(effect.render.removed.contains(&second));
        assert!(effect.caret.is_some());
    }

    #[test]
    fn toggle_task_keeps_id() {
        let mut ed = editor("- [ ] todo");
        let item = ed.ast().parent_of(leaf(&ed, 0)).unwrap();
        ed.toggle_task(item).unwrap();
        assert_eq!(ed.text(), "- [x] todo");
        assert!(ed.ast().contains(item));
    }

    #[test]
    fn set_text_reconciles_ids() {
        let mut ed = editor("# Title\n\nbody text");
        let heading = leaf(&ed, 0);
        let effect = ed.set_text("# Title\n\nbody text, edited");
        assert_eq!(leaf(&ed, 0), heading);
        assert_eq!(effect.version, 1);
        assert_eq!(ed.text(), "# Title\n\nbody text, edited");
    }

    #[test]
    fn set_text_with_same_text_keeps_code_blocks() {
        let mut ed = editor("intro\n\n```rust\nlet x = 1;\n```\n\n    a\n    b\n    c\n\n> ```\n> q\n> ```");
        let before = ed.ast().descendants(ed.ast().root());
        let effect = ed.set_text(&ed.text());
        assert!(effect.render.removed.is_empty(), "removed {:?}", effect.render.removed);
        assert_eq!(ed.ast().descendants(ed.ast().root()), before);
    }

    #[test]
    fn restore_brings_back_text() {
        let mut ed = editor("one");
        let snap = ed.snapshot();
        let inline = first_inline(&ed, 0);
        ed.insert_text(inline.id, 3, " two").unwrap();
        ed.restore(snap);
        assert_eq!(ed.text(), "one");
        assert_eq!(ed.version(), 2);
    }

    #[test]
    fn block_source_reads_canonical_text() {
        let ed = editor("# T\n- a\n- b");
        let list = ed.ast().parent_of(ed.ast().parent_of(leaf(&ed, 1)).unwrap()).unwrap();
        assert_eq!(ed.block_source(list).as_deref(), Some("- a\n- b"));
        assert_eq!(ed.block_source(leaf(&ed, 0)).as_deref(), Some("# T"));
        assert_eq!(ed.block_source(NodeId(9999)), None);
    }

    #[test]
    fn save_writes_canonical_text() {
        let dir = TempDir::new().unwrap();
        let ed = editor("3. a\n3. b");
        ed.save_to(dir.path(), RelativePath::new("list.md")).unwrap();
        let saved = std::fs::read_to_string(dir.path().join("list.md")).unwrap();
        assert_eq!(saved, "3. a\n4. b");
    }
}
