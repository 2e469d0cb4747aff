/*!
 * # Editing
 *
 * Structural edits over the block tree. The tree is the source of truth;
 * the text is derived from it by the normalizer after every edit.
 *
 * ## Model
 *
 * - Every edit names the inline or block it acts on by [`NodeId`] and a
 *   byte offset, never by document position
 * - An edit either commits in full or leaves the document untouched
 * - Nodes that survive an edit keep their ids, so hosts can patch their view
 *   from the returned [`Effect`]
 *
 * ## Module Structure
 *
 * - **`editor`**: [`Editor`], the transactional facade hosts talk to
 * - **`session`**: the mutable view of one document an operation runs on
 * - **`ops`**: the operations themselves (typing, split, merge, indent,
 *   tables, code blocks, range paste/delete, Enter and Backspace)
 * - **`effect`**: render ops and caret placement returned to the host
 * - **`error`**: precondition versus invariant failures
 *
 * ## Usage Pattern
 *
 * ```rust
 * use markdown_loom_engine::editing::{Editor, Placement};
 * use markdown_loom_engine::ast::query::flatten_leaves;
 *
 * let mut editor = Editor::new("- first");
 * let leaf = flatten_leaves(editor.ast())[0];
 * let inline = editor.ast().block(leaf).unwrap().inlines[0].id;
 *
 * // Enter at the end of a list item opens a sibling item.
 * let effect = editor.enter(inline, 5).unwrap();
 * assert_eq!(editor.text(), "- first\n- ");
 * assert!(effect.render.ops.iter().any(|op| op.placement == Placement::Next));
 * assert!(effect.caret.is_some());
 * ```
 *
 * [`NodeId`]: crate::ast::NodeId
 */

pub mod editor;
pub mod effect;
pub mod error;
mod ops;
pub(crate) mod session;

pub use editor::{Editor, Snapshot};
pub use effect::{Affinity, Caret, Effect, Placement, RenderOp, RenderPatch};
pub use error::{EditError, EditResult};
pub use ops::TextPoint;
