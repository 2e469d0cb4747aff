pub mod ast;
pub mod editing;
pub mod io;
pub mod options;
pub mod parsing;

// Re-export key types for easier usage
pub use ast::{Ast, Block, BlockKind, Inline, InlineKind, NodeId};
pub use editing::{Caret, EditError, Editor, Effect, Placement, RenderOp, RenderPatch, TextPoint};
pub use io::{IoError, read_document, write_document};
pub use options::{EngineOptions, ParseOptions, ReconcileOptions};
pub use parsing::{ParsedDocument, parse_document};
