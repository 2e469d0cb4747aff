//! # Block Parsing
//!
//! Line-oriented block parsing in three passes.
//!
//! ## Parsing Phases
//!
//! 1. **Line Classification** (`classify`): each line is classified into a
//!    `LineClass` from local facts, in a fixed detection order.
//!
//! 2. **Block Construction** (`builder`): a `BlockParser` turns lines into
//!    `BlockNode`s, carrying state only for open fences, tables and quotes.
//!
//! 3. **Coalescing** (`merge`): consecutive list, quote and indented-code
//!    blocks are joined, and list items nest by indentation.
//!
//! Leaf inline runs are attached afterwards by `leaf::attach_inlines`.
//!
//! ## Key Invariants
//!
//! - Fenced code blocks are raw zones: no block or inline parsing inside
//! - Every line of input maps to some block, blank lines to empty paragraphs
//! - All block nodes carry absolute byte spans into the source

pub mod builder;
pub mod classify;
pub mod kinds;
pub mod leaf;
pub mod merge;

pub use builder::BlockParser;
pub use classify::{LineClass, LineContext, MarkdownLineClassifier, detect_block_type};
pub use leaf::{InlineContext, attach_inlines, leaf_inlines};
pub use merge::merge_blocks;
