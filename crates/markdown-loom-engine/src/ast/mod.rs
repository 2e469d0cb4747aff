//! # Block Tree
//!
//! The document model: an arena of blocks keyed by [`NodeId`], each owning a
//! flat run of inlines.
//!
//! - **`node`**: block and inline kinds, spans and the owned `BlockNode` form
//! - **`tree`**: the `Ast` arena with its parent index and splice primitive
//! - **`query`**: read-only lookups (by id, by position, ownership)
//! - **`mutation`**: pure split / merge / cascade-remove primitives
//! - **`normalize`**: canonical text and spans from structure
//! - **`reconcile`**: id transfer from a previous tree to a re-parse

pub mod id;
pub mod mutation;
pub mod node;
pub mod normalize;
pub mod query;
pub mod reconcile;
pub mod tree;

pub use id::{IdGenerator, NodeId, SequentialIds, UuidIds};
pub use node::{
    Alignment, Block, BlockKind, BlockNode, BlockType, CodeBlockInfo, Inline, InlineKind, InlineText, ListInfo,
};
pub use normalize::normalize;
pub use tree::Ast;
