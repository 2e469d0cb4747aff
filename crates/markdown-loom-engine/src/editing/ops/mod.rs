//! The editing operations, grouped by concern. Each one is a method on
//! [`Session`](super::session::Session) returning an [`Effect`](super::Effect)
//! or an [`EditError`](super::EditError).

mod code;
#[cfg(test)]
mod fixture;
mod indent;
mod keys;
mod merge;
mod range;
mod split;
mod table;
mod text;

pub use range::TextPoint;
