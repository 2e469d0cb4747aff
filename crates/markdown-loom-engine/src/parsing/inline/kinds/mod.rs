//! # Inline Kinds
//!
//! Inline-specific types that own their syntax delimiters. The parser asks
//! these types whether a construct starts at the cursor; it never hardcodes
//! `` ` `` or `[^` itself.

pub mod autolink;
pub mod code_span;
pub mod emoji;
pub mod entity;
pub mod escape;
pub mod footnote;
pub mod link;
pub mod raw_html;
pub mod strikethrough;

pub use autolink::Autolink;
pub use code_span::CodeSpan;
pub use emoji::Emoji;
pub use entity::Entity;
pub use escape::Escape;
pub use footnote::FootnoteRef;
pub use link::Link;
pub use raw_html::RawHtml;
pub use strikethrough::Strikethrough;
