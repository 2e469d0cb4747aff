//! Block kinds that own their syntax: prefixes, fences, markers and the
//! small matchers the classifier calls. The classifier never hardcodes `>`
//! or a fence string itself.

pub mod block_quote;
pub mod code_fence;
pub mod footnote;
pub mod heading;
pub mod html_block;
pub mod list;
pub mod paragraph;
pub mod table;
pub mod thematic_break;

pub use block_quote::BlockQuote;
pub use code_fence::CodeFence;
pub use footnote::FootnoteDefinition;
pub use heading::Heading;
pub use html_block::HtmlBlock;
pub use list::{Bullet, ListMarker};
pub use paragraph::Paragraph;
pub use table::{CellSlice, Table};
pub use thematic_break::ThematicBreak;
