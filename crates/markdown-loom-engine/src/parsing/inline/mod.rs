//! # Inline Parsing
//!
//! Cursor-based inline parsing over the text of one leaf block.
//!
//! ## Modules
//!
//! - **`kinds`**: one type per construct, owning its delimiters and scanner
//! - **`cursor`**: `Cursor` for byte-by-byte scanning with offset tracking
//! - **`emphasis`**: the `*`/`_` delimiter stack and its resolution pass
//! - **`parser`**: `InlineParser`, which tries constructs in precedence order
//!
//! ## Precedence
//!
//! At each position: escape, backslash hard break, entity, code span,
//! autolink, raw HTML, image, link, footnote reference, strikethrough,
//! emphasis run, emoji. Code spans are raw zones, so `` `*a*` `` is a single
//! code span. Anything malformed is kept as text.

pub mod cursor;
pub mod emphasis;
pub mod kinds;
pub mod parser;

pub use parser::InlineParser;
