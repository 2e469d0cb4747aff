pub mod lines;
pub mod slice;
pub mod span;

pub use lines::{LineRef, lines_with_spans, sanitize};
pub use slice::{floor_char_boundary, preview, slice_to_string};
pub use span::Span;
