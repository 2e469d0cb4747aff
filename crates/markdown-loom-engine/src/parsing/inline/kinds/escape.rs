/// Backslash escapes and the backslash hard break.
pub struct Escape;

impl Escape {
    pub const BACKSLASH: u8 = b'\\';

    /// ASCII punctuation may be escaped.
    pub fn is_escapable(b: u8) -> bool {
        b.is_ascii_punctuation()
    }
}
