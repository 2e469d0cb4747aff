use serde::{Deserialize, Serialize};

/// A byte range `[start, end)`.
///
/// Block spans are absolute offsets into the document text; inline spans are
/// local to the text of the block that owns them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A span of `len` bytes starting at `start`.
    pub fn at(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// Returns the length in bytes. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty (start >= end).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// True if `offset` lies inside the span, counting the end position as inside.
    #[must_use]
    pub fn touches(self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Moves the span by `delta` bytes.
    #[must_use]
    pub fn shifted(self, delta: usize) -> Self {
        Self {
            start: self.start + delta,
            end: self.end + delta,
        }
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn cover(self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_and_empty() {
        assert_eq!(Span::new(2, 7).len(), 5);
        assert!(Span::new(4, 4).is_empty());
        assert_eq!(Span::new(7, 2).len(), 0);
    }

    #[test]
    fn touches_includes_end() {
        let sp = Span::new(3, 6);
        assert!(sp.touches(3));
        assert!(sp.touches(6));
        assert!(!sp.touches(7));
    }

    #[test]
    fn cover_and_shift() {
        assert_eq!(Span::new(1, 3).cover(Span::new(5, 9)), Span::new(1, 9));
        assert_eq!(Span::new(1, 3).shifted(10), Span::new(11, 13));
    }
}
