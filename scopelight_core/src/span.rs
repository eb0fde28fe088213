//! Byte-offset spans into a source buffer.

use std::fmt;

/// A half-open byte range `[start, end)` in a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    /// Start offset (inclusive).
    pub start: u32,
    /// End offset (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a span from two offsets.
    #[inline]
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A zero-width span at offset 0, for synthesized nodes.
    #[inline]
    #[must_use]
    pub const fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// A zero-width span at `offset`.
    #[inline]
    #[must_use]
    pub const fn at(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `offset` lies inside the span.
    #[inline]
    #[must_use]
    pub const fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    #[must_use]
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Move the span by `delta` bytes.
    #[inline]
    #[must_use]
    pub const fn shifted(self, delta: u32) -> Span {
        Span::new(self.start + delta, self.end + delta)
    }

    /// Borrow the spanned text out of `source`.
    #[must_use]
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        source
            .get(self.start as usize..self.end as usize)
            .unwrap_or_default()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len_and_empty() {
        assert_eq!(Span::new(3, 7).len(), 4);
        assert!(Span::at(5).is_empty());
        assert!(!Span::new(0, 1).is_empty());
    }

    #[test]
    fn test_span_contains_is_half_open() {
        let span = Span::new(2, 4);
        assert!(!span.contains(1));
        assert!(span.contains(2));
        assert!(span.contains(3));
        assert!(!span.contains(4));
    }

    #[test]
    fn test_span_to_covers_both() {
        assert_eq!(Span::new(4, 6).to(Span::new(1, 2)), Span::new(1, 6));
    }

    #[test]
    fn test_span_slice() {
        let src = "def foo(): pass";
        assert_eq!(Span::new(4, 7).slice(src), "foo");
        assert_eq!(Span::new(40, 50).slice(src), "");
    }

    #[test]
    fn test_span_shifted() {
        assert_eq!(Span::new(1, 3).shifted(10), Span::new(11, 13));
    }
}
