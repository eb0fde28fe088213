//! Line/column positions and the offset table used to compute them.
//!
//! Lines are 1-indexed; columns are 0-indexed byte offsets from the start of
//! the line, which is what editors expect for highlight ranges.

use crate::span::Span;
use std::fmt;

// =============================================================================
// Position
// =============================================================================

/// A resolved source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 0-indexed byte column.
    pub column: u32,
}

impl Position {
    /// Create a position.
    #[inline]
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Resolve `offset` without a prebuilt index. Linear in `offset`.
    #[must_use]
    pub fn of_offset(source: &str, offset: u32) -> Self {
        let offset = (offset as usize).min(source.len());
        let before = &source.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() as u32 + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |nl| nl + 1);
        Self::new(line, (offset - line_start) as u32)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// =============================================================================
// Line Index
// =============================================================================

/// Pre-computed line start table for O(log n) offset-to-position lookup.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    /// Byte offsets of each line start (always starts with 0).
    line_starts: Vec<u32>,
    /// Total source length.
    len: u32,
}

impl LineIndex {
    /// Build the table in one pass over `source`.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i as u32 + 1),
        );
        Self {
            line_starts,
            len: source.len() as u32,
        }
    }

    /// Resolve a byte offset.
    #[must_use]
    pub fn position(&self, offset: u32) -> Position {
        let offset = offset.min(self.len);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        Position::new(line_idx as u32 + 1, offset - self.line_starts[line_idx])
    }

    /// Resolve both ends of a span.
    #[must_use]
    pub fn range(&self, span: Span) -> (Position, Position) {
        (self.position(span.start), self.position(span.end))
    }

    /// Byte offset of a position, if the line exists.
    #[must_use]
    pub fn offset(&self, position: Position) -> Option<u32> {
        let start = *self.line_starts.get(position.line.checked_sub(1)? as usize)?;
        Some((start + position.column).min(self.len))
    }

    /// Byte offset where a 1-indexed line starts.
    #[must_use]
    pub fn line_start(&self, line: u32) -> Option<u32> {
        self.line_starts.get(line.checked_sub(1)? as usize).copied()
    }

    /// Number of lines (a trailing newline opens an empty last line).
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_resolve() {
        let idx = LineIndex::new("hello\nworld");
        assert_eq!(idx.position(0), Position::new(1, 0));
        assert_eq!(idx.position(3), Position::new(1, 3));
        assert_eq!(idx.position(5), Position::new(1, 5));
        assert_eq!(idx.position(6), Position::new(2, 0));
        assert_eq!(idx.position(10), Position::new(2, 4));
    }

    #[test]
    fn test_line_index_clamps_past_end() {
        let idx = LineIndex::new("ab");
        assert_eq!(idx.position(99), Position::new(1, 2));
    }

    #[test]
    fn test_line_index_trailing_newline() {
        let idx = LineIndex::new("a\nb\n");
        assert_eq!(idx.line_count(), 3);
        assert_eq!(idx.position(4), Position::new(3, 0));
    }

    #[test]
    fn test_line_index_offset_roundtrip() {
        let src = "x = 1\n  def foo(): pass\n";
        let idx = LineIndex::new(src);
        let pos = Position::new(2, 6);
        let off = idx.offset(pos).unwrap();
        assert_eq!(&src[off as usize..off as usize + 3], "foo");
        assert_eq!(idx.position(off), pos);
        assert_eq!(idx.offset(Position::new(9, 0)), None);
    }

    #[test]
    fn test_multibyte_columns_are_bytes() {
        let idx = LineIndex::new("äöü = 1");
        assert_eq!(idx.position(6), Position::new(1, 6));
    }

    #[test]
    fn test_of_offset_matches_index() {
        let src = "a\n\nbc\nd";
        let idx = LineIndex::new(src);
        for off in 0..=src.len() as u32 {
            assert_eq!(Position::of_offset(src, off), idx.position(off));
        }
    }

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 9) < Position::new(2, 0));
        assert!(Position::new(2, 1) > Position::new(2, 0));
    }
}
