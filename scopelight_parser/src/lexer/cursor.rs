//! Character cursor over a window of the source buffer.
//!
//! Positions are always absolute byte offsets into the full buffer, also when
//! the cursor only walks a sub-range (f-string replacement fields).

use scopelight_core::Span;

/// End-of-file sentinel character.
pub const EOF_CHAR: char = '\0';

/// A cursor over source code that tracks position and provides lookahead.
#[derive(Debug, Clone)]
pub struct Cursor<'src> {
    /// Full source buffer.
    source: &'src str,
    /// Characters left in the window.
    chars: std::str::Chars<'src>,
    /// Absolute byte position.
    pos: usize,
    /// Absolute end of the window.
    end: usize,
}

impl<'src> Cursor<'src> {
    /// Create a cursor over the whole of `source`.
    #[inline]
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self::window(source, 0, source.len())
    }

    /// Create a cursor over `source[start..end]`.
    ///
    /// Bounds are clamped to the buffer and snapped back to char boundaries.
    #[must_use]
    pub fn window(source: &'src str, start: usize, end: usize) -> Self {
        let mut end = end.min(source.len());
        while !source.is_char_boundary(end) {
            end -= 1;
        }
        let mut start = start.min(end);
        while !source.is_char_boundary(start) {
            start -= 1;
        }
        Self {
            source,
            chars: source[start..end].chars(),
            pos: start,
            end,
        }
    }

    /// Current absolute byte position.
    #[inline]
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Absolute end of the window.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Check if the window is exhausted.
    #[inline]
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.end
    }

    /// Peek at the next character without consuming it.
    #[inline]
    #[must_use]
    pub fn first(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    /// Peek one character further.
    #[inline]
    #[must_use]
    pub fn second(&self) -> char {
        self.chars.clone().nth(1).unwrap_or(EOF_CHAR)
    }

    /// Peek two characters further.
    #[inline]
    #[must_use]
    pub fn third(&self) -> char {
        self.chars.clone().nth(2).unwrap_or(EOF_CHAR)
    }

    /// Consume and return the next character.
    #[inline]
    pub fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume characters while the predicate holds.
    #[inline]
    pub fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while !self.is_eof() && predicate(self.first()) {
            self.bump();
        }
    }

    /// Consume `c` if it is next.
    #[inline]
    pub fn eat(&mut self, c: char) -> bool {
        if self.first() == c && !self.is_eof() {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Source text from `start` to the current position.
    #[inline]
    #[must_use]
    pub fn slice_from(&self, start: usize) -> &'src str {
        &self.source[start..self.pos]
    }

    /// Span from `start` to the current position.
    #[inline]
    #[must_use]
    pub fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }
}
