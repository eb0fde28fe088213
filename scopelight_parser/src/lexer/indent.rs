//! Indentation and bracket tracking for Python's significant whitespace.

use crate::token::LexError;

/// Result of comparing a new line's indentation with the open blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentChange {
    /// Same level as the innermost block.
    Same,
    /// One level deeper.
    Indent,
    /// Closes this many blocks.
    Dedent(usize),
}

/// Tracks indentation levels and open brackets.
#[derive(Debug, Clone)]
pub struct IndentStack {
    /// Open indentation columns, innermost last. Always starts with 0.
    levels: Vec<usize>,
    /// Dedents still to be emitted.
    pending_dedents: usize,
    /// Open brackets with their byte offsets, innermost last.
    brackets: Vec<(char, usize)>,
    /// Whether the lexer sits at the start of a logical line.
    at_line_start: bool,
}

impl IndentStack {
    /// Create a tracker at column 0 with no open brackets.
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: vec![0],
            pending_dedents: 0,
            brackets: Vec::new(),
            at_line_start: true,
        }
    }

    /// Create a tracker that behaves as if inside one open bracket, so line
    /// breaks and indentation are insignificant.
    #[must_use]
    pub fn bracketed() -> Self {
        Self {
            brackets: vec![('(', 0)],
            at_line_start: false,
            ..Self::new()
        }
    }

    /// Column of a line's leading whitespace. Tabs advance to the next
    /// multiple of eight.
    #[must_use]
    pub fn measure(prefix: &str) -> usize {
        prefix.chars().fold(0, |col, c| match c {
            '\t' => (col / 8 + 1) * 8,
            '\x0c' => 0,
            _ => col + 1,
        })
    }

    /// Whether the lexer sits at the start of a logical line.
    #[inline]
    #[must_use]
    pub const fn at_line_start(&self) -> bool {
        self.at_line_start
    }

    /// Mark the start or continuation of a logical line.
    #[inline]
    pub fn set_line_start(&mut self, value: bool) {
        self.at_line_start = value;
    }

    /// Indentation is significant only outside brackets.
    #[inline]
    #[must_use]
    pub fn tracking_indent(&self) -> bool {
        self.brackets.is_empty()
    }

    /// Record an opening bracket at byte offset `at`.
    #[inline]
    pub fn open_bracket(&mut self, c: char, at: usize) {
        self.brackets.push((c, at));
    }

    /// Record a closing bracket.
    ///
    /// # Errors
    /// [`LexError::UnmatchedBracket`] when nothing is open or the innermost
    /// opener does not pair with `c`.
    pub fn close_bracket(&mut self, c: char) -> Result<(), LexError> {
        let expected = match c {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        match self.brackets.last() {
            Some(&(open, _)) if open == expected => {
                self.brackets.pop();
                Ok(())
            }
            _ => Err(LexError::UnmatchedBracket),
        }
    }

    /// Number of currently open brackets.
    #[inline]
    #[must_use]
    pub fn bracket_depth(&self) -> usize {
        self.brackets.len()
    }

    /// Byte offset of the innermost open bracket.
    #[inline]
    #[must_use]
    pub fn innermost_bracket(&self) -> Option<usize> {
        self.brackets.last().map(|&(_, at)| at)
    }

    /// Compare a new line's column against the open blocks.
    ///
    /// # Errors
    /// [`LexError::InconsistentDedent`] when `column` lands between levels.
    pub fn process(&mut self, column: usize) -> Result<IndentChange, LexError> {
        let current = self.current();
        if column > current {
            self.levels.push(column);
            return Ok(IndentChange::Indent);
        }
        if column == current {
            return Ok(IndentChange::Same);
        }
        let mut count = 0;
        while self.current() > column {
            self.levels.pop();
            count += 1;
        }
        if self.current() != column {
            return Err(LexError::InconsistentDedent);
        }
        self.pending_dedents = count;
        Ok(IndentChange::Dedent(count))
    }

    /// Innermost open column.
    #[inline]
    #[must_use]
    pub fn current(&self) -> usize {
        self.levels.last().copied().unwrap_or(0)
    }

    /// Take one pending dedent, if any.
    #[inline]
    pub fn take_dedent(&mut self) -> bool {
        if self.pending_dedents == 0 {
            return false;
        }
        self.pending_dedents -= 1;
        true
    }

    /// Close every open block at end of input.
    pub fn close_all(&mut self) {
        self.pending_dedents += self.levels.len() - 1;
        self.levels.truncate(1);
    }
}

impl Default for IndentStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_and_dedent() {
        let mut stack = IndentStack::new();
        assert_eq!(stack.process(4), Ok(IndentChange::Indent));
        assert_eq!(stack.process(8), Ok(IndentChange::Indent));
        assert_eq!(stack.process(8), Ok(IndentChange::Same));
        assert_eq!(stack.process(0), Ok(IndentChange::Dedent(2)));
        assert!(stack.take_dedent());
        assert!(stack.take_dedent());
        assert!(!stack.take_dedent());
    }

    #[test]
    fn test_inconsistent_dedent() {
        let mut stack = IndentStack::new();
        stack.process(4).unwrap();
        assert_eq!(stack.process(2), Err(LexError::InconsistentDedent));
    }

    #[test]
    fn test_close_all() {
        let mut stack = IndentStack::new();
        stack.process(2).unwrap();
        stack.process(6).unwrap();
        stack.close_all();
        assert_eq!(stack.current(), 0);
        assert!(stack.take_dedent());
        assert!(stack.take_dedent());
        assert!(!stack.take_dedent());
    }

    #[test]
    fn test_brackets_disable_indent() {
        let mut stack = IndentStack::new();
        stack.open_bracket('(', 0);
        stack.open_bracket('[', 4);
        assert!(!stack.tracking_indent());
        assert_eq!(stack.innermost_bracket(), Some(4));
        assert_eq!(stack.close_bracket(']'), Ok(()));
        assert_eq!(stack.close_bracket(']'), Err(LexError::UnmatchedBracket));
        assert_eq!(stack.close_bracket(')'), Ok(()));
        assert!(stack.tracking_indent());
        assert_eq!(stack.close_bracket(')'), Err(LexError::UnmatchedBracket));
    }

    #[test]
    fn test_bracketed_tracker() {
        let stack = IndentStack::bracketed();
        assert!(!stack.tracking_indent());
        assert!(!stack.at_line_start());
    }

    #[test]
    fn test_measure_tabs() {
        assert_eq!(IndentStack::measure("    "), 4);
        assert_eq!(IndentStack::measure("\t"), 8);
        assert_eq!(IndentStack::measure("  \t"), 8);
        assert_eq!(IndentStack::measure("\t  "), 10);
    }
}
