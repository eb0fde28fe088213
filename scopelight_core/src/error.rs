//! Syntax errors reported by the parser.

use crate::position::Position;
use crate::span::Span;
use thiserror::Error;

/// Broad class of a syntax error.
///
/// Tolerance policies match on this instead of on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    /// A token the grammar does not allow here.
    UnexpectedToken,
    /// Input ended in the middle of a construct.
    UnexpectedEof,
    /// An opening bracket is never closed.
    UnclosedBracket,
    /// A closing bracket without an opener.
    UnmatchedBracket,
    /// A string literal runs past the end of its line or the buffer.
    UnterminatedString,
    /// Inconsistent or unexpected indentation.
    Indentation,
    /// Malformed token (bad number, stray character).
    InvalidToken,
    /// Nesting exceeds the parser's depth limit.
    TooDeep,
    /// Assignment, deletion or loop target that cannot be bound.
    InvalidTarget,
    /// Grammatically valid but rejected by name binding rules.
    Semantic,
}

/// A syntax error with its location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {}, column {})", .position.line, .position.column)]
pub struct SyntaxError {
    /// Error class.
    pub kind: SyntaxErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Offending byte range.
    pub span: Span,
    /// Start of `span` as line/column.
    pub position: Position,
}

impl SyntaxError {
    /// Create an error, resolving its position against `source`.
    #[must_use]
    pub fn new(kind: SyntaxErrorKind, message: impl Into<String>, span: Span, source: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            position: Position::of_offset(source, span.start),
        }
    }

    /// 1-indexed line of the error.
    #[inline]
    #[must_use]
    pub fn line(&self) -> u32 {
        self.position.line
    }
}

/// Result of a parse operation.
pub type ParseResult<T> = std::result::Result<T, SyntaxError>;

/// Errors shared by every scopelight crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The buffer does not parse.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// A caller-supplied position lies outside the buffer.
    #[error("position {0} is outside the buffer")]
    OutOfRange(Position),
}

/// Result alias over [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_resolves_position() {
        let err = SyntaxError::new(
            SyntaxErrorKind::UnexpectedToken,
            "invalid syntax",
            Span::new(6, 7),
            "x = 1\n)",
        );
        assert_eq!(err.position, Position::new(2, 0));
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_error_wraps_syntax_error() {
        let err: Error = SyntaxError::new(
            SyntaxErrorKind::TooDeep,
            "too many nested parentheses",
            Span::at(0),
            "",
        )
        .into();
        assert!(matches!(err, Error::Syntax(_)));
        assert_eq!(
            Error::OutOfRange(Position::new(9, 2)).to_string(),
            "position 9:2 is outside the buffer"
        );
    }

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError::new(
            SyntaxErrorKind::UnexpectedEof,
            "unexpected end of file",
            Span::at(3),
            "1 +",
        );
        assert_eq!(err.to_string(), "unexpected end of file (line 1, column 3)");
    }
}
