//! Token definitions for the Python lexer.
//!
//! Literal tokens carry no decoded value: highlighting only needs to know
//! where a literal is, never what it evaluates to. F-string tokens carry the
//! byte ranges of their replacement-field expressions so the parser can
//! descend into them.

use scopelight_core::{Span, SyntaxErrorKind};
use std::fmt;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// Source span.
    pub span: Span,
}

impl Token {
    /// Create a new token.
    #[inline]
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Check if this is an end-of-file token.
    #[inline]
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// The identifier text, if this is an identifier.
    #[inline]
    #[must_use]
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

/// Token kinds for Python lexical analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal of any base, float or imaginary.
    Number,
    /// String literal (any prefix except `f` and `b`).
    String,
    /// Bytes literal.
    Bytes,
    /// F-string; each span covers one replacement-field expression.
    FString(Vec<Span>),

    // Identifiers and Keywords
    /// Identifier. Soft keywords (`match`, `case`, `type`, `_`) lex as identifiers.
    Ident(String),
    /// Hard keyword.
    Keyword(Keyword),

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `/`
    Slash,
    /// `//`
    DoubleSlash,
    /// `%`
    Percent,
    /// `@`
    At,
    /// `<<`
    LeftShift,
    /// `>>`
    RightShift,
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `:=`
    ColonEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `==`
    EqualEqual,
    /// `!=`
    NotEqual,

    // Delimiters
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `;`
    Semicolon,
    /// `->`
    Arrow,
    /// `=`
    Equal,
    /// Any augmented assignment (`+=`, `//=`, `**=`, ...).
    AugAssign,
    /// `...`
    Ellipsis,

    // Indentation
    /// Indentation increase.
    Indent,
    /// Indentation decrease.
    Dedent,
    /// Logical line end.
    Newline,

    // Special
    /// End of file.
    Eof,
    /// Malformed input.
    Error(LexError),
}

impl TokenKind {
    /// Check if this is a comparison operator (`in`/`is`/`not` excluded).
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Less
                | Self::Greater
                | Self::LessEqual
                | Self::GreaterEqual
                | Self::EqualEqual
                | Self::NotEqual
        )
    }

    /// Check if this token opens a bracket.
    #[must_use]
    pub const fn is_open_bracket(&self) -> bool {
        matches!(self, Self::LeftParen | Self::LeftBracket | Self::LeftBrace)
    }

    /// Check if this token can start an atom, used to detect implicit ends.
    #[must_use]
    pub fn starts_atom(&self) -> bool {
        match self {
            Self::Number
            | Self::String
            | Self::Bytes
            | Self::FString(_)
            | Self::Ident(_)
            | Self::Ellipsis
            | Self::LeftParen
            | Self::LeftBracket
            | Self::LeftBrace => true,
            Self::Keyword(kw) => matches!(
                kw,
                Keyword::True | Keyword::False | Keyword::None | Keyword::Lambda | Keyword::Await
            ),
            _ => false,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Number => "number",
            Self::String | Self::Bytes | Self::FString(_) => "string",
            Self::Ident(name) => return f.write_str(name),
            Self::Keyword(kw) => kw.as_str(),
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::DoubleStar => "**",
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Percent => "%",
            Self::At => "@",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
            Self::Ampersand => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::ColonEqual => ":=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::EqualEqual => "==",
            Self::NotEqual => "!=",
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBracket => "[",
            Self::RightBracket => "]",
            Self::LeftBrace => "{",
            Self::RightBrace => "}",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::Semicolon => ";",
            Self::Arrow => "->",
            Self::Equal => "=",
            Self::AugAssign => "augmented assignment",
            Self::Ellipsis => "...",
            Self::Indent => "indent",
            Self::Dedent => "dedent",
            Self::Newline => "newline",
            Self::Eof => "end of file",
            Self::Error(err) => return write!(f, "{err}"),
        };
        f.write_str(text)
    }
}

// =============================================================================
// Lexical Errors
// =============================================================================

/// Malformed input found by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    /// String runs past its line (or the buffer, for triple quotes).
    UnterminatedString,
    /// Number literal with no digits after its base prefix or a bad suffix.
    InvalidNumber,
    /// Character that cannot start any token.
    UnexpectedChar(char),
    /// Dedent to a column that was never indented to.
    InconsistentDedent,
    /// Closing bracket with no opener.
    UnmatchedBracket,
    /// Backslash not followed by a line break.
    StrayBackslash,
}

impl LexError {
    /// Error class reported to callers.
    #[must_use]
    pub const fn syntax_kind(self) -> SyntaxErrorKind {
        match self {
            Self::UnterminatedString => SyntaxErrorKind::UnterminatedString,
            Self::InconsistentDedent => SyntaxErrorKind::Indentation,
            Self::UnmatchedBracket => SyntaxErrorKind::UnmatchedBracket,
            Self::InvalidNumber | Self::UnexpectedChar(_) | Self::StrayBackslash => {
                SyntaxErrorKind::InvalidToken
            }
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => f.write_str("unterminated string literal"),
            Self::InvalidNumber => f.write_str("invalid number literal"),
            Self::UnexpectedChar(c) => write!(f, "invalid character '{c}'"),
            Self::InconsistentDedent => {
                f.write_str("unindent does not match any outer indentation level")
            }
            Self::UnmatchedBracket => f.write_str("unmatched closing bracket"),
            Self::StrayBackslash => f.write_str("unexpected character after line continuation"),
        }
    }
}

// =============================================================================
// Keywords
// =============================================================================

/// Python hard keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `False`
    False,
    /// `None`
    None,
    /// `True`
    True,
    /// `and`
    And,
    /// `as`
    As,
    /// `assert`
    Assert,
    /// `async`
    Async,
    /// `await`
    Await,
    /// `break`
    Break,
    /// `class`
    Class,
    /// `continue`
    Continue,
    /// `def`
    Def,
    /// `del`
    Del,
    /// `elif`
    Elif,
    /// `else`
    Else,
    /// `except`
    Except,
    /// `finally`
    Finally,
    /// `for`
    For,
    /// `from`
    From,
    /// `global`
    Global,
    /// `if`
    If,
    /// `import`
    Import,
    /// `in`
    In,
    /// `is`
    Is,
    /// `lambda`
    Lambda,
    /// `nonlocal`
    Nonlocal,
    /// `not`
    Not,
    /// `or`
    Or,
    /// `pass`
    Pass,
    /// `raise`
    Raise,
    /// `return`
    Return,
    /// `try`
    Try,
    /// `while`
    While,
    /// `with`
    With,
    /// `yield`
    Yield,
}

/// Every hard keyword, in declaration order.
pub const KEYWORDS: [Keyword; 35] = [
    Keyword::False,
    Keyword::None,
    Keyword::True,
    Keyword::And,
    Keyword::As,
    Keyword::Assert,
    Keyword::Async,
    Keyword::Await,
    Keyword::Break,
    Keyword::Class,
    Keyword::Continue,
    Keyword::Def,
    Keyword::Del,
    Keyword::Elif,
    Keyword::Else,
    Keyword::Except,
    Keyword::Finally,
    Keyword::For,
    Keyword::From,
    Keyword::Global,
    Keyword::If,
    Keyword::Import,
    Keyword::In,
    Keyword::Is,
    Keyword::Lambda,
    Keyword::Nonlocal,
    Keyword::Not,
    Keyword::Or,
    Keyword::Pass,
    Keyword::Raise,
    Keyword::Return,
    Keyword::Try,
    Keyword::While,
    Keyword::With,
    Keyword::Yield,
];

impl Keyword {
    /// Look up a hard keyword by its spelling.
    #[must_use]
    pub fn lookup(s: &str) -> Option<Self> {
        KEYWORDS.iter().copied().find(|kw| kw.as_str() == s)
    }

    /// Get the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::False => "False",
            Self::None => "None",
            Self::True => "True",
            Self::And => "and",
            Self::As => "as",
            Self::Assert => "assert",
            Self::Async => "async",
            Self::Await => "await",
            Self::Break => "break",
            Self::Class => "class",
            Self::Continue => "continue",
            Self::Def => "def",
            Self::Del => "del",
            Self::Elif => "elif",
            Self::Else => "else",
            Self::Except => "except",
            Self::Finally => "finally",
            Self::For => "for",
            Self::From => "from",
            Self::Global => "global",
            Self::If => "if",
            Self::Import => "import",
            Self::In => "in",
            Self::Is => "is",
            Self::Lambda => "lambda",
            Self::Nonlocal => "nonlocal",
            Self::Not => "not",
            Self::Or => "or",
            Self::Pass => "pass",
            Self::Raise => "raise",
            Self::Return => "return",
            Self::Try => "try",
            Self::While => "while",
            Self::With => "with",
            Self::Yield => "yield",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup_roundtrip() {
        for kw in KEYWORDS {
            assert_eq!(Keyword::lookup(kw.as_str()), Some(kw));
        }
    }

    #[test]
    fn test_soft_keywords_are_not_hard() {
        assert_eq!(Keyword::lookup("match"), None);
        assert_eq!(Keyword::lookup("case"), None);
        assert_eq!(Keyword::lookup("type"), None);
        assert_eq!(Keyword::lookup("print"), None);
    }

    #[test]
    fn test_token_ident_accessor() {
        let tok = Token::new(TokenKind::Ident("spam".to_string()), Span::new(0, 4));
        assert_eq!(tok.ident(), Some("spam"));
        let tok = Token::new(TokenKind::Keyword(Keyword::Def), Span::new(0, 3));
        assert_eq!(tok.ident(), None);
    }

    #[test]
    fn test_starts_atom() {
        assert!(TokenKind::Ident("x".into()).starts_atom());
        assert!(TokenKind::Keyword(Keyword::None).starts_atom());
        assert!(!TokenKind::Keyword(Keyword::If).starts_atom());
        assert!(!TokenKind::Comma.starts_atom());
    }

    #[test]
    fn test_lex_error_kinds() {
        assert_eq!(
            LexError::UnterminatedString.syntax_kind(),
            SyntaxErrorKind::UnterminatedString
        );
        assert_eq!(
            LexError::InconsistentDedent.syntax_kind(),
            SyntaxErrorKind::Indentation
        );
        assert_eq!(
            LexError::UnexpectedChar('$').to_string(),
            "invalid character '$'"
        );
    }

    #[test]
    fn test_token_kind_display() {
        assert_eq!(TokenKind::DoubleStar.to_string(), "**");
        assert_eq!(TokenKind::ColonEqual.to_string(), ":=");
        assert_eq!(TokenKind::Ident("foo".into()).to_string(), "foo");
        assert_eq!(TokenKind::Eof.to_string(), "end of file");
    }
}
