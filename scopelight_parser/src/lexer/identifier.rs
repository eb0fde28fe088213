//! Identifier and keyword scanning (PEP 3131).

use super::cursor::Cursor;
use crate::token::{Keyword, TokenKind};

/// Check if a character can start an identifier.
#[inline]
#[must_use]
pub fn is_id_start(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphabetic() || c == '_';
    }
    unicode_xid::UnicodeXID::is_xid_start(c)
}

/// Check if a character can continue an identifier.
#[inline]
#[must_use]
pub fn is_id_continue(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphanumeric() || c == '_';
    }
    unicode_xid::UnicodeXID::is_xid_continue(c)
}

/// Scan the rest of an identifier whose first character started at `start`.
pub fn lex_identifier(cursor: &mut Cursor<'_>, start: usize) -> TokenKind {
    cursor.eat_while(is_id_continue);
    let text = cursor.slice_from(start);
    match Keyword::lookup(text) {
        Some(kw) => TokenKind::Keyword(kw),
        None => TokenKind::Ident(text.to_string()),
    }
}

/// Check whether `text` is a complete, non-keyword identifier.
#[must_use]
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(is_id_start)
        && chars.all(is_id_continue)
        && Keyword::lookup(text).is_none()
}

/// Context-sensitive keywords. They lex as identifiers and the parser decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftKeyword {
    /// `match` statement head.
    Match,
    /// `case` clause head.
    Case,
    /// `type` alias statement.
    Type,
    /// `_` wildcard pattern.
    Underscore,
}

impl SoftKeyword {
    /// Classify an identifier spelling.
    #[must_use]
    pub fn lookup(s: &str) -> Option<Self> {
        match s {
            "match" => Some(Self::Match),
            "case" => Some(Self::Case),
            "type" => Some(Self::Type),
            "_" => Some(Self::Underscore),
            _ => None,
        }
    }

    /// Spelling of the soft keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Case => "case",
            Self::Type => "type",
            Self::Underscore => "_",
        }
    }
}
