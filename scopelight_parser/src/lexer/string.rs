//! String literal scanning.
//!
//! Handles every Python 3.12 quoting form: single, double and triple quotes
//! with `r`, `b`, `u` and `f` prefixes. Escapes are skipped, never decoded.
//! For f-strings the scanner records the byte range of every replacement
//! field expression, including fields nested in format specs.

use super::cursor::{Cursor, EOF_CHAR};
use super::identifier::is_id_continue;
use crate::token::{LexError, TokenKind};
use scopelight_core::Span;

/// String prefix flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringPrefix {
    /// Raw string (backslashes are literal).
    pub raw: bool,
    /// Bytes literal.
    pub bytes: bool,
    /// Format string.
    pub format: bool,
    /// Explicit `u` prefix.
    pub unicode: bool,
}

impl StringPrefix {
    /// Parse a prefix spelling. Returns `None` for anything that is not a
    /// valid combination (`bf`, `ub`, `rr`, ...).
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() > 2 {
            return None;
        }
        let mut prefix = Self::default();
        for c in text.chars() {
            let flag = match c.to_ascii_lowercase() {
                'r' => &mut prefix.raw,
                'b' => &mut prefix.bytes,
                'f' => &mut prefix.format,
                'u' => &mut prefix.unicode,
                _ => return None,
            };
            if *flag {
                return None;
            }
            *flag = true;
        }
        let valid = !(prefix.bytes && (prefix.format || prefix.unicode))
            && !(prefix.unicode && (prefix.format || prefix.raw));
        valid.then_some(prefix)
    }
}

/// Scan a string literal. The cursor sits on the opening quote.
pub fn lex_string(cursor: &mut Cursor<'_>, prefix: StringPrefix) -> TokenKind {
    let mut fields = Vec::new();
    match scan_string(cursor, prefix, &mut fields) {
        Ok(()) if prefix.format => TokenKind::FString(fields),
        Ok(()) if prefix.bytes => TokenKind::Bytes,
        Ok(()) => TokenKind::String,
        Err(err) => TokenKind::Error(err),
    }
}

/// Opening quote of the literal under the cursor.
#[derive(Debug, Clone, Copy)]
struct Quote {
    ch: char,
    triple: bool,
}

impl Quote {
    fn open(cursor: &mut Cursor<'_>) -> Option<Self> {
        let ch = cursor.first();
        if ch != '"' && ch != '\'' {
            return None;
        }
        cursor.bump();
        let triple = cursor.first() == ch && cursor.second() == ch;
        if triple {
            cursor.bump();
            cursor.bump();
        }
        Some(Self { ch, triple })
    }

    /// Consume the closing quote if it is next.
    fn close(self, cursor: &mut Cursor<'_>) -> bool {
        if cursor.first() != self.ch {
            return false;
        }
        if self.triple {
            if cursor.second() != self.ch || cursor.third() != self.ch {
                return false;
            }
            cursor.bump();
            cursor.bump();
        }
        cursor.bump();
        true
    }
}

fn scan_string(
    cursor: &mut Cursor<'_>,
    prefix: StringPrefix,
    fields: &mut Vec<Span>,
) -> Result<(), LexError> {
    let quote = Quote::open(cursor).ok_or(LexError::UnterminatedString)?;
    loop {
        if quote.close(cursor) {
            return Ok(());
        }
        match cursor.first() {
            _ if cursor.is_eof() => return Err(LexError::UnterminatedString),
            '\n' | '\r' if !quote.triple => return Err(LexError::UnterminatedString),
            '\\' => {
                cursor.bump();
                // An escaped quote or backslash never ends the literal, raw or not.
                if !(prefix.format && cursor.first() == '{') {
                    cursor.bump();
                }
            }
            '{' if prefix.format => {
                cursor.bump();
                if !cursor.eat('{') {
                    scan_field(cursor, fields)?;
                }
            }
            _ => {
                cursor.bump();
            }
        }
    }
}

/// Scan one replacement field. The cursor sits just past its `{`.
fn scan_field(cursor: &mut Cursor<'_>, fields: &mut Vec<Span>) -> Result<(), LexError> {
    let start = cursor.pos();
    scan_field_expr(cursor)?;
    fields.push(cursor.span_from(start));

    if cursor.first() == '=' {
        cursor.bump();
        cursor.eat_while(|c| c == ' ');
    }
    if cursor.first() == '!' {
        cursor.bump();
        cursor.eat_while(is_id_continue);
    }
    if cursor.eat(':') {
        scan_format_spec(cursor, fields)?;
    }
    if cursor.eat('}') {
        Ok(())
    } else {
        Err(LexError::UnterminatedString)
    }
}

/// Advance to the end of a field expression, stopping before the `=`, `!`,
/// `:` or `}` that terminates it.
fn scan_field_expr(cursor: &mut Cursor<'_>) -> Result<(), LexError> {
    let mut nesting = 0usize;
    let mut prev = EOF_CHAR;
    loop {
        let c = cursor.first();
        if cursor.is_eof() {
            return Err(LexError::UnterminatedString);
        }
        match c {
            '(' | '[' | '{' => nesting += 1,
            ')' | ']' => nesting = nesting.saturating_sub(1),
            '}' if nesting > 0 => nesting -= 1,
            '}' => return Ok(()),
            ':' if nesting == 0 => return Ok(()),
            '!' if nesting == 0 && cursor.second() != '=' => return Ok(()),
            '=' if nesting == 0
                && cursor.second() != '='
                && !matches!(prev, '=' | '!' | '<' | '>') =>
            {
                return Ok(());
            }
            '"' | '\'' => {
                scan_string(cursor, StringPrefix::default(), &mut Vec::new())?;
                prev = c;
                continue;
            }
            _ if super::identifier::is_id_start(c) => {
                let word = cursor.pos();
                cursor.eat_while(is_id_continue);
                if matches!(cursor.first(), '"' | '\'') {
                    if let Some(prefix) = StringPrefix::parse(cursor.slice_from(word)) {
                        scan_string(cursor, prefix, &mut Vec::new())?;
                    }
                }
                prev = 'a';
                continue;
            }
            _ => {}
        }
        if !c.is_whitespace() {
            prev = c;
        }
        cursor.bump();
    }
}

/// Scan a format spec up to (not including) the closing `}` of its field.
fn scan_format_spec(cursor: &mut Cursor<'_>, fields: &mut Vec<Span>) -> Result<(), LexError> {
    loop {
        match cursor.first() {
            _ if cursor.is_eof() => return Err(LexError::UnterminatedString),
            '}' => return Ok(()),
            '{' => {
                cursor.bump();
                scan_field(cursor, fields)?;
            }
            '"' | '\'' | '\n' => return Err(LexError::UnterminatedString),
            _ => {
                cursor.bump();
            }
        }
    }
}
