//! Number literal scanning.
//!
//! Literals are validated for shape only (`0x` needs digits, exponents need
//! digits); their values are never computed.

use super::cursor::Cursor;
use crate::token::{LexError, TokenKind};

/// Check if `c` (followed by `next`) starts a number.
#[inline]
#[must_use]
pub fn is_number_start(c: char, next: char) -> bool {
    c.is_ascii_digit() || (c == '.' && next.is_ascii_digit())
}

/// Scan a number. `first` has already been consumed.
pub fn lex_number(cursor: &mut Cursor<'_>, first: char) -> TokenKind {
    if first == '0' {
        let radix_digit: Option<fn(char) -> bool> = match cursor.first() {
            'x' | 'X' => Some(|c| c.is_ascii_hexdigit()),
            'o' | 'O' => Some(|c| matches!(c, '0'..='7')),
            'b' | 'B' => Some(|c| matches!(c, '0' | '1')),
            _ => None,
        };
        if let Some(is_digit) = radix_digit {
            cursor.bump();
            return if eat_digits(cursor, is_digit) {
                TokenKind::Number
            } else {
                TokenKind::Error(LexError::InvalidNumber)
            };
        }
    }

    if first != '.' {
        eat_digits(cursor, |c| c.is_ascii_digit());
        if cursor.first() == '.' {
            cursor.bump();
        }
    }
    eat_digits(cursor, |c| c.is_ascii_digit());

    if matches!(cursor.first(), 'e' | 'E') {
        cursor.bump();
        if matches!(cursor.first(), '+' | '-') {
            cursor.bump();
        }
        if !eat_digits(cursor, |c| c.is_ascii_digit()) {
            return TokenKind::Error(LexError::InvalidNumber);
        }
    }
    if matches!(cursor.first(), 'j' | 'J') {
        cursor.bump();
    }
    TokenKind::Number
}

/// Eat digits with single underscores between them. Returns whether any digit
/// was consumed.
fn eat_digits(cursor: &mut Cursor<'_>, is_digit: impl Fn(char) -> bool) -> bool {
    let mut any = false;
    loop {
        let c = cursor.first();
        if is_digit(c) && !cursor.is_eof() {
            any = true;
            cursor.bump();
        } else if c == '_' && is_digit(cursor.second()) {
            cursor.bump();
        } else {
            return any;
        }
    }
}
