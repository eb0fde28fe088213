//! Python 3.12 lexer.
//!
//! Produces a token stream with explicit `Newline`, `Indent` and `Dedent`
//! tokens. Blank and comment-only lines produce nothing. Inside brackets line
//! breaks are insignificant. Malformed input becomes a `TokenKind::Error`
//! token after which lexing continues, so callers that only need a best-effort
//! token stream can keep going.

mod cursor;
mod identifier;
mod indent;
mod number;
mod string;

pub use cursor::{Cursor, EOF_CHAR};
pub use identifier::{is_id_continue, is_id_start, is_identifier, SoftKeyword};
pub use indent::{IndentChange, IndentStack};
pub use string::StringPrefix;

use crate::token::{LexError, Token, TokenKind};
use scopelight_core::Span;

/// Streaming tokenizer over a source buffer or a window of it.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    /// Full source buffer.
    source: &'src str,
    /// Character cursor.
    cursor: Cursor<'src>,
    /// Indentation and bracket state.
    indent: IndentStack,
    /// Whether the current logical line produced a token yet.
    line_has_content: bool,
    /// Windowed lexers never emit layout tokens.
    windowed: bool,
    /// Whether end-of-input dedents have been scheduled.
    closed: bool,
}

impl<'src> Lexer<'src> {
    /// Create a lexer over a whole module.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            cursor: Cursor::new(source),
            indent: IndentStack::new(),
            line_has_content: false,
            windowed: false,
            closed: false,
        }
    }

    /// Create a lexer over `span` of `source` that treats the window as one
    /// bracketed expression: no `Newline`, `Indent` or `Dedent` tokens.
    #[must_use]
    pub fn window(source: &'src str, span: Span) -> Self {
        Self {
            source,
            cursor: Cursor::window(source, span.start as usize, span.end as usize),
            indent: IndentStack::bracketed(),
            line_has_content: false,
            windowed: true,
            closed: true,
        }
    }

    /// The full source buffer.
    #[inline]
    #[must_use]
    pub const fn source(&self) -> &'src str {
        self.source
    }

    /// Number of brackets still open. Windowed lexers count their implicit one.
    #[inline]
    #[must_use]
    pub fn open_brackets(&self) -> usize {
        self.indent.bracket_depth()
    }

    /// Whether this lexer walks a window of the buffer.
    #[inline]
    #[must_use]
    pub const fn is_windowed(&self) -> bool {
        self.windowed
    }

    /// Span of the innermost bracket that is still open.
    #[must_use]
    pub fn unclosed_bracket(&self) -> Option<Span> {
        let base = usize::from(self.windowed);
        if self.indent.bracket_depth() <= base {
            return None;
        }
        self.indent
            .innermost_bracket()
            .map(|at| Span::new(at as u32, at as u32 + 1))
    }

    /// Produce the next token. Returns `Eof` forever once input is exhausted.
    pub fn next_token(&mut self) -> Token {
        loop {
            if self.indent.take_dedent() {
                return self.token_at(TokenKind::Dedent, self.cursor.pos());
            }

            if self.indent.at_line_start() && self.indent.tracking_indent() {
                if let Some(token) = self.line_indentation() {
                    return token;
                }
                continue;
            }

            self.cursor.eat_while(|c| matches!(c, ' ' | '\t' | '\x0c'));
            if self.cursor.first() == '#' {
                self.cursor.eat_while(|c| c != '\n' && c != '\r');
            }

            if self.cursor.is_eof() {
                return self.end_of_input();
            }

            let start = self.cursor.pos();
            match self.cursor.first() {
                '\n' | '\r' => {
                    self.eat_line_break();
                    if self.indent.tracking_indent() && !self.windowed {
                        self.indent.set_line_start(true);
                        self.line_has_content = false;
                        return Token::new(TokenKind::Newline, self.cursor.span_from(start));
                    }
                }
                '\\' => {
                    self.cursor.bump();
                    if !self.eat_line_break() {
                        return self.emit(TokenKind::Error(LexError::StrayBackslash), start);
                    }
                }
                _ => {
                    let kind = self.lex_token();
                    return self.emit(kind, start);
                }
            }
        }
    }

    /// Measure the indentation of a fresh line. Returns `None` when the line
    /// was blank or only a comment (already consumed), when it keeps the
    /// current level, or when dedents were scheduled.
    fn line_indentation(&mut self) -> Option<Token> {
        let start = self.cursor.pos();
        self.cursor.eat_while(|c| matches!(c, ' ' | '\t' | '\x0c'));
        let ws_end = self.cursor.pos();

        if self.cursor.first() == '#' {
            self.cursor.eat_while(|c| c != '\n' && c != '\r');
        }
        match self.cursor.first() {
            _ if self.cursor.is_eof() => {
                self.indent.set_line_start(false);
                return None;
            }
            '\n' | '\r' => {
                self.eat_line_break();
                return None;
            }
            _ => {}
        }
        self.indent.set_line_start(false);
        let column = IndentStack::measure(&self.source[start..ws_end]);
        match self.indent.process(column) {
            Ok(IndentChange::Indent) => {
                Some(Token::new(TokenKind::Indent, Span::new(start as u32, ws_end as u32)))
            }
            Ok(IndentChange::Same | IndentChange::Dedent(_)) => None,
            Err(err) => Some(Token::new(
                TokenKind::Error(err),
                Span::new(start as u32, ws_end as u32),
            )),
        }
    }

    /// Newline at end of the last logical line, then closing dedents, then `Eof`.
    fn end_of_input(&mut self) -> Token {
        let pos = self.cursor.pos();
        if self.line_has_content && !self.windowed && self.indent.tracking_indent() {
            self.line_has_content = false;
            return self.token_at(TokenKind::Newline, pos);
        }
        if !self.closed {
            self.closed = true;
            self.indent.close_all();
            if self.indent.take_dedent() {
                return self.token_at(TokenKind::Dedent, pos);
            }
        }
        self.token_at(TokenKind::Eof, pos)
    }

    fn eat_line_break(&mut self) -> bool {
        if self.cursor.eat('\r') {
            self.cursor.eat('\n');
            true
        } else {
            self.cursor.eat('\n')
        }
    }

    fn token_at(&self, kind: TokenKind, pos: usize) -> Token {
        Token::new(kind, Span::at(pos as u32))
    }

    fn emit(&mut self, kind: TokenKind, start: usize) -> Token {
        self.line_has_content = true;
        Token::new(kind, self.cursor.span_from(start))
    }

    /// Lex one non-layout token starting at the cursor.
    fn lex_token(&mut self) -> TokenKind {
        let c = self.cursor.first();
        if c == '"' || c == '\'' {
            return string::lex_string(&mut self.cursor, StringPrefix::default());
        }
        if let Some(kind) = self.prefixed_string() {
            return kind;
        }

        let start = self.cursor.pos();
        let next = self.cursor.second();
        self.cursor.bump();
        if number::is_number_start(c, next) {
            return number::lex_number(&mut self.cursor, c);
        }
        if is_id_start(c) {
            return identifier::lex_identifier(&mut self.cursor, start);
        }
        self.lex_operator(c)
    }

    /// Lex a string with a prefix such as `rb'...'` or `f"..."`.
    fn prefixed_string(&mut self) -> Option<TokenKind> {
        let is_quote = |c: char| c == '"' || c == '\'';
        let (c1, c2) = (self.cursor.first(), self.cursor.second());
        if !c1.is_ascii_alphabetic() {
            return None;
        }
        let len = if is_quote(c2) {
            1
        } else if c2.is_ascii_alphabetic() && is_quote(self.cursor.third()) {
            2
        } else {
            return None;
        };
        let pos = self.cursor.pos();
        let prefix = StringPrefix::parse(&self.source[pos..pos + len])?;
        for _ in 0..len {
            self.cursor.bump();
        }
        Some(string::lex_string(&mut self.cursor, prefix))
    }

    /// Lex an operator or delimiter. `c` has been consumed.
    fn lex_operator(&mut self, c: char) -> TokenKind {
        let at = self.cursor.pos() - 1;
        let cur = &mut self.cursor;
        match c {
            '(' | '[' | '{' => {
                self.indent.open_bracket(c, at);
                match c {
                    '(' => TokenKind::LeftParen,
                    '[' => TokenKind::LeftBracket,
                    _ => TokenKind::LeftBrace,
                }
            }
            ')' | ']' | '}' => {
                if let Err(err) = self.indent.close_bracket(c) {
                    return TokenKind::Error(err);
                }
                match c {
                    ')' => TokenKind::RightParen,
                    ']' => TokenKind::RightBracket,
                    _ => TokenKind::RightBrace,
                }
            }
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '~' => TokenKind::Tilde,
            '.' => {
                if cur.first() == '.' && cur.second() == '.' {
                    cur.bump();
                    cur.bump();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            ':' => {
                if cur.eat('=') {
                    TokenKind::ColonEqual
                } else {
                    TokenKind::Colon
                }
            }
            '=' => {
                if cur.eat('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                if cur.eat('=') {
                    TokenKind::NotEqual
                } else {
                    TokenKind::Error(LexError::UnexpectedChar('!'))
                }
            }
            '-' => {
                if cur.eat('>') {
                    TokenKind::Arrow
                } else {
                    augmented(cur, TokenKind::Minus)
                }
            }
            '+' => augmented(cur, TokenKind::Plus),
            '%' => augmented(cur, TokenKind::Percent),
            '@' => augmented(cur, TokenKind::At),
            '&' => augmented(cur, TokenKind::Ampersand),
            '|' => augmented(cur, TokenKind::Pipe),
            '^' => augmented(cur, TokenKind::Caret),
            '*' => {
                if cur.eat('*') {
                    augmented(cur, TokenKind::DoubleStar)
                } else {
                    augmented(cur, TokenKind::Star)
                }
            }
            '/' => {
                if cur.eat('/') {
                    augmented(cur, TokenKind::DoubleSlash)
                } else {
                    augmented(cur, TokenKind::Slash)
                }
            }
            '<' => {
                if cur.eat('<') {
                    augmented(cur, TokenKind::LeftShift)
                } else if cur.eat('=') {
                    TokenKind::LessEqual
                } else if cur.eat('>') {
                    TokenKind::NotEqual
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if cur.eat('>') {
                    augmented(cur, TokenKind::RightShift)
                } else if cur.eat('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            other => TokenKind::Error(LexError::UnexpectedChar(other)),
        }
    }
}

/// `op` or, when followed by `=`, an augmented assignment.
fn augmented(cursor: &mut Cursor<'_>, op: TokenKind) -> TokenKind {
    if cursor.eat('=') {
        TokenKind::AugAssign
    } else {
        op
    }
}

/// Tokenize a whole module, including the final `Eof`.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.is_eof();
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}
