//! Recursive descent parser for Python 3.12 with Pratt parsing for
//! expressions.
//!
//! The parser stops at the first error, matching CPython: error recovery
//! happens one level up by patching the text and parsing again (see
//! [`crate::tolerant`]).

mod expr;
mod pattern;
mod stmt;

use crate::ast::{Expr, Identifier, Module, Stmt};
use crate::lexer::Lexer;
use crate::token::{Keyword, Token, TokenKind};
use scopelight_core::{ParseResult, Span, SyntaxError, SyntaxErrorKind};
use smallvec::SmallVec;

/// Maximum recursion depth of nested expressions and blocks.
pub const MAX_NESTING: usize = 100;

/// Maximum depth of the expression tree, counting the links of flat
/// left-nested chains such as `a + b + c` or `a.b.c` as well as nesting.
pub const MAX_EXPR_DEPTH: usize = 500;

// =============================================================================
// Parser Core
// =============================================================================

/// Python 3.12 parser.
pub struct Parser<'src> {
    /// Token source.
    lexer: Lexer<'src>,
    /// Current token.
    current: Token,
    /// Previous token (for span tracking).
    previous: Token,
    /// One token of lookahead past `current`, filled on demand.
    peeked: Option<Token>,
    /// Current recursion depth.
    depth: usize,
    /// Depth of the expression tree being built.
    expr_depth: usize,
}

/// Saved parser position for speculative parsing.
struct Checkpoint<'src> {
    lexer: Lexer<'src>,
    current: Token,
    previous: Token,
    peeked: Option<Token>,
}

impl<'src> Parser<'src> {
    /// Create a parser for a whole module.
    pub fn new(source: &'src str) -> Self {
        Self::with_lexer(Lexer::new(source), 0, 0)
    }

    /// Create a parser over one f-string replacement field.
    fn fragment(source: &'src str, span: Span, depth: usize, expr_depth: usize) -> Self {
        Self::with_lexer(Lexer::window(source, span), depth, expr_depth)
    }

    fn with_lexer(mut lexer: Lexer<'src>, depth: usize, expr_depth: usize) -> Self {
        let first = lexer.next_token();
        Self {
            lexer,
            current: first.clone(),
            previous: first,
            peeked: None,
            depth,
            expr_depth,
        }
    }

    /// Parse a module (file).
    #[tracing::instrument(level = "trace", skip_all, fields(len = self.lexer.source().len()))]
    pub fn parse_module(&mut self) -> ParseResult<Module> {
        let start = self.current.span.start;
        let mut body = Vec::new();
        while !self.is_at_end() {
            if self.check(&TokenKind::Indent) {
                return Err(self.error_with(SyntaxErrorKind::Indentation, "unexpected indent"));
            }
            body.extend(self.parse_statement()?);
        }
        Ok(Module::new(body, Span::new(start, self.current.span.end)))
    }

    /// Parse one statement. Simple statements joined by `;` come back together.
    pub fn parse_statement(&mut self) -> ParseResult<SmallVec<[Stmt; 1]>> {
        self.nested(Self::parse_statement_inner)
    }

    /// Parse a single expression (`test`, no tuples).
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_precedence(Precedence::Lowest)
    }

    /// Parse source that must consist of exactly one expression list.
    fn parse_standalone_expression(&mut self) -> ParseResult<Expr> {
        if self.is_at_end() {
            return Err(self.error_with(
                SyntaxErrorKind::UnexpectedToken,
                "f-string: empty expression not allowed",
            ));
        }
        let expr = self.parse_star_expressions_or_yield()?;
        if !self.is_at_end() {
            return Err(self.error_at_current("invalid syntax"));
        }
        Ok(expr)
    }

    // =========================================================================
    // Token Management
    // =========================================================================

    /// Get the current token.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Get the previous token.
    #[inline]
    pub fn previous(&self) -> &Token {
        &self.previous
    }

    /// The full source buffer.
    #[inline]
    pub fn source(&self) -> &'src str {
        self.lexer.source()
    }

    /// Advance to the next token.
    pub fn advance(&mut self) {
        let next = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token(),
        };
        self.previous = std::mem::replace(&mut self.current, next);
    }

    /// The token after `current`.
    pub fn peek(&mut self) -> &Token {
        let lexer = &mut self.lexer;
        self.peeked.get_or_insert_with(|| lexer.next_token())
    }

    /// Check if the current token has the same kind (payload ignored).
    #[inline]
    pub fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    /// Check if the current token is a specific keyword.
    #[inline]
    pub fn check_keyword(&self, kw: Keyword) -> bool {
        matches!(&self.current.kind, TokenKind::Keyword(k) if *k == kw)
    }

    /// Check if the current token is the identifier `name` (soft keywords).
    #[inline]
    pub fn check_soft(&self, name: &str) -> bool {
        self.current.ident() == Some(name)
    }

    /// Consume the current token if it matches.
    pub fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it's the given keyword.
    pub fn match_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect and consume a token of `kind`.
    pub fn expect(&mut self, kind: &TokenKind, msg: &str) -> ParseResult<()> {
        if self.match_token(kind) {
            Ok(())
        } else {
            Err(self.error_at_current(msg))
        }
    }

    /// Expect and consume a keyword.
    pub fn expect_keyword(&mut self, kw: Keyword, msg: &str) -> ParseResult<()> {
        if self.match_keyword(kw) {
            Ok(())
        } else {
            Err(self.error_at_current(msg))
        }
    }

    /// Expect and consume an identifier.
    pub fn expect_identifier(&mut self, msg: &str) -> ParseResult<Identifier> {
        match &self.current.kind {
            TokenKind::Ident(name) => {
                let ident = Identifier::new(name.as_str(), self.current.span);
                self.advance();
                Ok(ident)
            }
            _ => Err(self.error_at_current(msg)),
        }
    }

    /// Check if at end of input.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.check(&TokenKind::Eof)
    }

    fn checkpoint(&self) -> Checkpoint<'src> {
        Checkpoint {
            lexer: self.lexer.clone(),
            current: self.current.clone(),
            previous: self.previous.clone(),
            peeked: self.peeked.clone(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint<'src>) {
        self.lexer = checkpoint.lexer;
        self.current = checkpoint.current;
        self.previous = checkpoint.previous;
        self.peeked = checkpoint.peeked;
    }

    /// Run `f` one nesting level deeper, failing cleanly past [`MAX_NESTING`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_with(SyntaxErrorKind::TooDeep, "too many nested parentheses"));
        }
        self.depth += 1;
        let result = self.chained(|p| {
            p.chain_link()?;
            f(p)
        });
        self.depth -= 1;
        result
    }

    /// Run `f`, then drop the chain links it counted.
    fn chained<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let base = self.expr_depth;
        let result = f(self);
        self.expr_depth = base;
        result
    }

    /// Count one more level of the expression tree, failing cleanly past
    /// [`MAX_EXPR_DEPTH`]. Only call inside [`Parser::chained`].
    fn chain_link(&mut self) -> ParseResult<()> {
        if self.expr_depth >= MAX_EXPR_DEPTH {
            return Err(self.error_with(SyntaxErrorKind::TooDeep, "expression is too deeply nested"));
        }
        self.expr_depth += 1;
        Ok(())
    }

    // =========================================================================
    // Span Tracking
    // =========================================================================

    /// Span from `start` to the end of the previous token.
    pub fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.previous.span.end.max(start))
    }

    /// Start offset of the current token.
    pub fn start_span(&self) -> u32 {
        self.current.span.start
    }

    // =========================================================================
    // Error Handling
    // =========================================================================

    /// Error at the current token, classified by what the token is.
    pub fn error_at_current(&self, msg: &str) -> SyntaxError {
        let source = self.source();
        match &self.current.kind {
            TokenKind::Error(err) => {
                SyntaxError::new(err.syntax_kind(), err.to_string(), self.current.span, source)
            }
            TokenKind::Eof => match self.lexer.unclosed_bracket() {
                Some(bracket) => {
                    let open = bracket.slice(source);
                    SyntaxError::new(
                        SyntaxErrorKind::UnclosedBracket,
                        format!("'{open}' was never closed"),
                        bracket,
                        source,
                    )
                }
                None => SyntaxError::new(
                    SyntaxErrorKind::UnexpectedEof,
                    "unexpected EOF while parsing",
                    self.current.span,
                    source,
                ),
            },
            TokenKind::Indent => SyntaxError::new(
                SyntaxErrorKind::Indentation,
                "unexpected indent",
                self.current.span,
                source,
            ),
            _ => SyntaxError::new(SyntaxErrorKind::UnexpectedToken, msg, self.current.span, source),
        }
    }

    /// Error of a fixed kind at the current token.
    pub fn error_with(&self, kind: SyntaxErrorKind, msg: impl Into<String>) -> SyntaxError {
        SyntaxError::new(kind, msg, self.current.span, self.source())
    }

    /// Error of a fixed kind at `span`.
    pub fn error_at(&self, kind: SyntaxErrorKind, msg: impl Into<String>, span: Span) -> SyntaxError {
        SyntaxError::new(kind, msg, span, self.source())
    }
}

// =============================================================================
// Precedence Levels
// =============================================================================

/// Expression precedence levels for Pratt parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Precedence {
    /// Lambda and everything above.
    Lowest = 0,
    /// Conditional `if-else`
    Conditional = 1,
    /// `or`
    Or = 2,
    /// `and`
    And = 3,
    /// `not`
    Not = 4,
    /// Comparisons, `in`, `is`
    Comparison = 5,
    /// `|`
    BitwiseOr = 6,
    /// `^`
    BitwiseXor = 7,
    /// `&`
    BitwiseAnd = 8,
    /// `<<`, `>>`
    Shift = 9,
    /// `+`, `-`
    Additive = 10,
    /// `*`, `@`, `/`, `//`, `%`
    Multiplicative = 11,
    /// Unary `+`, `-`, `~`
    Unary = 12,
    /// `**`
    Power = 13,
    /// `await`
    Await = 14,
    /// Attribute, subscript, call
    Primary = 15,
}

impl Precedence {
    /// The next tighter level.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Lowest => Self::Conditional,
            Self::Conditional => Self::Or,
            Self::Or => Self::And,
            Self::And => Self::Not,
            Self::Not => Self::Comparison,
            Self::Comparison => Self::BitwiseOr,
            Self::BitwiseOr => Self::BitwiseXor,
            Self::BitwiseXor => Self::BitwiseAnd,
            Self::BitwiseAnd => Self::Shift,
            Self::Shift => Self::Additive,
            Self::Additive => Self::Multiplicative,
            Self::Multiplicative => Self::Unary,
            Self::Unary => Self::Power,
            Self::Power => Self::Await,
            Self::Await | Self::Primary => Self::Primary,
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Parse source code into a module.
pub fn parse(source: &str) -> ParseResult<Module> {
    Parser::new(source).parse_module()
}

/// Parse source consisting of a single expression list.
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let span = Span::new(0, source.len() as u32);
    Parser::fragment(source, span, 0, 0).parse_standalone_expression()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, StmtKind};

    #[test]
    fn test_empty_module() {
        let module = parse("").unwrap();
        assert!(module.body.is_empty());
        let module = parse("\n# comment\n\n").unwrap();
        assert!(module.body.is_empty());
    }

    #[test]
    fn test_semicolon_statements() {
        let module = parse("a = 1; b = 2; pass\n").unwrap();
        assert_eq!(module.body.len(), 3);
        assert!(matches!(module.body[2].kind, StmtKind::Pass));
    }

    #[test]
    fn test_unexpected_indent() {
        let err = parse("  x = 1\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Indentation);
    }

    #[test]
    fn test_unclosed_bracket_reported_at_opener() {
        let err = parse("x = 1\nfoo(a,\n  b\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnclosedBracket);
        assert_eq!(err.message, "'(' was never closed");
        assert_eq!((err.position.line, err.position.column), (2, 3));
    }

    #[test]
    fn test_unexpected_eof() {
        let err = parse("if x:\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Indentation);
        let err = parse("x = ").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_lex_error_surfaces() {
        let err = parse("s = 'abc\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedString);
        assert_eq!(err.position.line, 1);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("x = {}1{}\n", "(".repeat(500), ")".repeat(500));
        let err = parse(&deep).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::TooDeep);

        let shallow = format!("x = {}1{}\n", "(".repeat(20), ")".repeat(20));
        assert!(parse(&shallow).is_ok());
    }

    fn chain(sep: &str, terms: usize) -> String {
        format!("x = {}\n", vec!["a"; terms].join(sep))
    }

    #[test]
    fn test_long_operator_chain_is_too_deep() {
        for sep in [" + ", " * ", " | ", " if a else "] {
            let err = parse(&chain(sep, 50_000)).unwrap_err();
            assert_eq!(err.kind, SyntaxErrorKind::TooDeep, "{sep:?}");
            assert_eq!(err.position.line, 1);
        }
    }

    #[test]
    fn test_long_trailer_chain_is_too_deep() {
        for sep in [".", "()."] {
            let err = parse(&chain(sep, 50_000)).unwrap_err();
            assert_eq!(err.kind, SyntaxErrorKind::TooDeep, "{sep:?}");
        }
        let subscripts = format!("x = a{}\n", "[0]".repeat(50_000));
        assert_eq!(parse(&subscripts).unwrap_err().kind, SyntaxErrorKind::TooDeep);
    }

    #[test]
    fn test_long_chain_in_pattern_is_too_deep() {
        let source = format!("match x:\n    case {}:\n        pass\n", chain(".", 50_000).trim_start_matches("x = ").trim_end());
        assert_eq!(parse(&source).unwrap_err().kind, SyntaxErrorKind::TooDeep);
    }

    #[test]
    fn test_flat_sequences_are_not_chains() {
        for sep in [" and ", " < ", ", "] {
            assert!(parse(&chain(sep, 5_000)).is_ok(), "{sep:?}");
        }
        assert!(parse(&chain(" + ", 400)).is_ok());
        assert!(parse(&chain(".", 400)).is_ok());
    }

    #[test]
    fn test_chain_depth_combines_with_nesting() {
        // Parenthesised chains stack on the links counted outside them.
        let inner = chain(" + ", 60);
        let inner = inner.trim_start_matches("x = ").trim_end();
        let mut source = inner.to_owned();
        for _ in 0..20 {
            source = format!("{inner} + ({source})");
        }
        let err = parse(&format!("x = {source}\n")).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::TooDeep);
    }

    #[test]
    fn test_parse_expression_api() {
        let expr = parse_expression("a.b(c)").unwrap();
        assert!(matches!(expr.kind, ExprKind::Call { .. }));
        assert!(parse_expression("").is_err());
        assert!(parse_expression("a b").is_err());
    }

    #[test]
    fn test_precedence_ordering() {
        assert!(Precedence::Primary > Precedence::Lowest);
        assert!(Precedence::Multiplicative > Precedence::Additive);
        assert_eq!(Precedence::Additive.next(), Precedence::Multiplicative);
        assert_eq!(Precedence::Primary.next(), Precedence::Primary);
    }
}
