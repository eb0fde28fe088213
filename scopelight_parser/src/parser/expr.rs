//! Expression parsing.
//!
//! Binary operators go through a Pratt loop driven by [`Precedence`];
//! atoms, trailers, displays and comprehensions are plain recursive descent.

use super::{Parser, Precedence};
use crate::ast::{Comprehension, Expr, ExprKind, Keyword as KeywordArg};
use crate::token::{Keyword, TokenKind};
use scopelight_core::{ParseResult, Span, SyntaxErrorKind};

impl<'src> Parser<'src> {
    // =========================================================================
    // Pratt Core
    // =========================================================================

    /// Parse an expression whose operators bind at least as tightly as `min`.
    pub fn parse_precedence(&mut self, min: Precedence) -> ParseResult<Expr> {
        self.nested(|p| {
            let start = p.start_span();
            let mut left = p.parse_prefix()?;
            while let Some(prec) = p.infix_precedence() {
                if prec < min {
                    break;
                }
                p.chain_link()?;
                left = p.parse_infix(left, prec, start)?;
            }
            Ok(left)
        })
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        let start = self.start_span();
        match &self.current().kind {
            TokenKind::Keyword(Keyword::Not) => {
                self.advance();
                let operand = self.parse_precedence(Precedence::Not)?;
                Ok(Expr::new(ExprKind::UnaryOp(Box::new(operand)), self.span_from(start)))
            }
            TokenKind::Minus | TokenKind::Plus | TokenKind::Tilde => {
                self.advance();
                let operand = self.parse_precedence(Precedence::Unary)?;
                Ok(Expr::new(ExprKind::UnaryOp(Box::new(operand)), self.span_from(start)))
            }
            TokenKind::Keyword(Keyword::Await) => {
                self.advance();
                let operand = self.parse_primary()?;
                Ok(Expr::new(ExprKind::Await(Box::new(operand)), self.span_from(start)))
            }
            TokenKind::Keyword(Keyword::Lambda) => self.parse_lambda(),
            _ => self.parse_primary(),
        }
    }

    fn infix_precedence(&mut self) -> Option<Precedence> {
        if self.check_keyword(Keyword::Not) {
            let not_in = matches!(self.peek().kind, TokenKind::Keyword(Keyword::In));
            return not_in.then_some(Precedence::Comparison);
        }
        let prec = match &self.current().kind {
            TokenKind::Keyword(Keyword::If) => Precedence::Conditional,
            TokenKind::Keyword(Keyword::Or) => Precedence::Or,
            TokenKind::Keyword(Keyword::And) => Precedence::And,
            TokenKind::Keyword(Keyword::In | Keyword::Is) => Precedence::Comparison,
            kind if kind.is_comparison() => Precedence::Comparison,
            TokenKind::Pipe => Precedence::BitwiseOr,
            TokenKind::Caret => Precedence::BitwiseXor,
            TokenKind::Ampersand => Precedence::BitwiseAnd,
            TokenKind::LeftShift | TokenKind::RightShift => Precedence::Shift,
            TokenKind::Plus | TokenKind::Minus => Precedence::Additive,
            TokenKind::Star
            | TokenKind::Slash
            | TokenKind::DoubleSlash
            | TokenKind::Percent
            | TokenKind::At => Precedence::Multiplicative,
            TokenKind::DoubleStar => Precedence::Power,
            _ => return None,
        };
        Some(prec)
    }

    fn parse_infix(&mut self, left: Expr, prec: Precedence, start: u32) -> ParseResult<Expr> {
        let kind = match prec {
            Precedence::Conditional => {
                self.advance();
                let test = self.parse_precedence(Precedence::Or)?;
                self.expect_keyword(Keyword::Else, "expected 'else' after 'if' expression")?;
                let orelse = self.parse_precedence(Precedence::Lowest)?;
                ExprKind::IfExp {
                    test: Box::new(test),
                    body: Box::new(left),
                    orelse: Box::new(orelse),
                }
            }
            Precedence::Or | Precedence::And => {
                let kw = if prec == Precedence::Or { Keyword::Or } else { Keyword::And };
                let mut values = vec![left];
                while self.match_keyword(kw) {
                    values.push(self.parse_precedence(prec.next())?);
                }
                ExprKind::BoolOp(values)
            }
            Precedence::Comparison => {
                let mut comparators = Vec::new();
                while self.match_comparison_operator() {
                    comparators.push(self.parse_precedence(Precedence::BitwiseOr)?);
                }
                ExprKind::Compare {
                    left: Box::new(left),
                    comparators,
                }
            }
            Precedence::Power => {
                self.advance();
                let right = self.parse_precedence(Precedence::Unary)?;
                ExprKind::BinOp {
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            _ => {
                self.advance();
                let right = self.parse_precedence(prec.next())?;
                ExprKind::BinOp {
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
        };
        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// Consume `<`, `in`, `not in`, `is`, `is not`, ... if present.
    fn match_comparison_operator(&mut self) -> bool {
        if self.current().kind.is_comparison() || self.check_keyword(Keyword::In) {
            self.advance();
            return true;
        }
        if self.match_keyword(Keyword::Is) {
            self.match_keyword(Keyword::Not);
            return true;
        }
        if self.check_keyword(Keyword::Not)
            && matches!(self.peek().kind, TokenKind::Keyword(Keyword::In))
        {
            self.advance();
            self.advance();
            return true;
        }
        false
    }

    // =========================================================================
    // Expression Lists
    // =========================================================================

    /// `star_expressions`: a comma list with optional `*x` items; more than
    /// one item or a trailing comma makes a tuple.
    pub fn parse_star_expressions(&mut self) -> ParseResult<Expr> {
        self.parse_comma_list(Self::parse_star_expression)
    }

    /// `star_expressions` or a `yield` expression.
    pub fn parse_star_expressions_or_yield(&mut self) -> ParseResult<Expr> {
        if self.check_keyword(Keyword::Yield) {
            self.parse_yield()
        } else {
            self.parse_star_expressions()
        }
    }

    /// Comma list of `star_named_expression` (match subjects, displays).
    pub fn parse_star_named_expressions(&mut self) -> ParseResult<Expr> {
        self.parse_comma_list(Self::parse_star_named_expression)
    }

    /// Comma list of loop/comprehension targets, stopping before `in`.
    pub fn parse_target_list(&mut self) -> ParseResult<Expr> {
        let target = self.parse_comma_list(|p| {
            if p.check(&TokenKind::Star) {
                let start = p.start_span();
                p.advance();
                let inner = p.parse_precedence(Precedence::BitwiseOr)?;
                Ok(Expr::new(ExprKind::Starred(Box::new(inner)), p.span_from(start)))
            } else {
                p.parse_precedence(Precedence::BitwiseOr)
            }
        })?;
        self.validate_target(&target)?;
        Ok(target)
    }

    fn parse_comma_list(
        &mut self,
        mut item: impl FnMut(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let start = self.start_span();
        let first = item(self)?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if !self.starts_expression() {
                break;
            }
            elts.push(item(self)?);
        }
        Ok(Expr::new(ExprKind::Tuple(elts), self.span_from(start)))
    }

    /// `*x` or an `expression`.
    pub fn parse_star_expression(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::Star) {
            let start = self.start_span();
            self.advance();
            let inner = self.parse_precedence(Precedence::BitwiseOr)?;
            return Ok(Expr::new(ExprKind::Starred(Box::new(inner)), self.span_from(start)));
        }
        self.parse_expression()
    }

    /// `*x` or a `named_expression`.
    pub fn parse_star_named_expression(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::Star) {
            return self.parse_star_expression();
        }
        self.parse_named_expression()
    }

    /// `name := value` or an `expression`.
    pub fn parse_named_expression(&mut self) -> ParseResult<Expr> {
        let is_walrus = self.current().ident().is_some()
            && matches!(self.peek().kind, TokenKind::ColonEqual);
        if !is_walrus {
            return self.parse_expression();
        }
        let start = self.start_span();
        let target = self.parse_primary()?;
        self.expect(&TokenKind::ColonEqual, "expected ':='")?;
        let value = self.parse_expression()?;
        Ok(Expr::new(
            ExprKind::NamedExpr {
                target: Box::new(target),
                value: Box::new(value),
            },
            self.span_from(start),
        ))
    }

    /// `yield`, `yield value[, ...]` or `yield from value`.
    pub fn parse_yield(&mut self) -> ParseResult<Expr> {
        let start = self.start_span();
        self.expect_keyword(Keyword::Yield, "expected 'yield'")?;
        let kind = if self.match_keyword(Keyword::From) {
            ExprKind::YieldFrom(Box::new(self.parse_expression()?))
        } else if self.starts_expression() {
            ExprKind::Yield(Some(Box::new(self.parse_star_expressions()?)))
        } else {
            ExprKind::Yield(None)
        };
        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// Whether the current token can begin an expression.
    pub(crate) fn starts_expression(&self) -> bool {
        let kind = &self.current().kind;
        kind.starts_atom()
            || matches!(
                kind,
                TokenKind::Minus
                    | TokenKind::Plus
                    | TokenKind::Tilde
                    | TokenKind::Star
                    | TokenKind::Keyword(Keyword::Not)
            )
    }

    // =========================================================================
    // Primaries and Atoms
    // =========================================================================

    /// An atom followed by any number of `.name`, `(...)` and `[...]`.
    pub fn parse_primary(&mut self) -> ParseResult<Expr> {
        self.chained(|p| {
            let start = p.start_span();
            let mut expr = p.parse_atom()?;
            loop {
                if !matches!(
                    p.current().kind,
                    TokenKind::Dot | TokenKind::LeftParen | TokenKind::LeftBracket
                ) {
                    return Ok(expr);
                }
                p.chain_link()?;
                let kind = match p.current().kind {
                    TokenKind::Dot => {
                        p.advance();
                        let attr = p.expect_identifier("expected attribute name after '.'")?;
                        ExprKind::Attribute {
                            value: Box::new(expr),
                            attr,
                        }
                    }
                    TokenKind::LeftParen => p.parse_call(expr)?,
                    _ => {
                        p.advance();
                        let slice = p.parse_slices()?;
                        p.expect(&TokenKind::RightBracket, "expected ']'")?;
                        ExprKind::Subscript {
                            value: Box::new(expr),
                            slice: Box::new(slice),
                        }
                    }
                };
                expr = Expr::new(kind, p.span_from(start));
            }
        })
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let start = self.start_span();
        let kind = match &self.current().kind {
            TokenKind::Ident(name) => {
                let kind = ExprKind::Name(name.clone());
                self.advance();
                kind
            }
            TokenKind::Number
            | TokenKind::Ellipsis
            | TokenKind::Keyword(Keyword::True | Keyword::False | Keyword::None) => {
                self.advance();
                ExprKind::Constant
            }
            TokenKind::String | TokenKind::Bytes | TokenKind::FString(_) => {
                return self.parse_strings();
            }
            TokenKind::LeftParen => return self.parse_paren(),
            TokenKind::LeftBracket => return self.parse_list_display(),
            TokenKind::LeftBrace => return self.parse_brace_display(),
            _ => return Err(self.error_at_current("invalid syntax")),
        };
        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// Adjacent string literals. F-string fields are parsed into expressions.
    fn parse_strings(&mut self) -> ParseResult<Expr> {
        let start = self.start_span();
        let mut fields: Vec<Span> = Vec::new();
        let (mut has_bytes, mut has_text, mut has_format) = (false, false, false);
        loop {
            match &self.current().kind {
                TokenKind::String => has_text = true,
                TokenKind::Bytes => has_bytes = true,
                TokenKind::FString(spans) => {
                    has_text = true;
                    has_format = true;
                    fields.extend_from_slice(spans);
                }
                _ => break,
            }
            self.advance();
        }
        let span = self.span_from(start);
        if has_bytes && has_text {
            return Err(self.error_at(
                SyntaxErrorKind::UnexpectedToken,
                "cannot mix bytes and nonbytes literals",
                span,
            ));
        }
        if !has_format {
            return Ok(Expr::new(ExprKind::Constant, span));
        }
        let mut values = Vec::with_capacity(fields.len());
        for field in fields {
            let mut sub = Parser::fragment(self.source(), field, self.depth, self.expr_depth);
            values.push(sub.parse_standalone_expression()?);
        }
        Ok(Expr::new(ExprKind::JoinedStr(values), span))
    }

    /// `( ... )`: unit tuple, grouping, tuple, generator or yield.
    fn parse_paren(&mut self) -> ParseResult<Expr> {
        let start = self.start_span();
        self.advance();
        if self.match_token(&TokenKind::RightParen) {
            return Ok(Expr::new(ExprKind::Tuple(Vec::new()), self.span_from(start)));
        }
        if self.check_keyword(Keyword::Yield) {
            let expr = self.parse_yield()?;
            self.expect(&TokenKind::RightParen, "expected ')'")?;
            return Ok(expr);
        }
        let first = self.parse_star_named_expression()?;
        if self.starts_comprehension() {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(&TokenKind::RightParen, "expected ')'")?;
            let kind = ExprKind::GeneratorExp {
                elt: Box::new(first),
                generators,
            };
            return Ok(Expr::new(kind, self.span_from(start)));
        }
        if self.check(&TokenKind::Comma) {
            let mut elts = vec![first];
            while self.match_token(&TokenKind::Comma) {
                if self.check(&TokenKind::RightParen) {
                    break;
                }
                elts.push(self.parse_star_named_expression()?);
            }
            self.expect(&TokenKind::RightParen, "expected ')'")?;
            return Ok(Expr::new(ExprKind::Tuple(elts), self.span_from(start)));
        }
        self.expect(&TokenKind::RightParen, "expected ')'")?;
        Ok(first)
    }

    /// `[ ... ]`: list or list comprehension.
    fn parse_list_display(&mut self) -> ParseResult<Expr> {
        let start = self.start_span();
        self.advance();
        if self.match_token(&TokenKind::RightBracket) {
            return Ok(Expr::new(ExprKind::List(Vec::new()), self.span_from(start)));
        }
        let first = self.parse_star_named_expression()?;
        let kind = if self.starts_comprehension() {
            ExprKind::ListComp {
                elt: Box::new(first),
                generators: self.parse_comprehension_clauses()?,
            }
        } else {
            ExprKind::List(self.parse_display_tail(first, &TokenKind::RightBracket)?)
        };
        self.expect(&TokenKind::RightBracket, "expected ']'")?;
        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// `{ ... }`: dict, set or their comprehensions.
    fn parse_brace_display(&mut self) -> ParseResult<Expr> {
        let start = self.start_span();
        self.advance();
        if self.match_token(&TokenKind::RightBrace) {
            let kind = ExprKind::Dict {
                keys: Vec::new(),
                values: Vec::new(),
            };
            return Ok(Expr::new(kind, self.span_from(start)));
        }

        let kind = if self.match_token(&TokenKind::DoubleStar) {
            let value = self.parse_precedence(Precedence::BitwiseOr)?;
            self.parse_dict_tail(None, value)?
        } else {
            let first = self.parse_star_named_expression()?;
            if self.match_token(&TokenKind::Colon) {
                let value = self.parse_expression()?;
                if self.starts_comprehension() {
                    ExprKind::DictComp {
                        key: Box::new(first),
                        value: Box::new(value),
                        generators: self.parse_comprehension_clauses()?,
                    }
                } else {
                    self.parse_dict_tail(Some(first), value)?
                }
            } else if self.starts_comprehension() {
                ExprKind::SetComp {
                    elt: Box::new(first),
                    generators: self.parse_comprehension_clauses()?,
                }
            } else {
                ExprKind::Set(self.parse_display_tail(first, &TokenKind::RightBrace)?)
            }
        };
        self.expect(&TokenKind::RightBrace, "expected '}'")?;
        Ok(Expr::new(kind, self.span_from(start)))
    }

    fn parse_display_tail(&mut self, first: Expr, close: &TokenKind) -> ParseResult<Vec<Expr>> {
        let mut elts = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(close) {
                break;
            }
            elts.push(self.parse_star_named_expression()?);
        }
        Ok(elts)
    }

    fn parse_dict_tail(&mut self, first_key: Option<Expr>, first_value: Expr) -> ParseResult<ExprKind> {
        let mut keys = vec![first_key];
        let mut values = vec![first_value];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::RightBrace) {
                break;
            }
            if self.match_token(&TokenKind::DoubleStar) {
                keys.push(None);
                values.push(self.parse_precedence(Precedence::BitwiseOr)?);
            } else {
                keys.push(Some(self.parse_expression()?));
                self.expect(&TokenKind::Colon, "expected ':'")?;
                values.push(self.parse_expression()?);
            }
        }
        Ok(ExprKind::Dict { keys, values })
    }

    // =========================================================================
    // Comprehensions
    // =========================================================================

    pub(crate) fn starts_comprehension(&mut self) -> bool {
        self.check_keyword(Keyword::For)
            || (self.check_keyword(Keyword::Async)
                && matches!(self.peek().kind, TokenKind::Keyword(Keyword::For)))
    }

    fn parse_comprehension_clauses(&mut self) -> ParseResult<Vec<Comprehension>> {
        let mut generators = Vec::new();
        while self.starts_comprehension() {
            let is_async = self.match_keyword(Keyword::Async);
            self.expect_keyword(Keyword::For, "expected 'for'")?;
            let target = self.parse_target_list()?;
            self.expect_keyword(Keyword::In, "expected 'in'")?;
            let iter = self.parse_precedence(Precedence::Or)?;
            let mut ifs = Vec::new();
            while self.match_keyword(Keyword::If) {
                ifs.push(self.parse_precedence(Precedence::Or)?);
            }
            generators.push(Comprehension {
                target,
                iter,
                ifs,
                is_async,
            });
        }
        Ok(generators)
    }

    // =========================================================================
    // Trailers
    // =========================================================================

    /// `func(...)`. The current token is `(`.
    fn parse_call(&mut self, func: Expr) -> ParseResult<ExprKind> {
        let (args, keywords) = self.parse_arguments()?;
        Ok(ExprKind::Call {
            func: Box::new(func),
            args,
            keywords,
        })
    }

    /// A parenthesized call argument list, shared by calls and class headers.
    pub(crate) fn parse_arguments(&mut self) -> ParseResult<(Vec<Expr>, Vec<KeywordArg>)> {
        self.expect(&TokenKind::LeftParen, "expected '('")?;
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            let start = self.start_span();
            if self.match_token(&TokenKind::Star) {
                let inner = self.parse_expression()?;
                args.push(Expr::new(ExprKind::Starred(Box::new(inner)), self.span_from(start)));
            } else if self.match_token(&TokenKind::DoubleStar) {
                keywords.push(KeywordArg {
                    arg: None,
                    value: self.parse_expression()?,
                });
            } else if self.current().ident().is_some()
                && matches!(self.peek().kind, TokenKind::Equal)
            {
                let arg = self.expect_identifier("expected keyword name")?;
                self.advance();
                keywords.push(KeywordArg {
                    arg: Some(arg),
                    value: self.parse_expression()?,
                });
            } else {
                let value = self.parse_named_expression()?;
                if self.starts_comprehension() {
                    let generators = self.parse_comprehension_clauses()?;
                    let kind = ExprKind::GeneratorExp {
                        elt: Box::new(value),
                        generators,
                    };
                    args.push(Expr::new(kind, self.span_from(start)));
                } else {
                    args.push(value);
                }
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "expected ')'")?;
        Ok((args, keywords))
    }

    /// Subscript contents: one slice item, or a tuple of them.
    fn parse_slices(&mut self) -> ParseResult<Expr> {
        let start = self.start_span();
        let first = self.parse_slice_item()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::RightBracket) {
                break;
            }
            elts.push(self.parse_slice_item()?);
        }
        Ok(Expr::new(ExprKind::Tuple(elts), self.span_from(start)))
    }

    fn parse_slice_item(&mut self) -> ParseResult<Expr> {
        let start = self.start_span();
        let lower = if self.check(&TokenKind::Colon) {
            None
        } else {
            let expr = self.parse_star_named_expression()?;
            if !self.check(&TokenKind::Colon) {
                return Ok(expr);
            }
            Some(Box::new(expr))
        };
        self.expect(&TokenKind::Colon, "expected ':'")?;
        let ends_part = |p: &Self| {
            p.check(&TokenKind::Colon)
                || p.check(&TokenKind::Comma)
                || p.check(&TokenKind::RightBracket)
        };
        let upper = if ends_part(self) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        let step = if self.match_token(&TokenKind::Colon) && !ends_part(self) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Expr::new(ExprKind::Slice { lower, upper, step }, self.span_from(start)))
    }

    fn parse_lambda(&mut self) -> ParseResult<Expr> {
        let start = self.start_span();
        self.expect_keyword(Keyword::Lambda, "expected 'lambda'")?;
        let args = self.parse_parameters(&TokenKind::Colon, false)?;
        self.expect(&TokenKind::Colon, "expected ':'")?;
        let body = self.parse_expression()?;
        Ok(Expr::new(
            ExprKind::Lambda {
                args: Box::new(args),
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    // =========================================================================
    // Targets
    // =========================================================================

    /// Check that `expr` can be bound by assignment, `for`, `with` or `del`.
    pub(crate) fn validate_target(&self, expr: &Expr) -> ParseResult<()> {
        match &expr.kind {
            ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => Ok(()),
            ExprKind::Tuple(elts) | ExprKind::List(elts) => {
                elts.iter().try_for_each(|elt| self.validate_target(elt))
            }
            ExprKind::Starred(inner) => self.validate_target(inner),
            other => {
                let what = match other {
                    ExprKind::Constant | ExprKind::JoinedStr(_) => "literal",
                    ExprKind::Call { .. } => "function call",
                    ExprKind::NamedExpr { .. } => "named expression",
                    ExprKind::Lambda { .. } => "lambda",
                    _ => "expression",
                };
                Err(self.error_at(
                    SyntaxErrorKind::InvalidTarget,
                    format!("cannot assign to {what}"),
                    expr.span,
                ))
            }
        }
    }
}
