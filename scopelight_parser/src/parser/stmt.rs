//! Statement parsing: simple statements, compound statements, definitions
//! and their parameter lists.

use super::{Parser, Precedence};
use crate::ast::{
    Alias, Arg, Arguments, ClassDef, ExceptHandler, Expr, ExprKind, FunctionDef, Identifier,
    MatchCase, Stmt, StmtKind, TypeParam, TypeParamKind, WithItem,
};
use crate::token::{Keyword, TokenKind};
use scopelight_core::{ParseResult, SyntaxErrorKind};
use smallvec::{smallvec, SmallVec};

impl<'src> Parser<'src> {
    // =========================================================================
    // Dispatch
    // =========================================================================

    pub(super) fn parse_statement_inner(&mut self) -> ParseResult<SmallVec<[Stmt; 1]>> {
        let stmt = match &self.current().kind {
            TokenKind::Keyword(Keyword::If) => self.parse_if()?,
            TokenKind::Keyword(Keyword::While) => self.parse_while()?,
            TokenKind::Keyword(Keyword::For) => {
                let start = self.start_span();
                self.parse_for(start, false)?
            }
            TokenKind::Keyword(Keyword::Try) => self.parse_try()?,
            TokenKind::Keyword(Keyword::With) => {
                let start = self.start_span();
                self.parse_with(start, false)?
            }
            TokenKind::Keyword(Keyword::Def) | TokenKind::Keyword(Keyword::Class) => {
                self.parse_definition(Vec::new())?
            }
            TokenKind::Keyword(Keyword::Async) => self.parse_async()?,
            TokenKind::At => self.parse_decorated()?,
            TokenKind::Ident(name) if name == "match" => match self.try_parse_match()? {
                Some(stmt) => stmt,
                None => return self.parse_simple_statements(),
            },
            _ => return self.parse_simple_statements(),
        };
        Ok(smallvec![stmt])
    }

    /// Simple statements separated by `;` and ended by a newline.
    fn parse_simple_statements(&mut self) -> ParseResult<SmallVec<[Stmt; 1]>> {
        let mut stmts = SmallVec::new();
        loop {
            stmts.push(self.parse_simple_statement()?);
            if !self.match_token(&TokenKind::Semicolon) {
                break;
            }
            if self.check(&TokenKind::Newline) || self.is_at_end() {
                break;
            }
        }
        if !self.match_token(&TokenKind::Newline) && !self.is_at_end() {
            return Err(self.error_at_current("invalid syntax"));
        }
        Ok(stmts)
    }

    fn parse_simple_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.start_span();
        let is_type_alias =
            self.check_soft("type") && matches!(self.peek().kind, TokenKind::Ident(_));
        let kind = match &self.current().kind {
            TokenKind::Keyword(Keyword::Pass) => {
                self.advance();
                StmtKind::Pass
            }
            TokenKind::Keyword(Keyword::Break) => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.advance();
                StmtKind::Continue
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();
                let value = if self.starts_expression() {
                    Some(Box::new(self.parse_star_expressions()?))
                } else {
                    None
                };
                StmtKind::Return(value)
            }
            TokenKind::Keyword(Keyword::Raise) => {
                self.advance();
                let mut exc = None;
                let mut cause = None;
                if self.starts_expression() {
                    exc = Some(Box::new(self.parse_expression()?));
                    if self.match_keyword(Keyword::From) {
                        cause = Some(Box::new(self.parse_expression()?));
                    }
                }
                StmtKind::Raise { exc, cause }
            }
            TokenKind::Keyword(Keyword::Global) => {
                self.advance();
                StmtKind::Global(self.parse_name_list()?)
            }
            TokenKind::Keyword(Keyword::Nonlocal) => {
                self.advance();
                StmtKind::Nonlocal(self.parse_name_list()?)
            }
            TokenKind::Keyword(Keyword::Del) => {
                self.advance();
                let mut targets = Vec::new();
                loop {
                    let target = self.parse_precedence(Precedence::BitwiseOr)?;
                    self.validate_target(&target)?;
                    targets.push(target);
                    if !self.match_token(&TokenKind::Comma) || !self.starts_expression() {
                        break;
                    }
                }
                StmtKind::Delete(targets)
            }
            TokenKind::Keyword(Keyword::Assert) => {
                self.advance();
                let test = Box::new(self.parse_expression()?);
                let msg = if self.match_token(&TokenKind::Comma) {
                    Some(Box::new(self.parse_expression()?))
                } else {
                    None
                };
                StmtKind::Assert { test, msg }
            }
            TokenKind::Keyword(Keyword::Import) => self.parse_import()?,
            TokenKind::Keyword(Keyword::From) => self.parse_import_from()?,
            TokenKind::Ident(_) if is_type_alias => self.parse_type_alias()?,
            _ => self.parse_expression_statement()?,
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    // =========================================================================
    // Simple Statements
    // =========================================================================

    /// Expression statement, assignment, augmented or annotated assignment.
    fn parse_expression_statement(&mut self) -> ParseResult<StmtKind> {
        let first = self.parse_star_expressions_or_yield()?;

        if self.check(&TokenKind::Equal) {
            let mut targets = vec![first];
            let value = loop {
                self.advance();
                let next = self.parse_star_expressions_or_yield()?;
                if !self.check(&TokenKind::Equal) {
                    break next;
                }
                targets.push(next);
            };
            for target in &targets {
                self.validate_target(target)?;
            }
            if let ExprKind::Starred(_) = value.kind {
                return Err(self.error_at(
                    SyntaxErrorKind::InvalidTarget,
                    "can't use starred expression here",
                    value.span,
                ));
            }
            return Ok(StmtKind::Assign {
                targets,
                value: Box::new(value),
            });
        }

        if self.check(&TokenKind::AugAssign) {
            self.require_single_target(&first, "illegal expression for augmented assignment")?;
            self.advance();
            let value = self.parse_star_expressions_or_yield()?;
            return Ok(StmtKind::AugAssign {
                target: Box::new(first),
                value: Box::new(value),
            });
        }

        if self.check(&TokenKind::Colon) {
            self.require_single_target(&first, "only single target (not tuple) can be annotated")?;
            self.advance();
            let annotation = self.parse_expression()?;
            let value = if self.match_token(&TokenKind::Equal) {
                Some(Box::new(self.parse_star_expressions_or_yield()?))
            } else {
                None
            };
            return Ok(StmtKind::AnnAssign {
                target: Box::new(first),
                annotation: Box::new(annotation),
                value,
            });
        }

        Ok(StmtKind::Expr(Box::new(first)))
    }

    fn require_single_target(&self, target: &Expr, msg: &str) -> ParseResult<()> {
        match target.kind {
            ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => Ok(()),
            _ => Err(self.error_at(SyntaxErrorKind::InvalidTarget, msg, target.span)),
        }
    }

    fn parse_name_list(&mut self) -> ParseResult<Vec<Identifier>> {
        let mut names = vec![self.expect_identifier("expected a name")?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.expect_identifier("expected a name")?);
        }
        Ok(names)
    }

    /// `import a.b as c, d`
    fn parse_import(&mut self) -> ParseResult<StmtKind> {
        self.expect_keyword(Keyword::Import, "expected 'import'")?;
        let mut names = vec![self.parse_dotted_alias()?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.parse_dotted_alias()?);
        }
        Ok(StmtKind::Import(names))
    }

    fn parse_dotted_alias(&mut self) -> ParseResult<Alias> {
        let start = self.start_span();
        let path = self.parse_dotted_name()?;
        let asname = self.parse_as_name()?;
        Ok(Alias {
            path,
            asname,
            span: self.span_from(start),
        })
    }

    fn parse_dotted_name(&mut self) -> ParseResult<Vec<Identifier>> {
        let mut path = vec![self.expect_identifier("expected module name")?];
        while self.match_token(&TokenKind::Dot) {
            path.push(self.expect_identifier("expected module name after '.'")?);
        }
        Ok(path)
    }

    fn parse_as_name(&mut self) -> ParseResult<Option<Identifier>> {
        if self.match_keyword(Keyword::As) {
            Ok(Some(self.expect_identifier("expected a name after 'as'")?))
        } else {
            Ok(None)
        }
    }

    /// `from ..pkg.mod import a as b, c` / `from m import (a, b,)` / `from m import *`
    fn parse_import_from(&mut self) -> ParseResult<StmtKind> {
        self.expect_keyword(Keyword::From, "expected 'from'")?;
        let mut level = 0;
        loop {
            if self.match_token(&TokenKind::Dot) {
                level += 1;
            } else if self.match_token(&TokenKind::Ellipsis) {
                level += 3;
            } else {
                break;
            }
        }
        let module = if self.current().ident().is_some() {
            self.parse_dotted_name()?
        } else if level == 0 {
            return Err(self.error_at_current("expected module name"));
        } else {
            Vec::new()
        };
        self.expect_keyword(Keyword::Import, "expected 'import'")?;

        let names = if self.check(&TokenKind::Star) {
            let star = Identifier::new("*", self.current().span);
            self.advance();
            let span = star.span;
            vec![Alias {
                path: vec![star],
                asname: None,
                span,
            }]
        } else if self.match_token(&TokenKind::LeftParen) {
            let mut names = vec![self.parse_import_alias()?];
            while self.match_token(&TokenKind::Comma) {
                if self.check(&TokenKind::RightParen) {
                    break;
                }
                names.push(self.parse_import_alias()?);
            }
            self.expect(&TokenKind::RightParen, "expected ')'")?;
            names
        } else {
            let mut names = vec![self.parse_import_alias()?];
            while self.match_token(&TokenKind::Comma) {
                names.push(self.parse_import_alias()?);
            }
            names
        };
        Ok(StmtKind::ImportFrom {
            module,
            names,
            level,
        })
    }

    fn parse_import_alias(&mut self) -> ParseResult<Alias> {
        let start = self.start_span();
        let name = self.expect_identifier("expected a name to import")?;
        let asname = self.parse_as_name()?;
        Ok(Alias {
            path: vec![name],
            asname,
            span: self.span_from(start),
        })
    }

    /// `type Name[T] = value`. The current token is the soft keyword `type`.
    fn parse_type_alias(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let name = self.expect_identifier("expected type alias name")?;
        let type_params = self.parse_optional_type_params()?;
        self.expect(&TokenKind::Equal, "expected '=' in type alias")?;
        let value = self.parse_expression()?;
        Ok(StmtKind::TypeAlias {
            name,
            type_params,
            value: Box::new(value),
        })
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// `: NEWLINE INDENT stmt+ DEDENT` or `: simple_stmts`.
    pub(crate) fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(&TokenKind::Colon, "expected ':'")?;
        if !self.match_token(&TokenKind::Newline) {
            return Ok(self.parse_simple_statements()?.into_vec());
        }
        self.expect_indent()?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            body.extend(self.parse_statement()?);
        }
        self.match_token(&TokenKind::Dedent);
        Ok(body)
    }

    pub(crate) fn expect_indent(&mut self) -> ParseResult<()> {
        if self.match_token(&TokenKind::Indent) {
            return Ok(());
        }
        if matches!(self.current().kind, TokenKind::Error(_)) {
            return Err(self.error_at_current("invalid syntax"));
        }
        Err(self.error_with(SyntaxErrorKind::Indentation, "expected an indented block"))
    }

    // =========================================================================
    // Compound Statements
    // =========================================================================

    /// `if` or `elif` chain.
    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let start = self.start_span();
        self.advance();
        let test = self.parse_named_expression()?;
        let body = self.parse_block()?;
        let orelse = if self.check_keyword(Keyword::Elif) {
            vec![self.parse_if()?]
        } else if self.match_keyword(Keyword::Else) {
            self.parse_block()?
        } else {
            Vec::new()
        };
        let kind = StmtKind::If {
            test: Box::new(test),
            body,
            orelse,
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let start = self.start_span();
        self.expect_keyword(Keyword::While, "expected 'while'")?;
        let test = self.parse_named_expression()?;
        let body = self.parse_block()?;
        let orelse = self.parse_else_block()?;
        let kind = StmtKind::While {
            test: Box::new(test),
            body,
            orelse,
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    fn parse_else_block(&mut self) -> ParseResult<Vec<Stmt>> {
        if self.match_keyword(Keyword::Else) {
            self.parse_block()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_for(&mut self, start: u32, is_async: bool) -> ParseResult<Stmt> {
        self.expect_keyword(Keyword::For, "expected 'for'")?;
        let target = self.parse_target_list()?;
        self.expect_keyword(Keyword::In, "expected 'in'")?;
        let iter = self.parse_star_expressions()?;
        let body = self.parse_block()?;
        let orelse = self.parse_else_block()?;
        let kind = StmtKind::For {
            target: Box::new(target),
            iter: Box::new(iter),
            body,
            orelse,
            is_async,
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    fn parse_try(&mut self) -> ParseResult<Stmt> {
        let start = self.start_span();
        self.expect_keyword(Keyword::Try, "expected 'try'")?;
        let body = self.parse_block()?;

        let mut handlers = Vec::new();
        let mut is_star = false;
        while self.check_keyword(Keyword::Except) {
            let handler_start = self.start_span();
            self.advance();
            if self.match_token(&TokenKind::Star) {
                is_star = true;
            }
            let mut typ = None;
            let mut name = None;
            if !self.check(&TokenKind::Colon) {
                typ = Some(self.parse_expression()?);
                name = self.parse_as_name()?;
            }
            let handler_body = self.parse_block()?;
            handlers.push(ExceptHandler {
                typ,
                name,
                body: handler_body,
                span: self.span_from(handler_start),
            });
        }

        let orelse = if handlers.is_empty() {
            Vec::new()
        } else {
            self.parse_else_block()?
        };
        let finalbody = if self.match_keyword(Keyword::Finally) {
            self.parse_block()?
        } else {
            Vec::new()
        };
        if handlers.is_empty() && finalbody.is_empty() {
            return Err(self.error_at_current("expected 'except' or 'finally' block"));
        }

        let kind = StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
            is_star,
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    fn parse_with(&mut self, start: u32, is_async: bool) -> ParseResult<Stmt> {
        self.expect_keyword(Keyword::With, "expected 'with'")?;
        let items = match self.try_parse_parenthesized_with_items() {
            Some(items) => items,
            None => {
                let mut items = vec![self.parse_with_item()?];
                while self.match_token(&TokenKind::Comma) {
                    items.push(self.parse_with_item()?);
                }
                items
            }
        };
        let body = self.parse_block()?;
        let kind = StmtKind::With {
            items,
            body,
            is_async,
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    /// `with (a as b, c as d,):`. Falls back when the parentheses turn out
    /// to belong to an expression.
    fn try_parse_parenthesized_with_items(&mut self) -> Option<Vec<WithItem>> {
        if !self.check(&TokenKind::LeftParen) {
            return None;
        }
        let checkpoint = self.checkpoint();
        let attempt = (|| -> ParseResult<Vec<WithItem>> {
            self.advance();
            let mut items = vec![self.parse_with_item()?];
            while self.match_token(&TokenKind::Comma) {
                if self.check(&TokenKind::RightParen) {
                    break;
                }
                items.push(self.parse_with_item()?);
            }
            self.expect(&TokenKind::RightParen, "expected ')'")?;
            Ok(items)
        })();
        match attempt {
            Ok(items) if self.check(&TokenKind::Colon) => Some(items),
            _ => {
                self.restore(checkpoint);
                None
            }
        }
    }

    fn parse_with_item(&mut self) -> ParseResult<WithItem> {
        let context_expr = self.parse_expression()?;
        let optional_vars = if self.match_keyword(Keyword::As) {
            let target = self.parse_precedence(Precedence::BitwiseOr)?;
            self.validate_target(&target)?;
            Some(target)
        } else {
            None
        };
        Ok(WithItem {
            context_expr,
            optional_vars,
        })
    }

    /// `match subject:` followed by `case` blocks. Returns `None` (with the
    /// position restored) when `match` is used as an ordinary name.
    fn try_parse_match(&mut self) -> ParseResult<Option<Stmt>> {
        let start = self.start_span();
        let checkpoint = self.checkpoint();
        self.advance();
        let subject = match self.parse_star_named_expressions() {
            Ok(subject) if self.check(&TokenKind::Colon) => subject,
            _ => {
                self.restore(checkpoint);
                return Ok(None);
            }
        };
        if !matches!(self.peek().kind, TokenKind::Newline) {
            self.restore(checkpoint);
            return Ok(None);
        }
        self.advance();
        self.advance();
        self.expect_indent()?;

        let mut cases = Vec::new();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            if !self.check_soft("case") {
                return Err(self.error_at_current("expected 'case' block"));
            }
            self.advance();
            let pattern = self.parse_case_patterns()?;
            let guard = if self.match_keyword(Keyword::If) {
                Some(self.parse_named_expression()?)
            } else {
                None
            };
            let body = self.parse_block()?;
            cases.push(MatchCase {
                pattern,
                guard,
                body,
            });
        }
        self.match_token(&TokenKind::Dedent);

        let kind = StmtKind::Match {
            subject: Box::new(subject),
            cases,
        };
        Ok(Some(Stmt::new(kind, self.span_from(start))))
    }

    // =========================================================================
    // Definitions
    // =========================================================================

    /// `async def`, `async for`, `async with`.
    fn parse_async(&mut self) -> ParseResult<Stmt> {
        let start = self.start_span();
        self.advance();
        match &self.current().kind {
            TokenKind::Keyword(Keyword::Def) => self.parse_function_def(start, Vec::new(), true),
            TokenKind::Keyword(Keyword::For) => self.parse_for(start, true),
            TokenKind::Keyword(Keyword::With) => self.parse_with(start, true),
            _ => Err(self.error_at_current("expected 'def', 'for' or 'with' after 'async'")),
        }
    }

    fn parse_decorated(&mut self) -> ParseResult<Stmt> {
        let mut decorators = Vec::new();
        while self.match_token(&TokenKind::At) {
            decorators.push(self.parse_named_expression()?);
            self.expect(&TokenKind::Newline, "expected newline after decorator")?;
        }
        self.parse_definition(decorators)
    }

    fn parse_definition(&mut self, decorators: Vec<Expr>) -> ParseResult<Stmt> {
        let start = self.start_span();
        if self.match_keyword(Keyword::Async) {
            if !self.check_keyword(Keyword::Def) {
                return Err(self.error_at_current("expected 'def' after 'async'"));
            }
            return self.parse_function_def(start, decorators, true);
        }
        if self.check_keyword(Keyword::Class) {
            return self.parse_class_def(start, decorators);
        }
        if self.check_keyword(Keyword::Def) {
            return self.parse_function_def(start, decorators, false);
        }
        Err(self.error_at_current("expected 'def' or 'class' after decorator"))
    }

    fn parse_function_def(
        &mut self,
        start: u32,
        decorator_list: Vec<Expr>,
        is_async: bool,
    ) -> ParseResult<Stmt> {
        self.expect_keyword(Keyword::Def, "expected 'def'")?;
        let name = self.expect_identifier("expected function name")?;
        let type_params = self.parse_optional_type_params()?;
        self.expect(&TokenKind::LeftParen, "expected '('")?;
        let args = self.parse_parameters(&TokenKind::RightParen, true)?;
        self.expect(&TokenKind::RightParen, "expected ')'")?;
        let returns = if self.match_token(&TokenKind::Arrow) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        let body = self.parse_block()?;
        let def = FunctionDef {
            name,
            type_params,
            args,
            body,
            decorator_list,
            returns,
            is_async,
        };
        Ok(Stmt::new(StmtKind::FunctionDef(Box::new(def)), self.span_from(start)))
    }

    fn parse_class_def(&mut self, start: u32, decorator_list: Vec<Expr>) -> ParseResult<Stmt> {
        self.expect_keyword(Keyword::Class, "expected 'class'")?;
        let name = self.expect_identifier("expected class name")?;
        let type_params = self.parse_optional_type_params()?;
        let (bases, keywords) = if self.check(&TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            (Vec::new(), Vec::new())
        };
        let body = self.parse_block()?;
        let def = ClassDef {
            name,
            type_params,
            bases,
            keywords,
            body,
            decorator_list,
        };
        Ok(Stmt::new(StmtKind::ClassDef(Box::new(def)), self.span_from(start)))
    }

    /// Parameter list up to (not including) `closing`. Lambdas pass
    /// `annotations = false`.
    pub(crate) fn parse_parameters(
        &mut self,
        closing: &TokenKind,
        annotations: bool,
    ) -> ParseResult<Arguments> {
        let mut params = Arguments::default();
        let mut keyword_only = false;

        while !self.check(closing) {
            if self.match_token(&TokenKind::Slash) {
                if params.args.is_empty() || !params.posonlyargs.is_empty() || keyword_only {
                    return Err(self.error_at(
                        SyntaxErrorKind::UnexpectedToken,
                        "at least one argument must precede /",
                        self.previous().span,
                    ));
                }
                params.posonlyargs = std::mem::take(&mut params.args);
            } else if self.match_token(&TokenKind::Star) {
                if keyword_only {
                    return Err(self.error_at(
                        SyntaxErrorKind::UnexpectedToken,
                        "* argument may appear only once",
                        self.previous().span,
                    ));
                }
                keyword_only = true;
                if self.current().ident().is_some() {
                    let arg = self.parse_parameter(annotations, true)?;
                    self.check_duplicate(&params, &arg)?;
                    params.vararg = Some(arg);
                }
            } else if self.match_token(&TokenKind::DoubleStar) {
                let arg = self.parse_parameter(annotations, false)?;
                self.check_duplicate(&params, &arg)?;
                params.kwarg = Some(arg);
                self.match_token(&TokenKind::Comma);
                break;
            } else {
                let arg = self.parse_parameter(annotations, false)?;
                self.check_duplicate(&params, &arg)?;
                let default = if self.match_token(&TokenKind::Equal) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                if keyword_only {
                    params.kw_defaults.push(default);
                    params.kwonlyargs.push(arg);
                } else {
                    match default {
                        Some(value) => params.defaults.push(value),
                        None if !params.defaults.is_empty() => {
                            return Err(self.error_at(
                                SyntaxErrorKind::UnexpectedToken,
                                "parameter without a default follows parameter with a default",
                                arg.name.span,
                            ));
                        }
                        None => {}
                    }
                    params.args.push(arg);
                }
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_parameter(&mut self, annotations: bool, starred: bool) -> ParseResult<Arg> {
        let name = self.expect_identifier("expected parameter name")?;
        let annotation = if annotations && self.match_token(&TokenKind::Colon) {
            let value = if starred {
                self.parse_star_expression()?
            } else {
                self.parse_expression()?
            };
            Some(Box::new(value))
        } else {
            None
        };
        Ok(Arg { name, annotation })
    }

    fn check_duplicate(&self, params: &Arguments, arg: &Arg) -> ParseResult<()> {
        if params.iter().any(|p| p.name.name == arg.name.name) {
            return Err(self.error_at(
                SyntaxErrorKind::Semantic,
                format!("duplicate argument '{}' in function definition", arg.name.name),
                arg.name.span,
            ));
        }
        Ok(())
    }

    // =========================================================================
    // Type Parameters
    // =========================================================================

    fn parse_optional_type_params(&mut self) -> ParseResult<Vec<TypeParam>> {
        if !self.match_token(&TokenKind::LeftBracket) {
            return Ok(Vec::new());
        }
        let mut params = Vec::new();
        while !self.check(&TokenKind::RightBracket) {
            params.push(self.parse_type_param()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        if params.is_empty() {
            return Err(self.error_at_current("type parameter list cannot be empty"));
        }
        self.expect(&TokenKind::RightBracket, "expected ']'")?;
        Ok(params)
    }

    fn parse_type_param(&mut self) -> ParseResult<TypeParam> {
        let start = self.start_span();
        let kind = if self.match_token(&TokenKind::Star) {
            TypeParamKind::TypeVarTuple {
                name: self.expect_identifier("expected type parameter name")?,
            }
        } else if self.match_token(&TokenKind::DoubleStar) {
            TypeParamKind::ParamSpec {
                name: self.expect_identifier("expected type parameter name")?,
            }
        } else {
            let name = self.expect_identifier("expected type parameter name")?;
            let bound = if self.match_token(&TokenKind::Colon) {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };
            TypeParamKind::TypeVar { name, bound }
        };
        Ok(TypeParam {
            kind,
            span: self.span_from(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{ExprKind, Stmt, StmtKind};
    use crate::parser::parse;
    use scopelight_core::SyntaxErrorKind;

    fn first(src: &str) -> Stmt {
        parse(src).unwrap().body.remove(0)
    }

    #[test]
    fn test_assignment_forms() {
        assert!(matches!(first("a = b = 1\n").kind, StmtKind::Assign { ref targets, .. } if targets.len() == 2));
        assert!(matches!(first("a, *b = c\n").kind, StmtKind::Assign { .. }));
        assert!(matches!(first("a.b += 1\n").kind, StmtKind::AugAssign { .. }));
        assert!(matches!(first("x: int = 3\n").kind, StmtKind::AnnAssign { .. }));
        assert!(matches!(first("x: int\n").kind, StmtKind::AnnAssign { value: None, .. }));
        assert!(matches!(first("x = yield\n").kind, StmtKind::Assign { .. }));
    }

    #[test]
    fn test_invalid_targets() {
        assert_eq!(parse("f() = 1\n").unwrap_err().kind, SyntaxErrorKind::InvalidTarget);
        assert_eq!(parse("1 += 1\n").unwrap_err().kind, SyntaxErrorKind::InvalidTarget);
        assert_eq!(parse("a, b: int\n").unwrap_err().kind, SyntaxErrorKind::InvalidTarget);
        assert_eq!(parse("for f() in x: pass\n").unwrap_err().kind, SyntaxErrorKind::InvalidTarget);
    }

    #[test]
    fn test_imports() {
        match first("import os.path as p, sys\n").kind {
            StmtKind::Import(names) => {
                assert_eq!(names.len(), 2);
                assert_eq!(names[0].dotted(), "os.path");
                assert_eq!(names[0].bound().unwrap().as_str(), "p");
            }
            other => panic!("unexpected {other:?}"),
        }
        match first("from ..pkg import (a as b, c,)\n").kind {
            StmtKind::ImportFrom { module, names, level } => {
                assert_eq!(level, 2);
                assert_eq!(module[0].as_str(), "pkg");
                assert_eq!(names.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        match first("from . import *\n").kind {
            StmtKind::ImportFrom { names, level, .. } => {
                assert_eq!(level, 1);
                assert!(names[0].is_wildcard());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse("from import x\n").is_err());
    }

    #[test]
    fn test_compound_statements() {
        let src = "\
if a:
    pass
elif b:
    pass
else:
    pass
while x:
    break
else:
    pass
for i, j in k:
    continue
try:
    pass
except* ValueError as e:
    pass
finally:
    pass
with open(f) as g, h:
    pass
";
        let module = parse(src).unwrap();
        assert_eq!(module.body.len(), 5);
        match &module.body[0].kind {
            StmtKind::If { orelse, .. } => assert!(matches!(orelse[0].kind, StmtKind::If { .. })),
            other => panic!("unexpected {other:?}"),
        }
        match &module.body[3].kind {
            StmtKind::Try { handlers, is_star, .. } => {
                assert!(*is_star);
                assert_eq!(handlers[0].name.as_ref().unwrap().as_str(), "e");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parenthesized_with() {
        match first("with (open(a) as b, open(c) as d,):\n    pass\n").kind {
            StmtKind::With { items, .. } => {
                assert_eq!(items.len(), 2);
                assert!(items[1].optional_vars.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
        match first("with (a, b):\n    pass\n").kind {
            StmtKind::With { items, .. } => assert_eq!(items.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        match first("with (a, b) as c:\n    pass\n").kind {
            StmtKind::With { items, .. } => {
                assert_eq!(items.len(), 1);
                assert!(matches!(items[0].context_expr.kind, ExprKind::Tuple(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_function_definitions() {
        let src = "@dec\n@other.attr(1)\nasync def f[T: int, *Ts, **P](a, /, b=1, *args: int, c, d=2, **kw) -> T:\n    return a\n";
        let stmt = first(src);
        assert_eq!(stmt.span.start, 20);
        match stmt.kind {
            StmtKind::FunctionDef(def) => {
                assert!(def.is_async);
                assert_eq!(def.decorator_list.len(), 2);
                assert_eq!(def.type_params.len(), 3);
                assert_eq!(def.args.posonlyargs.len(), 1);
                assert_eq!(def.args.args.len(), 1);
                assert_eq!(def.args.kwonlyargs.len(), 2);
                assert_eq!(def.args.kw_defaults.len(), 2);
                assert!(def.args.vararg.is_some());
                assert!(def.args.kwarg.is_some());
                assert!(def.returns.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_parameter() {
        let err = parse("def f(a, b, a): pass\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Semantic);
        assert_eq!(err.message, "duplicate argument 'a' in function definition");
        assert_eq!(err.position.column, 12);

        let err = parse("f = lambda x, *x: 0\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Semantic);
    }

    #[test]
    fn test_default_ordering() {
        assert!(parse("def f(a=1, b): pass\n").is_err());
        assert!(parse("def f(a=1, *, b): pass\n").is_ok());
    }

    #[test]
    fn test_class_definition() {
        match first("class C[T](Base, metaclass=M):\n    x = 1\n").kind {
            StmtKind::ClassDef(def) => {
                assert_eq!(def.name.as_str(), "C");
                assert_eq!(def.bases.len(), 1);
                assert_eq!(def.keywords.len(), 1);
                assert_eq!(def.type_params.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_soft_keywords_as_names() {
        let module = parse("match = 1\nmatch(x)\ntype = 2\ntype(x)\ncase = 3\n").unwrap();
        assert_eq!(module.body.len(), 5);
        assert!(matches!(module.body[1].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn test_type_alias() {
        match first("type Pair[T] = tuple[T, T]\n").kind {
            StmtKind::TypeAlias { name, type_params, .. } => {
                assert_eq!(name.as_str(), "Pair");
                assert_eq!(type_params.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_match_statement() {
        let src = "match cmd.split():\n    case [x, *rest] if x:\n        pass\n    case _:\n        pass\n";
        match first(src).kind {
            StmtKind::Match { cases, .. } => {
                assert_eq!(cases.len(), 2);
                assert!(cases[0].guard.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_block_errors() {
        let err = parse("def f():\nreturn 1\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Indentation);
        assert!(parse("try:\n    pass\nx = 1\n").is_err());
        assert!(parse("if x: pass; y = 2\n").is_ok());
    }
}
