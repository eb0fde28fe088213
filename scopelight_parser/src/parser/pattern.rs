//! `case` pattern parsing.

use super::{Parser, Precedence};
use crate::ast::{Expr, ExprKind, Identifier, Pattern, PatternKind};
use crate::token::{Keyword, TokenKind};
use scopelight_core::{ParseResult, SyntaxErrorKind};

impl<'src> Parser<'src> {
    /// The pattern after `case`: an open sequence or a single pattern.
    pub(crate) fn parse_case_patterns(&mut self) -> ParseResult<Pattern> {
        let start = self.start_span();
        let first = self.parse_maybe_star_pattern()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut patterns = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::Colon) || self.check_keyword(Keyword::If) {
                break;
            }
            patterns.push(self.parse_maybe_star_pattern()?);
        }
        Ok(Pattern {
            kind: PatternKind::MatchSequence(patterns),
            span: self.span_from(start),
        })
    }

    fn parse_maybe_star_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start_span();
        if !self.match_token(&TokenKind::Star) {
            return self.parse_as_pattern();
        }
        let name = self.expect_identifier("expected a name after '*'")?;
        Ok(Pattern {
            kind: PatternKind::MatchStar(capture(name)),
            span: self.span_from(start),
        })
    }

    /// `or_pattern ['as' NAME]`
    fn parse_as_pattern(&mut self) -> ParseResult<Pattern> {
        self.nested(|p| {
            let start = p.start_span();
            let pattern = p.parse_or_pattern()?;
            if !p.match_keyword(Keyword::As) {
                return Ok(pattern);
            }
            let name = p.expect_identifier("expected a name after 'as'")?;
            if name.name == "_" {
                return Err(p.error_at(
                    SyntaxErrorKind::InvalidTarget,
                    "cannot use '_' as a target",
                    name.span,
                ));
            }
            Ok(Pattern {
                kind: PatternKind::MatchAs {
                    pattern: Some(Box::new(pattern)),
                    name: Some(name),
                },
                span: p.span_from(start),
            })
        })
    }

    fn parse_or_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start_span();
        let first = self.parse_closed_pattern()?;
        if !self.check(&TokenKind::Pipe) {
            return Ok(first);
        }
        let mut alternatives = vec![first];
        while self.match_token(&TokenKind::Pipe) {
            alternatives.push(self.parse_closed_pattern()?);
        }
        Ok(Pattern {
            kind: PatternKind::MatchOr(alternatives),
            span: self.span_from(start),
        })
    }

    fn parse_closed_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start_span();
        let kind = match &self.current().kind {
            TokenKind::Keyword(Keyword::True | Keyword::False | Keyword::None) => {
                self.advance();
                PatternKind::MatchSingleton
            }
            TokenKind::Number
            | TokenKind::String
            | TokenKind::Bytes
            | TokenKind::FString(_)
            | TokenKind::Minus => {
                PatternKind::MatchValue(Box::new(self.parse_precedence(Precedence::Additive)?))
            }
            TokenKind::Ident(_) => return self.parse_name_pattern(),
            TokenKind::LeftParen => {
                self.advance();
                if self.match_token(&TokenKind::RightParen) {
                    PatternKind::MatchSequence(Vec::new())
                } else {
                    let inner = self.parse_maybe_star_pattern()?;
                    if !self.check(&TokenKind::Comma) {
                        self.expect(&TokenKind::RightParen, "expected ')'")?;
                        return Ok(inner);
                    }
                    let items = self.parse_pattern_items(inner, &TokenKind::RightParen)?;
                    self.expect(&TokenKind::RightParen, "expected ')'")?;
                    PatternKind::MatchSequence(items)
                }
            }
            TokenKind::LeftBracket => {
                self.advance();
                let items = if self.check(&TokenKind::RightBracket) {
                    Vec::new()
                } else {
                    let first = self.parse_maybe_star_pattern()?;
                    self.parse_pattern_items(first, &TokenKind::RightBracket)?
                };
                self.expect(&TokenKind::RightBracket, "expected ']'")?;
                PatternKind::MatchSequence(items)
            }
            TokenKind::LeftBrace => self.parse_mapping_pattern()?,
            _ => return Err(self.error_at_current("invalid pattern")),
        };
        Ok(Pattern {
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_pattern_items(&mut self, first: Pattern, close: &TokenKind) -> ParseResult<Vec<Pattern>> {
        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(close) {
                break;
            }
            items.push(self.parse_maybe_star_pattern()?);
        }
        Ok(items)
    }

    /// Capture, wildcard, dotted value or class pattern.
    fn parse_name_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.start_span();
        let name = self.expect_identifier("expected a name")?;
        let dotted = self.check(&TokenKind::Dot);
        if !dotted && !self.check(&TokenKind::LeftParen) {
            return Ok(Pattern {
                kind: PatternKind::MatchAs {
                    pattern: None,
                    name: capture(name),
                },
                span: self.span_from(start),
            });
        }

        let value = self.chained(|p| {
            let mut value = Expr::new(ExprKind::Name(name.name), name.span);
            while p.match_token(&TokenKind::Dot) {
                p.chain_link()?;
                let attr = p.expect_identifier("expected attribute name after '.'")?;
                value = Expr::new(
                    ExprKind::Attribute {
                        value: Box::new(value),
                        attr,
                    },
                    p.span_from(start),
                );
            }
            Ok(value)
        })?;
        if !self.check(&TokenKind::LeftParen) {
            return Ok(Pattern {
                kind: PatternKind::MatchValue(Box::new(value)),
                span: self.span_from(start),
            });
        }

        self.advance();
        let mut patterns = Vec::new();
        let mut kwd_attrs = Vec::new();
        let mut kwd_patterns = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            if self.current().ident().is_some() && matches!(self.peek().kind, TokenKind::Equal) {
                kwd_attrs.push(self.expect_identifier("expected keyword name")?);
                self.advance();
                kwd_patterns.push(self.parse_as_pattern()?);
            } else {
                if !kwd_attrs.is_empty() {
                    return Err(self.error_at_current("positional patterns follow keyword patterns"));
                }
                patterns.push(self.parse_as_pattern()?);
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "expected ')'")?;
        Ok(Pattern {
            kind: PatternKind::MatchClass {
                cls: Box::new(value),
                patterns,
                kwd_attrs,
                kwd_patterns,
            },
            span: self.span_from(start),
        })
    }

    /// `{key: pattern, **rest}`. The current token is `{`.
    fn parse_mapping_pattern(&mut self) -> ParseResult<PatternKind> {
        self.advance();
        let mut keys = Vec::new();
        let mut patterns = Vec::new();
        let mut rest = None;
        while !self.check(&TokenKind::RightBrace) {
            if self.match_token(&TokenKind::DoubleStar) {
                rest = Some(self.expect_identifier("expected a name after '**'")?);
                self.match_token(&TokenKind::Comma);
                break;
            }
            let key = match &self.current().kind {
                TokenKind::Keyword(Keyword::True | Keyword::False | Keyword::None) => {
                    let span = self.current().span;
                    self.advance();
                    Expr::new(ExprKind::Constant, span)
                }
                _ => self.parse_precedence(Precedence::Additive)?,
            };
            keys.push(key);
            self.expect(&TokenKind::Colon, "expected ':'")?;
            patterns.push(self.parse_as_pattern()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBrace, "expected '}'")?;
        Ok(PatternKind::MatchMapping {
            keys,
            patterns,
            rest,
        })
    }
}

/// `_` captures nothing.
fn capture(name: Identifier) -> Option<Identifier> {
    (name.name != "_").then_some(name)
}

#[cfg(test)]
mod tests {
    use crate::ast::{Pattern, PatternKind, StmtKind};
    use crate::parser::parse;

    fn case_pattern(pattern: &str) -> Pattern {
        let src = format!("match s:\n    case {pattern}:\n        pass\n");
        match parse(&src).unwrap().body.remove(0).kind {
            StmtKind::Match { mut cases, .. } => cases.remove(0).pattern,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_capture_and_wildcard() {
        match case_pattern("x").kind {
            PatternKind::MatchAs { pattern: None, name } => assert_eq!(name.unwrap().as_str(), "x"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            case_pattern("_").kind,
            PatternKind::MatchAs { pattern: None, name: None }
        ));
    }

    #[test]
    fn test_value_and_literal_patterns() {
        assert!(matches!(case_pattern("Color.RED").kind, PatternKind::MatchValue(_)));
        assert!(matches!(case_pattern("-1").kind, PatternKind::MatchValue(_)));
        assert!(matches!(case_pattern("1 + 2j").kind, PatternKind::MatchValue(_)));
        assert!(matches!(case_pattern("None").kind, PatternKind::MatchSingleton));
    }

    #[test]
    fn test_sequence_patterns() {
        match case_pattern("a, *rest").kind {
            PatternKind::MatchSequence(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(&items[1].kind, PatternKind::MatchStar(Some(n)) if n.as_str() == "rest"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(case_pattern("[*_]").kind, PatternKind::MatchSequence(_)));
        assert!(matches!(case_pattern("()").kind, PatternKind::MatchSequence(_)));
        assert!(matches!(case_pattern("(x)").kind, PatternKind::MatchAs { .. }));
    }

    #[test]
    fn test_class_and_mapping_patterns() {
        match case_pattern("Point(x, y=0 | 1 as z)").kind {
            PatternKind::MatchClass { patterns, kwd_attrs, kwd_patterns, .. } => {
                assert_eq!(patterns.len(), 1);
                assert_eq!(kwd_attrs[0].as_str(), "y");
                assert!(matches!(kwd_patterns[0].kind, PatternKind::MatchAs { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
        match case_pattern("{'k': v, **rest}").kind {
            PatternKind::MatchMapping { keys, rest, .. } => {
                assert_eq!(keys.len(), 1);
                assert_eq!(rest.unwrap().as_str(), "rest");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(parse("match s:\n    case x as _:\n        pass\n").is_err());
        assert!(parse("match s:\n    case C(a=1, b):\n        pass\n").is_err());
    }
}
