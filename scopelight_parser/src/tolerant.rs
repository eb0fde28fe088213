//! Error-tolerant parsing.
//!
//! When a buffer fails to parse, the line of the error (and the line the user
//! last changed, when known) is rewritten so that only its identifiers and
//! attribute dots survive, each at its original byte column. The patched text
//! is parsed once more. Because identifiers keep their positions, names on
//! the patched lines still get highlighted while the user is mid-edit.

use crate::ast::Module;
use crate::lexer::Lexer;
use crate::parser::parse;
use crate::token::TokenKind;
use scopelight_core::{ParseResult, Span, SyntaxError, SyntaxErrorKind};
use std::borrow::Cow;

// =============================================================================
// Policy
// =============================================================================

/// Decides whether a syntax error is minor enough to attempt a patch.
pub trait TolerancePolicy: Send + Sync {
    /// Whether `error` should be patched over.
    fn is_minor(&self, error: &SyntaxError) -> bool;
}

impl<F> TolerancePolicy for F
where
    F: Fn(&SyntaxError) -> bool + Send + Sync,
{
    fn is_minor(&self, error: &SyntaxError) -> bool {
        self(error)
    }
}

/// Patch every syntax error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TolerateAll;

impl TolerancePolicy for TolerateAll {
    fn is_minor(&self, _error: &SyntaxError) -> bool {
        true
    }
}

/// Never patch; every syntax error is reported as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TolerateNothing;

impl TolerancePolicy for TolerateNothing {
    fn is_minor(&self, _error: &SyntaxError) -> bool {
        false
    }
}

// =============================================================================
// Results
// =============================================================================

/// A successfully parsed buffer.
#[derive(Debug, Clone)]
pub struct Parsed<'a> {
    /// Syntax tree.
    pub module: Module,
    /// Text the tree was parsed from: the input, or its patched copy. Both
    /// have the same line count and identifier columns.
    pub source: Cow<'a, str>,
    /// Present when the tree came from a patched copy.
    pub tolerated: Option<Tolerated>,
}

impl Parsed<'_> {
    /// Whether the tree required a patch.
    #[inline]
    #[must_use]
    pub fn is_tolerated(&self) -> bool {
        self.tolerated.is_some()
    }

    /// The error that was patched over, if any.
    #[must_use]
    pub fn underlying_error(&self) -> Option<&SyntaxError> {
        self.tolerated.as_ref().map(|t| &t.error)
    }
}

/// Details of a tolerated parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tolerated {
    /// Error reported for the unpatched text.
    pub error: SyntaxError,
    /// 1-indexed lines that were rewritten.
    pub lines: Vec<u32>,
}

// =============================================================================
// Tolerant Parse
// =============================================================================

/// Parse `source`, patching at most the error line and `changed_line`
/// (1-indexed) and retrying once when `policy` deems the error minor.
///
/// Errors raised by name binding rules (duplicate parameters) come from an
/// otherwise well-formed tree and are never patched.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len(), changed_line = ?changed_line))]
pub fn parse_tolerant<'a>(
    source: &'a str,
    changed_line: Option<u32>,
    policy: &dyn TolerancePolicy,
) -> ParseResult<Parsed<'a>> {
    let error = match parse(source) {
        Ok(module) => {
            return Ok(Parsed {
                module,
                source: Cow::Borrowed(source),
                tolerated: None,
            })
        }
        Err(error) => error,
    };
    if error.kind == SyntaxErrorKind::Semantic || !policy.is_minor(&error) {
        return Err(error);
    }

    let mut lines = vec![error.line()];
    if let Some(changed) = changed_line {
        if changed != error.line() {
            lines.push(changed);
        }
    }
    let Some(patched) = patch_lines(source, &lines) else {
        tracing::debug!(line = error.line(), "nothing to patch");
        return Err(error);
    };

    match parse(&patched) {
        Ok(module) => {
            tracing::debug!(?lines, error = %error, "tolerated syntax error");
            Ok(Parsed {
                module,
                source: Cow::Owned(patched),
                tolerated: Some(Tolerated { error, lines }),
            })
        }
        Err(retry) => {
            tracing::debug!(
                target: "scopelight::recovery",
                original = %error,
                retry = %retry,
                "recovery failure"
            );
            Err(error)
        }
    }
}

/// Rewrite the given 1-indexed lines with [`fix_line`]. Returns `None` when
/// no line exists or the rewrite changes nothing.
fn patch_lines(source: &str, lines: &[u32]) -> Option<String> {
    let mut changed = false;
    let mut out = String::with_capacity(source.len());
    for (index, line) in source.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let lineno = index as u32 + 1;
        if !lines.contains(&lineno) {
            out.push_str(line);
            continue;
        }
        let (body, cr) = match line.strip_suffix('\r') {
            Some(body) => (body, "\r"),
            None => (line, ""),
        };
        let fixed = fix_line(body);
        changed |= fixed != body;
        out.push_str(&fixed);
        out.push_str(cr);
    }
    changed.then_some(out)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kept {
    Name,
    Dot,
}

/// Reduce one line to its indentation, identifiers and attribute dots.
///
/// Every kept token stays at its byte column. Gaps are filled with `+`
/// between names (so the line stays one expression) and with spaces after a
/// dot. Keywords are dropped and a trailing dot is cut.
#[must_use]
pub fn fix_line(line: &str) -> String {
    let body = line.trim_start_matches([' ', '\t', '\x0c']);
    let mut text = String::with_capacity(line.len());
    text.push_str(&line[..line.len() - body.len()]);

    let mut prev = None;
    let mut lexer = Lexer::window(line, Span::new(0, line.len() as u32));
    loop {
        let token = lexer.next_token();
        match token.kind {
            TokenKind::Eof => break,
            TokenKind::Dot if prev == Some(Kept::Name) => {
                place(&mut text, line, token.span, ' ');
                prev = Some(Kept::Dot);
            }
            TokenKind::Ident(_) => {
                let filler = if prev == Some(Kept::Dot) { ' ' } else { '+' };
                place(&mut text, line, token.span, filler);
                prev = Some(Kept::Name);
            }
            _ => {}
        }
    }
    if prev == Some(Kept::Dot) {
        text.pop();
    }
    text
}

fn place(text: &mut String, line: &str, span: Span, filler: char) {
    let column = span.start as usize;
    while text.len() < column {
        text.push(filler);
    }
    text.push_str(span.slice(line));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StmtKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fix_line_keeps_names_at_their_columns() {
        assert_eq!(fix_line("foo(a, b"), "foo+a++b");
        assert_eq!(fix_line("    x = y.z +"), "    x+++y.z");
        assert_eq!(fix_line("if foo.bar:"), "+++foo.bar");
        assert_eq!(fix_line("a = self."), "a+++self");
        assert_eq!(fix_line("a. b"), "a. b");
        assert_eq!(fix_line("x = 'unterminated"), "x");
        assert_eq!(fix_line(""), "");
    }

    #[test]
    fn test_fix_line_drops_keywords_and_stray_dots() {
        assert_eq!(fix_line("return not x"), format!("{}x", "+".repeat(11)));
        assert_eq!(fix_line("1 .x"), "+++x");
        assert_eq!(fix_line("\tfor i in"), "\t++++i");
    }

    #[test]
    fn test_clean_parse_borrows_source() {
        let parsed = parse_tolerant("x = 1\n", None, &TolerateAll).unwrap();
        assert!(!parsed.is_tolerated());
        assert!(matches!(parsed.source, Cow::Borrowed(_)));
    }

    #[test]
    fn test_error_line_is_patched() {
        let src = "import os\nos.path.\nprint(os)\n";
        let parsed = parse_tolerant(src, None, &TolerateAll).unwrap();
        let tolerated = parsed.tolerated.as_ref().unwrap();
        assert_eq!(tolerated.lines, vec![2]);
        assert_eq!(parsed.source, "import os\nos.path\nprint(os)\n");
        assert_eq!(parsed.module.body.len(), 3);
    }

    #[test]
    fn test_unclosed_bracket_patched_at_opener() {
        let src = "def f(a):\n    return g(a,\n";
        let parsed = parse_tolerant(src, None, &TolerateAll).unwrap();
        assert_eq!(parsed.source, "def f(a):\n    +++++++g+a\n");
        assert_eq!(parsed.tolerated.unwrap().lines, vec![2]);
        match &parsed.module.body[0].kind {
            StmtKind::FunctionDef(def) => assert_eq!(def.body.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_changed_line_patched_together() {
        // The error surfaces on line 2 but the bracket was opened on line 1.
        let src = "a = [1,\nb = 2\n";
        assert!(parse_tolerant(src, None, &TolerateAll).is_err());
        let parsed = parse_tolerant(src, Some(1), &TolerateAll).unwrap();
        assert_eq!(parsed.source, "a\nb\n");
        assert_eq!(parsed.tolerated.unwrap().lines, vec![2, 1]);
    }

    #[test]
    fn test_policy_controls_patching() {
        let src = "x = (\n";
        let err = parse_tolerant(src, None, &TolerateNothing).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnclosedBracket);

        let only_brackets = |e: &SyntaxError| e.kind == SyntaxErrorKind::UnclosedBracket;
        assert!(parse_tolerant(src, None, &only_brackets).is_ok());
        let only_indent = |e: &SyntaxError| e.kind == SyntaxErrorKind::Indentation;
        assert!(parse_tolerant(src, None, &only_indent).is_err());
    }

    #[test]
    fn test_failed_retry_reports_original_error() {
        let src = "if x:\n    a = 1\n  b = 2\n";
        let err = parse_tolerant(src, None, &TolerateAll).unwrap_err();
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn test_semantic_errors_are_not_patched() {
        let err = parse_tolerant("def f(a, a): pass\n", None, &TolerateAll).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Semantic);
    }
}
