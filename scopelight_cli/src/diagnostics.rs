//! Source-mapped syntax error display with CPython-style carets.
//!
//! ```text
//!   File "test.py", line 3
//!     x = (1,
//!         ^
//! SyntaxError: '(' was never closed
//! ```

use scopelight_core::{LineIndex, Span, SyntaxError, SyntaxErrorKind};

// =============================================================================
// Source Map
// =============================================================================

/// A source file prepared for error display.
#[derive(Debug, Clone)]
pub struct SourceMap<'a> {
    source: &'a str,
    filename: &'a str,
    lines: LineIndex,
}

impl<'a> SourceMap<'a> {
    /// Index `source` for display under `filename`.
    pub fn new(source: &'a str, filename: &'a str) -> Self {
        Self {
            source,
            filename,
            lines: LineIndex::new(source),
        }
    }

    /// Text of a 1-indexed line, without its line terminator.
    pub fn line_text(&self, line: u32) -> Option<&'a str> {
        let start = self.lines.line_start(line)? as usize;
        let end = self
            .lines
            .line_start(line + 1)
            .map_or(self.source.len(), |s| s as usize);
        let text = self.source.get(start..end)?;
        Some(text.trim_end_matches('\n').trim_end_matches('\r'))
    }

    /// Filename for display.
    #[inline]
    pub fn filename(&self) -> &str {
        self.filename
    }
}

// =============================================================================
// Error Rendering
// =============================================================================

/// Python exception name for an error class.
pub fn error_type(kind: SyntaxErrorKind) -> &'static str {
    match kind {
        SyntaxErrorKind::Indentation => "IndentationError",
        _ => "SyntaxError",
    }
}

/// Render `error` with its source line and a caret under the span.
pub fn render_syntax_error(source_map: &SourceMap<'_>, error: &SyntaxError) -> String {
    render_source_error(source_map, error.span, error_type(error.kind), &error.message)
}

/// Render a diagnostic for `span` with the source line and a caret underline.
///
/// Spans longer than one character get tildes with the caret in the middle.
/// A span running past its first line is underlined to the end of that line.
pub fn render_source_error(
    source_map: &SourceMap<'_>,
    span: Span,
    error_type: &str,
    message: &str,
) -> String {
    let mut output = String::with_capacity(256);

    let pos = source_map.lines.position(span.start);
    let end_pos = source_map
        .lines
        .position(span.end.saturating_sub(1).max(span.start));

    output.push_str(&format!(
        "  File \"{}\", line {}\n",
        source_map.filename(),
        pos.line,
    ));

    if let Some(line_text) = source_map.line_text(pos.line) {
        output.push_str(&format!("    {}\n", line_text));

        let caret_start = pos.column as usize;
        let caret_end = if pos.line == end_pos.line {
            end_pos.column as usize + 1
        } else {
            line_text.len()
        };
        let caret_len = caret_end.saturating_sub(caret_start).max(1);

        output.push_str("    ");
        output.push_str(&" ".repeat(caret_start));
        let mid = caret_len / 2;
        for i in 0..caret_len {
            output.push(if caret_len == 1 || i == mid { '^' } else { '~' });
        }
        output.push('\n');
    }

    output.push_str(&format!("{}: {}", error_type, message));
    output
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // =========================================================================
    // SourceMap Tests
    // =========================================================================

    #[test]
    fn test_line_text() {
        let sm = SourceMap::new("line1\nline2\r\nline3", "test.py");
        assert_eq!(sm.line_text(1), Some("line1"));
        assert_eq!(sm.line_text(2), Some("line2"));
        assert_eq!(sm.line_text(3), Some("line3"));
        assert_eq!(sm.line_text(0), None);
        assert_eq!(sm.line_text(4), None);
    }

    #[test]
    fn test_line_text_trailing_newline() {
        let sm = SourceMap::new("a\n", "test.py");
        assert_eq!(sm.line_text(1), Some("a"));
        assert_eq!(sm.line_text(2), Some(""));
    }

    #[test]
    fn test_filename() {
        let sm = SourceMap::new("x", "/path/to/script.py");
        assert_eq!(sm.filename(), "/path/to/script.py");
    }

    // =========================================================================
    // Rendering Tests
    // =========================================================================

    #[test]
    fn test_render_single_char() {
        let sm = SourceMap::new("x = (1", "test.py");
        let output = render_source_error(&sm, Span::new(4, 5), "SyntaxError", "'(' was never closed");
        assert_eq!(
            output,
            "  File \"test.py\", line 1\n    x = (1\n        ^\nSyntaxError: '(' was never closed"
        );
    }

    #[test]
    fn test_render_multichar_span() {
        let sm = SourceMap::new("x = 1\nreturn value", "test.py");
        let output = render_source_error(&sm, Span::new(6, 12), "SyntaxError", "'return' outside function");
        assert!(output.contains("line 2"));
        assert!(output.contains("    return value\n    ~~~^~~\n"));
    }

    #[test]
    fn test_render_zero_length_span() {
        let sm = SourceMap::new("x = ", "test.py");
        let output = render_source_error(&sm, Span::new(4, 4), "SyntaxError", "invalid syntax");
        assert!(output.contains("        ^\n"));
    }

    #[test]
    fn test_render_span_past_line_end() {
        let sm = SourceMap::new("ab\ncd", "test.py");
        let output = render_source_error(&sm, Span::new(1, 5), "SyntaxError", "bad");
        assert!(output.contains("    ab\n     ^\n"));
    }

    #[test]
    fn test_render_syntax_error_kind() {
        let source = "if x:\npass\n";
        let sm = SourceMap::new(source, "test.py");
        let error = SyntaxError::new(
            SyntaxErrorKind::Indentation,
            "expected an indented block",
            Span::new(6, 10),
            source,
        );
        let output = render_syntax_error(&sm, &error);
        assert!(output.ends_with("IndentationError: expected an indented block"));
        assert!(output.contains("line 2"));
    }
}
