//! # Scopelight Core
//!
//! Source spans, line/column positions and the syntax error type shared by
//! the parser, the analyzer and the highlight engine.

#![warn(missing_docs)]

pub mod error;
pub mod position;
pub mod span;

pub use error::{Error, ParseResult, Result, SyntaxError, SyntaxErrorKind};
pub use position::{LineIndex, Position};
pub use span::Span;

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Python grammar version the parser targets.
pub const PYTHON_VERSION: (u8, u8) = (3, 12);
