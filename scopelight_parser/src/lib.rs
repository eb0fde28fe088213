//! # Scopelight Parser
//!
//! Python 3.12 lexer and parser with an error-tolerant front door.
//!
//! [`parse`] is strict and stops at the first error. [`parse_tolerant`]
//! patches the offending line once and retries, which is what an editor
//! wants while the user is typing.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod tolerant;

pub use ast::*;
pub use lexer::{tokenize, Lexer};
pub use parser::{parse, parse_expression, Parser, MAX_NESTING};
pub use token::{Token, TokenKind};
pub use tolerant::{
    fix_line, parse_tolerant, Parsed, TolerancePolicy, TolerateAll, TolerateNothing, Tolerated,
};
