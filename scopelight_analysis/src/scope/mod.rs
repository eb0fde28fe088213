//! Scope construction.
//!
//! [`ScopeBuilder`] walks a module once and records two things: every scope
//! with its binding map, and every name occurrence with the scope it is
//! resolved from. Classification runs afterwards over the finished tree, so
//! a binding later in a scope is visible to earlier uses.

mod builder;
mod symbol;

pub use builder::{Access, Collected, Definition, DefinitionKind, Occurrence, Role, ScopeBuilder};
pub use symbol::{Scope, ScopeId, ScopeKind, ScopeTree, Symbol, SymbolFlags};
