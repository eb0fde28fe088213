//! Classified name occurrences and the highlights they produce.

use crate::scope::ScopeId;
use scopelight_core::{Position, Span};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// Category
// =============================================================================

/// What a name occurrence refers to.
///
/// The declaration order is the tie-breaker when two highlights share a
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// No binding found and not a builtin.
    Unresolved,
    /// `self.x` / `cls.x` inside a method.
    Attribute,
    /// A builtin not shadowed by any binding.
    Builtin,
    /// Bound in an enclosing function scope.
    Free,
    /// Bound at module level.
    Global,
    /// A parameter of the enclosing function.
    Parameter,
    /// A parameter never read in its function.
    ParameterUnused,
    /// The `self`/`cls` parameter of a method.
    SelfParam,
    /// Bound by an import.
    Imported,
    /// Bound in the scope it occurs in.
    Local,
    /// Marks the occurrences of the name under the cursor.
    Selected,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 11] = [
        Category::Unresolved,
        Category::Attribute,
        Category::Builtin,
        Category::Free,
        Category::Global,
        Category::Parameter,
        Category::ParameterUnused,
        Category::SelfParam,
        Category::Imported,
        Category::Local,
        Category::Selected,
    ];

    /// Short lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Unresolved => "unresolved",
            Category::Attribute => "attribute",
            Category::Builtin => "builtin",
            Category::Free => "free",
            Category::Global => "global",
            Category::Parameter => "parameter",
            Category::ParameterUnused => "parameterUnused",
            Category::SelfParam => "self",
            Category::Imported => "imported",
            Category::Local => "local",
            Category::Selected => "selected",
        }
    }

    /// Highlight group name handed to the renderer.
    #[must_use]
    pub fn highlight_group(self) -> String {
        let name = self.as_str();
        let mut group = String::with_capacity("scopelight".len() + name.len());
        group.push_str("scopelight");
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            group.push(first.to_ascii_uppercase());
            group.push_str(chars.as_str());
        }
        group
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

// =============================================================================
// Nodes
// =============================================================================

/// Index of a node in its [`NodeIndex`](crate::NodeIndex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One classified name occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameNode {
    /// Position in the owning index.
    pub id: NodeId,
    /// Spelling as written.
    pub name: Arc<str>,
    /// Lookup key after private-name mangling.
    pub symbol: Arc<str>,
    /// Start line and byte column.
    pub start: Position,
    /// End byte column on the same line.
    pub end: u32,
    /// Byte range in the source.
    pub span: Span,
    /// Classification.
    pub category: Category,
    /// Scope the occurrence belongs to.
    pub scope: ScopeId,
    /// Scope that owns the binding this occurrence refers to. Builtins and
    /// unresolved names group under the module.
    pub defining: Option<ScopeId>,
    /// For a `self`/`cls` receiver, the attribute node it qualifies.
    pub target: Option<NodeId>,
}

impl NameNode {
    /// 1-indexed line.
    #[inline]
    #[must_use]
    pub fn line(&self) -> u32 {
        self.start.line
    }

    /// Whether `pos` falls on this node (end exclusive).
    #[inline]
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        pos.line == self.start.line && self.start.column <= pos.column && pos.column < self.end
    }

    /// The highlight this node renders as.
    #[must_use]
    pub fn highlight(&self) -> Highlight {
        Highlight {
            line: self.start.line,
            start: self.start.column,
            end: self.end,
            category: self.category,
            name: Arc::clone(&self.name),
        }
    }

    /// The same highlight drawn in another category.
    #[must_use]
    pub fn highlight_as(&self, category: Category) -> Highlight {
        Highlight {
            category,
            ..self.highlight()
        }
    }
}

/// A renderable highlight. Ordered by line, column, category, name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Highlight {
    /// 1-indexed line.
    pub line: u32,
    /// Start byte column.
    pub start: u32,
    /// End byte column (exclusive).
    pub end: u32,
    /// Category to draw.
    pub category: Category,
    /// Spelling.
    pub name: Arc<str>,
}

impl Highlight {
    fn key(&self) -> (u32, u32, Category, &str, u32) {
        (self.line, self.start, self.category, &self.name, self.end)
    }
}

impl Ord for Highlight {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Highlight {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Highlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{} {} {}",
            self.line, self.start, self.end, self.category, self.name
        )
    }
}
