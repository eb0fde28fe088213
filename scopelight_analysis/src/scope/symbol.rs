//! Symbol table and scope definitions.

use rustc_hash::{FxHashMap, FxHashSet};
use scopelight_core::Span;
use std::sync::Arc;

/// The kind of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Module-level scope.
    Module,
    /// Class body scope.
    Class,
    /// Function scope.
    Function,
    /// Comprehension scope (list comp, dict comp, etc.).
    Comprehension,
    /// Lambda expression scope.
    Lambda,
    /// PEP 695 annotation scope holding type parameters.
    Annotation,
}

impl ScopeKind {
    /// Whether names bound here are visible to nested scopes.
    #[inline]
    #[must_use]
    pub const fn is_function_like(self) -> bool {
        matches!(
            self,
            Self::Function | Self::Lambda | Self::Comprehension | Self::Annotation
        )
    }
}

/// Flags for symbol classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolFlags(u16);

impl SymbolFlags {
    /// No flags.
    pub const NONE: SymbolFlags = SymbolFlags(0);
    /// Symbol is bound in this scope.
    pub const DEF: SymbolFlags = SymbolFlags(1 << 0);
    /// Symbol is a parameter.
    pub const PARAM: SymbolFlags = SymbolFlags(1 << 1);
    /// Symbol is bound by an import.
    pub const IMPORTED: SymbolFlags = SymbolFlags(1 << 2);
    /// Symbol is declared `global`.
    pub const GLOBAL_EXPLICIT: SymbolFlags = SymbolFlags(1 << 3);
    /// Symbol is declared `nonlocal`.
    pub const NONLOCAL: SymbolFlags = SymbolFlags(1 << 4);
    /// Symbol is annotated.
    pub const ANNOTATED: SymbolFlags = SymbolFlags(1 << 5);
    /// Symbol is bound by something other than an import.
    pub const ASSIGNED: SymbolFlags = SymbolFlags(1 << 6);

    /// Check if a flag is set.
    #[inline]
    pub const fn contains(self, other: SymbolFlags) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Combine flags.
    #[inline]
    pub const fn union(self, other: SymbolFlags) -> SymbolFlags {
        SymbolFlags(self.0 | other.0)
    }

    /// Bound here and not redirected by a declaration.
    #[inline]
    pub const fn is_local(self) -> bool {
        self.contains(Self::DEF)
            && !self.contains(Self::GLOBAL_EXPLICIT)
            && !self.contains(Self::NONLOCAL)
    }

    /// Declared `global` or `nonlocal`.
    #[inline]
    pub const fn is_declared(self) -> bool {
        self.contains(Self::GLOBAL_EXPLICIT) || self.contains(Self::NONLOCAL)
    }
}

impl std::ops::BitOr for SymbolFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for SymbolFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Information about a symbol in a scope.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// The symbol name, after private-name mangling.
    pub name: Arc<str>,
    /// Classification flags.
    pub flags: SymbolFlags,
}

impl Symbol {
    /// Create a new symbol.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            flags: SymbolFlags::NONE,
        }
    }

    /// Check if this is a local variable.
    #[inline]
    pub fn is_local(&self) -> bool {
        self.flags.is_local()
    }

    /// Check if this is a parameter.
    #[inline]
    pub fn is_parameter(&self) -> bool {
        self.flags.contains(SymbolFlags::PARAM)
    }

    /// Check if only imports bind this symbol.
    #[inline]
    pub fn is_imported(&self) -> bool {
        self.flags.contains(SymbolFlags::IMPORTED)
    }
}

/// Index of a scope in its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) u32);

impl ScopeId {
    /// The module scope of every tree.
    pub const ROOT: ScopeId = ScopeId(0);

    /// Raw index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A scope in the symbol table.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Scope kind.
    pub kind: ScopeKind,
    /// Scope name (function/class name or "<module>").
    pub name: Arc<str>,
    /// Enclosing scope; `None` only for the module.
    pub parent: Option<ScopeId>,
    /// Child scopes in source order.
    pub children: Vec<ScopeId>,
    /// Symbols bound or declared in this scope.
    pub symbols: FxHashMap<Arc<str>, Symbol>,
    /// Name of the `self`/`cls` parameter of a method.
    pub self_param: Option<Arc<str>>,
    /// Names used here or in nested scopes that resolve to an enclosing
    /// function scope. Filled by classification.
    pub free: FxHashSet<Arc<str>>,
    /// Reads of each parameter, nested scopes included. Filled by
    /// classification.
    pub parameter_reads: FxHashMap<Arc<str>, u32>,
    /// Source span of the construct that opened the scope.
    pub span: Span,
}

impl Scope {
    /// Create a new scope.
    pub fn new(kind: ScopeKind, name: impl Into<Arc<str>>, parent: Option<ScopeId>, span: Span) -> Self {
        Self {
            kind,
            name: name.into(),
            parent,
            children: Vec::new(),
            symbols: FxHashMap::default(),
            self_param: None,
            free: FxHashSet::default(),
            parameter_reads: FxHashMap::default(),
            span,
        }
    }

    /// Add `flags` to a symbol, creating it if needed.
    pub fn define(&mut self, name: &Arc<str>, flags: SymbolFlags) {
        self.symbols
            .entry(Arc::clone(name))
            .or_insert_with(|| Symbol::new(Arc::clone(name)))
            .flags |= flags;
    }

    /// Look up a symbol.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Symbols bound here.
    pub fn locals(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values().filter(|s| s.is_local())
    }

    /// How often parameter `name` is read; zero for unknown names.
    #[inline]
    pub fn reads_of(&self, name: &str) -> u32 {
        self.parameter_reads.get(name).copied().unwrap_or(0)
    }
}

/// All scopes of a module, stored as an arena. The module scope is
/// [`ScopeId::ROOT`].
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    /// Create a tree holding only a module scope.
    pub fn new(span: Span) -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Module, "<module>", None, span)],
        }
    }

    /// Add a child of `parent`.
    pub fn push(&mut self, kind: ScopeKind, name: impl Into<Arc<str>>, parent: ScopeId, span: Span) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(kind, name, Some(parent), span));
        self.scopes[parent.index()].children.push(id);
        id
    }

    /// The module scope.
    #[inline]
    pub fn root(&self) -> &Scope {
        &self.scopes[0]
    }

    /// Get a scope.
    #[inline]
    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Get a scope mutably.
    #[inline]
    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// Number of scopes.
    #[inline]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Always false: a tree has at least its module scope.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Iterate over `(id, scope)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, scope)| (ScopeId(i as u32), scope))
    }

    /// Iterate mutably over `(id, scope)` pairs in creation order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ScopeId, &mut Scope)> {
        self.scopes
            .iter_mut()
            .enumerate()
            .map(|(i, scope)| (ScopeId(i as u32), scope))
    }

    /// `id` and its enclosing scopes, innermost first.
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), |&id| self.get(id).parent)
    }

    /// The innermost class scope among `id` and its ancestors.
    pub fn enclosing_class(&self, id: ScopeId) -> Option<&Scope> {
        self.ancestors(id)
            .map(|id| self.get(id))
            .find(|scope| scope.kind == ScopeKind::Class)
    }

    /// Symbol key of `name` used in `scope`: `__x` inside class `C` becomes
    /// `_C__x`.
    pub fn mangle(&self, name: &str, scope: ScopeId) -> Arc<str> {
        if name.starts_with("__") && !name.ends_with("__") {
            if let Some(class) = self.enclosing_class(scope) {
                let stripped = class.name.trim_start_matches('_');
                if !stripped.is_empty() {
                    return format!("_{stripped}{name}").into();
                }
            }
        }
        name.into()
    }
}
