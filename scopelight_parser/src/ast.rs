//! Abstract syntax tree for Python 3.12.
//!
//! The tree keeps every construct that can contain or bind a name and the
//! exact span of every identifier. Literal values and operators are not
//! retained.

use scopelight_core::Span;

// =============================================================================
// Module Level
// =============================================================================

/// A parsed module (file).
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Top-level statements.
    pub body: Vec<Stmt>,
    /// Source span.
    pub span: Span,
}

impl Module {
    /// Create a new module.
    #[must_use]
    pub fn new(body: Vec<Stmt>, span: Span) -> Self {
        Self { body, span }
    }
}

/// An identifier with its exact location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// Spelling as written.
    pub name: String,
    /// Span covering exactly the spelling.
    pub span: Span,
}

impl Identifier {
    /// Create a new identifier.
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    /// The spelling.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// Statements
// =============================================================================

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// The statement kind.
    pub kind: StmtKind,
    /// Source span.
    pub span: Span,
}

impl Stmt {
    /// Create a new statement.
    #[must_use]
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    // === Simple Statements ===
    /// Expression statement.
    Expr(Box<Expr>),
    /// `a = b = value`
    Assign {
        /// Targets, left to right.
        targets: Vec<Expr>,
        /// Assigned value.
        value: Box<Expr>,
    },
    /// `target op= value`
    AugAssign {
        /// Target.
        target: Box<Expr>,
        /// Value.
        value: Box<Expr>,
    },
    /// `target: annotation [= value]`
    AnnAssign {
        /// Target.
        target: Box<Expr>,
        /// Annotation.
        annotation: Box<Expr>,
        /// Optional value.
        value: Option<Box<Expr>>,
    },
    /// `return [value]`
    Return(Option<Box<Expr>>),
    /// `del a, b`
    Delete(Vec<Expr>),
    /// `pass`
    Pass,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `raise [exc [from cause]]`
    Raise {
        /// Exception.
        exc: Option<Box<Expr>>,
        /// Cause.
        cause: Option<Box<Expr>>,
    },
    /// `assert test[, msg]`
    Assert {
        /// Condition.
        test: Box<Expr>,
        /// Message.
        msg: Option<Box<Expr>>,
    },
    /// `global a, b`
    Global(Vec<Identifier>),
    /// `nonlocal a, b`
    Nonlocal(Vec<Identifier>),
    /// `import a.b as c, d`
    Import(Vec<Alias>),
    /// `from ..m import a as b`
    ImportFrom {
        /// Dotted module path, empty for `from . import x`.
        module: Vec<Identifier>,
        /// Imported names. A wildcard import is a single alias spelled `*`.
        names: Vec<Alias>,
        /// Number of leading dots.
        level: u32,
    },

    // === Compound Statements ===
    /// `if`/`elif`/`else`. An `elif` is a nested `If` in `orelse`.
    If {
        /// Condition.
        test: Box<Expr>,
        /// Body.
        body: Vec<Stmt>,
        /// Else branch.
        orelse: Vec<Stmt>,
    },
    /// `[async] for target in iter`
    For {
        /// Loop variable(s).
        target: Box<Expr>,
        /// Iterable.
        iter: Box<Expr>,
        /// Body.
        body: Vec<Stmt>,
        /// Else clause.
        orelse: Vec<Stmt>,
        /// `async for`.
        is_async: bool,
    },
    /// `while test`
    While {
        /// Condition.
        test: Box<Expr>,
        /// Body.
        body: Vec<Stmt>,
        /// Else clause.
        orelse: Vec<Stmt>,
    },
    /// `[async] with a as b, c`
    With {
        /// Context items.
        items: Vec<WithItem>,
        /// Body.
        body: Vec<Stmt>,
        /// `async with`.
        is_async: bool,
    },
    /// `try` with `except` or `except*` handlers.
    Try {
        /// Try body.
        body: Vec<Stmt>,
        /// Handlers.
        handlers: Vec<ExceptHandler>,
        /// Else clause.
        orelse: Vec<Stmt>,
        /// Finally clause.
        finalbody: Vec<Stmt>,
        /// Handlers are `except*`.
        is_star: bool,
    },
    /// `match subject:`
    Match {
        /// Subject expression.
        subject: Box<Expr>,
        /// Cases.
        cases: Vec<MatchCase>,
    },

    // === Definitions ===
    /// `def` or `async def`.
    FunctionDef(Box<FunctionDef>),
    /// `class`.
    ClassDef(Box<ClassDef>),
    /// `type X[T] = value`
    TypeAlias {
        /// Alias name.
        name: Identifier,
        /// Type parameters.
        type_params: Vec<TypeParam>,
        /// Aliased type.
        value: Box<Expr>,
    },
}

/// A function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Function name.
    pub name: Identifier,
    /// PEP 695 type parameters.
    pub type_params: Vec<TypeParam>,
    /// Parameters.
    pub args: Arguments,
    /// Body.
    pub body: Vec<Stmt>,
    /// Decorators, outermost first.
    pub decorator_list: Vec<Expr>,
    /// Return annotation.
    pub returns: Option<Box<Expr>>,
    /// `async def`.
    pub is_async: bool,
}

/// A class definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    /// Class name.
    pub name: Identifier,
    /// PEP 695 type parameters.
    pub type_params: Vec<TypeParam>,
    /// Positional bases.
    pub bases: Vec<Expr>,
    /// Keyword arguments (`metaclass=...`).
    pub keywords: Vec<Keyword>,
    /// Body.
    pub body: Vec<Stmt>,
    /// Decorators, outermost first.
    pub decorator_list: Vec<Expr>,
}

// =============================================================================
// Expressions
// =============================================================================

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// The expression kind.
    pub kind: ExprKind,
    /// Source span.
    pub span: Span,
}

impl Expr {
    /// Create a new expression.
    #[must_use]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The name, if this is a bare name.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // === Atoms ===
    /// Number, string, bytes, `True`, `False`, `None` or `...`.
    Constant,
    /// String concatenation containing f-strings; holds the replacement
    /// field expressions in source order.
    JoinedStr(Vec<Expr>),
    /// A name.
    Name(String),

    // === Containers ===
    /// `[a, b]`
    List(Vec<Expr>),
    /// `(a, b)` or bare `a, b`.
    Tuple(Vec<Expr>),
    /// `{a, b}`
    Set(Vec<Expr>),
    /// `{k: v, **m}`
    Dict {
        /// Keys; `None` for `**` unpacking.
        keys: Vec<Option<Expr>>,
        /// Values.
        values: Vec<Expr>,
    },

    // === Comprehensions ===
    /// `[elt for ...]`
    ListComp {
        /// Element.
        elt: Box<Expr>,
        /// Clauses.
        generators: Vec<Comprehension>,
    },
    /// `{elt for ...}`
    SetComp {
        /// Element.
        elt: Box<Expr>,
        /// Clauses.
        generators: Vec<Comprehension>,
    },
    /// `{k: v for ...}`
    DictComp {
        /// Key.
        key: Box<Expr>,
        /// Value.
        value: Box<Expr>,
        /// Clauses.
        generators: Vec<Comprehension>,
    },
    /// `(elt for ...)`
    GeneratorExp {
        /// Element.
        elt: Box<Expr>,
        /// Clauses.
        generators: Vec<Comprehension>,
    },

    // === Operators ===
    /// `target := value`
    NamedExpr {
        /// Target name.
        target: Box<Expr>,
        /// Value.
        value: Box<Expr>,
    },
    /// Any binary arithmetic or bitwise operation.
    BinOp {
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `not x`, `-x`, `+x`, `~x`.
    UnaryOp(Box<Expr>),
    /// `a and b and c` / `a or b`.
    BoolOp(Vec<Expr>),
    /// `a < b <= c`
    Compare {
        /// Leftmost operand.
        left: Box<Expr>,
        /// Remaining operands.
        comparators: Vec<Expr>,
    },
    /// `a if test else b`
    IfExp {
        /// Condition.
        test: Box<Expr>,
        /// Value when true.
        body: Box<Expr>,
        /// Value when false.
        orelse: Box<Expr>,
    },
    /// `lambda args: body`
    Lambda {
        /// Parameters.
        args: Box<Arguments>,
        /// Body.
        body: Box<Expr>,
    },

    // === Primaries ===
    /// `value.attr`
    Attribute {
        /// Receiver.
        value: Box<Expr>,
        /// Attribute name.
        attr: Identifier,
    },
    /// `value[slice]`
    Subscript {
        /// Receiver.
        value: Box<Expr>,
        /// Index.
        slice: Box<Expr>,
    },
    /// `lower:upper:step`
    Slice {
        /// Lower bound.
        lower: Option<Box<Expr>>,
        /// Upper bound.
        upper: Option<Box<Expr>>,
        /// Step.
        step: Option<Box<Expr>>,
    },
    /// `*value`
    Starred(Box<Expr>),
    /// `func(args, kw=v)`
    Call {
        /// Callee.
        func: Box<Expr>,
        /// Positional arguments.
        args: Vec<Expr>,
        /// Keyword arguments.
        keywords: Vec<Keyword>,
    },

    // === Coroutines ===
    /// `await value`
    Await(Box<Expr>),
    /// `yield [value]`
    Yield(Option<Box<Expr>>),
    /// `yield from value`
    YieldFrom(Box<Expr>),
}

// =============================================================================
// Function Arguments
// =============================================================================

/// Function parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    /// Positional-only parameters (before `/`).
    pub posonlyargs: Vec<Arg>,
    /// Regular parameters.
    pub args: Vec<Arg>,
    /// `*args`.
    pub vararg: Option<Arg>,
    /// Keyword-only parameters.
    pub kwonlyargs: Vec<Arg>,
    /// Defaults for keyword-only parameters.
    pub kw_defaults: Vec<Option<Expr>>,
    /// `**kwargs`.
    pub kwarg: Option<Arg>,
    /// Defaults for the trailing positional parameters.
    pub defaults: Vec<Expr>,
}

impl Arguments {
    /// Every parameter in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.posonlyargs
            .iter()
            .chain(&self.args)
            .chain(&self.vararg)
            .chain(&self.kwonlyargs)
            .chain(&self.kwarg)
    }

    /// The first positional parameter.
    #[must_use]
    pub fn first_positional(&self) -> Option<&Arg> {
        self.posonlyargs.first().or_else(|| self.args.first())
    }

    /// Every default value expression.
    pub fn default_values(&self) -> impl Iterator<Item = &Expr> {
        self.defaults.iter().chain(self.kw_defaults.iter().flatten())
    }
}

/// A single parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    /// Parameter name.
    pub name: Identifier,
    /// Annotation.
    pub annotation: Option<Box<Expr>>,
}

/// A keyword argument in a call or class header.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    /// Argument name, `None` for `**mapping`.
    pub arg: Option<Identifier>,
    /// Value.
    pub value: Expr,
}

// =============================================================================
// Import Aliases
// =============================================================================

/// An import alias: `a.b.c as d`.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    /// Dotted path components.
    pub path: Vec<Identifier>,
    /// `as` name.
    pub asname: Option<Identifier>,
    /// Source span.
    pub span: Span,
}

impl Alias {
    /// Whether this is the `*` of a wildcard import.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self.path.as_slice(), [only] if only.name == "*")
    }

    /// The identifier this alias binds: the `as` name, else the first path
    /// component (`import a.b` binds `a`).
    #[must_use]
    pub fn bound(&self) -> Option<&Identifier> {
        self.asname.as_ref().or_else(|| self.path.first())
    }

    /// Dotted spelling of the path.
    #[must_use]
    pub fn dotted(&self) -> String {
        let parts: Vec<&str> = self.path.iter().map(Identifier::as_str).collect();
        parts.join(".")
    }
}

// =============================================================================
// Comprehensions
// =============================================================================

/// A `for ... in ... if ...` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    /// Loop variable(s).
    pub target: Expr,
    /// Iterable.
    pub iter: Expr,
    /// Filters.
    pub ifs: Vec<Expr>,
    /// `async for`.
    pub is_async: bool,
}

// =============================================================================
// Exception Handling and Context Managers
// =============================================================================

/// An `except` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    /// Exception type.
    pub typ: Option<Expr>,
    /// `as` binding.
    pub name: Option<Identifier>,
    /// Body.
    pub body: Vec<Stmt>,
    /// Source span.
    pub span: Span,
}

/// One item of a `with` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    /// Context expression.
    pub context_expr: Expr,
    /// `as` target.
    pub optional_vars: Option<Expr>,
}

// =============================================================================
// Match (Pattern Matching)
// =============================================================================

/// A `case` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
    /// Pattern.
    pub pattern: Pattern,
    /// `if` guard.
    pub guard: Option<Expr>,
    /// Body.
    pub body: Vec<Stmt>,
}

/// A pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    /// Pattern kind.
    pub kind: PatternKind,
    /// Source span.
    pub span: Span,
}

/// Pattern kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    /// Literal or dotted value.
    MatchValue(Box<Expr>),
    /// `True`, `False` or `None`.
    MatchSingleton,
    /// `[a, *rest]` / `(a, b)`
    MatchSequence(Vec<Pattern>),
    /// `{key: pattern, **rest}`
    MatchMapping {
        /// Keys.
        keys: Vec<Expr>,
        /// Value patterns.
        patterns: Vec<Pattern>,
        /// `**rest` capture.
        rest: Option<Identifier>,
    },
    /// `Cls(p, attr=q)`
    MatchClass {
        /// Class expression.
        cls: Box<Expr>,
        /// Positional patterns.
        patterns: Vec<Pattern>,
        /// Keyword attribute names.
        kwd_attrs: Vec<Identifier>,
        /// Keyword patterns.
        kwd_patterns: Vec<Pattern>,
    },
    /// `*name` or `*_` inside a sequence.
    MatchStar(Option<Identifier>),
    /// Capture, wildcard or `pattern as name`.
    MatchAs {
        /// Inner pattern.
        pattern: Option<Box<Pattern>>,
        /// Captured name; `None` for `_`.
        name: Option<Identifier>,
    },
    /// `a | b`
    MatchOr(Vec<Pattern>),
}

// =============================================================================
// Type Parameters (Python 3.12+)
// =============================================================================

/// A PEP 695 type parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    /// Type parameter kind.
    pub kind: TypeParamKind,
    /// Source span.
    pub span: Span,
}

impl TypeParam {
    /// The declared name.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        match &self.kind {
            TypeParamKind::TypeVar { name, .. }
            | TypeParamKind::TypeVarTuple { name }
            | TypeParamKind::ParamSpec { name } => name,
        }
    }
}

/// Type parameter kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeParamKind {
    /// `T` or `T: bound`
    TypeVar {
        /// Name.
        name: Identifier,
        /// Bound or constraints.
        bound: Option<Box<Expr>>,
    },
    /// `*Ts`
    TypeVarTuple {
        /// Name.
        name: Identifier,
    },
    /// `**P`
    ParamSpec {
        /// Name.
        name: Identifier,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: u32) -> Identifier {
        Identifier::new(name, Span::new(start, start + name.len() as u32))
    }

    #[test]
    fn test_alias_bound_name() {
        let alias = Alias {
            path: vec![ident("os", 7), ident("path", 10)],
            asname: None,
            span: Span::new(7, 14),
        };
        assert_eq!(alias.bound().map(Identifier::as_str), Some("os"));
        assert_eq!(alias.dotted(), "os.path");

        let aliased = Alias {
            asname: Some(ident("p", 18)),
            ..alias
        };
        assert_eq!(aliased.bound().map(Identifier::as_str), Some("p"));
    }

    #[test]
    fn test_alias_wildcard() {
        let alias = Alias {
            path: vec![ident("*", 14)],
            asname: None,
            span: Span::new(14, 15),
        };
        assert!(alias.is_wildcard());
    }

    #[test]
    fn test_arguments_iteration_order() {
        let arg = |name: &str, at| Arg {
            name: ident(name, at),
            annotation: None,
        };
        let args = Arguments {
            posonlyargs: vec![arg("a", 0)],
            args: vec![arg("b", 3)],
            vararg: Some(arg("c", 6)),
            kwonlyargs: vec![arg("d", 9)],
            kwarg: Some(arg("e", 12)),
            ..Arguments::default()
        };
        let names: Vec<&str> = args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
        assert_eq!(args.first_positional().map(|a| a.name.as_str()), Some("a"));
    }

    #[test]
    fn test_type_param_name() {
        let param = TypeParam {
            kind: TypeParamKind::ParamSpec { name: ident("P", 2) },
            span: Span::new(0, 3),
        };
        assert_eq!(param.name().as_str(), "P");
    }
}
