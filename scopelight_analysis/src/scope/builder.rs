//! AST walk that builds the scope tree and collects every name occurrence.

use super::symbol::{ScopeId, ScopeKind, ScopeTree, SymbolFlags};
use scopelight_core::Span;
use scopelight_parser::ast::{
    Arguments, ClassDef, Comprehension, Expr, ExprKind, FunctionDef, Identifier, Module, Pattern,
    PatternKind, Stmt, StmtKind, TypeParam, TypeParamKind,
};
use std::sync::Arc;

/// How an occurrence came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A plain name: load, store, delete, declaration or definition.
    Name,
    /// A parameter in a function or lambda header.
    Parameter,
    /// The name an import binds.
    Import,
    /// `x` in `self.x`, owned by the class scope.
    Attribute,
}

/// Whether an occurrence reads its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The value is read. `x += 1` reads `x`.
    Load,
    /// Binding, deletion or declaration without a read.
    Store,
}

/// One name occurrence, before classification.
#[derive(Debug, Clone)]
pub struct Occurrence {
    /// Spelling.
    pub name: Arc<str>,
    /// Mangled lookup key.
    pub symbol: Arc<str>,
    /// Exact span of the spelling.
    pub span: Span,
    /// Scope the occurrence is resolved from.
    pub scope: ScopeId,
    /// How it was found.
    pub role: Role,
    /// Read or write.
    pub access: Access,
    /// For a `self`/`cls` receiver: index of its attribute occurrence.
    pub target: Option<usize>,
}

/// Kind of definition statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    /// `class`
    Class,
    /// `def` or `async def`
    Function,
}

/// Start of a `class` or `def` statement (after decorators).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    /// What is defined.
    pub kind: DefinitionKind,
    /// Offset of the `class`, `def` or `async` keyword.
    pub offset: u32,
}

/// Output of [`ScopeBuilder::build`].
#[derive(Debug, Clone)]
pub struct Collected {
    /// Every scope of the module.
    pub tree: ScopeTree,
    /// Every name occurrence, in walk order.
    pub occurrences: Vec<Occurrence>,
    /// Every class and function definition, in walk order.
    pub definitions: Vec<Definition>,
}

/// Builds scopes in a single descent.
///
/// Bindings are recorded regardless of position: a name assigned anywhere in
/// a function is local to the whole function. Resolution happens afterwards
/// in [`crate::classify`].
pub struct ScopeBuilder {
    tree: ScopeTree,
    current: ScopeId,
    occurrences: Vec<Occurrence>,
    definitions: Vec<Definition>,
    /// Method scope with a `self`/`cls` parameter, and its class.
    method_classes: Vec<(ScopeId, ScopeId)>,
    leaking_comprehensions: bool,
}

impl ScopeBuilder {
    /// Create a builder. With `leaking_comprehensions`, list comprehensions
    /// bind their variables in the enclosing scope.
    pub fn new(leaking_comprehensions: bool) -> Self {
        Self {
            tree: ScopeTree::new(Span::dummy()),
            current: ScopeId::ROOT,
            occurrences: Vec::new(),
            definitions: Vec::new(),
            method_classes: Vec::new(),
            leaking_comprehensions,
        }
    }

    /// Walk `module` and return its scopes and occurrences.
    #[tracing::instrument(level = "trace", skip_all, fields(statements = module.body.len()))]
    pub fn build(mut self, module: &Module) -> Collected {
        self.tree.get_mut(ScopeId::ROOT).span = module.span;
        self.visit_body(&module.body);
        self.promote_declared_globals();
        tracing::trace!(
            scopes = self.tree.len(),
            occurrences = self.occurrences.len(),
            "scopes built"
        );
        Collected {
            tree: self.tree,
            occurrences: self.occurrences,
            definitions: self.definitions,
        }
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// Enter a new scope, run `f`, and return to the previous one.
    fn with_scope<T>(
        &mut self,
        kind: ScopeKind,
        name: &str,
        span: Span,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let id = self.tree.push(kind, name, self.current, span);
        let saved = std::mem::replace(&mut self.current, id);
        let result = f(self);
        self.current = saved;
        result
    }

    /// Record an occurrence in `scope` and return its index.
    fn record_in(&mut self, scope: ScopeId, name: &str, span: Span, role: Role, access: Access) -> usize {
        let symbol = self.tree.mangle(name, scope);
        self.occurrences.push(Occurrence {
            name: name.into(),
            symbol,
            span,
            scope,
            role,
            access,
            target: None,
        });
        self.occurrences.len() - 1
    }

    fn record(&mut self, name: &str, span: Span) -> usize {
        self.record_in(self.current, name, span, Role::Name, Access::Load)
    }

    fn record_store(&mut self, name: &str, span: Span) -> usize {
        self.record_in(self.current, name, span, Role::Name, Access::Store)
    }

    /// Bind `name` in `scope` with `flags`.
    fn bind_in(&mut self, scope: ScopeId, name: &str, flags: SymbolFlags) {
        let symbol = self.tree.mangle(name, scope);
        self.tree.get_mut(scope).define(&symbol, flags | SymbolFlags::DEF);
    }

    fn bind(&mut self, name: &str) {
        self.bind_in(self.current, name, SymbolFlags::ASSIGNED);
    }

    /// Record and bind an identifier in the current scope.
    fn define_identifier(&mut self, ident: &Identifier) {
        self.bind(&ident.name);
        self.record_store(&ident.name, ident.span);
    }

    /// A name declared `global` and assigned in a function is a module
    /// binding even when the module never assigns it itself.
    fn promote_declared_globals(&mut self) {
        let mut promoted = Vec::new();
        for (_, scope) in self.tree.iter() {
            for symbol in scope.symbols.values() {
                let flags = symbol.flags;
                if flags.contains(SymbolFlags::GLOBAL_EXPLICIT) && flags.contains(SymbolFlags::DEF) {
                    promoted.push((Arc::clone(&symbol.name), flags));
                }
            }
        }
        let root = self.tree.get_mut(ScopeId::ROOT);
        for (name, flags) in promoted {
            let mut binding = SymbolFlags::DEF;
            for flag in [SymbolFlags::IMPORTED, SymbolFlags::ASSIGNED] {
                if flags.contains(flag) {
                    binding |= flag;
                }
            }
            root.define(&name, binding);
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn visit_body(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::FunctionDef(def) => self.visit_function_def(def, stmt.span),
            StmtKind::ClassDef(def) => self.visit_class_def(def, stmt.span),

            StmtKind::Assign { targets, value } => {
                self.visit_expr(value);
                for target in targets {
                    self.visit_target(target);
                }
            }

            StmtKind::AugAssign { target, value } => {
                self.visit_expr(value);
                match target.as_name() {
                    Some(name) => {
                        self.bind(name);
                        self.record(name, target.span);
                    }
                    None => self.visit_expr(target),
                }
            }

            StmtKind::AnnAssign {
                target,
                annotation,
                value,
            } => {
                self.visit_expr(annotation);
                if let Some(value) = value {
                    self.visit_expr(value);
                }
                if let Some(name) = target.as_name() {
                    self.bind_in(self.current, name, SymbolFlags::ASSIGNED | SymbolFlags::ANNOTATED);
                    self.record_store(name, target.span);
                } else {
                    self.visit_expr(target);
                }
            }

            StmtKind::For {
                target,
                iter,
                body,
                orelse,
                ..
            } => {
                self.visit_expr(iter);
                self.visit_target(target);
                self.visit_body(body);
                self.visit_body(orelse);
            }

            StmtKind::While { test, body, orelse } | StmtKind::If { test, body, orelse } => {
                self.visit_expr(test);
                self.visit_body(body);
                self.visit_body(orelse);
            }

            StmtKind::With { items, body, .. } => {
                for item in items {
                    self.visit_expr(&item.context_expr);
                    if let Some(vars) = &item.optional_vars {
                        self.visit_target(vars);
                    }
                }
                self.visit_body(body);
            }

            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            } => {
                self.visit_body(body);
                for handler in handlers {
                    if let Some(typ) = &handler.typ {
                        self.visit_expr(typ);
                    }
                    if let Some(name) = &handler.name {
                        self.define_identifier(name);
                    }
                    self.visit_body(&handler.body);
                }
                self.visit_body(orelse);
                self.visit_body(finalbody);
            }

            StmtKind::Global(names) => {
                for name in names {
                    let symbol = self.tree.mangle(&name.name, self.current);
                    self.tree
                        .get_mut(self.current)
                        .define(&symbol, SymbolFlags::GLOBAL_EXPLICIT);
                    self.record_store(&name.name, name.span);
                }
            }

            StmtKind::Nonlocal(names) => {
                for name in names {
                    let symbol = self.tree.mangle(&name.name, self.current);
                    self.tree
                        .get_mut(self.current)
                        .define(&symbol, SymbolFlags::NONLOCAL);
                    self.record_store(&name.name, name.span);
                }
            }

            StmtKind::Import(aliases) | StmtKind::ImportFrom { names: aliases, .. } => {
                for alias in aliases.iter().filter(|a| !a.is_wildcard()) {
                    if let Some(bound) = alias.bound() {
                        self.bind_in(self.current, &bound.name, SymbolFlags::IMPORTED);
                        self.record_in(self.current, &bound.name, bound.span, Role::Import, Access::Store);
                    }
                }
            }

            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.visit_expr(value);
                }
            }

            StmtKind::Raise { exc, cause } => {
                for expr in exc.iter().chain(cause) {
                    self.visit_expr(expr);
                }
            }

            StmtKind::Assert { test, msg } => {
                self.visit_expr(test);
                if let Some(msg) = msg {
                    self.visit_expr(msg);
                }
            }

            StmtKind::Delete(targets) => {
                for target in targets {
                    self.visit_target(target);
                }
            }

            StmtKind::Expr(value) => self.visit_expr(value),

            StmtKind::Pass | StmtKind::Break | StmtKind::Continue => {}

            StmtKind::Match { subject, cases } => {
                self.visit_expr(subject);
                for case in cases {
                    self.visit_pattern(&case.pattern);
                    if let Some(guard) = &case.guard {
                        self.visit_expr(guard);
                    }
                    self.visit_body(&case.body);
                }
            }

            StmtKind::TypeAlias {
                name,
                type_params,
                value,
            } => {
                self.define_identifier(name);
                self.with_scope(ScopeKind::Annotation, &name.name, stmt.span, |b| {
                    b.visit_type_params(type_params);
                    b.visit_expr(value);
                });
            }
        }
    }

    fn visit_function_def(&mut self, def: &FunctionDef, span: Span) {
        self.definitions.push(Definition {
            kind: DefinitionKind::Function,
            offset: span.start,
        });
        for decorator in &def.decorator_list {
            self.visit_expr(decorator);
        }
        for default in def.args.default_values() {
            self.visit_expr(default);
        }
        self.define_identifier(&def.name);

        let in_class = self.tree.get(self.current).kind == ScopeKind::Class;
        let class_scope = self.current;
        let header = |b: &mut Self| {
            for arg in def.args.iter() {
                if let Some(annotation) = &arg.annotation {
                    b.visit_expr(annotation);
                }
            }
            if let Some(returns) = &def.returns {
                b.visit_expr(returns);
            }
            b.with_scope(ScopeKind::Function, &def.name.name, span, |b| {
                if in_class {
                    b.mark_self_param(&def.args, class_scope);
                }
                b.visit_parameters(&def.args);
                b.visit_body(&def.body);
            });
        };

        if def.type_params.is_empty() {
            header(self);
        } else {
            self.with_scope(ScopeKind::Annotation, &def.name.name, span, |b| {
                b.visit_type_params(&def.type_params);
                header(b);
            });
        }
    }

    fn visit_class_def(&mut self, def: &ClassDef, span: Span) {
        self.definitions.push(Definition {
            kind: DefinitionKind::Class,
            offset: span.start,
        });
        for decorator in &def.decorator_list {
            self.visit_expr(decorator);
        }
        self.define_identifier(&def.name);

        let header = |b: &mut Self| {
            for base in &def.bases {
                b.visit_expr(base);
            }
            for keyword in &def.keywords {
                b.visit_expr(&keyword.value);
            }
            b.with_scope(ScopeKind::Class, &def.name.name, span, |b| b.visit_body(&def.body));
        };

        if def.type_params.is_empty() {
            header(self);
        } else {
            self.with_scope(ScopeKind::Annotation, &def.name.name, span, |b| {
                b.visit_type_params(&def.type_params);
                header(b);
            });
        }
    }

    /// The first positional parameter of a method, spelled `self` or `cls`.
    fn mark_self_param(&mut self, args: &Arguments, class_scope: ScopeId) {
        let Some(first) = args.first_positional() else {
            return;
        };
        if matches!(first.name.as_str(), "self" | "cls") {
            let scope = self.tree.get_mut(self.current);
            scope.self_param = Some(first.name.name.as_str().into());
            self.method_classes.push((self.current, class_scope));
        }
    }

    fn visit_parameters(&mut self, args: &Arguments) {
        for arg in args.iter() {
            self.bind_in(self.current, &arg.name.name, SymbolFlags::PARAM);
            self.record_in(self.current, &arg.name.name, arg.name.span, Role::Parameter, Access::Store);
        }
    }

    fn visit_type_params(&mut self, params: &[TypeParam]) {
        for param in params {
            self.define_identifier(param.name());
            if let TypeParamKind::TypeVar { bound: Some(bound), .. } = &param.kind {
                self.visit_expr(bound);
            }
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Visit an expression in store/delete context.
    fn visit_target(&mut self, target: &Expr) {
        match &target.kind {
            ExprKind::Name(name) => {
                self.bind(name);
                self.record_store(name, target.span);
            }
            ExprKind::Tuple(elts) | ExprKind::List(elts) => {
                for elt in elts {
                    self.visit_target(elt);
                }
            }
            ExprKind::Starred(inner) => self.visit_target(inner),
            _ => self.visit_expr(target),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Name(name) => {
                self.record(name, expr.span);
            }

            ExprKind::Attribute { value, attr } => {
                let attribute = self.self_attribute(value, attr);
                if let (Some(attribute), ExprKind::Name(name)) = (attribute, &value.kind) {
                    let receiver = self.record(name, value.span);
                    self.occurrences[receiver].target = Some(attribute);
                } else {
                    self.visit_expr(value);
                }
            }

            ExprKind::NamedExpr { target, value } => {
                self.visit_expr(value);
                if let Some(name) = target.as_name() {
                    let scope = self.walrus_scope();
                    self.bind_in(scope, name, SymbolFlags::ASSIGNED);
                    self.record_in(scope, name, target.span, Role::Name, Access::Store);
                }
            }

            ExprKind::Lambda { args, body } => {
                for default in args.default_values() {
                    self.visit_expr(default);
                }
                self.with_scope(ScopeKind::Lambda, "<lambda>", expr.span, |b| {
                    b.visit_parameters(args);
                    b.visit_expr(body);
                });
            }

            ExprKind::ListComp { elt, generators } => {
                if self.leaking_comprehensions {
                    for generator in generators {
                        self.visit_expr(&generator.iter);
                        self.visit_target(&generator.target);
                        for cond in &generator.ifs {
                            self.visit_expr(cond);
                        }
                    }
                    self.visit_expr(elt);
                } else {
                    self.visit_comprehension("<listcomp>", expr.span, generators, &[elt.as_ref()]);
                }
            }
            ExprKind::SetComp { elt, generators } => {
                self.visit_comprehension("<setcomp>", expr.span, generators, &[elt.as_ref()]);
            }
            ExprKind::GeneratorExp { elt, generators } => {
                self.visit_comprehension("<genexpr>", expr.span, generators, &[elt.as_ref()]);
            }
            ExprKind::DictComp {
                key,
                value,
                generators,
            } => {
                self.visit_comprehension(
                    "<dictcomp>",
                    expr.span,
                    generators,
                    &[key.as_ref(), value.as_ref()],
                );
            }

            ExprKind::Constant => {}

            ExprKind::JoinedStr(values)
            | ExprKind::List(values)
            | ExprKind::Tuple(values)
            | ExprKind::Set(values)
            | ExprKind::BoolOp(values) => {
                for value in values {
                    self.visit_expr(value);
                }
            }

            ExprKind::Dict { keys, values } => {
                for key in keys.iter().flatten() {
                    self.visit_expr(key);
                }
                for value in values {
                    self.visit_expr(value);
                }
            }

            ExprKind::BinOp { left, right } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }

            ExprKind::Compare { left, comparators } => {
                self.visit_expr(left);
                for comparator in comparators {
                    self.visit_expr(comparator);
                }
            }

            ExprKind::IfExp { test, body, orelse } => {
                self.visit_expr(test);
                self.visit_expr(body);
                self.visit_expr(orelse);
            }

            ExprKind::Subscript { value, slice } => {
                self.visit_expr(value);
                self.visit_expr(slice);
            }

            ExprKind::Slice { lower, upper, step } => {
                for part in [lower, upper, step].into_iter().flatten() {
                    self.visit_expr(part);
                }
            }

            ExprKind::Call {
                func,
                args,
                keywords,
            } => {
                self.visit_expr(func);
                for arg in args {
                    self.visit_expr(arg);
                }
                for keyword in keywords {
                    self.visit_expr(&keyword.value);
                }
            }

            ExprKind::UnaryOp(value)
            | ExprKind::Starred(value)
            | ExprKind::Await(value)
            | ExprKind::YieldFrom(value) => self.visit_expr(value),

            ExprKind::Yield(value) => {
                if let Some(value) = value {
                    self.visit_expr(value);
                }
            }
        }
    }

    /// Comprehension: the first iterable is evaluated outside, everything
    /// else in a fresh scope.
    fn visit_comprehension(
        &mut self,
        name: &str,
        span: Span,
        generators: &[Comprehension],
        elements: &[&Expr],
    ) {
        if let Some(first) = generators.first() {
            self.visit_expr(&first.iter);
        }
        self.with_scope(ScopeKind::Comprehension, name, span, |b| {
            for (i, generator) in generators.iter().enumerate() {
                if i > 0 {
                    b.visit_expr(&generator.iter);
                }
                b.visit_target(&generator.target);
                for cond in &generator.ifs {
                    b.visit_expr(cond);
                }
            }
            for element in elements {
                b.visit_expr(element);
            }
        });
    }

    /// Walrus targets skip comprehension scopes.
    fn walrus_scope(&self) -> ScopeId {
        self.tree
            .ancestors(self.current)
            .find(|&id| self.tree.get(id).kind != ScopeKind::Comprehension)
            .unwrap_or(ScopeId::ROOT)
    }

    /// If `value.attr` is an attribute of the current method's `self`/`cls`
    /// parameter, record the attribute in the class scope.
    fn self_attribute(&mut self, value: &Expr, attr: &Identifier) -> Option<usize> {
        let receiver = value.as_name()?;
        let scope = self.tree.get(self.current);
        if scope.self_param.as_deref() != Some(receiver) {
            return None;
        }
        let class = self
            .method_classes
            .iter()
            .find(|(method, _)| *method == self.current)
            .map(|&(_, class)| class)?;
        Some(self.record_in(class, &attr.name, attr.span, Role::Attribute, Access::Load))
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    fn visit_pattern(&mut self, pattern: &Pattern) {
        match &pattern.kind {
            PatternKind::MatchValue(value) => self.visit_expr(value),
            PatternKind::MatchSingleton => {}
            PatternKind::MatchSequence(patterns) | PatternKind::MatchOr(patterns) => {
                for pattern in patterns {
                    self.visit_pattern(pattern);
                }
            }
            PatternKind::MatchMapping {
                keys,
                patterns,
                rest,
            } => {
                for key in keys {
                    self.visit_expr(key);
                }
                for pattern in patterns {
                    self.visit_pattern(pattern);
                }
                if let Some(rest) = rest {
                    self.define_identifier(rest);
                }
            }
            PatternKind::MatchClass {
                cls,
                patterns,
                kwd_patterns,
                ..
            } => {
                self.visit_expr(cls);
                for pattern in patterns.iter().chain(kwd_patterns) {
                    self.visit_pattern(pattern);
                }
            }
            PatternKind::MatchStar(name) => {
                if let Some(name) = name {
                    self.define_identifier(name);
                }
            }
            PatternKind::MatchAs { pattern, name } => {
                if let Some(pattern) = pattern {
                    self.visit_pattern(pattern);
                }
                if let Some(name) = name {
                    self.define_identifier(name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use scopelight_parser::parse;

    fn build(source: &str) -> Collected {
        let module = parse(source).expect("parse failed");
        ScopeBuilder::new(false).build(&module)
    }

    fn scope_named<'a>(collected: &'a Collected, name: &str) -> (ScopeId, &'a Scope) {
        collected
            .tree
            .iter()
            .find(|(_, scope)| &*scope.name == name)
            .expect("no such scope")
    }

    fn names_in(collected: &Collected, scope: ScopeId) -> Vec<&str> {
        collected
            .occurrences
            .iter()
            .filter(|o| o.scope == scope)
            .map(|o| &*o.name)
            .collect()
    }

    #[test]
    fn test_function_scope_and_parameters() {
        let c = build("def f(a, b=x):\n    return a\n");
        let (id, scope) = scope_named(&c, "f");
        assert_eq!(scope.kind, ScopeKind::Function);
        assert!(scope.lookup("a").is_some_and(|s| s.is_parameter()));
        // The default is evaluated in the module.
        assert!(names_in(&c, ScopeId::ROOT).contains(&"x"));
        assert_eq!(names_in(&c, id), vec!["a", "b", "a"]);
        assert!(c.tree.root().lookup("f").is_some_and(|s| s.is_local()));
    }

    #[test]
    fn test_access_of_occurrences() {
        let c = build("def f(a):\n    a = a\n    a += 1\n    del a\n    global g\n");
        let (id, _) = scope_named(&c, "f");
        let accesses: Vec<(&str, Access)> = c
            .occurrences
            .iter()
            .filter(|o| o.scope == id)
            .map(|o| (&*o.name, o.access))
            .collect();
        assert_eq!(
            accesses,
            vec![
                ("a", Access::Store),
                ("a", Access::Load),
                ("a", Access::Store),
                ("a", Access::Load),
                ("a", Access::Store),
                ("g", Access::Store),
            ]
        );
    }

    #[test]
    fn test_binding_anywhere_in_scope() {
        let c = build("def f():\n    print(x)\n    x = 1\n");
        let (_, scope) = scope_named(&c, "f");
        assert!(scope.lookup("x").is_some_and(|s| s.is_local()));
        assert!(scope.lookup("print").is_none());
    }

    #[test]
    fn test_comprehension_first_iter_outside() {
        let c = build("ys = [y for y in xs if y]\n");
        let (id, scope) = scope_named(&c, "<listcomp>");
        assert_eq!(scope.kind, ScopeKind::Comprehension);
        assert!(names_in(&c, ScopeId::ROOT).contains(&"xs"));
        assert_eq!(names_in(&c, id), vec!["y", "y", "y"]);
    }

    #[test]
    fn test_leaking_list_comprehension() {
        let module = parse("ys = [y for y in xs]\n").unwrap();
        let c = ScopeBuilder::new(true).build(&module);
        assert_eq!(c.tree.len(), 1);
        assert!(c.tree.root().lookup("y").is_some());
    }

    #[test]
    fn test_walrus_binds_outside_comprehension() {
        let c = build("def f(xs):\n    return [last := x for x in xs]\n");
        let (id, scope) = scope_named(&c, "f");
        assert!(scope.lookup("last").is_some());
        let walrus = c.occurrences.iter().find(|o| &*o.name == "last").unwrap();
        assert_eq!(walrus.scope, id);
    }

    #[test]
    fn test_global_declaration_promoted() {
        let c = build("def f():\n    global counter\n    counter = 1\n");
        assert!(c.tree.root().lookup("counter").is_some_and(|s| s.is_local()));
        let (_, scope) = scope_named(&c, "f");
        let flags = scope.lookup("counter").unwrap().flags;
        assert!(flags.contains(SymbolFlags::GLOBAL_EXPLICIT));
        assert!(!flags.is_local());
    }

    #[test]
    fn test_imports_skip_wildcards() {
        let c = build("import os.path\nfrom a import b as c\nfrom m import *\n");
        let imports: Vec<_> = c
            .occurrences
            .iter()
            .filter(|o| o.role == Role::Import)
            .map(|o| &*o.name)
            .collect();
        assert_eq!(imports, vec!["os", "c"]);
        assert!(c.tree.root().lookup("*").is_none());
    }

    #[test]
    fn test_self_attribute_targets_class_scope() {
        let source = "class A:\n    def m(self):\n        self.x = 1\n";
        let c = build(source);
        let (class_id, _) = scope_named(&c, "A");
        let (method_id, method) = scope_named(&c, "m");
        assert_eq!(method.self_param.as_deref(), Some("self"));

        let attr = c
            .occurrences
            .iter()
            .position(|o| o.role == Role::Attribute)
            .unwrap();
        assert_eq!(c.occurrences[attr].scope, class_id);
        assert_eq!(c.occurrences[attr].span.slice(source), "x");

        let receiver = c
            .occurrences
            .iter()
            .find(|o| o.scope == method_id && o.target.is_some())
            .unwrap();
        assert_eq!(receiver.target, Some(attr));
    }

    #[test]
    fn test_no_self_param_outside_class() {
        let c = build("def m(self):\n    self.x = 1\n");
        let (_, scope) = scope_named(&c, "m");
        assert!(scope.self_param.is_none());
        assert!(c.occurrences.iter().all(|o| o.role != Role::Attribute));
    }

    #[test]
    fn test_private_name_mangling() {
        let c = build("class _Foo:\n    __x = 1\n    __init__ = 2\n");
        let (_, scope) = scope_named(&c, "_Foo");
        assert!(scope.lookup("_Foo__x").is_some());
        assert!(scope.lookup("__init__").is_some());
    }

    #[test]
    fn test_type_params_get_annotation_scope() {
        let c = build("def f[T: int](x: T) -> T:\n    pass\n");
        let (annotation, scope) = scope_named(&c, "f");
        assert_eq!(scope.kind, ScopeKind::Annotation);
        assert!(scope.lookup("T").is_some());
        let body = scope.children[0];
        assert_eq!(c.tree.get(body).kind, ScopeKind::Function);
        assert_eq!(c.tree.get(body).parent, Some(annotation));
    }

    #[test]
    fn test_match_captures() {
        let c = build("match p:\n    case [x, *rest] | {'k': x, **rest}:\n        pass\n    case _:\n        pass\n");
        let root = c.tree.root();
        assert!(root.lookup("x").is_some());
        assert!(root.lookup("rest").is_some());
        assert!(root.lookup("_").is_none());
    }

    #[test]
    fn test_definitions_recorded() {
        let c = build("@dec\nclass A:\n    async def m(self):\n        pass\n");
        let kinds: Vec<_> = c.definitions.iter().map(|d| (d.kind, d.offset)).collect();
        assert_eq!(
            kinds,
            vec![(DefinitionKind::Class, 5), (DefinitionKind::Function, 18)]
        );
    }
}
