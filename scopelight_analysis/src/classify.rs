//! Name classification.
//!
//! Resolution follows Python's lexical rules over the finished scope tree:
//! own scope first, then enclosing function-like scopes (class bodies are not
//! visible to nested scopes), then the module, then builtins.

use crate::builtins::is_builtin;
use crate::node::{Category, NameNode, NodeId};
use crate::scope::{Access, Occurrence, Role, ScopeId, ScopeKind, ScopeTree, SymbolFlags};
use rustc_hash::FxHashSet;
use scopelight_core::LineIndex;
use std::sync::Arc;

/// Where an occurrence resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resolution {
    category: Category,
    defining: ScopeId,
}

/// Classifies occurrences against a scope tree, recording free variables
/// and parameter reads on its scopes.
pub struct Classifier<'a> {
    tree: &'a mut ScopeTree,
    excluded_builtins: &'a FxHashSet<Arc<str>>,
}

impl<'a> Classifier<'a> {
    /// Create a classifier. Names in `excluded_builtins` are never
    /// classified as builtins.
    pub fn new(tree: &'a mut ScopeTree, excluded_builtins: &'a FxHashSet<Arc<str>>) -> Self {
        Self {
            tree,
            excluded_builtins,
        }
    }

    /// Classify every occurrence.
    ///
    /// The returned nodes are in occurrence order, with ids and targets equal
    /// to occurrence indices.
    #[tracing::instrument(level = "trace", skip_all, fields(occurrences = occurrences.len()))]
    pub fn classify(&mut self, occurrences: &[Occurrence], lines: &LineIndex) -> Vec<NameNode> {
        let resolutions: Vec<Resolution> = occurrences
            .iter()
            .map(|occurrence| self.resolve(occurrence))
            .collect();

        self.record_usage(occurrences, &resolutions);

        occurrences
            .iter()
            .zip(&resolutions)
            .enumerate()
            .map(|(i, (occurrence, resolution))| {
                let mut category = resolution.category;
                if category == Category::Parameter
                    && self.tree.get(resolution.defining).reads_of(&occurrence.symbol) == 0
                {
                    category = Category::ParameterUnused;
                }
                let start = lines.position(occurrence.span.start);
                NameNode {
                    id: NodeId(i as u32),
                    name: Arc::clone(&occurrence.name),
                    symbol: Arc::clone(&occurrence.symbol),
                    start,
                    end: start.column + occurrence.name.len() as u32,
                    span: occurrence.span,
                    category,
                    scope: occurrence.scope,
                    defining: Some(resolution.defining),
                    target: occurrence.target.map(|t| NodeId(t as u32)),
                }
            })
            .collect()
    }

    /// Fill each scope's parameter read counts and free-variable set.
    fn record_usage(&mut self, occurrences: &[Occurrence], resolutions: &[Resolution]) {
        for (_, scope) in self.tree.iter_mut() {
            scope.free.clear();
            scope.parameter_reads = scope
                .symbols
                .values()
                .filter(|symbol| symbol.is_parameter())
                .map(|symbol| (Arc::clone(&symbol.name), 0))
                .collect();
        }

        for (occurrence, resolution) in occurrences.iter().zip(resolutions) {
            if !matches!(resolution.category, Category::Parameter | Category::Free) {
                continue;
            }
            if occurrence.access == Access::Load {
                let defining = self.tree.get_mut(resolution.defining);
                if let Some(reads) = defining.parameter_reads.get_mut(&*occurrence.symbol) {
                    *reads += 1;
                }
            }
            if resolution.category == Category::Free {
                let path: Vec<ScopeId> = self
                    .tree
                    .ancestors(occurrence.scope)
                    .take_while(|&id| id != resolution.defining)
                    .collect();
                for id in path {
                    self.tree.get_mut(id).free.insert(Arc::clone(&occurrence.symbol));
                }
            }
        }
    }

    fn resolve(&self, occurrence: &Occurrence) -> Resolution {
        match occurrence.role {
            Role::Attribute => Resolution {
                category: Category::Attribute,
                defining: occurrence.scope,
            },
            Role::Import => {
                let mut resolution = self.resolve_name(occurrence);
                resolution.category = Category::Imported;
                resolution
            }
            Role::Name | Role::Parameter => self.resolve_name(occurrence),
        }
    }

    fn resolve_name(&self, occurrence: &Occurrence) -> Resolution {
        let symbol = &*occurrence.symbol;
        let own_id = occurrence.scope;
        let own = self.tree.get(own_id);

        if let Some(binding) = own.lookup(symbol) {
            let flags = binding.flags;
            if flags.contains(SymbolFlags::GLOBAL_EXPLICIT) {
                return self.resolve_global(occurrence);
            }
            if flags.is_local() {
                let category = if flags.contains(SymbolFlags::PARAM) {
                    if own.self_param.as_deref() == Some(symbol) {
                        Category::SelfParam
                    } else {
                        Category::Parameter
                    }
                } else if flags.contains(SymbolFlags::IMPORTED) {
                    Category::Imported
                } else if own.kind == ScopeKind::Module {
                    Category::Global
                } else {
                    Category::Local
                };
                return Resolution {
                    category,
                    defining: own_id,
                };
            }
        }
        if own.kind == ScopeKind::Module {
            return self.resolve_global(occurrence);
        }

        let mut previous = own.kind;
        for id in self.tree.ancestors(own_id).skip(1) {
            let scope = self.tree.get(id);
            match scope.kind {
                ScopeKind::Module => break,
                // Annotation scopes can see the class body they sit in.
                ScopeKind::Class if previous != ScopeKind::Annotation => {}
                _ => {
                    if let Some(binding) = scope.lookup(symbol) {
                        if binding.flags.contains(SymbolFlags::GLOBAL_EXPLICIT) {
                            break;
                        }
                        if binding.flags.is_local() {
                            let category = if scope.kind == ScopeKind::Class {
                                Category::Local
                            } else {
                                Category::Free
                            };
                            return Resolution {
                                category,
                                defining: id,
                            };
                        }
                    }
                }
            }
            previous = scope.kind;
        }
        self.resolve_global(occurrence)
    }

    /// Module binding, then builtin, then unresolved. All of them group
    /// under the module scope.
    fn resolve_global(&self, occurrence: &Occurrence) -> Resolution {
        let category = match self.tree.root().lookup(&occurrence.symbol) {
            Some(binding) if binding.flags.contains(SymbolFlags::DEF) => {
                if binding.flags.contains(SymbolFlags::IMPORTED) {
                    Category::Imported
                } else {
                    Category::Global
                }
            }
            _ if is_builtin(&occurrence.name)
                && !self.excluded_builtins.contains(&*occurrence.name) =>
            {
                Category::Builtin
            }
            _ => Category::Unresolved,
        };
        Resolution {
            category,
            defining: ScopeId::ROOT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeBuilder;
    use pretty_assertions::assert_eq;
    use scopelight_parser::parse;

    fn classify(source: &str) -> Vec<(String, Category)> {
        let module = parse(source).expect("parse failed");
        let mut collected = ScopeBuilder::new(false).build(&module);
        let excluded = FxHashSet::default();
        let nodes = Classifier::new(&mut collected.tree, &excluded)
            .classify(&collected.occurrences, &LineIndex::new(source));
        nodes
            .into_iter()
            .map(|n| (n.name.to_string(), n.category))
            .collect()
    }

    fn pairs(expected: &[(&str, Category)]) -> Vec<(String, Category)> {
        expected.iter().map(|(n, c)| (n.to_string(), *c)).collect()
    }

    #[test]
    fn test_module_names() {
        assert_eq!(
            classify("import os\nx = len(os)\ny\n"),
            pairs(&[
                ("os", Category::Imported),
                ("len", Category::Builtin),
                ("os", Category::Imported),
                ("x", Category::Global),
                ("y", Category::Unresolved),
            ])
        );
    }

    #[test]
    fn test_builtin_shadowed_by_module_binding() {
        assert_eq!(
            classify("list = []\nlist\n"),
            pairs(&[("list", Category::Global), ("list", Category::Global)])
        );
    }

    #[test]
    fn test_parameters_and_unused() {
        assert_eq!(
            classify("def f(a, b):\n    return a\n"),
            pairs(&[
                ("f", Category::Global),
                ("a", Category::Parameter),
                ("b", Category::ParameterUnused),
                ("a", Category::Parameter),
            ])
        );
    }

    #[test]
    fn test_nested_read_marks_parameter_used() {
        let classes = classify("def f(a):\n    def g():\n        return a\n    return g\n");
        assert!(classes.contains(&("a".to_string(), Category::Free)));
        assert!(!classes.iter().any(|(_, c)| *c == Category::ParameterUnused));
    }

    #[test]
    fn test_stored_parameter_is_unused() {
        assert_eq!(
            classify("def f(x):\n    x = 1\n"),
            pairs(&[
                ("f", Category::Global),
                ("x", Category::ParameterUnused),
                ("x", Category::ParameterUnused),
            ])
        );
        let deleted = classify("def f(x):\n    del x\n");
        assert!(deleted[1..].iter().all(|(_, c)| *c == Category::ParameterUnused));
    }

    #[test]
    fn test_augmented_assignment_reads_parameter() {
        let classes = classify("def f(x):\n    x += 1\n");
        assert!(classes[1..].iter().all(|(_, c)| *c == Category::Parameter));
    }

    #[test]
    fn test_nonlocal_store_is_not_a_read() {
        let classes = classify("def f(x):\n    def g():\n        nonlocal x\n        x = 2\n");
        assert_eq!(classes[1], ("x".to_string(), Category::ParameterUnused));

        let classes = classify("def f(x):\n    def g():\n        nonlocal x\n        x += 2\n");
        assert_eq!(classes[1], ("x".to_string(), Category::Parameter));
    }

    fn scopes(source: &str) -> ScopeTree {
        let module = parse(source).expect("parse failed");
        let mut collected = ScopeBuilder::new(false).build(&module);
        let excluded = FxHashSet::default();
        Classifier::new(&mut collected.tree, &excluded)
            .classify(&collected.occurrences, &LineIndex::new(source));
        collected.tree
    }

    fn scope<'t>(tree: &'t ScopeTree, name: &str) -> &'t crate::scope::Scope {
        tree.iter()
            .map(|(_, scope)| scope)
            .find(|scope| &*scope.name == name)
            .unwrap_or_else(|| panic!("no scope {name}"))
    }

    #[test]
    fn test_scopes_record_parameter_reads() {
        let tree = scopes("def f(a, b, c):\n    b = a + a\n    def g():\n        return c\n");
        let f = scope(&tree, "f");
        assert_eq!((f.reads_of("a"), f.reads_of("b"), f.reads_of("c")), (2, 0, 1));
        assert_eq!(f.parameter_reads.len(), 3);
        assert!(scope(&tree, "g").parameter_reads.is_empty());
    }

    #[test]
    fn test_scopes_record_free_variables() {
        let tree = scopes(
            "def f(a):\n    b = 1\n    def g():\n        def h():\n            return a, b, len\n",
        );
        let expected: FxHashSet<Arc<str>> = [Arc::from("a"), Arc::from("b")].into_iter().collect();
        assert_eq!(scope(&tree, "h").free, expected);
        // `g` passes both names through to `h`.
        assert_eq!(scope(&tree, "g").free, expected);
        assert!(scope(&tree, "f").free.is_empty());
        assert!(tree.root().free.is_empty());
    }

    #[test]
    fn test_free_and_local() {
        assert_eq!(
            classify("def f():\n    x = 1\n    def g():\n        return x\n"),
            pairs(&[
                ("f", Category::Global),
                ("x", Category::Local),
                ("g", Category::Local),
                ("x", Category::Free),
            ])
        );
    }

    #[test]
    fn test_class_body_not_visible_to_methods() {
        let classes = classify("class A:\n    x = 1\n    def m(self):\n        return x\n");
        assert_eq!(classes[1], ("x".to_string(), Category::Local));
        assert_eq!(classes.last(), Some(&("x".to_string(), Category::Unresolved)));
    }

    #[test]
    fn test_self_param_never_unused() {
        let classes = classify("class A:\n    def m(self):\n        pass\n");
        assert!(classes.contains(&("self".to_string(), Category::SelfParam)));
    }

    #[test]
    fn test_global_declaration() {
        assert_eq!(
            classify("def f():\n    global g\n    g = 1\n"),
            pairs(&[
                ("f", Category::Global),
                ("g", Category::Global),
                ("g", Category::Global),
            ])
        );
    }

    #[test]
    fn test_nonlocal_declaration() {
        let classes = classify("def f():\n    n = 0\n    def g():\n        nonlocal n\n        n += 1\n");
        let n: Vec<_> = classes.iter().filter(|(name, _)| name == "n").collect();
        assert_eq!(n.len(), 3);
        assert_eq!(n[1].1, Category::Free);
        assert_eq!(n[2].1, Category::Free);
    }

    #[test]
    fn test_excluded_builtin_is_unresolved() {
        let module = parse("print\n").unwrap();
        let mut collected = ScopeBuilder::new(false).build(&module);
        let excluded: FxHashSet<Arc<str>> = [Arc::from("print")].into_iter().collect();
        let nodes = Classifier::new(&mut collected.tree, &excluded)
            .classify(&collected.occurrences, &LineIndex::new("print\n"));
        assert_eq!(nodes[0].category, Category::Unresolved);
    }

    #[test]
    fn test_type_param_visible_in_body() {
        let classes = classify("def f[T](x: T) -> T:\n    y: T = x\n");
        let ts: Vec<_> = classes.iter().filter(|(name, _)| name == "T").collect();
        assert_eq!(ts[0].1, Category::Local);
        assert!(ts[1..].iter().all(|(_, c)| *c == Category::Local || *c == Category::Free));
        assert_eq!(ts.last().map(|t| t.1), Some(Category::Free));
    }

    #[test]
    fn test_positions_are_byte_columns() {
        let source = "s = 'é'; v = s\n";
        let module = parse(source).unwrap();
        let mut collected = ScopeBuilder::new(false).build(&module);
        let excluded = FxHashSet::default();
        let nodes = Classifier::new(&mut collected.tree, &excluded)
            .classify(&collected.occurrences, &LineIndex::new(source));
        let v = nodes.iter().find(|n| &*n.name == "v").unwrap();
        assert_eq!((v.start.line, v.start.column, v.end), (1, 10, 11));
    }
}
