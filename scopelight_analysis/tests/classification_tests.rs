//! End-to-end classification tests: source text in, categories out.

use scopelight_analysis::{analyze, Analysis, AnalysisOptions, Category, NameNode};
use scopelight_core::Position;
use scopelight_parser::{parse_tolerant, TolerateAll};

fn analyze_source(source: &str) -> Analysis {
    analyze_with(source, &AnalysisOptions::default())
}

fn analyze_with(source: &str, options: &AnalysisOptions) -> Analysis {
    let parsed = parse_tolerant(source, None, &TolerateAll).expect("parse failed");
    analyze(&parsed, options)
}

fn at(analysis: &Analysis, line: u32, column: u32) -> &NameNode {
    analysis
        .index
        .node_at(Position::new(line, column))
        .unwrap_or_else(|| panic!("no node at {line}:{column}"))
}

fn category_at(analysis: &Analysis, line: u32, column: u32) -> Category {
    at(analysis, line, column).category
}

#[test]
fn test_builtin_shadowing_makes_global() {
    let a = analyze_source("list = []\nprint(list)\n");
    assert_eq!(category_at(&a, 1, 0), Category::Global);
    assert_eq!(category_at(&a, 2, 0), Category::Builtin);
    assert_eq!(category_at(&a, 2, 6), Category::Global);
}

#[test]
fn test_self_attribute_merge() {
    let source = "\
class Point:
    x = 0

    def move(self, dx):
        self.x += dx
        return self.x
";
    let a = analyze_source(source);
    assert_eq!(category_at(&a, 4, 13), Category::SelfParam);
    assert_eq!(category_at(&a, 5, 13), Category::Attribute);

    // The receiver redirects to the attribute, which shares the class
    // binding with the class-level `x`.
    let receiver = at(&a, 5, 8);
    assert_eq!(receiver.category, Category::SelfParam);
    let merged: Vec<Position> = a
        .index
        .same_nodes(receiver, true, true)
        .iter()
        .map(|n| n.start)
        .collect();
    assert_eq!(
        merged,
        vec![Position::new(2, 4), Position::new(5, 13), Position::new(6, 20)]
    );

    // Without the redirect, the receiver groups with its own parameter.
    let unmerged = a.index.same_nodes(receiver, true, false);
    assert!(unmerged.iter().all(|n| &*n.name == "self"));
    assert_eq!(unmerged.len(), 3);
}

#[test]
fn test_cls_parameter_in_classmethod() {
    let source = "class A:\n    @classmethod\n    def make(cls):\n        return cls.registry\n";
    let a = analyze_source(source);
    assert_eq!(category_at(&a, 3, 13), Category::SelfParam);
    assert_eq!(category_at(&a, 4, 19), Category::Attribute);
}

#[test]
fn test_unused_parameters() {
    let source = "def f(used, unused, *args, **kwargs):\n    return used(*args)\n";
    let a = analyze_source(source);
    assert_eq!(category_at(&a, 1, 6), Category::Parameter);
    assert_eq!(category_at(&a, 1, 12), Category::ParameterUnused);
    assert_eq!(category_at(&a, 1, 21), Category::Parameter);
    assert_eq!(category_at(&a, 1, 29), Category::ParameterUnused);
}

#[test]
fn test_lambda_parameters() {
    let a = analyze_source("key = lambda item, _: item[0]\n");
    assert_eq!(category_at(&a, 1, 13), Category::Parameter);
    assert_eq!(category_at(&a, 1, 19), Category::ParameterUnused);
}

#[test]
fn test_closure_reads_are_free() {
    let source = "\
def outer(n):
    total = 0
    def inner():
        return total + n
    return inner
";
    let a = analyze_source(source);
    assert_eq!(category_at(&a, 4, 15), Category::Free);
    assert_eq!(category_at(&a, 4, 23), Category::Free);
    assert_eq!(category_at(&a, 1, 10), Category::Parameter);
}

#[test]
fn test_comprehension_scopes() {
    let source = "xs = [1]\nys = [x * k for x in xs]\nx\n";
    let a = analyze_source(source);
    assert_eq!(category_at(&a, 2, 6), Category::Local);
    assert_eq!(category_at(&a, 2, 10), Category::Unresolved);
    assert_eq!(category_at(&a, 2, 21), Category::Global);
    assert_eq!(category_at(&a, 3, 0), Category::Unresolved);

    let leaking = AnalysisOptions {
        leaking_comprehensions: true,
        ..AnalysisOptions::default()
    };
    let a = analyze_with(source, &leaking);
    assert_eq!(category_at(&a, 2, 6), Category::Global);
    assert_eq!(category_at(&a, 3, 0), Category::Global);
}

#[test]
fn test_walrus_in_comprehension_binds_in_function() {
    let source = "def f(xs):\n    [last := x for x in xs]\n    return last\n";
    let a = analyze_source(source);
    assert_eq!(category_at(&a, 2, 5), Category::Local);
    assert_eq!(category_at(&a, 3, 11), Category::Local);
}

#[test]
fn test_private_names_group_by_mangled_symbol() {
    let source = "\
class Account:
    __slots = ()

    def peek(self):
        return self.__slots
";
    let a = analyze_source(source);
    let attribute = at(&a, 5, 20);
    assert_eq!(&*attribute.symbol, "_Account__slots");
    let same = a.index.same_nodes(attribute, true, true);
    assert_eq!(same.len(), 2);
}

#[test]
fn test_imports_and_globals() {
    let source = "\
import os.path as osp
from collections import OrderedDict
from typing import *

def f():
    global config
    config = osp.join('a')
    return OrderedDict, List
";
    let a = analyze_source(source);
    assert_eq!(category_at(&a, 1, 18), Category::Imported);
    assert_eq!(category_at(&a, 2, 24), Category::Imported);
    assert_eq!(category_at(&a, 6, 11), Category::Global);
    assert_eq!(category_at(&a, 7, 4), Category::Global);
    assert_eq!(category_at(&a, 7, 13), Category::Imported);
    assert_eq!(category_at(&a, 8, 11), Category::Imported);
    // Wildcard imports bind nothing.
    assert_eq!(category_at(&a, 8, 24), Category::Unresolved);
}

#[test]
fn test_pep695_type_parameters() {
    let source = "\
class Box[T]:
    def get(self) -> T:
        item: T
        return item

type Pair[K, V] = tuple[K, V]
";
    let a = analyze_source(source);
    assert_eq!(category_at(&a, 1, 10), Category::Local);
    assert_eq!(category_at(&a, 2, 21), Category::Free);
    assert_eq!(category_at(&a, 3, 14), Category::Free);
    assert_eq!(category_at(&a, 6, 5), Category::Global);
    assert_eq!(category_at(&a, 6, 18), Category::Builtin);
    assert_eq!(category_at(&a, 6, 24), Category::Local);
}

#[test]
fn test_match_captures() {
    let source = "\
match command:
    case Point(x=0, y=yy):
        print(yy)
    case [first, *rest]:
        print(first, rest)
";
    let a = analyze_source(source);
    assert_eq!(category_at(&a, 1, 6), Category::Unresolved);
    assert_eq!(category_at(&a, 2, 22), Category::Global);
    assert_eq!(category_at(&a, 3, 14), Category::Global);
    assert_eq!(category_at(&a, 4, 18), Category::Global);
}

#[test]
fn test_rename_set_is_exact() {
    let source = "\
value = 1
def f(value):
    return value
print(value)
";
    let a = analyze_source(source);
    let param = at(&a, 2, 6);
    let rename: Vec<Position> = a.index.rename_set(param, true).iter().map(|n| n.start).collect();
    assert_eq!(rename, vec![Position::new(2, 6), Position::new(3, 11)]);

    let global = at(&a, 4, 6);
    let rename: Vec<Position> = a.index.rename_set(global, true).iter().map(|n| n.start).collect();
    assert_eq!(rename, vec![Position::new(1, 0), Position::new(4, 6)]);
}

#[test]
fn test_every_resolved_node_defined_in_own_or_ancestor_scope() {
    let source = "\
import sys
class C:
    attr = 1
    def m(self, a):
        def inner(b):
            return [a + b + z for z in sys.argv]
        return inner
";
    let a = analyze_source(source);
    for node in a.index.nodes() {
        let defining = node.defining.expect("every node has a defining scope");
        let mut chain = a.scopes.ancestors(node.scope);
        assert!(
            chain.any(|id| id == defining),
            "{} at {} is defined outside its scope chain",
            node.name,
            node.start
        );
    }
}

#[test]
fn test_analysis_is_idempotent() {
    let source = "import os\nclass A:\n    def f(self, x):\n        return os.path.join(self.y, x)\n";
    let first = analyze_source(source);
    let second = analyze_source(source);
    assert_eq!(first.index.highlights(&[]), second.index.highlights(&[]));
}

#[test]
fn test_long_chains_are_rejected_before_analysis() {
    let terms = vec!["a"; 50_000];
    for sep in [" + ", "."] {
        let source = format!("a = 1\nx = {}\n", terms.join(sep));
        let err = parse_tolerant(&source, Some(2), &TolerateAll).unwrap_err();
        assert_eq!(err.kind, scopelight_core::SyntaxErrorKind::TooDeep, "{sep:?}");
        assert_eq!(err.line(), 2);
    }
}

#[test]
fn test_long_chain_within_limit_is_classified() {
    let source = format!("a = 1\nx = {}\n", vec!["a"; 300].join(" + "));
    let a = analyze_source(&source);
    assert_eq!(category_at(&a, 2, 4), Category::Global);
    assert_eq!(a.index.same_nodes(at(&a, 1, 0), true, false).len(), 301);
}

#[test]
fn test_assigned_but_never_read_parameter_is_unused() {
    let a = analyze_source("def f(x, y):\n    x = 1\n    return y\n");
    assert_eq!(category_at(&a, 1, 6), Category::ParameterUnused);
    assert_eq!(category_at(&a, 2, 4), Category::ParameterUnused);
    assert_eq!(category_at(&a, 1, 9), Category::Parameter);

    let f = a
        .scopes
        .iter()
        .map(|(_, scope)| scope)
        .find(|scope| &*scope.name == "f")
        .unwrap();
    assert_eq!((f.reads_of("x"), f.reads_of("y")), (0, 1));
}
