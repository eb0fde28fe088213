//! Analysis throughput benchmarks.
//!
//! Measures the full pass an editor runs on every qualifying edit: parse,
//! scope construction, classification and indexing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scopelight_analysis::{analyze, AnalysisOptions};
use scopelight_parser::{parse, parse_tolerant, TolerateAll};

// =============================================================================
// Benchmark Helpers
// =============================================================================

const CLASS_TEMPLATE: &str = "\
class Widget{n}(Base):
    registry = {}

    def __init__(self, name, *children, parent=None):
        self.name = name
        self.children = [child for child in children if child is not parent]
        self.__secret = len(self.children)

    @property
    def size(self):
        def walk(node, depth=0):
            return sum(walk(c, depth + 1) for c in node.children) + depth
        return walk(self)

    @classmethod
    def create(cls, spec):
        if (name := spec.get('name')) is not None:
            return cls(name)
        raise ValueError(f'bad spec {spec!r}')
";

/// Module with `classes` copies of a method-heavy class.
fn synthetic_module(classes: usize) -> String {
    let mut source = String::from("import os\nfrom typing import Any\n\nBase = object\n\n");
    for n in 0..classes {
        source.push_str(&CLASS_TEMPLATE.replace("{n}", &n.to_string()));
        source.push('\n');
    }
    source
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_full_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pass");
    for classes in [1, 10, 100] {
        let source = synthetic_module(classes);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(classes), &source, |b, source| {
            let options = AnalysisOptions::default();
            b.iter(|| {
                let parsed = parse_tolerant(black_box(source), None, &TolerateAll)
                    .expect("synthetic module parses");
                black_box(analyze(&parsed, &options))
            });
        });
    }
    group.finish();
}

fn bench_parse_only(c: &mut Criterion) {
    let source = synthetic_module(100);
    c.bench_function("parse_100_classes", |b| {
        b.iter(|| black_box(parse(black_box(&source))))
    });
}

fn bench_tolerant_recovery(c: &mut Criterion) {
    let mut source = synthetic_module(10);
    source.push_str("value = os.path.join(\n");
    c.bench_function("tolerant_recovery", |b| {
        b.iter(|| black_box(parse_tolerant(black_box(&source), None, &TolerateAll)))
    });
}

criterion_group!(benches, bench_full_pass, bench_parse_only, bench_tolerant_recovery);
criterion_main!(benches);
