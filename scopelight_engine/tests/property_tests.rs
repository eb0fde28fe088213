//! Property-based tests for the differ and the session.
//!
//! 1. Diff correctness: applying the ops to the old highlights yields the new
//!    ones, for any change range.
//! 2. Ordering: every remove precedes every add.
//! 3. Idempotence: re-analyzing an unchanged buffer publishes nothing.

use proptest::prelude::*;
use scopelight_analysis::{Category, Highlight};
use scopelight_engine::{apply, diff, BufferSession, ChangedLines, Config, DiffOp, Snapshot};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

// -- Strategies --

fn category_strategy() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

fn highlight_strategy() -> impl Strategy<Value = Highlight> {
    (1u32..12, 0u32..16, category_strategy(), prop::sample::select(vec!["a", "bb", "self", "x"]))
        .prop_map(|(line, start, category, name)| Highlight {
            line,
            start,
            end: start + name.len() as u32,
            category,
            name: name.into(),
        })
}

fn highlight_set() -> impl Strategy<Value = Vec<Highlight>> {
    prop::collection::btree_set(highlight_strategy(), 0..40).prop_map(|set| set.into_iter().collect())
}

fn range_strategy() -> impl Strategy<Value = Option<ChangedLines>> {
    prop::option::of((1u32..12, 0u32..4, 0u32..4).prop_map(|(start, old, new)| ChangedLines {
        start,
        old_end: start + old,
        new_end: start + new,
    }))
}

/// A small Python module built from name-heavy statement templates.
fn program_strategy() -> impl Strategy<Value = String> {
    let name = prop::sample::select(vec!["a", "b", "len", "os", "value"]);
    let statement = (0usize..6, name.clone(), name).prop_map(|(kind, x, y)| match kind {
        0 => format!("{x} = {y}\n"),
        1 => format!("import {x}\n"),
        2 => format!("def f({x}):\n    return {y}\n"),
        3 => format!("class C:\n    def m(self, {x}):\n        self.{y} = {x}\n"),
        4 => format!("print([{x} for {x} in {y}])\n"),
        _ => format!("lambda {x}: {y}\n"),
    });
    prop::collection::vec(statement, 1..8).prop_map(|lines| lines.concat())
}

// -- Properties --

proptest! {
    #[test]
    fn diff_applies_to_new_state(old in highlight_set(), new in highlight_set(), range in range_strategy()) {
        let ops = diff(&old, &new, range);
        let mut drawn: BTreeSet<Highlight> = old.iter().cloned().collect();
        apply(&mut drawn, &ops);
        prop_assert_eq!(drawn.into_iter().collect::<Vec<_>>(), new);
    }

    #[test]
    fn diff_removes_before_adds(old in highlight_set(), new in highlight_set(), range in range_strategy()) {
        let ops = diff(&old, &new, range);
        let first_add = ops.iter().position(|op| matches!(op, DiffOp::Add(_))).unwrap_or(ops.len());
        prop_assert!(ops[first_add..].iter().all(|op| matches!(op, DiffOp::Add(_))));
    }

    #[test]
    fn diff_of_identical_sets_is_empty(hls in highlight_set()) {
        prop_assert!(diff(&hls, &hls, None).is_empty());
    }

    #[test]
    fn reanalysis_publishes_nothing(source in program_strategy()) {
        let mut session = BufferSession::new(Arc::new(Config::default()));
        let now = Instant::now();
        session.update(&Snapshot::new(source.as_str()), now);
        let drawn = session.drawn().to_vec();
        let ops = session.update(&Snapshot::new(source.as_str()), now);
        prop_assert!(ops.is_empty(), "unexpected ops {:?}", ops);
        prop_assert_eq!(session.drawn(), drawn.as_slice());
    }

    #[test]
    fn incremental_matches_fresh(first in program_strategy(), second in program_strategy()) {
        let now = Instant::now();
        let mut incremental = BufferSession::new(Arc::new(Config::default()));
        incremental.update(&Snapshot::new(first.as_str()), now);
        let mut drawn: BTreeSet<Highlight> = incremental.drawn().iter().cloned().collect();
        let ops = incremental.update(&Snapshot::new(second.as_str()), now);
        apply(&mut drawn, &ops);

        let mut fresh = BufferSession::new(Arc::new(Config::default()));
        fresh.update(&Snapshot::new(second.as_str()), now);
        prop_assert_eq!(drawn.into_iter().collect::<Vec<_>>(), fresh.drawn().to_vec());
    }
}
