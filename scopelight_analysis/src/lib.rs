//! # Scopelight Analysis
//!
//! Scope resolution and name classification for Python source.
//!
//! A pass runs in three steps:
//! 1. [`ScopeBuilder`] walks the tree once, building scopes and collecting
//!    every name occurrence.
//! 2. [`Classifier`] resolves each occurrence against the finished scopes.
//! 3. [`NodeIndex`] orders the classified nodes and answers queries.
//!
//! [`analyze`] runs all three.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod classify;
pub mod index;
pub mod node;
pub mod scope;

pub use classify::Classifier;
pub use index::{next_location, NodeIndex};
pub use node::{Category, Highlight, NameNode, NodeId, UnknownCategory};
pub use scope::{DefinitionKind, ScopeBuilder, ScopeId, ScopeKind, ScopeTree};

use rustc_hash::FxHashSet;
use scopelight_core::{LineIndex, Position};
use scopelight_parser::{Parsed, Tolerated};
use std::sync::Arc;

/// Knobs that change how names are bound or classified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// List comprehensions bind their variables in the enclosing scope.
    pub leaking_comprehensions: bool,
    /// Builtin names reported as unresolved instead.
    pub excluded_builtins: FxHashSet<Arc<str>>,
}

/// What [`Analysis::next_location`] jumps between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    /// Occurrences of the name under the cursor.
    Name,
    /// `class` statements.
    Class,
    /// `def` statements.
    Function,
}

/// The result of analyzing one buffer version.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Classified nodes.
    pub index: NodeIndex,
    /// Scopes the nodes refer to.
    pub scopes: ScopeTree,
    /// Start of each `class` statement.
    pub classes: Vec<Position>,
    /// Start of each `def` statement.
    pub functions: Vec<Position>,
    /// Present when the tree came from a patched copy of the buffer.
    pub tolerated: Option<Tolerated>,
}

impl Analysis {
    /// An analysis with no nodes, standing in for "nothing analyzed yet".
    #[must_use]
    pub fn empty() -> Self {
        Self {
            index: NodeIndex::default(),
            scopes: ScopeTree::new(scopelight_core::Span::dummy()),
            classes: Vec::new(),
            functions: Vec::new(),
            tolerated: None,
        }
    }

    /// Where to jump from `here`. For [`LocationKind::Name`] the candidates
    /// are the nodes sharing a binding with the node at `here`; `None` when
    /// there is no such node.
    #[must_use]
    pub fn next_location(
        &self,
        kind: LocationKind,
        here: Position,
        reverse: bool,
        use_target: bool,
    ) -> Option<Position> {
        let locations = self.locations(kind, here, use_target)?;
        Some(next_location(here, &locations, reverse))
    }

    /// The first (or with `last`, the final) location of `kind`.
    #[must_use]
    pub fn edge_location(
        &self,
        kind: LocationKind,
        here: Position,
        last: bool,
        use_target: bool,
    ) -> Option<Position> {
        let locations = self.locations(kind, here, use_target)?;
        if last {
            locations.iter().max().copied()
        } else {
            locations.iter().min().copied()
        }
    }

    fn locations(&self, kind: LocationKind, here: Position, use_target: bool) -> Option<Vec<Position>> {
        Some(match kind {
            LocationKind::Name => {
                let node = self.index.node_at(here)?;
                self.index
                    .same_nodes(node, true, use_target)
                    .into_iter()
                    .map(|n| n.start)
                    .collect()
            }
            LocationKind::Class => self.classes.clone(),
            LocationKind::Function => self.functions.clone(),
        })
    }
}

/// Analyze a parsed buffer.
#[tracing::instrument(level = "debug", skip_all, fields(tolerated = parsed.is_tolerated()))]
pub fn analyze(parsed: &Parsed<'_>, options: &AnalysisOptions) -> Analysis {
    let mut collected = ScopeBuilder::new(options.leaking_comprehensions).build(&parsed.module);
    let lines = LineIndex::new(&parsed.source);
    let nodes = Classifier::new(&mut collected.tree, &options.excluded_builtins)
        .classify(&collected.occurrences, &lines);

    let mut classes = Vec::new();
    let mut functions = Vec::new();
    for definition in &collected.definitions {
        let position = lines.position(definition.offset);
        match definition.kind {
            DefinitionKind::Class => classes.push(position),
            DefinitionKind::Function => functions.push(position),
        }
    }

    let index = NodeIndex::new(nodes);
    tracing::debug!(nodes = index.len(), scopes = collected.tree.len(), "analysis complete");
    Analysis {
        index,
        scopes: collected.tree,
        classes,
        functions,
        tolerated: parsed.tolerated.clone(),
    }
}
