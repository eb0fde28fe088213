//! The classified nodes of one analysis pass and the queries over them.

use crate::node::{Category, Highlight, NameNode, NodeId};
use crate::scope::ScopeId;
use rustc_hash::FxHashMap;
use scopelight_core::Position;
use smallvec::SmallVec;
use std::sync::Arc;

/// Key shared by every node that refers to the same binding.
type BindingKey = (Option<ScopeId>, Arc<str>);

/// Nodes ordered by (line, column, category, name) with lookups by position
/// and by binding.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    nodes: Vec<NameNode>,
    by_binding: FxHashMap<BindingKey, SmallVec<[NodeId; 4]>>,
}

impl NodeIndex {
    /// Sort `nodes` and renumber them. Targets are remapped from the
    /// incoming ids.
    #[must_use]
    pub fn new(mut nodes: Vec<NameNode>) -> Self {
        nodes.sort_by(|a, b| {
            (a.start, a.category, &a.name).cmp(&(b.start, b.category, &b.name))
        });

        let mut remap = vec![NodeId(0); nodes.len()];
        for (new, node) in nodes.iter().enumerate() {
            if let Some(slot) = remap.get_mut(node.id.index()) {
                *slot = NodeId(new as u32);
            }
        }

        let mut by_binding: FxHashMap<BindingKey, SmallVec<[NodeId; 4]>> = FxHashMap::default();
        for (new, node) in nodes.iter_mut().enumerate() {
            node.id = NodeId(new as u32);
            node.target = node.target.and_then(|t| remap.get(t.index()).copied());
            by_binding
                .entry((node.defining, Arc::clone(&node.symbol)))
                .or_default()
                .push(node.id);
        }

        Self { nodes, by_binding }
    }

    /// Number of nodes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether there are no nodes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in order.
    #[inline]
    pub fn nodes(&self) -> &[NameNode] {
        &self.nodes
    }

    /// Get a node by id.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&NameNode> {
        self.nodes.get(id.index())
    }

    /// Nodes on a 1-indexed line.
    pub fn on_line(&self, line: u32) -> &[NameNode] {
        let lo = self.nodes.partition_point(|n| n.start.line < line);
        let hi = self.nodes.partition_point(|n| n.start.line <= line);
        &self.nodes[lo..hi]
    }

    /// The node covering `pos`, end exclusive.
    pub fn node_at(&self, pos: Position) -> Option<&NameNode> {
        self.on_line(pos.line).iter().find(|n| n.contains(pos))
    }

    /// Nodes referring to the same binding as `node`: same symbol and same
    /// defining scope.
    ///
    /// With `use_target`, a `self`/`cls` receiver is replaced by the
    /// attribute it qualifies. Without `mark_original`, the (possibly
    /// redirected) node itself is left out.
    pub fn same_nodes(&self, node: &NameNode, mark_original: bool, use_target: bool) -> Vec<&NameNode> {
        let node = match node.target {
            Some(target) if use_target => self.get(target).unwrap_or(node),
            _ => node,
        };
        let key = (node.defining, Arc::clone(&node.symbol));
        self.by_binding
            .get(&key)
            .into_iter()
            .flatten()
            .filter(|&&id| mark_original || id != node.id)
            .filter_map(|&id| self.get(id))
            .collect()
    }

    /// Every node a rename of `node` must touch, `node` included.
    pub fn rename_set(&self, node: &NameNode, use_target: bool) -> Vec<&NameNode> {
        self.same_nodes(node, true, use_target)
    }

    /// Highlights for the nodes sharing a binding with the node at `pos`,
    /// drawn as [`Category::Selected`].
    pub fn selection(&self, pos: Position, mark_original: bool, use_target: bool) -> Vec<Highlight> {
        let Some(node) = self.node_at(pos) else {
            return Vec::new();
        };
        self.same_nodes(node, mark_original, use_target)
            .into_iter()
            .map(|n| n.highlight_as(Category::Selected))
            .collect()
    }

    /// Sorted highlights of every node whose category is not excluded.
    pub fn highlights(&self, excluded: &[Category]) -> Vec<Highlight> {
        self.nodes
            .iter()
            .filter(|n| !excluded.contains(&n.category))
            .map(NameNode::highlight)
            .collect()
    }

    /// First node of `category` starting after `here`, wrapping around.
    pub fn next_of_category(&self, category: Category, here: Position) -> Option<&NameNode> {
        let mut of_category = self.nodes.iter().filter(|n| n.category == category);
        let first = of_category.clone().next();
        of_category.find(|n| n.start > here).or(first)
    }

    /// Last node of `category` starting before `here`, wrapping around.
    pub fn prev_of_category(&self, category: Category, here: Position) -> Option<&NameNode> {
        let mut of_category = self.nodes.iter().rev().filter(|n| n.category == category);
        let last = of_category.clone().next();
        of_category.find(|n| n.start < here).or(last)
    }

    /// First node of `category` in the buffer.
    pub fn first_of_category(&self, category: Category) -> Option<&NameNode> {
        self.nodes.iter().find(|n| n.category == category)
    }

    /// Last node of `category` in the buffer.
    pub fn last_of_category(&self, category: Category) -> Option<&NameNode> {
        self.nodes.iter().rev().find(|n| n.category == category)
    }
}

/// The location after `here` in `locations`, or before it with `reverse`,
/// wrapping at both ends. `here` counts as a location of its own, so from
/// inside a gap the nearest neighbour is chosen.
#[must_use]
pub fn next_location(here: Position, locations: &[Position], reverse: bool) -> Position {
    let mut sorted: SmallVec<[Position; 16]> = locations.iter().copied().collect();
    if !sorted.contains(&here) {
        sorted.push(here);
    }
    sorted.sort_unstable();
    sorted.dedup();
    let len = sorted.len();
    let at = sorted.iter().position(|&p| p == here).unwrap_or(0);
    let step = if reverse { len - 1 } else { 1 };
    sorted[(at + step) % len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scopelight_core::Span;

    fn node(id: u32, line: u32, col: u32, name: &str, category: Category, defining: u32) -> NameNode {
        NameNode {
            id: NodeId(id),
            name: name.into(),
            symbol: name.into(),
            start: Position::new(line, col),
            end: col + name.len() as u32,
            span: Span::dummy(),
            category,
            scope: ScopeId::ROOT,
            defining: Some(ScopeId(defining)),
            target: None,
        }
    }

    fn sample() -> NodeIndex {
        NodeIndex::new(vec![
            node(0, 2, 4, "x", Category::Local, 1),
            node(1, 1, 0, "x", Category::Global, 0),
            node(2, 3, 8, "x", Category::Local, 1),
            node(3, 1, 4, "len", Category::Builtin, 0),
        ])
    }

    #[test]
    fn test_nodes_sorted_and_renumbered() {
        let index = sample();
        let order: Vec<_> = index.nodes().iter().map(|n| (n.start.line, n.start.column)).collect();
        assert_eq!(order, vec![(1, 0), (1, 4), (2, 4), (3, 8)]);
        for (i, n) in index.nodes().iter().enumerate() {
            assert_eq!(n.id.index(), i);
        }
    }

    #[test]
    fn test_target_remapped() {
        let mut receiver = node(0, 2, 0, "self", Category::SelfParam, 1);
        receiver.target = Some(NodeId(1));
        let attr = node(1, 1, 0, "a", Category::Attribute, 0);
        let index = NodeIndex::new(vec![receiver, attr]);
        let receiver = index.node_at(Position::new(2, 1)).unwrap();
        let target = index.get(receiver.target.unwrap()).unwrap();
        assert_eq!(&*target.name, "a");
    }

    #[test]
    fn test_node_at_end_exclusive() {
        let index = sample();
        assert_eq!(index.node_at(Position::new(1, 4)).map(|n| &*n.name), Some("len"));
        assert_eq!(index.node_at(Position::new(1, 6)).map(|n| &*n.name), Some("len"));
        assert!(index.node_at(Position::new(1, 7)).is_none());
        assert!(index.node_at(Position::new(9, 0)).is_none());
    }

    #[test]
    fn test_same_nodes_respects_defining_scope() {
        let index = sample();
        let x = index.node_at(Position::new(2, 4)).unwrap();
        let same: Vec<_> = index.same_nodes(x, true, true).iter().map(|n| n.start).collect();
        assert_eq!(same, vec![Position::new(2, 4), Position::new(3, 8)]);
        let others = index.same_nodes(x, false, true);
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].start, Position::new(3, 8));
    }

    #[test]
    fn test_selection_highlights() {
        let index = sample();
        let selected = index.selection(Position::new(3, 8), true, true);
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|h| h.category == Category::Selected));
        assert!(index.selection(Position::new(1, 3), true, true).is_empty());
    }

    #[test]
    fn test_category_navigation_wraps() {
        let index = sample();
        let here = Position::new(3, 8);
        let next = index.next_of_category(Category::Local, here).unwrap();
        assert_eq!(next.start, Position::new(2, 4));
        let prev = index.prev_of_category(Category::Local, Position::new(2, 4)).unwrap();
        assert_eq!(prev.start, Position::new(3, 8));
        assert_eq!(
            index.first_of_category(Category::Global).map(|n| n.start),
            Some(Position::new(1, 0))
        );
        assert!(index.last_of_category(Category::Free).is_none());
    }

    #[test]
    fn test_highlights_exclude() {
        let index = sample();
        let hls = index.highlights(&[Category::Builtin]);
        assert_eq!(hls.len(), 3);
        assert!(hls.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_next_location() {
        let locs = [Position::new(1, 0), Position::new(5, 0), Position::new(9, 4)];
        assert_eq!(next_location(Position::new(5, 0), &locs, false), Position::new(9, 4));
        assert_eq!(next_location(Position::new(9, 4), &locs, false), Position::new(1, 0));
        assert_eq!(next_location(Position::new(1, 0), &locs, true), Position::new(9, 4));
        assert_eq!(next_location(Position::new(3, 2), &locs, false), Position::new(5, 0));
        assert_eq!(next_location(Position::new(3, 2), &locs, true), Position::new(1, 0));
        assert_eq!(next_location(Position::new(3, 2), &[], false), Position::new(3, 2));
    }
}
