//! Parent-pointer forests that keep nothing but tree edges. Non-tree edges are either used right
//! away to shorten the tree or dropped.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

use debug_tree::TreeBuilder;
use derivative::Derivative;

use crate::connectivity::SpanningForest;
use crate::directory::{opt_fmt, Directory, Idx, VertexNode};
use crate::edge::{Timestamp, TreeEdge, Vertex, NO_EDGE};
use crate::memory::Footprint;
use crate::pointer_tree::PointerNode;

/// How hard a forest works to keep its trees shallow.
pub trait Policy {
    /// Re-root at the centre of the tree when linking, and towards the queried vertices when
    /// answering queries.
    const BALANCE: bool;
    /// Use non-tree edges to shorten paths before dropping them.
    const RESHAPE: bool;
}

/// The optimized D-Tree policy.
#[derive(Debug, Default)]
pub struct Balanced;

impl Policy for Balanced {
    const BALANCE: bool = true;
    const RESHAPE: bool = true;
}

/// Tree edges and sizes only.
#[derive(Debug, Default)]
pub struct Simple;

impl Policy for Simple {
    const BALANCE: bool = false;
    const RESHAPE: bool = false;
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Node {
    vertex: Vertex,
    #[derivative(Debug(format_with = "opt_fmt"))]
    parent: Option<Idx>,
    size: usize,
    weight: Timestamp,
}

impl VertexNode for Node {
    fn new(vertex: Vertex) -> Self {
        Self {
            vertex,
            parent: None,
            size: 1,
            weight: NO_EDGE,
        }
    }
    fn vertex(&self) -> Vertex {
        self.vertex
    }
}

impl PointerNode for Node {
    fn parent(&self) -> Option<Idx> {
        self.parent
    }
    fn set_parent(&mut self, parent: Option<Idx>) {
        self.parent = parent;
    }
    fn size(&self) -> usize {
        self.size
    }
    fn size_mut(&mut self) -> &mut usize {
        &mut self.size
    }
    fn weight(&self) -> Timestamp {
        self.weight
    }
    fn set_weight(&mut self, weight: Timestamp) {
        self.weight = weight;
    }
}

pub struct OptimizedTree<P> {
    nodes: Directory<Node>,
    _policy: PhantomData<P>,
}

pub type OptimizedDTree = OptimizedTree<Balanced>;
pub type STree = OptimizedTree<Simple>;

impl<P> Default for OptimizedTree<P> {
    fn default() -> Self {
        Self {
            nodes: Directory::default(),
            _policy: PhantomData,
        }
    }
}

impl<P: Policy> OptimizedTree<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self, u: Vertex) -> Option<usize> {
        self.nodes.get(u).map(|u| self.nodes.depth(u))
    }

    pub fn is_consistent(&self) -> bool {
        self.nodes.sizes_consistent()
    }

    fn pair(&self, u: Vertex, v: Vertex) -> Option<(Idx, Idx)> {
        Some((self.nodes.get(u)?, self.nodes.get(v)?))
    }

    fn clean_up(&mut self, u: Idx) {
        if self.nodes[u].is_isolated() {
            self.nodes.remove(u);
        }
    }
}

impl<P: Policy> SpanningForest for OptimizedTree<P> {
    fn same_tree(&mut self, u: Vertex, v: Vertex) -> bool {
        let (u, v) = (self.nodes.get_or_create(u), self.nodes.get_or_create(v));
        self.nodes.find_root(u) == self.nodes.find_root(v)
    }

    fn connected(&mut self, u: Vertex, v: Vertex) -> bool {
        let Some((u, v)) = self.pair(u, v) else {
            return false;
        };
        if P::BALANCE {
            self.nodes.connected_rebalancing(u, v)
        } else {
            self.nodes.find_root(u) == self.nodes.find_root(v)
        }
    }

    fn find_root(&mut self, u: Vertex) -> Option<Vertex> {
        let u = self.nodes.get(u)?;
        Some(self.nodes.vertex(self.nodes.find_root(u)))
    }

    fn link(&mut self, u: Vertex, v: Vertex, weight: Timestamp) {
        let (u, v) = (self.nodes.get_or_create(u), self.nodes.get_or_create(v));
        self.nodes.insert_tree_edge(u, v, weight, P::BALANCE);
    }

    fn find_minimum(&mut self, u: Vertex, v: Vertex) -> Option<TreeEdge> {
        let (u, v) = self.pair(u, v)?;
        let child = self.nodes.find_minimum(u, v)?;
        let parent = self.nodes.parent(child)?;
        Some(TreeEdge {
            child: self.nodes.vertex(child),
            parent: self.nodes.vertex(parent),
            weight: self.nodes.weight(child),
        })
    }

    fn insert_non_tree_edge(&mut self, u: Vertex, v: Vertex, weight: Timestamp) {
        if !P::RESHAPE {
            return;
        }
        let (u, v) = (self.nodes.get_or_create(u), self.nodes.get_or_create(v));
        if let Some((c, p)) = self.nodes.reshape(u, v, weight) {
            log::trace!(
                "Dropped {}-{} for a shorter path",
                self.nodes.vertex(c),
                self.nodes.vertex(p)
            );
        }
    }

    fn delete_tree_edge(&mut self, u: Vertex, v: Vertex) {
        if let Some((u, v)) = self.pair(u, v) {
            self.nodes.delete_tree_edge(u, v);
            self.clean_up(u);
            self.clean_up(v);
        }
    }

    fn tree_edge_weight(&self, u: Vertex, v: Vertex) -> Option<Timestamp> {
        let (u, v) = self.pair(u, v)?;
        let (child, _) = self.nodes.tree_edge(u, v)?;
        Some(self.nodes.weight(child))
    }

    fn tree_edges(&self) -> Vec<TreeEdge> {
        self.nodes.tree_edges()
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn footprint(&self) -> Footprint {
        Footprint {
            vertices: self.nodes.len(),
            node_slots: self.nodes.slots(),
            node_bytes: std::mem::size_of::<Node>(),
            ..Default::default()
        }
    }
}

impl<P> Debug for OptimizedTree<P> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let mut children: HashMap<Option<Idx>, Vec<Idx>> = HashMap::new();
        for (_, u) in self.nodes.iter() {
            children.entry(self.nodes[u].parent).or_default().push(u);
        }
        children.values_mut().for_each(|c| c.sort_unstable());
        let builder = TreeBuilder::new();
        {
            let _b = builder.add_branch("OptimizedTree");
            let roots = children.get(&None).cloned().unwrap_or_default();
            for r in roots {
                self.tree_dbg(r, &children, &builder);
            }
        }
        write!(f, "{}", builder.string())
    }
}

impl<P> OptimizedTree<P> {
    fn tree_dbg(&self, u: Idx, children: &HashMap<Option<Idx>, Vec<Idx>>, tree: &TreeBuilder) {
        let _b = tree.add_branch(&format!("[{u}] {:?}", self.nodes[u]));
        for &c in children.get(&Some(u)).into_iter().flatten() {
            self.tree_dbg(c, children, tree);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;

    #[test]
    fn non_tree_edges_are_dropped() {
        let mut t = OptimizedDTree::new();
        t.insert_edge(Edge::new(1, 2, 3));
        t.insert_edge(Edge::new(2, 3, 3));
        t.insert_edge(Edge::new(1, 3, 3));
        assert_eq!(t.tree_edges().len(), 2);
        assert!(t.connected(1, 3));
        // Evicting the dropped edge touches nothing.
        let dropped = [(1, 2), (2, 3), (1, 3)]
            .into_iter()
            .find(|&(u, v)| !t.is_tree_edge(u, v))
            .unwrap();
        t.remove_edge(Edge::new(dropped.0, dropped.1, 3));
        assert_eq!(t.tree_edges().len(), 2);
        assert!(t.is_consistent());
    }

    #[test]
    fn reshape_keeps_dropped_edges_shallow() {
        let mut t = OptimizedDTree::new();
        // Star around 0 with a long arm 0 - 10 - 11 - 12 - 13, all ties.
        for v in 1..=6 {
            t.insert_edge(Edge::new(0, v, 1));
        }
        t.insert_edge(Edge::new(0, 10, 1));
        for v in 10..13 {
            t.insert_edge(Edge::new(v, v + 1, 1));
        }
        assert!(t.is_consistent());
        let before = t.tree_edges();
        t.insert_edge(Edge::new(1, 13, 1));
        assert!(t.is_consistent());
        let after = t.tree_edges();
        assert_eq!(before.len(), after.len());
        if t.is_tree_edge(1, 13) {
            assert!(after.iter().all(|e| e.weight == 1));
        } else {
            assert!(t.depth(1).unwrap().abs_diff(t.depth(13).unwrap()) <= 1);
        }
        for v in [1, 2, 3, 4, 5, 6, 10, 11, 12, 13] {
            assert!(t.connected(0, v));
        }
    }

    #[test]
    fn s_tree_never_moves_roots_on_query() {
        let mut t = STree::new();
        for v in 0..10 {
            t.insert_edge(Edge::new(v, v + 1, v as Timestamp));
        }
        let root = t.find_root(0);
        let depth = t.depth(10);
        for _ in 0..5 {
            assert!(t.connected(0, 10));
        }
        assert_eq!(t.find_root(0), root);
        assert_eq!(t.depth(10), depth);
        t.insert_edge(Edge::new(0, 10, 20));
        assert!(t.is_tree_edge(0, 10));
        assert!(!t.is_tree_edge(0, 1));
        assert!(t.is_consistent());
    }

    #[test]
    fn pruned_after_last_edge_leaves() {
        let mut t = STree::new();
        t.insert_edge(Edge::new(4, 5, 0));
        t.remove_edge(Edge::new(4, 5, 0));
        assert!(t.is_empty());
        assert_eq!(t.footprint().node_slots, 2);
        t.insert_edge(Edge::new(6, 7, 1));
        assert_eq!(t.footprint().node_slots, 2);
        assert_eq!(t.len(), 2);
    }
}
