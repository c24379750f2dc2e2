//! D-Tree: a maximum spanning forest kept as parent pointers, with explicit children and
//! non-tree adjacency on every node.

use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};

use debug_tree::TreeBuilder;
use derivative::Derivative;

use crate::connectivity::SpanningForest;
use crate::directory::{opt_fmt, Directory, Idx, VertexNode};
use crate::edge::{Timestamp, TreeEdge, Vertex, NO_EDGE};
use crate::memory::Footprint;
use crate::pointer_tree::PointerNode;

fn weight_fmt(w: &Timestamp, f: &mut Formatter) -> std::fmt::Result {
    if *w == NO_EDGE {
        write!(f, "∞")
    } else {
        write!(f, "{w}")
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Node {
    vertex: Vertex,
    #[derivative(Debug(format_with = "opt_fmt"))]
    parent: Option<Idx>,
    children: BTreeSet<Idx>,
    /// Other endpoints of non-tree edges.
    non_tree: BTreeSet<Idx>,
    size: usize,
    /// Weight of the edge to the parent.
    #[derivative(Debug(format_with = "weight_fmt"))]
    weight: Timestamp,
}

impl VertexNode for Node {
    fn new(vertex: Vertex) -> Self {
        Self {
            vertex,
            parent: None,
            children: BTreeSet::new(),
            non_tree: BTreeSet::new(),
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
    fn add_child(&mut self, child: Idx) {
        self.children.insert(child);
    }
    fn remove_child(&mut self, child: Idx) {
        self.children.remove(&child);
    }
    fn is_isolated(&self) -> bool {
        self.parent.is_none() && self.children.is_empty() && self.non_tree.is_empty()
    }
}

#[derive(Default)]
pub struct DTree {
    nodes: Directory<Node>,
    /// Use non-tree edges to shorten paths when they arrive.
    reshaping: bool,
}

impl DTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// A D-Tree that may turn an arriving non-tree edge into a tree edge when its endpoints' depths
    /// differ by at least 2, demoting a tree edge on the cycle instead.
    pub fn with_reshaping() -> Self {
        Self {
            nodes: Directory::new(),
            reshaping: true,
        }
    }

    fn add_non_tree(&mut self, u: Idx, v: Idx) {
        self.nodes[u].non_tree.insert(v);
        self.nodes[v].non_tree.insert(u);
    }

    fn clean_up(&mut self, u: Idx) {
        if self.nodes[u].is_isolated() {
            self.nodes.remove(u);
        }
    }

    fn pair(&self, u: Vertex, v: Vertex) -> Option<(Idx, Idx)> {
        Some((self.nodes.get(u)?, self.nodes.get(v)?))
    }

    /// Distance from u to the root of its tree.
    pub fn depth(&self, u: Vertex) -> Option<usize> {
        self.nodes.get(u).map(|u| self.nodes.depth(u))
    }

    /// Non-tree edges, each once, with the smaller endpoint first.
    pub fn non_tree_edges(&self) -> Vec<(Vertex, Vertex)> {
        let mut edges: Vec<_> = self
            .nodes
            .iter()
            .flat_map(|(v, u)| {
                self.nodes[u]
                    .non_tree
                    .iter()
                    .map(move |&w| (v, self.nodes.vertex(w)))
            })
            .filter(|(a, b)| a < b)
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Is every subtree size and children set consistent with the parent pointers?
    pub fn is_consistent(&self) -> bool {
        self.nodes.sizes_consistent()
            && self.nodes.iter().all(|(_, u)| {
                let n = &self.nodes[u];
                n.children.iter().all(|&c| self.nodes[c].parent == Some(u))
                    && n.parent
                        .map_or(true, |p| self.nodes[p].children.contains(&u))
            })
    }
}

impl SpanningForest for DTree {
    fn same_tree(&mut self, u: Vertex, v: Vertex) -> bool {
        let (u, v) = (self.nodes.get_or_create(u), self.nodes.get_or_create(v));
        self.nodes.find_root(u) == self.nodes.find_root(v)
    }

    fn connected(&mut self, u: Vertex, v: Vertex) -> bool {
        match self.pair(u, v) {
            Some((u, v)) => self.nodes.connected_rebalancing(u, v),
            None => false,
        }
    }

    fn find_root(&mut self, u: Vertex) -> Option<Vertex> {
        let u = self.nodes.get(u)?;
        Some(self.nodes.vertex(self.nodes.find_root(u)))
    }

    fn link(&mut self, u: Vertex, v: Vertex, weight: Timestamp) {
        let (u, v) = (self.nodes.get_or_create(u), self.nodes.get_or_create(v));
        self.nodes.insert_tree_edge(u, v, weight, true);
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

    fn replace(&mut self, min: TreeEdge, u: Vertex, v: Vertex, weight: Timestamp) {
        if let Some((a, b)) = self.pair(min.child, min.parent) {
            self.nodes.delete_tree_edge(a, b);
            self.add_non_tree(a, b);
        }
        self.link(u, v, weight);
    }

    fn insert_non_tree_edge(&mut self, u: Vertex, v: Vertex, weight: Timestamp) {
        let (u, v) = (self.nodes.get_or_create(u), self.nodes.get_or_create(v));
        if self.nodes[u].non_tree.contains(&v) {
            return;
        }
        if self.reshaping {
            if let Some((c, p)) = self.nodes.reshape(u, v, weight) {
                self.add_non_tree(c, p);
                return;
            }
        }
        self.add_non_tree(u, v);
    }

    fn delete_tree_edge(&mut self, u: Vertex, v: Vertex) {
        if let Some((u, v)) = self.pair(u, v) {
            self.nodes.delete_tree_edge(u, v);
            self.clean_up(u);
            self.clean_up(v);
        }
    }

    fn delete_non_tree_edge(&mut self, u: Vertex, v: Vertex) {
        if let Some((u, v)) = self.pair(u, v) {
            self.nodes[u].non_tree.remove(&v);
            self.nodes[v].non_tree.remove(&u);
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
        let adjacency_entries = self
            .nodes
            .iter()
            .map(|(_, u)| self.nodes[u].children.len() + self.nodes[u].non_tree.len())
            .sum();
        Footprint {
            vertices: self.nodes.len(),
            node_slots: self.nodes.slots(),
            node_bytes: std::mem::size_of::<Node>(),
            adjacency_entries,
            ..Default::default()
        }
    }
}

impl Debug for DTree {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let builder = TreeBuilder::new();
        {
            let _b = builder.add_branch("DTree");
            let mut roots: Vec<_> = self
                .nodes
                .iter()
                .filter(|&(_, u)| self.nodes[u].parent.is_none())
                .collect();
            roots.sort_unstable();
            for (_, r) in roots {
                self.tree_dbg(r, &builder);
            }
        }
        write!(f, "{}", builder.string())
    }
}

impl DTree {
    fn tree_dbg(&self, u: Idx, tree: &TreeBuilder) {
        let n = &self.nodes[u];
        let _b = tree.add_branch(&format!("[{u}] {n:?}"));
        for &c in &n.children {
            self.tree_dbg(c, tree);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;

    fn insert_all(t: &mut DTree, edges: &[(Vertex, Vertex, Timestamp)]) {
        for &e in edges {
            t.insert_edge(Edge::from(e));
            assert!(t.is_consistent(), "after {e:?}\n{t:?}");
        }
    }

    #[test]
    fn replacement_keeps_heavier_edges() {
        let mut t = DTree::new();
        insert_all(&mut t, &[(1, 2, 0), (2, 3, 1), (1, 3, 2)]);
        assert!(t.is_tree_edge(1, 3));
        assert!(t.is_tree_edge(2, 3));
        assert!(!t.is_tree_edge(1, 2));
        assert_eq!(t.non_tree_edges(), vec![(1, 2)]);
        assert_eq!(t.tree_edge_weight(3, 1), Some(2));
    }

    #[test]
    fn tied_edge_is_kept_as_non_tree() {
        let mut t = DTree::new();
        insert_all(&mut t, &[(1, 2, 5), (2, 3, 5), (3, 1, 5)]);
        assert_eq!(t.tree_edges().len(), 2);
        assert_eq!(t.non_tree_edges().len(), 1);
        // Inserting it again is a no-op.
        insert_all(&mut t, &[(3, 1, 5)]);
        assert_eq!(t.non_tree_edges().len(), 1);
    }

    #[test]
    fn isolated_vertices_are_dropped() {
        let mut t = DTree::new();
        insert_all(&mut t, &[(1, 2, 0), (2, 3, 1)]);
        assert_eq!(t.len(), 3);
        t.remove_edge(Edge::new(1, 2, 0));
        assert_eq!(t.len(), 2);
        assert!(!t.connected(1, 2));
        assert_eq!(t.find_root(1), None);
        t.remove_edge(Edge::new(2, 3, 1));
        assert!(t.is_empty());
    }

    #[test]
    fn queries_rebalance_long_paths() {
        let mut t = DTree::new();
        // A path hung from one end: 0 - 1 - ... - 20
        for v in 0..20 {
            t.insert_edge(Edge::new(v, v + 1, v as Timestamp));
        }
        assert!(t.is_consistent());
        for _ in 0..30 {
            assert!(t.connected(0, 20));
            assert!(t.is_consistent());
        }
        // Both halves of the path hang from the middle vertex.
        assert_eq!(t.find_root(0), Some(10));
        assert_eq!(t.depth(0), Some(10));
        assert_eq!(t.depth(20), Some(10));
    }

    #[test]
    fn reshaping_shortens_the_cycle() {
        let mut t = DTree::with_reshaping();
        // Path 0 - 1 - 2 - 3 - 4 - 5, all at the same timestamp so that (0, 5) can't replace.
        for v in 0..5 {
            t.insert_edge(Edge::new(v, v + 1, 7));
        }
        t.insert_edge(Edge::new(0, 5, 7));
        assert!(t.is_consistent());
        let (d0, d5) = (t.depth(0).unwrap(), t.depth(5).unwrap());
        if t.is_tree_edge(0, 5) {
            // The demoted edge was recorded instead.
            assert_eq!(t.tree_edges().len(), 5);
            assert_eq!(t.non_tree_edges().len(), 1);
            assert!(!t.non_tree_edges().contains(&(0, 5)));
        } else {
            assert!(d0.abs_diff(d5) < 2);
            assert_eq!(t.non_tree_edges(), vec![(0, 5)]);
        }
        for v in 0..6 {
            assert!(t.connected(0, v));
        }
    }
}
