use std::collections::VecDeque;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use crate::d_tree::DTree;
use crate::edge::{Edge, Timestamp, TreeEdge, Vertex};
use crate::error::ConfigError;
use crate::link_cut_tree::LinkCutForest;
use crate::memory::{Footprint, MemoryProbe};
use crate::optimized_tree::{OptimizedDTree, STree};
use crate::union_find::RecomputingConnectivity;

/// Connectivity over the edges of a sliding window. The window driver only talks to engines
/// through this trait.
pub trait WindowConnectivity {
    /// Adds an edge. Edges arrive in timestamp order.
    fn insert(&mut self, edge: Edge);
    /// Forgets every edge with timestamp smaller than `less_than`.
    fn evict(&mut self, less_than: Timestamp);
    /// Are source and target connected by edges of the window? False for unknown vertices.
    ///
    /// Pointer-based engines may reshape their trees while answering.
    fn query(&mut self, source: Vertex, target: Vertex) -> bool;
    /// Answers every query, appending each answer to the output with the same index.
    /// Callers guarantee `queries.len() == outputs.len()`.
    fn query_batch(&mut self, queries: &[(Vertex, Vertex)], outputs: &mut [Vec<bool>]) {
        for (&(u, v), out) in queries.iter().zip(outputs.iter_mut()) {
            out.push(self.query(u, v));
        }
    }
    /// Periodic maintenance after each slide. Nothing to do for the engines in this crate.
    fn manage(&mut self, _timestamp: Timestamp) {}
    /// What the engine currently holds.
    fn footprint(&self) -> Footprint;
    /// Bytes used, as measured by the given probe.
    fn memory_consumption(&self, probe: &dyn MemoryProbe) -> u64 {
        probe.measure(&self.footprint())
    }
}

/// A forest kept as a maximum spanning forest of the inserted edges, weighted by timestamp.
///
/// Vertices are created on first use by [`SpanningForest::same_tree`] and dropped once they have
/// no edges left.
pub trait SpanningForest: Debug {
    /// Are u and v in the same tree? Starts tracking both if needed.
    fn same_tree(&mut self, u: Vertex, v: Vertex) -> bool;
    /// Are u and v in the same tree? False if any of them is not tracked. May restructure.
    fn connected(&mut self, u: Vertex, v: Vertex) -> bool;
    /// Root of the tree containing u, if tracked.
    fn find_root(&mut self, u: Vertex) -> Option<Vertex>;
    /// Adds a tree edge between u and v, which must be in different trees.
    fn link(&mut self, u: Vertex, v: Vertex, weight: Timestamp);
    /// Minimum weight tree edge on the path between u and v, which must be in the same tree.
    /// None if the path is empty.
    fn find_minimum(&mut self, u: Vertex, v: Vertex) -> Option<TreeEdge>;
    /// Swaps `min` out of the forest for a tree edge (u, v).
    fn replace(&mut self, min: TreeEdge, u: Vertex, v: Vertex, weight: Timestamp) {
        self.delete_tree_edge(min.child, min.parent);
        self.link(u, v, weight);
    }
    /// Handles an edge that closes a cycle without being heavier than its minimum.
    fn insert_non_tree_edge(&mut self, u: Vertex, v: Vertex, weight: Timestamp);
    /// Removes the tree edge between u and v, if there is one. Never searches for a replacement.
    fn delete_tree_edge(&mut self, u: Vertex, v: Vertex);
    /// Forgets a non-tree edge between u and v.
    fn delete_non_tree_edge(&mut self, _u: Vertex, _v: Vertex) {}
    /// Weight of the tree edge between u and v, if there is one.
    fn tree_edge_weight(&self, u: Vertex, v: Vertex) -> Option<Timestamp>;
    fn is_tree_edge(&self, u: Vertex, v: Vertex) -> bool {
        self.tree_edge_weight(u, v).is_some()
    }
    /// All tree edges, sorted by weight.
    fn tree_edges(&self) -> Vec<TreeEdge>;
    /// Number of tracked vertices.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn footprint(&self) -> Footprint;

    /// Inserts an edge, keeping the forest a maximum spanning forest.
    fn insert_edge(&mut self, edge: Edge) {
        let Edge {
            source: s,
            target: t,
            timestamp: w,
        } = edge;
        if s == t {
            return;
        }
        if !self.same_tree(s, t) {
            log::trace!("{edge} joins two trees");
            self.link(s, t, w);
            return;
        }
        match self.find_minimum(s, t) {
            Some(min) if min.weight < w => {
                log::trace!("{edge} replaces {min:?}");
                self.replace(min, s, t, w);
            }
            _ => {
                log::trace!("{edge} is a non-tree edge");
                self.insert_non_tree_edge(s, t, w);
            }
        }
    }

    /// Removes an edge that is leaving the window. Every edge it competed with for a place in the
    /// forest is lighter, so it already left, and the removal needs no replacement.
    fn remove_edge(&mut self, edge: Edge) {
        if edge.is_loop() {
            return;
        }
        if self.tree_edge_weight(edge.source, edge.target) == Some(edge.timestamp) {
            log::trace!("Evicting tree edge {edge}");
            self.delete_tree_edge(edge.source, edge.target);
        } else {
            self.delete_non_tree_edge(edge.source, edge.target);
        }
    }
}

/// Windowed connectivity on top of a spanning forest: keeps the window's edges in arrival order
/// so they can be removed from the forest as they expire.
#[derive(Debug, Default)]
pub struct ForestConnectivity<F> {
    forest: F,
    window: VecDeque<Edge>,
}

impl<F: SpanningForest> ForestConnectivity<F> {
    pub fn new(forest: F) -> Self {
        Self {
            forest,
            window: VecDeque::new(),
        }
    }

    pub fn forest(&self) -> &F {
        &self.forest
    }

    pub fn forest_mut(&mut self) -> &mut F {
        &mut self.forest
    }

    /// Edges currently in the window, oldest first.
    pub fn window(&self) -> impl Iterator<Item = &Edge> {
        self.window.iter()
    }
}

impl<F: SpanningForest> WindowConnectivity for ForestConnectivity<F> {
    fn insert(&mut self, edge: Edge) {
        self.window.push_back(edge);
        self.forest.insert_edge(edge);
    }

    fn evict(&mut self, less_than: Timestamp) {
        while let Some(&edge) = self.window.front() {
            if edge.timestamp >= less_than {
                break;
            }
            self.window.pop_front();
            self.forest.remove_edge(edge);
        }
    }

    fn query(&mut self, source: Vertex, target: Vertex) -> bool {
        self.forest.connected(source, target)
    }

    fn footprint(&self) -> Footprint {
        Footprint {
            buffered_edges: self.window.len(),
            ..self.forest.footprint()
        }
    }
}

pub type DTreeConnectivity = ForestConnectivity<DTree>;
pub type OptimizedDTreeConnectivity = ForestConnectivity<OptimizedDTree>;
pub type STreeConnectivity = ForestConnectivity<STree>;
pub type LinkCutConnectivity = ForestConnectivity<LinkCutForest>;

/// Selects one of the engines of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Rebuilds a union-find from the whole window on every query. Used as the reference.
    UnionFind,
    DTree,
    /// D-Tree that also reshapes its trees with non-tree edges.
    ReshapingDTree,
    OptimizedDTree,
    STree,
    LinkCut,
}

impl EngineKind {
    pub const ALL: [EngineKind; 6] = [
        EngineKind::UnionFind,
        EngineKind::DTree,
        EngineKind::ReshapingDTree,
        EngineKind::OptimizedDTree,
        EngineKind::STree,
        EngineKind::LinkCut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EngineKind::UnionFind => "union-find",
            EngineKind::DTree => "d-tree",
            EngineKind::ReshapingDTree => "reshaping-d-tree",
            EngineKind::OptimizedDTree => "optimized-d-tree",
            EngineKind::STree => "s-tree",
            EngineKind::LinkCut => "link-cut",
        }
    }

    pub fn build(self) -> Box<dyn WindowConnectivity> {
        match self {
            EngineKind::UnionFind => Box::new(RecomputingConnectivity::new()),
            EngineKind::DTree => Box::new(ForestConnectivity::new(DTree::new())),
            EngineKind::ReshapingDTree => {
                Box::new(ForestConnectivity::new(DTree::with_reshaping()))
            }
            EngineKind::OptimizedDTree => {
                Box::new(ForestConnectivity::new(OptimizedDTree::default()))
            }
            EngineKind::STree => Box::new(ForestConnectivity::new(STree::default())),
            EngineKind::LinkCut => Box::new(ForestConnectivity::new(LinkCutForest::new())),
        }
    }
}

impl Display for EngineKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|k| k.name()).collect();
                ConfigError::UnknownEngine(s.to_owned(), names.join(", "))
            })
    }
}
