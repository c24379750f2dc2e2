//! The recomputing baseline: a plain buffer of the window's edges, turned into a fresh union-find
//! on every query. Slow, but obviously correct, so the other engines are checked against it.

use std::collections::{HashMap, VecDeque};

use crate::connectivity::WindowConnectivity;
use crate::edge::{Edge, Timestamp, Vertex};
use crate::memory::Footprint;

/// Weighted quick-union with path compression over sparse vertex ids.
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    /// Roots map to themselves.
    parent: HashMap<Vertex, Vertex>,
    /// Only meaningful for roots.
    size: HashMap<Vertex, usize>,
    /// Number of components.
    count: usize,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with every given vertex in its own component.
    pub fn with_vertices(vertices: impl IntoIterator<Item = Vertex>) -> Self {
        let mut uf = Self::new();
        for v in vertices {
            uf.add_vertex(v);
        }
        uf
    }

    fn add_vertex(&mut self, v: Vertex) {
        if !self.parent.contains_key(&v) {
            self.parent.insert(v, v);
            self.size.insert(v, 1);
            self.count += 1;
        }
    }

    /// Are source and target in the same component? Unknown vertices are not added.
    pub fn connected(&mut self, source: Vertex, target: Vertex) -> bool {
        if !self.parent.contains_key(&source) || !self.parent.contains_key(&target) {
            return false;
        }
        self.find(source) == self.find(target)
    }

    /// Merges the components of source and target, adding them first if needed. Returns whether
    /// anything changed.
    pub fn union(&mut self, source: Vertex, target: Vertex) -> bool {
        self.add_vertex(source);
        self.add_vertex(target);
        let (rs, rt) = (self.find(source), self.find(target));
        if rs == rt {
            return false;
        }
        let (ss, st) = (self.size[&rs], self.size[&rt]);
        let (child, root) = if ss < st { (rs, rt) } else { (rt, rs) };
        self.parent.insert(child, root);
        self.size.insert(root, ss + st);
        self.count -= 1;
        true
    }

    /// Root of the component of a known vertex, compressing the path to it.
    fn find(&mut self, v: Vertex) -> Vertex {
        let mut root = v;
        while self.parent[&root] != root {
            root = self.parent[&root];
        }
        let mut u = v;
        while u != root {
            let next = self.parent[&u];
            self.parent.insert(u, root);
            u = next;
        }
        root
    }

    /// Number of components.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}

/// Keeps the window as a FIFO buffer and answers queries by recomputing components from scratch.
#[derive(Debug, Default)]
pub struct RecomputingConnectivity {
    window: VecDeque<Edge>,
    /// Built by the last query.
    components: UnionFind,
}

impl RecomputingConnectivity {
    pub fn new() -> Self {
        Self::default()
    }

    fn rebuild(&mut self) -> &mut UnionFind {
        let mut uf = UnionFind::new();
        for e in self.window.iter().filter(|e| !e.is_loop()) {
            uf.union(e.source, e.target);
        }
        self.components = uf;
        &mut self.components
    }
}

impl WindowConnectivity for RecomputingConnectivity {
    fn insert(&mut self, edge: Edge) {
        self.window.push_back(edge);
    }

    fn evict(&mut self, less_than: Timestamp) {
        while self
            .window
            .front()
            .is_some_and(|e| e.timestamp < less_than)
        {
            self.window.pop_front();
        }
    }

    fn query(&mut self, source: Vertex, target: Vertex) -> bool {
        self.rebuild().connected(source, target)
    }

    fn query_batch(&mut self, queries: &[(Vertex, Vertex)], outputs: &mut [Vec<bool>]) {
        let uf = self.rebuild();
        for (&(u, v), out) in queries.iter().zip(outputs.iter_mut()) {
            out.push(uf.connected(u, v));
        }
    }

    fn footprint(&self) -> Footprint {
        Footprint {
            vertices: self.components.len(),
            map_entries: self.components.len(),
            buffered_edges: self.window.len(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_by_size_counts_components() {
        let mut uf = UnionFind::with_vertices([1, 2, 3, 4]);
        assert_eq!(uf.count(), 4);
        assert!(uf.union(1, 2));
        assert!(uf.union(3, 4));
        assert!(!uf.union(2, 1));
        assert_eq!(uf.count(), 2);
        assert!(uf.union(1, 4));
        assert_eq!(uf.count(), 1);
        assert!(uf.connected(2, 3));
    }

    #[test]
    fn connected_does_not_register_vertices() {
        let mut uf = UnionFind::new();
        assert!(!uf.connected(1, 1));
        assert!(uf.is_empty());
        uf.union(1, 2);
        assert!(uf.connected(1, 1));
        assert!(!uf.connected(1, 3));
        assert_eq!(uf.len(), 2);
    }

    #[test]
    fn path_unions_stay_flat() {
        let mut uf = UnionFind::new();
        for v in 0..100 {
            uf.union(v, v + 1);
        }
        assert!(uf.connected(0, 100));
        // Every new singleton hangs directly below the bigger root.
        assert_eq!(uf.find(57), 0);
        assert!((0..=100).all(|v| uf.parent[&v] == 0));
    }

    #[test]
    fn window_buffer_evicts_in_order() {
        let mut c = RecomputingConnectivity::new();
        c.insert(Edge::new(1, 2, 0));
        c.insert(Edge::new(2, 3, 1));
        c.insert(Edge::new(3, 3, 2));
        assert!(c.query(1, 3));
        assert!(c.query(3, 3));
        c.evict(1);
        assert!(!c.query(1, 3));
        assert!(c.query(2, 3));
        c.evict(2);
        assert!(!c.query(3, 3));
        assert_eq!(c.footprint().buffered_edges, 1);
    }
}
