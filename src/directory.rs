//! Node arena shared by the pointer-based engines. Nodes refer to each other by index, and the
//! directory maps vertex ids to the index of their node while the vertex is tracked.

use std::collections::{hash_map::Entry, HashMap};
use std::fmt::{Debug, Formatter};
use std::ops::{Index, IndexMut};

use crate::edge::Vertex;

pub type Idx = usize;

/// Returned when the node doesn't exist.
pub const EMPTY: Idx = usize::MAX;

/// Formats an index, ∅ if it is EMPTY.
pub(crate) fn idx_fmt(u: &Idx, f: &mut Formatter) -> std::fmt::Result {
    if *u == EMPTY {
        write!(f, "∅")
    } else {
        write!(f, "{u}")
    }
}

pub(crate) fn opt_fmt(u: &Option<Idx>, f: &mut Formatter) -> std::fmt::Result {
    idx_fmt(&u.unwrap_or(EMPTY), f)
}

pub trait VertexNode {
    /// A fresh node with no edges.
    fn new(vertex: Vertex) -> Self;
    fn vertex(&self) -> Vertex;
}

pub struct Directory<N> {
    nodes: Vec<N>,
    free: Vec<Idx>,
    index: HashMap<Vertex, Idx>,
}

impl<N> Default for Directory<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<N: VertexNode> Directory<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, v: Vertex) -> Option<Idx> {
        self.index.get(&v).copied()
    }

    /// Index of the node of v, creating an isolated node if v is not tracked yet.
    pub fn get_or_create(&mut self, v: Vertex) -> Idx {
        match self.index.entry(v) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let node = N::new(v);
                let idx = match self.free.pop() {
                    Some(idx) => {
                        self.nodes[idx] = node;
                        idx
                    }
                    None => {
                        self.nodes.push(node);
                        self.nodes.len() - 1
                    }
                };
                *e.insert(idx)
            }
        }
    }

    /// Stops tracking the vertex of node u. The slot is recycled by later insertions.
    pub fn remove(&mut self, u: Idx) {
        let v = self.nodes[u].vertex();
        if self.index.get(&v) == Some(&u) {
            log::trace!("Dropping isolated vertex {v} (node {u})");
            self.index.remove(&v);
            self.free.push(u);
        }
    }

    pub fn contains(&self, v: Vertex) -> bool {
        self.index.contains_key(&v)
    }

    pub fn vertex(&self, u: Idx) -> Vertex {
        self.nodes[u].vertex()
    }

    /// Number of tracked vertices.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of allocated slots, live or not.
    pub fn slots(&self) -> usize {
        self.nodes.len()
    }

    /// Tracked vertices and their node indices, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (Vertex, Idx)> + '_ {
        self.index.iter().map(|(&v, &u)| (v, u))
    }
}

impl<N> Index<Idx> for Directory<N> {
    type Output = N;
    fn index(&self, u: Idx) -> &N {
        &self.nodes[u]
    }
}

impl<N> IndexMut<Idx> for Directory<N> {
    fn index_mut(&mut self, u: Idx) -> &mut N {
        &mut self.nodes[u]
    }
}

impl<N: VertexNode + Debug> Debug for Directory<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut live: Vec<_> = self.iter().collect();
        live.sort_unstable();
        f.debug_map()
            .entries(live.into_iter().map(|(v, u)| (v, &self.nodes[u])))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct N(Vertex);

    impl VertexNode for N {
        fn new(vertex: Vertex) -> Self {
            N(vertex)
        }
        fn vertex(&self) -> Vertex {
            self.0
        }
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut d = Directory::<N>::new();
        let a = d.get_or_create(7);
        assert_eq!(d.get_or_create(7), a);
        assert_eq!(d.get(7), Some(a));
        assert_eq!(d.get(8), None);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn slots_are_recycled() {
        let mut d = Directory::<N>::new();
        let a = d.get_or_create(1);
        let b = d.get_or_create(2);
        d.remove(a);
        assert!(!d.contains(1));
        assert_eq!(d.len(), 1);
        let c = d.get_or_create(3);
        assert_eq!(c, a);
        assert_eq!(d.vertex(c), 3);
        assert_eq!(d.vertex(b), 2);
        assert_eq!(d.slots(), 2);
        // Removing a stale index twice doesn't free the slot again.
        d.remove(c);
        d.remove(c);
        assert_eq!(d.get_or_create(4), c);
        assert_eq!(d.get_or_create(5), 2);
    }
}
