//! Link-cut forest keeping a maximum spanning forest of the window.
//!
//! Each node stores the weight of the edge to its parent in the represented tree, so re-rooting
//! has to move the weights along the reversed path. The represented parent of every non-root node
//! is also kept in a map, which makes tree edges easy to look up without touching the splay trees.

use std::collections::HashMap;

use crate::connectivity::SpanningForest;
use crate::directory::{Idx, EMPTY};
use crate::edge::{Timestamp, TreeEdge, Vertex, NO_EDGE};
use crate::memory::Footprint;
use crate::splay::{SplayForest, SplayNode};

#[derive(Debug, Default)]
pub struct LinkCutForest {
    splay: SplayForest,
    /// Parent of each non-root node in the represented tree.
    rep_parent: HashMap<Idx, Idx>,
    /// Number of tree edges at each node. Nodes leave the forest when it drops to zero.
    degree: HashMap<Idx, usize>,
}

impl LinkCutForest {
    pub fn new() -> Self {
        Self::default()
    }

    fn pair(&self, u: Vertex, v: Vertex) -> Option<(Idx, Idx)> {
        Some((self.splay.get(u)?, self.splay.get(v)?))
    }

    /// Makes the path from the root to v preferred, with v last and splayed to the root of its
    /// splay tree. Returns the point where the access entered the path of the previous access,
    /// which is the LCA of v and the previously accessed node when both are in the same tree.
    fn access(&mut self, v: Idx) -> Idx {
        self.splay.splay(v);
        let below = self.splay.detach(v, 1);
        if below != EMPTY {
            self.splay.set_path_parent(below, v);
        }
        let mut last = v;
        loop {
            let w = self.splay.path_parent(v);
            if w == EMPTY {
                break;
            }
            last = w;
            self.splay.splay(w);
            let below = self.splay.detach(w, 1);
            if below != EMPTY {
                self.splay.set_path_parent(below, w);
            }
            self.splay.attach(w, 1, v);
            self.splay.splay(v);
        }
        last
    }

    fn root_of(&mut self, u: Idx) -> Idx {
        self.access(u);
        self.splay.leftmost(u)
    }

    fn depth_of(&mut self, u: Idx) -> usize {
        self.access(u);
        self.splay.size(u) - 1
    }

    /// Distance from u to the root of its represented tree.
    pub fn depth(&mut self, u: Vertex) -> Option<usize> {
        let u = self.splay.get(u)?;
        Some(self.depth_of(u))
    }

    fn re_root(&mut self, v: Idx) {
        self.access(v);
        let path = self.splay.inorder(v);
        if path.len() == 1 {
            return;
        }
        log::trace!("re_root({v}) over {} nodes", path.len());
        self.splay.shift_weights_up(&path);
        for w in path.windows(2) {
            self.rep_parent.insert(w[0], w[1]);
        }
        self.rep_parent.remove(&v);
        self.splay.reverse(v);
        self.splay.postorder_recalc(v);
    }

    /// Adds a tree edge between u and v, which must be in different trees. If neither is the root
    /// of its tree, the shallower one is re-rooted and hung below the other.
    fn link_idx(&mut self, u: Idx, v: Idx, weight: Timestamp) {
        let (child, parent) = if self.root_of(v) == v {
            (v, u)
        } else if self.root_of(u) == u {
            (u, v)
        } else if self.depth_of(v) <= self.depth_of(u) {
            self.re_root(v);
            (v, u)
        } else {
            self.re_root(u);
            (u, v)
        };
        log::trace!("link({child} -> {parent}, {weight})");
        self.access(child);
        self.access(parent);
        self.splay.set_weight(child, weight);
        self.splay.attach(child, 0, parent);
        self.rep_parent.insert(child, parent);
        *self.degree.entry(child).or_default() += 1;
        *self.degree.entry(parent).or_default() += 1;
    }

    /// Cuts v from its represented parent. Returns the parent.
    fn cut(&mut self, v: Idx) -> Option<Idx> {
        let p = self.rep_parent.remove(&v)?;
        log::trace!("cut({v} -> {p})");
        self.access(v);
        let above = self.splay.detach(v, 0);
        debug_assert_ne!(above, EMPTY);
        self.splay.set_weight(v, NO_EDGE);
        Some(p)
    }

    fn release(&mut self, u: Idx) {
        let Some(d) = self.degree.get_mut(&u) else {
            return;
        };
        *d -= 1;
        if *d == 0 {
            self.degree.remove(&u);
            self.splay.remove(u);
        }
    }

    /// Minimum weight node strictly below `top` on the path from `top` down to `bottom`.
    fn path_minimum(&mut self, top: Idx, bottom: Idx) -> Option<Idx> {
        self.access(bottom);
        self.splay.splay(top);
        let [_, below] = self.splay.child(top);
        let m = self.splay.min(below);
        (m != EMPTY).then_some(m)
    }

    /// Are the splay aggregates consistent, with weights only on non-root nodes?
    pub fn is_consistent(&self) -> bool {
        self.splay.aggregates_consistent()
            && self.splay.iter().all(|(_, u)| {
                let has_parent = self.rep_parent.contains_key(&u);
                has_parent == (self.splay.weight(u) != NO_EDGE)
                    && self.degree.get(&u).is_some_and(|&d| d > 0)
            })
    }
}

impl SpanningForest for LinkCutForest {
    fn same_tree(&mut self, u: Vertex, v: Vertex) -> bool {
        let (u, v) = (self.splay.get_or_create(u), self.splay.get_or_create(v));
        u == v || self.root_of(u) == self.root_of(v)
    }

    fn connected(&mut self, u: Vertex, v: Vertex) -> bool {
        match self.pair(u, v) {
            Some((u, v)) => u == v || self.root_of(u) == self.root_of(v),
            None => false,
        }
    }

    fn find_root(&mut self, u: Vertex) -> Option<Vertex> {
        let u = self.splay.get(u)?;
        let r = self.root_of(u);
        Some(self.splay.vertex(r))
    }

    fn link(&mut self, u: Vertex, v: Vertex, weight: Timestamp) {
        let (u, v) = (self.splay.get_or_create(u), self.splay.get_or_create(v));
        self.link_idx(u, v, weight);
    }

    fn find_minimum(&mut self, u: Vertex, v: Vertex) -> Option<TreeEdge> {
        let (u, v) = self.pair(u, v)?;
        if u == v {
            return None;
        }
        self.access(u);
        let lca = self.access(v);
        let m = [self.path_minimum(lca, u), self.path_minimum(lca, v)]
            .into_iter()
            .flatten()
            .min_by_key(|&m| self.splay.weight(m))?;
        let parent = *self.rep_parent.get(&m)?;
        Some(TreeEdge {
            child: self.splay.vertex(m),
            parent: self.splay.vertex(parent),
            weight: self.splay.weight(m),
        })
    }

    /// Cycle-closing edges that don't replace anything are not kept.
    fn insert_non_tree_edge(&mut self, _u: Vertex, _v: Vertex, _weight: Timestamp) {}

    fn delete_tree_edge(&mut self, u: Vertex, v: Vertex) {
        let Some((u, v)) = self.pair(u, v) else {
            return;
        };
        let child = if self.rep_parent.get(&u) == Some(&v) {
            u
        } else if self.rep_parent.get(&v) == Some(&u) {
            v
        } else {
            return;
        };
        self.cut(child);
        self.release(u);
        self.release(v);
    }

    fn tree_edge_weight(&self, u: Vertex, v: Vertex) -> Option<Timestamp> {
        let (u, v) = self.pair(u, v)?;
        if self.rep_parent.get(&u) == Some(&v) {
            Some(self.splay.weight(u))
        } else if self.rep_parent.get(&v) == Some(&u) {
            Some(self.splay.weight(v))
        } else {
            None
        }
    }

    fn tree_edges(&self) -> Vec<TreeEdge> {
        let mut edges: Vec<_> = self
            .rep_parent
            .iter()
            .map(|(&c, &p)| TreeEdge {
                child: self.splay.vertex(c),
                parent: self.splay.vertex(p),
                weight: self.splay.weight(c),
            })
            .collect();
        edges.sort_unstable_by_key(|e| (e.weight, e.endpoints()));
        edges
    }

    fn len(&self) -> usize {
        self.splay.len()
    }

    fn footprint(&self) -> Footprint {
        Footprint {
            vertices: self.splay.len(),
            node_slots: self.splay.slots(),
            node_bytes: std::mem::size_of::<SplayNode>(),
            map_entries: self.rep_parent.len() + self.degree.len(),
            ..Default::default()
        }
    }
}
