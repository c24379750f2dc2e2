//! Operations on rooted trees stored as parent pointers, shared by the D-Tree family.
//!
//! Every non-root node carries the weight of the edge to its parent and the size of its subtree.
//! Nodes that also keep explicit children hear about every parent change through
//! [`PointerNode::add_child`] and [`PointerNode::remove_child`].

use crate::directory::{Directory, Idx, VertexNode};
use crate::edge::{Timestamp, TreeEdge, NO_EDGE};

pub trait PointerNode: VertexNode {
    fn parent(&self) -> Option<Idx>;
    fn set_parent(&mut self, parent: Option<Idx>);
    /// Number of nodes in the subtree rooted here.
    fn size(&self) -> usize;
    fn size_mut(&mut self) -> &mut usize;
    /// Weight of the edge to the parent, [`NO_EDGE`] for roots.
    fn weight(&self) -> Timestamp;
    fn set_weight(&mut self, weight: Timestamp);
    fn add_child(&mut self, _child: Idx) {}
    fn remove_child(&mut self, _child: Idx) {}
    /// A node without edges is dropped from the directory.
    fn is_isolated(&self) -> bool {
        self.parent().is_none() && self.size() == 1
    }
}

fn alg_panic() -> ! {
    panic!("pointer tree algorithm incorrect")
}

impl<N: PointerNode> Directory<N> {
    pub fn parent(&self, u: Idx) -> Option<Idx> {
        self[u].parent()
    }

    pub fn size(&self, u: Idx) -> usize {
        self[u].size()
    }

    pub fn weight(&self, u: Idx) -> Timestamp {
        self[u].weight()
    }

    pub fn find_root(&self, mut u: Idx) -> Idx {
        while let Some(p) = self.parent(u) {
            u = p;
        }
        u
    }

    /// Root of the tree of u and the distance from u to it.
    pub fn root_with_depth(&self, mut u: Idx) -> (Idx, usize) {
        let mut depth = 0;
        while let Some(p) = self.parent(u) {
            u = p;
            depth += 1;
        }
        (u, depth)
    }

    pub fn depth(&self, u: Idx) -> usize {
        self.root_with_depth(u).1
    }

    /// The tree edge between u and v, as (child, parent).
    pub fn tree_edge(&self, u: Idx, v: Idx) -> Option<(Idx, Idx)> {
        if self.parent(u) == Some(v) {
            Some((u, v))
        } else if self.parent(v) == Some(u) {
            Some((v, u))
        } else {
            None
        }
    }

    /// Makes w the root of its tree by reversing the path to the old root. O(depth of w).
    pub fn re_root(&mut self, w: Idx) -> Idx {
        let Some(mut cur) = self.parent(w) else {
            return w;
        };
        log::trace!("re_root({w}) depth {}", self.depth(w));
        let mut ch = w;
        let mut ch_weight = self.weight(w);
        self[w].set_parent(None);
        self[w].set_weight(NO_EDGE);
        loop {
            let cur_parent = self.parent(cur);
            let cur_weight = self.weight(cur);
            self[cur].set_parent(Some(ch));
            self[cur].set_weight(ch_weight);
            self[cur].remove_child(ch);
            self[ch].add_child(cur);
            ch = cur;
            ch_weight = cur_weight;
            match cur_parent {
                Some(p) => cur = p,
                None => break,
            }
        }
        // ch is the old root, which still has the size of the whole tree.
        while let Some(p) = self.parent(ch) {
            let parent_size = self.size(p);
            *self[ch].size_mut() -= parent_size;
            let ch_size = self.size(ch);
            *self[p].size_mut() += ch_size;
            ch = p;
        }
        w
    }

    /// Hangs the root v below u, whose tree has root `root_u`. With `balance`, the first proper
    /// ancestor of u that ends up with more than half of the nodes becomes the new root.
    pub fn link(&mut self, u: Idx, root_u: Idx, v: Idx, weight: Timestamp, balance: bool) {
        debug_assert!(self.parent(v).is_none());
        self[v].set_parent(Some(u));
        self[v].set_weight(weight);
        self[u].add_child(v);
        let added = self.size(v);
        let half = (self.size(root_u) + added) / 2;
        let mut new_root = None;
        let mut c = Some(u);
        while let Some(x) = c {
            *self[x].size_mut() += added;
            c = self.parent(x);
            if balance && new_root.is_none() && c.is_some() && self.size(x) > half {
                new_root = Some(x);
            }
        }
        if let Some(r) = new_root {
            self.re_root(r);
        }
    }

    /// Links the trees of u and v, which must be different. The smaller tree is re-rooted at its
    /// endpoint and hung below the other endpoint.
    pub fn insert_tree_edge(&mut self, u: Idx, v: Idx, weight: Timestamp, balance: bool) {
        let (root_u, root_v) = (self.find_root(u), self.find_root(v));
        debug_assert_ne!(root_u, root_v);
        if self.size(root_v) < self.size(root_u) {
            let v = self.re_root(v);
            self.link(u, root_u, v, weight, balance);
        } else {
            let u = self.re_root(u);
            self.link(v, root_v, u, weight, balance);
        }
    }

    /// Detaches v from its parent. Returns the old parent.
    pub fn unlink(&mut self, v: Idx) -> Option<Idx> {
        let parent = self.parent(v)?;
        let removed = self.size(v);
        let mut c = Some(parent);
        while let Some(x) = c {
            *self[x].size_mut() -= removed;
            c = self.parent(x);
        }
        self[parent].remove_child(v);
        self[v].set_parent(None);
        self[v].set_weight(NO_EDGE);
        Some(parent)
    }

    /// Removes the tree edge between u and v. Returns it as (child, parent).
    pub fn delete_tree_edge(&mut self, u: Idx, v: Idx) -> Option<(Idx, Idx)> {
        let (child, parent) = self.tree_edge(u, v)?;
        self.unlink(child);
        Some((child, parent))
    }

    /// Minimum weight edge on the path between u and v, as the child endpoint. Walks up to the
    /// lowest common ancestor, so u and v must be in the same tree.
    pub fn find_minimum(&self, mut n1: Idx, mut n2: Idx) -> Option<Idx> {
        let mut min: Option<Idx> = None;
        let mut consider = |ch: Idx| {
            if min.map_or(true, |m| self.weight(ch) < self.weight(m)) {
                min = Some(ch);
            }
        };
        let up = |u: Idx| self.parent(u).unwrap_or_else(|| alg_panic());
        let (mut d1, mut d2) = (self.depth(n1), self.depth(n2));
        while d1 > d2 {
            consider(n1);
            n1 = up(n1);
            d1 -= 1;
        }
        while d2 > d1 {
            consider(n2);
            n2 = up(n2);
            d2 -= 1;
        }
        while n1 != n2 {
            consider(n1);
            n1 = up(n1);
            consider(n2);
            n2 = up(n2);
        }
        min
    }

    /// Are u and v in the same tree? Afterwards, re-roots the tree of u (then of v) at the root's
    /// child on the path to it if that child holds more than half of the tree.
    pub fn connected_rebalancing(&mut self, u: Idx, v: Idx) -> bool {
        let connected = self.find_root(u) == self.find_root(v);
        self.rebalance_towards(u);
        self.rebalance_towards(v);
        connected
    }

    fn rebalance_towards(&mut self, mut n: Idx) {
        let mut below = None;
        while let Some(p) = self.parent(n) {
            below = Some(n);
            n = p;
        }
        if let Some(d) = below {
            if self.size(d) > self.size(n) / 2 {
                self.re_root(d);
            }
        }
    }

    /// Uses the non-tree edge (u, v) to shorten the path between them. If the depths of u and v
    /// differ by at least 2, the tree edge above the node `gap - 2` levels above the deeper endpoint
    /// is cut and (u, v) becomes a tree edge. Returns the cut edge as (child, parent).
    pub fn reshape(&mut self, u: Idx, v: Idx, weight: Timestamp) -> Option<(Idx, Idx)> {
        let (root, depth_u) = self.root_with_depth(u);
        let depth_v = self.depth(v);
        let gap = depth_u.abs_diff(depth_v);
        if gap < 2 {
            return None;
        }
        let (deep, shallow) = if depth_u < depth_v { (v, u) } else { (u, v) };
        let mut c = deep;
        for _ in 0..gap - 2 {
            c = self.parent(c).unwrap_or_else(|| alg_panic());
        }
        if self.weight(c) > weight {
            // Only ties may be swapped without losing maximality.
            return None;
        }
        log::trace!("reshape({u}, {v}) gap {gap} cuts above {c}");
        let parent = self.unlink(c).unwrap_or_else(|| alg_panic());
        let deep = self.re_root(deep);
        self.link(shallow, root, deep, weight, true);
        Some((c, parent))
    }

    /// Every tree edge, sorted by weight.
    pub fn tree_edges(&self) -> Vec<TreeEdge> {
        let mut edges: Vec<_> = self
            .iter()
            .filter_map(|(v, u)| {
                let p = self.parent(u)?;
                Some(TreeEdge {
                    child: v,
                    parent: self.vertex(p),
                    weight: self.weight(u),
                })
            })
            .collect();
        edges.sort_unstable_by_key(|e| (e.weight, e.endpoints()));
        edges
    }

    /// Do all subtree sizes match the parent pointers? O(n * depth).
    pub fn sizes_consistent(&self) -> bool {
        let nodes: Vec<Idx> = self.iter().map(|(_, u)| u).collect();
        let mut expected = std::collections::HashMap::new();
        for &u in &nodes {
            let mut c = Some(u);
            while let Some(x) = c {
                *expected.entry(x).or_insert(0usize) += 1;
                c = self.parent(x);
            }
        }
        nodes.iter().all(|u| expected[u] == self.size(*u))
    }
}
