//! Splay trees over an arena, used to store the preferred paths of a link-cut forest.
//!
//! Inorder is top to bottom along the path. The root of each splay tree may point to the node its
//! path hangs from through `path_parent`. Every node keeps the size of its splay subtree and the
//! index of the node with minimum weight in it. Reversals are lazy.

use std::fmt::{Debug, Formatter};

use debug_tree::{add_branch_to, AsTree, TreeBuilder};
use derivative::Derivative;

use crate::directory::{idx_fmt, Directory, Idx, VertexNode, EMPTY};
use crate::edge::{Timestamp, Vertex, NO_EDGE};

fn node2_fmt([u, v]: &[Idx; 2], f: &mut Formatter) -> std::fmt::Result {
    write!(f, "[")?;
    idx_fmt(u, f)?;
    write!(f, ", ")?;
    idx_fmt(v, f)?;
    write!(f, "]")
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct SplayNode {
    vertex: Vertex,
    #[derivative(Debug(format_with = "idx_fmt"))]
    parent: Idx,
    /// Left and right child
    #[derivative(Debug(format_with = "node2_fmt"))]
    child: [Idx; 2],
    /// Set only on splay roots.
    #[derivative(Debug(format_with = "idx_fmt"))]
    path_parent: Idx,
    /// This node's children should be swapped, recursively.
    flip_subtree: bool,
    weight: Timestamp,
    /// Node with minimum weight in the splay subtree.
    #[derivative(Debug(format_with = "idx_fmt"))]
    min: Idx,
    size: usize,
}

impl VertexNode for SplayNode {
    fn new(vertex: Vertex) -> Self {
        Self {
            vertex,
            parent: EMPTY,
            child: [EMPTY; 2],
            path_parent: EMPTY,
            flip_subtree: false,
            weight: NO_EDGE,
            min: EMPTY,
            size: 1,
        }
    }
    fn vertex(&self) -> Vertex {
        self.vertex
    }
}

#[derive(Default)]
pub struct SplayForest {
    nodes: Directory<SplayNode>,
}

impl SplayForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, v: Vertex) -> Option<Idx> {
        self.nodes.get(v)
    }

    pub fn get_or_create(&mut self, v: Vertex) -> Idx {
        if let Some(u) = self.nodes.get(v) {
            return u;
        }
        let u = self.nodes.get_or_create(v);
        self.nodes[u].min = u;
        u
    }

    /// Drops a node that is alone in its splay tree and has nothing hanging from it.
    pub fn remove(&mut self, u: Idx) {
        debug_assert!(self.is_singleton(u));
        self.nodes.remove(u);
    }

    pub fn is_singleton(&self, u: Idx) -> bool {
        let n = &self.nodes[u];
        n.parent == EMPTY && n.child == [EMPTY; 2] && n.path_parent == EMPTY
    }

    pub fn vertex(&self, u: Idx) -> Vertex {
        self.nodes.vertex(u)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn slots(&self) -> usize {
        self.nodes.slots()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Vertex, Idx)> + '_ {
        self.nodes.iter()
    }

    pub fn weight(&self, u: Idx) -> Timestamp {
        self.nodes[u].weight
    }

    /// Changes the weight of a splay root.
    pub fn set_weight(&mut self, u: Idx, weight: Timestamp) {
        debug_assert_eq!(self.nodes[u].parent, EMPTY);
        self.nodes[u].weight = weight;
        self.recalc(u);
    }

    /// Moves every weight on the path one node up, so that the weight of each edge ends up on its
    /// upper endpoint. The last node gets [`NO_EDGE`]. Aggregates are stale until
    /// [`SplayForest::postorder_recalc`].
    pub fn shift_weights_up(&mut self, path: &[Idx]) {
        for w in path.windows(2) {
            self.nodes[w[0]].weight = self.nodes[w[1]].weight;
        }
        if let Some(&last) = path.last() {
            self.nodes[last].weight = NO_EDGE;
        }
    }

    pub fn path_parent(&self, u: Idx) -> Idx {
        self.nodes[u].path_parent
    }

    pub fn set_path_parent(&mut self, u: Idx, p: Idx) {
        self.nodes[u].path_parent = p;
    }

    pub fn size(&self, u: Idx) -> usize {
        if u == EMPTY {
            0
        } else {
            self.nodes[u].size
        }
    }

    /// Node with minimum weight in the splay subtree of u.
    pub fn min(&self, u: Idx) -> Idx {
        if u == EMPTY {
            EMPTY
        } else {
            self.nodes[u].min
        }
    }

    /// Children of u, after pushing down its pending flip.
    pub fn child(&mut self, u: Idx) -> [Idx; 2] {
        self.unlaze_flip(u);
        self.nodes[u].child
    }

    fn side(&self, u: Idx) -> usize {
        let p = self.nodes[u].parent;
        (self.nodes[p].child[1] == u) as usize
    }

    fn unlaze_flip(&mut self, u: Idx) {
        let n = &mut self.nodes[u];
        if n.flip_subtree {
            n.flip_subtree = false;
            n.child.swap(0, 1);
            for c in n.child {
                if c != EMPTY {
                    self.nodes[c].flip_subtree ^= true;
                }
            }
        }
    }

    // Call when children or weight change. Neither aggregate depends on the order.
    fn recalc(&mut self, u: Idx) {
        let [l, r] = self.nodes[u].child;
        self.nodes[u].size = self.size(l) + 1 + self.size(r);
        let mut min = u;
        for c in [l, r] {
            let m = self.min(c);
            if m != EMPTY && self.nodes[m].weight < self.nodes[min].weight {
                min = m;
            }
        }
        self.nodes[u].min = min;
    }

    fn rotate(&mut self, x: Idx) {
        let p = self.nodes[x].parent;
        let g = self.nodes[p].parent;
        let dir = self.side(x);
        let b = self.nodes[x].child[1 - dir];
        if g != EMPTY {
            let pdir = self.side(p);
            self.nodes[g].child[pdir] = x;
        } else {
            let pp = std::mem::replace(&mut self.nodes[p].path_parent, EMPTY);
            self.nodes[x].path_parent = pp;
        }
        self.nodes[x].parent = g;
        self.nodes[p].child[dir] = b;
        if b != EMPTY {
            self.nodes[b].parent = p;
        }
        self.nodes[x].child[1 - dir] = p;
        self.nodes[p].parent = x;
        self.recalc(p);
        self.recalc(x);
    }

    /// Brings u to the root of its splay tree.
    pub fn splay(&mut self, u: Idx) {
        let mut path = vec![u];
        let mut p = self.nodes[u].parent;
        while p != EMPTY {
            path.push(p);
            p = self.nodes[p].parent;
        }
        for &x in path.iter().rev() {
            self.unlaze_flip(x);
        }
        while self.nodes[u].parent != EMPTY {
            let p = self.nodes[u].parent;
            if self.nodes[p].parent != EMPTY {
                if self.side(u) == self.side(p) {
                    self.rotate(p);
                } else {
                    self.rotate(u);
                }
            }
            self.rotate(u);
        }
    }

    /// Detaches the child of the splay root u on the given side. Returns it.
    pub fn detach(&mut self, u: Idx, dir: usize) -> Idx {
        debug_assert_eq!(self.nodes[u].parent, EMPTY);
        self.unlaze_flip(u);
        let c = std::mem::replace(&mut self.nodes[u].child[dir], EMPTY);
        if c != EMPTY {
            self.nodes[c].parent = EMPTY;
        }
        self.recalc(u);
        c
    }

    /// Makes the splay root c the child of the splay root u on the given side, which must be empty.
    pub fn attach(&mut self, u: Idx, dir: usize, c: Idx) {
        self.unlaze_flip(u);
        debug_assert_eq!(self.nodes[u].child[dir], EMPTY);
        self.nodes[u].child[dir] = c;
        if c != EMPTY {
            self.nodes[c].parent = u;
            self.nodes[c].path_parent = EMPTY;
        }
        self.recalc(u);
    }

    /// First node in the order of the splay tree containing u, splayed to the root.
    pub fn leftmost(&mut self, u: Idx) -> Idx {
        self.splay(u);
        let mut x = u;
        loop {
            let [l, _] = self.child(x);
            if l == EMPTY {
                break;
            }
            x = l;
        }
        self.splay(x);
        x
    }

    /// Reverses the order of the splay tree rooted at u.
    pub fn reverse(&mut self, u: Idx) {
        self.nodes[u].flip_subtree ^= true;
    }

    /// Nodes of the splay tree rooted at u in order. Pushes every pending flip.
    pub fn inorder(&mut self, u: Idx) -> Vec<Idx> {
        let mut out = Vec::with_capacity(self.size(u));
        let mut stack = vec![];
        let mut x = u;
        while x != EMPTY || !stack.is_empty() {
            while x != EMPTY {
                self.unlaze_flip(x);
                stack.push(x);
                x = self.nodes[x].child[0];
            }
            if let Some(y) = stack.pop() {
                out.push(y);
                x = self.nodes[y].child[1];
            }
        }
        out
    }

    /// Recomputes the aggregates of every node in the splay tree rooted at u.
    pub fn postorder_recalc(&mut self, u: Idx) {
        let mut order = vec![];
        let mut stack = vec![u];
        while let Some(x) = stack.pop() {
            if x == EMPTY {
                continue;
            }
            order.push(x);
            stack.extend(self.nodes[x].child);
        }
        for &x in order.iter().rev() {
            self.recalc(x);
        }
    }

    /// Is every size and minimum consistent with the children?
    pub fn aggregates_consistent(&self) -> bool {
        self.nodes.iter().all(|(_, u)| {
            let n = &self.nodes[u];
            let [l, r] = n.child;
            let children_ok = [l, r]
                .into_iter()
                .all(|c| c == EMPTY || self.nodes[c].parent == u);
            let min_ok = [u, self.min(l), self.min(r)]
                .into_iter()
                .filter(|&m| m != EMPTY)
                .all(|m| self.nodes[n.min].weight <= self.nodes[m].weight);
            children_ok && min_ok && n.size == self.size(l) + 1 + self.size(r)
        })
    }

    fn tree_inorder_dbg<T: AsTree>(&self, u: Idx, tree: &T) {
        let nu = &self.nodes[u];
        if nu.child[0] != EMPTY {
            add_branch_to!(*tree, "left child of {u}");
            self.tree_inorder_dbg(nu.child[0], tree);
        }
        add_branch_to!(*tree, "[{u}] {nu:?}");
        if nu.child[1] != EMPTY {
            self.tree_inorder_dbg(nu.child[1], tree);
        }
    }
}

impl Debug for SplayForest {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let builder = TreeBuilder::new();
        {
            let _b = builder.add_branch("SplayForest");
            let mut roots: Vec<_> = self
                .nodes
                .iter()
                .filter(|&(_, u)| self.nodes[u].parent == EMPTY)
                .map(|(_, u)| u)
                .collect();
            roots.sort_unstable();
            for u in roots {
                self.tree_inorder_dbg(u, &builder);
            }
        }
        write!(f, "{}", builder.string())
    }
}
