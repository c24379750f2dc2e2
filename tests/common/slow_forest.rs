use std::collections::{BTreeSet, HashMap};

use sliding_connectivity::{Edge, Timestamp, TreeEdge, Vertex};

#[allow(dead_code)]
/// Recomputes a maximum spanning forest of a set of edges with Kruskal's algorithm.
#[derive(Debug, Default)]
pub struct SlowForest {
    parent: HashMap<Vertex, Vertex>,
    pub edges: Vec<Edge>,
}

impl SlowForest {
    fn root(&self, u: Vertex) -> Vertex {
        match self.parent.get(&u) {
            Some(&p) if p != u => self.root(p),
            _ => u,
        }
    }

    pub fn new<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> Self {
        let mut sorted: Vec<Edge> = edges.into_iter().filter(|e| !e.is_loop()).copied().collect();
        sorted.sort_by_key(|e| std::cmp::Reverse(e.timestamp));
        let mut f = Self::default();
        for e in sorted {
            let (ru, rv) = (f.root(e.source), f.root(e.target));
            if ru != rv {
                f.parent.insert(ru, rv);
                f.edges.push(e);
            }
        }
        f
    }

    /// Sum of the weights of a maximum spanning forest.
    pub fn weight(&self) -> i128 {
        self.edges.iter().map(|e| e.timestamp as i128).sum()
    }

    /// Vertices incident to at least one non-loop edge.
    pub fn vertices<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> BTreeSet<Vertex> {
        edges
            .into_iter()
            .filter(|e| !e.is_loop())
            .flat_map(|e| [e.source, e.target])
            .collect()
    }
}

#[allow(dead_code)]
/// Checks that `tree` is a maximum spanning forest of `edges`.
pub fn assert_maximum_forest<'a>(tree: &[TreeEdge], edges: impl IntoIterator<Item = &'a Edge> + Clone) {
    let slow = SlowForest::new(edges.clone());
    assert_eq!(tree.len(), slow.edges.len(), "forest sizes differ");
    let weight: i128 = tree.iter().map(|e| e.weight as i128).sum();
    assert_eq!(weight, slow.weight(), "forest is not maximum");
    let active: BTreeSet<(Vertex, Vertex, Timestamp)> = edges
        .into_iter()
        .map(|e| {
            let (a, b) = (e.source.min(e.target), e.source.max(e.target));
            (a, b, e.timestamp)
        })
        .collect();
    for e in tree {
        let (a, b) = e.endpoints();
        assert!(active.contains(&(a, b, e.weight)), "{e:?} is not in the window");
    }
}
