use std::fmt::{Debug, Display, Formatter};

pub type Vertex = u32;
pub type Timestamp = i64;

/// Weight stored on a node that has no edge to a parent.
pub const NO_EDGE: Timestamp = Timestamp::MAX;

/// A timestamped undirected edge of the stream. The timestamp doubles as the edge weight.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: Vertex,
    pub target: Vertex,
    pub timestamp: Timestamp,
}

impl Edge {
    pub fn new(source: Vertex, target: Vertex, timestamp: Timestamp) -> Self {
        Self {
            source,
            target,
            timestamp,
        }
    }

    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }
}

impl From<(Vertex, Vertex, Timestamp)> for Edge {
    fn from((source, target, timestamp): (Vertex, Vertex, Timestamp)) -> Self {
        Self::new(source, target, timestamp)
    }
}

impl Debug for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}-{} @{})", self.source, self.target, self.timestamp)
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <Self as Debug>::fmt(self, f)
    }
}

/// A tree edge of a spanning forest, identified by the child endpoint (the one whose parent pointer
/// carries the edge) and the parent endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEdge {
    pub child: Vertex,
    pub parent: Vertex,
    pub weight: Timestamp,
}

impl TreeEdge {
    /// Endpoints ordered so that edges compare equal regardless of orientation.
    pub fn endpoints(&self) -> (Vertex, Vertex) {
        if self.child < self.parent {
            (self.child, self.parent)
        } else {
            (self.parent, self.child)
        }
    }
}
