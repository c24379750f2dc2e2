//! Memory accounting. Engines only describe what they hold; turning that into bytes is the job of
//! an injected [`MemoryProbe`].

use std::mem::size_of;

use crate::edge::{Edge, Vertex};

/// What an engine currently keeps alive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Footprint {
    /// Entries in the vertex directory.
    pub vertices: usize,
    /// Allocated node slots in the arena, including recycled ones.
    pub node_slots: usize,
    /// Size of a single node.
    pub node_bytes: usize,
    /// Edges held in the window buffer.
    pub buffered_edges: usize,
    /// Entries in auxiliary maps keyed by vertex (directory excluded).
    pub map_entries: usize,
    /// Entries in per-node adjacency sets.
    pub adjacency_entries: usize,
}

impl Footprint {
    pub fn merge(self, other: Self) -> Self {
        Self {
            vertices: self.vertices + other.vertices,
            node_slots: self.node_slots + other.node_slots,
            // Only meaningful when one side has no nodes.
            node_bytes: self.node_bytes.max(other.node_bytes),
            buffered_edges: self.buffered_edges + other.buffered_edges,
            map_entries: self.map_entries + other.map_entries,
            adjacency_entries: self.adjacency_entries + other.adjacency_entries,
        }
    }
}

pub trait MemoryProbe {
    fn measure(&self, footprint: &Footprint) -> u64;
}

impl<F: Fn(&Footprint) -> u64> MemoryProbe for F {
    fn measure(&self, footprint: &Footprint) -> u64 {
        self(footprint)
    }
}

/// Estimates heap usage from type layouts. Hash tables are charged one control byte per entry on
/// top of the key and value.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEstimate;

impl LayoutEstimate {
    const MAP_ENTRY: usize = size_of::<Vertex>() + size_of::<usize>() + 1;
    const SET_ENTRY: usize = size_of::<usize>() + 1;
}

impl MemoryProbe for LayoutEstimate {
    fn measure(&self, f: &Footprint) -> u64 {
        let bytes = f.node_slots * f.node_bytes
            + f.vertices * Self::MAP_ENTRY
            + f.map_entries * Self::MAP_ENTRY
            + f.adjacency_entries * Self::SET_ENTRY
            + f.buffered_edges * size_of::<Edge>();
        bytes as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_footprint_is_free() {
        assert_eq!(LayoutEstimate.measure(&Footprint::default()), 0);
    }

    #[test]
    fn closures_are_probes() {
        let probe = |f: &Footprint| f.vertices as u64 * 10;
        let f = Footprint {
            vertices: 3,
            ..Default::default()
        };
        assert_eq!(probe.measure(&f), 30);
        assert!(LayoutEstimate.measure(&f) > 0);
    }
}
