//! Connectivity queries over the edges of a sliding time window.
//!
//! Every engine keeps a maximum spanning forest of the window, with edges weighted by their
//! timestamp, except for [`RecomputingConnectivity`] which recomputes components on every query
//! and serves as the reference. Since the heaviest edges are the newest, a tree edge that expires
//! never has a replacement left in the window, so evicting is just a cut.
//!
//! [`WindowConfig`] drives any [`WindowConnectivity`] over a stream of [`Edge`]s.

pub mod connectivity;
pub mod d_tree;
pub mod directory;
pub mod edge;
pub mod error;
pub mod link_cut_tree;
pub mod memory;
pub mod optimized_tree;
pub mod pointer_tree;
pub mod splay;
pub mod union_find;
pub mod window;

pub use connectivity::{EngineKind, ForestConnectivity, SpanningForest, WindowConnectivity};
pub use edge::{Edge, Timestamp, TreeEdge, Vertex};
pub use error::{ConfigError, StreamError};
pub use memory::{Footprint, LayoutEstimate, MemoryProbe};
pub use union_find::RecomputingConnectivity;
pub use window::{LatencyRecorder, MemoryRecorder, SlideLatency, SlideObserver, WindowConfig};

/// The engine with the best query latency on long windows.
pub type FastestConnectivity = connectivity::LinkCutConnectivity;
