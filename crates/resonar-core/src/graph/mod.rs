//! Directed audio-node graph with derived processing order.
//!
//! Nodes wrap [`AudioUnit`](crate::node::AudioUnit) implementations (or
//! act as structural mixers/outputs) and are wired with explicit
//! connections. The graph validates every mutation up front: duplicate
//! ids, connection limits, format agreement, and acyclicity are all
//! rejected before anything is registered, so the processing path never
//! has to cope with a malformed topology.
//!
//! Ordering is a depth-first post-order walk from each node's inputs,
//! recomputed after every mutation; ties between unrelated nodes fall
//! back to insertion order. Block execution walks that order once,
//! handing buffers downstream zero-copy where possible and mixing or
//! copying through the graph's pool where fan-in/fan-out demands it.
//!
//! ```
//! use resonar_core::graph::{AudioGraph, AudioNode, NodeId};
//! use resonar_core::node::{AudioFormat, Passthrough};
//!
//! let format = AudioFormat::new(48000.0, 2, 256);
//! let mut graph = AudioGraph::new();
//! graph.prepare(format);
//!
//! graph.add_node(AudioNode::source(NodeId(0), Box::new(Passthrough)))?;
//! graph.add_node(AudioNode::output(NodeId(1)))?;
//! graph.connect(NodeId(0), NodeId(1), 0, 0, format)?;
//!
//! assert_eq!(graph.processing_order(), &[NodeId(0), NodeId(1)]);
//! # Ok::<(), resonar_core::graph::GraphError>(())
//! ```

mod manager;
mod node;
mod process;

pub use manager::{AudioGraph, GraphError};
pub use node::{AudioNode, ConnectionId, NodeId, NodeKind};
