//! Node and connection records for the processing graph.
//!
//! Nodes and connections live in slot arenas inside
//! [`AudioGraph`](super::AudioGraph) and reference each other by id, never by
//! pointer, so removal and cycle detection are plain id-graph traversals.

use crate::node::{AudioUnit, NodeStatus};

/// Caller-chosen identifier for a node.
///
/// The graph rejects a second node with an id already in use. Ids are
/// stable across mutations for as long as the node is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Identifier for a registered connection.
///
/// Assigned sequentially by the graph and never reused within a graph
/// instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub(crate) u32);

impl ConnectionId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

/// The role of a node in the processing graph.
pub enum NodeKind {
    /// Generates audio. Takes no graph input beyond externally published
    /// blocks; its unit's `process` sees `Some` only for published input.
    Source(Box<dyn AudioUnit>),
    /// Transforms its collected input through the wrapped unit.
    Processor(Box<dyn AudioUnit>),
    /// Sums its inputs. The gain-weighted mix happens during input
    /// collection, so the node itself just forwards the collected block.
    Mixer,
    /// Terminal node; its collected input becomes the graph's output block.
    Output,
}

impl core::fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Source(_) => f.write_str("Source"),
            Self::Processor(_) => f.write_str("Processor"),
            Self::Mixer => f.write_str("Mixer"),
            Self::Output => f.write_str("Output"),
        }
    }
}

/// A node description handed to [`AudioGraph::add_node`](super::AudioGraph::add_node).
///
/// Declares the node's identity, role, and connection limits. The limits
/// are enforced at connect time, not at add time.
pub struct AudioNode {
    /// Caller-chosen identity.
    pub id: NodeId,
    /// Role and, for Source/Processor, the wrapped unit.
    pub kind: NodeKind,
    /// Maximum number of incoming connections.
    pub max_inputs: usize,
    /// Maximum number of outgoing connections.
    pub max_outputs: usize,
}

impl AudioNode {
    /// A node with explicit connection limits.
    pub fn new(id: NodeId, kind: NodeKind, max_inputs: usize, max_outputs: usize) -> Self {
        Self {
            id,
            kind,
            max_inputs,
            max_outputs,
        }
    }

    /// A generator node: no inputs, one output.
    pub fn source(id: NodeId, unit: Box<dyn AudioUnit>) -> Self {
        Self::new(id, NodeKind::Source(unit), 0, 1)
    }

    /// A transform node: one input, one output.
    pub fn processor(id: NodeId, unit: Box<dyn AudioUnit>) -> Self {
        Self::new(id, NodeKind::Processor(unit), 1, 1)
    }

    /// A summing node: up to `max_inputs` inputs, one output.
    pub fn mixer(id: NodeId, max_inputs: usize) -> Self {
        Self::new(id, NodeKind::Mixer, max_inputs, 1)
    }

    /// A terminal node: one input, no outputs.
    pub fn output(id: NodeId) -> Self {
        Self::new(id, NodeKind::Output, 1, 0)
    }
}

/// Internal bookkeeping for a registered node.
pub(crate) struct NodeData {
    pub id: NodeId,
    pub kind: NodeKind,
    pub max_inputs: usize,
    pub max_outputs: usize,
    pub status: NodeStatus,
    /// Ids of connections arriving at this node, in registration order.
    pub incoming: Vec<ConnectionId>,
    /// Ids of connections leaving this node, in registration order.
    pub outgoing: Vec<ConnectionId>,
}

impl NodeData {
    pub fn new(node: AudioNode) -> Self {
        Self {
            id: node.id,
            kind: node.kind,
            max_inputs: node.max_inputs,
            max_outputs: node.max_outputs,
            status: NodeStatus::Active,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    /// The unit wrapped by Source and Processor nodes.
    pub fn unit_mut(&mut self) -> Option<&mut Box<dyn AudioUnit>> {
        match &mut self.kind {
            NodeKind::Source(unit) | NodeKind::Processor(unit) => Some(unit),
            NodeKind::Mixer | NodeKind::Output => None,
        }
    }
}

/// A directed, format-tagged edge between two nodes.
#[derive(Debug)]
pub(crate) struct Connection {
    pub source: NodeId,
    pub destination: NodeId,
    /// Output port index on the source node.
    pub source_output: usize,
    /// Input port index on the destination node.
    pub destination_input: usize,
    pub format: crate::node::AudioFormat,
    /// Inactive connections are skipped during input collection.
    pub is_active: bool,
    /// Weight applied when this connection participates in a mix.
    pub gain: f32,
}
