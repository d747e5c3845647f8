//! Graph manager: node/connection registry, validation, and ordering.
//!
//! [`AudioGraph`] owns the node and connection arenas, enforces structural
//! rules at mutation time (duplicate ids, connection limits, format
//! agreement, acyclicity), and maintains a derived processing order that is
//! recomputed after every mutation. Block execution lives in the sibling
//! `process` module.

use crate::node::{AudioFormat, AudioUnit, NodeStatus};
use crate::pool::{BufferPool, GrowthPolicy};
use crate::SampleBuffer;

use super::node::{AudioNode, Connection, ConnectionId, NodeData, NodeId};

/// Pool size used when the caller does not configure one.
const DEFAULT_POOL_CAPACITY: usize = 32;

/// Errors returned by graph mutation operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A node with this id is already registered.
    #[error("node {0} is already registered")]
    DuplicateNode(NodeId),
    /// The referenced node is not in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    /// The endpoint has no free input or output slots.
    #[error("connection limit reached on node {0}")]
    ConnectionLimitExceeded(NodeId),
    /// A connection already exists between these ports.
    #[error("connection {0} → {1} already exists on these ports")]
    DuplicateConnection(NodeId, NodeId),
    /// Committing the connection would make the graph cyclic.
    #[error("cannot connect {0} → {1}: would create a cycle")]
    CycleDetected(NodeId, NodeId),
    /// The connection's format differs from the prepared stream format.
    #[error("connection format does not match the prepared stream format")]
    IncompatibleFormat,
}

/// A finished node output waiting to be collected downstream.
pub(crate) struct CachedOutput {
    pub buffer: SampleBuffer,
    /// Consumers that have not collected this output yet. The last one
    /// takes the buffer itself; earlier ones receive pool copies.
    pub remaining_consumers: usize,
}

/// Registry of nodes and connections plus the derived processing order.
///
/// Nodes are registered under caller-chosen [`NodeId`]s and stored in an
/// append-only slot arena, so insertion order doubles as the tie-break for
/// the topological sort. Connections live in their own arena and are
/// referenced from both endpoints' adjacency lists.
///
/// Mutations and [`process_block`](Self::process_block) must not run
/// concurrently; wrap the graph in a mutex when sharing it across threads.
pub struct AudioGraph {
    pub(crate) nodes: Vec<Option<NodeData>>,
    pub(crate) connections: Vec<Option<Connection>>,
    processing_order: Vec<NodeId>,
    format: Option<AudioFormat>,
    pub(crate) pool: Option<BufferPool>,
    pool_capacity: usize,
    pool_policy: GrowthPolicy,
    /// Per-slot output cache filled and drained during a block.
    pub(crate) cached: Vec<Option<CachedOutput>>,
    /// Externally published input blocks, consumed by the next block.
    pub(crate) staged: Vec<(NodeId, SampleBuffer)>,
    /// Reusable scratch for input collection.
    pub(crate) scratch_contribs: Vec<(usize, f32)>,
}

impl Default for AudioGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioGraph {
    /// Creates an empty graph with the default pool configuration.
    pub fn new() -> Self {
        Self::with_pool_config(DEFAULT_POOL_CAPACITY, GrowthPolicy::OnDemand)
    }

    /// Creates an empty graph with an explicit buffer pool policy.
    ///
    /// `pool_capacity` bounds the pool built by [`prepare`](Self::prepare);
    /// under [`GrowthPolicy::OnDemand`] the bound is advisory, under
    /// [`GrowthPolicy::Bounded`] it is hard.
    pub fn with_pool_config(pool_capacity: usize, pool_policy: GrowthPolicy) -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            processing_order: Vec::new(),
            format: None,
            pool: None,
            pool_capacity,
            pool_policy,
            cached: Vec::new(),
            staged: Vec::new(),
            scratch_contribs: Vec::new(),
        }
    }

    /// Prepares the graph (and every registered unit) for a stream format.
    ///
    /// Builds the internal buffer pool with the format's shape. Connections
    /// made after this call must carry an equal format.
    pub fn prepare(&mut self, format: AudioFormat) {
        self.format = Some(format);
        self.pool = Some(BufferPool::new(
            self.pool_capacity,
            format.max_frames,
            format.channels,
            format.sample_rate,
            self.pool_policy,
        ));
        for node in self.nodes.iter_mut().flatten() {
            if let Some(unit) = node.unit_mut() {
                unit.prepare(format);
                if !unit.validate() {
                    node.status = NodeStatus::Error;
                }
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_prepare: {} Hz, {} ch, {} frames",
            format.sample_rate,
            format.channels,
            format.max_frames
        );
    }

    /// The format the graph was prepared with, if any.
    pub fn format(&self) -> Option<AudioFormat> {
        self.format
    }

    /// The graph's buffer pool, available after [`prepare`](Self::prepare).
    pub fn pool(&self) -> Option<&BufferPool> {
        self.pool.as_ref()
    }

    // --- Node mutations ---

    /// Registers a node.
    ///
    /// Fails with [`GraphError::DuplicateNode`] if the id is already in
    /// use. If the graph is prepared, the node's unit is prepared
    /// immediately; a unit that fails validation enters
    /// [`NodeStatus::Error`] until reset.
    pub fn add_node(&mut self, node: AudioNode) -> Result<(), GraphError> {
        if self.slot_of(node.id).is_some() {
            return Err(GraphError::DuplicateNode(node.id));
        }

        let mut data = NodeData::new(node);
        if let Some(format) = self.format
            && let Some(unit) = data.unit_mut()
        {
            unit.prepare(format);
            if !unit.validate() {
                data.status = NodeStatus::Error;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: node {} ({:?})", data.id, data.kind);
        self.nodes.push(Some(data));
        self.recompute_order();
        Ok(())
    }

    /// Removes a node, all connections touching it, and any staged input
    /// published for it.
    ///
    /// The node's unit is reset before removal.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        let slot = self.slot_of(id).ok_or(GraphError::NodeNotFound(id))?;

        let connection_ids: Vec<ConnectionId> = {
            let Some(node) = self.nodes[slot].as_ref() else {
                return Err(GraphError::NodeNotFound(id));
            };
            node.incoming.iter().chain(node.outgoing.iter()).copied().collect()
        };
        for connection_id in connection_ids {
            self.remove_connection_internal(connection_id);
        }

        if let Some(node) = self.nodes[slot].as_mut()
            && let Some(unit) = node.unit_mut()
        {
            unit.reset();
        }
        if let Some(cached) = self.cached.get_mut(slot).and_then(Option::take) {
            self.release_buffer(cached.buffer);
        }
        if let Some(pos) = self.staged.iter().position(|(staged_id, _)| *staged_id == id) {
            let (_, buffer) = self.staged.swap_remove(pos);
            self.release_buffer(buffer);
        }

        self.nodes[slot] = None;
        self.recompute_order();
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_remove: node {id}");
        Ok(())
    }

    /// Sets a node's lifecycle status.
    pub fn set_status(&mut self, id: NodeId, status: NodeStatus) -> Result<(), GraphError> {
        let slot = self.slot_of(id).ok_or(GraphError::NodeNotFound(id))?;
        if let Some(node) = self.nodes[slot].as_mut() {
            node.status = status;
        }
        Ok(())
    }

    /// Returns a node's lifecycle status.
    pub fn status(&self, id: NodeId) -> Option<NodeStatus> {
        let slot = self.slot_of(id)?;
        self.nodes[slot].as_ref().map(|n| n.status)
    }

    /// Returns a mutable reference to the unit inside a Source or
    /// Processor node.
    pub fn unit_mut(&mut self, id: NodeId) -> Option<&mut dyn AudioUnit> {
        let slot = self.slot_of(id)?;
        let node = self.nodes.get_mut(slot)?.as_mut()?;
        Some(node.unit_mut()?.as_mut())
    }

    // --- Connection mutations ---

    /// Connects `source`'s output port to `destination`'s input port.
    ///
    /// Validation order: both endpoints must exist, neither may be at its
    /// declared connection limit, `format` must equal the prepared stream
    /// format, the port pair must not already be connected, and the edge
    /// must not close a cycle. Nothing is registered when any check fails.
    pub fn connect(
        &mut self,
        source: NodeId,
        destination: NodeId,
        source_output: usize,
        destination_input: usize,
        format: AudioFormat,
    ) -> Result<ConnectionId, GraphError> {
        let source_slot = self.slot_of(source).ok_or(GraphError::NodeNotFound(source))?;
        let destination_slot = self
            .slot_of(destination)
            .ok_or(GraphError::NodeNotFound(destination))?;

        {
            let Some(source_node) = self.nodes[source_slot].as_ref() else {
                return Err(GraphError::NodeNotFound(source));
            };
            let Some(destination_node) = self.nodes[destination_slot].as_ref() else {
                return Err(GraphError::NodeNotFound(destination));
            };

            if source_node.outgoing.len() >= source_node.max_outputs {
                return Err(GraphError::ConnectionLimitExceeded(source));
            }
            if destination_node.incoming.len() >= destination_node.max_inputs {
                return Err(GraphError::ConnectionLimitExceeded(destination));
            }
        }

        if let Some(prepared) = self.format
            && format != prepared
        {
            return Err(GraphError::IncompatibleFormat);
        }

        let duplicate = self.nodes[source_slot].as_ref().is_some_and(|node| {
            node.outgoing.iter().any(|id| {
                self.connections[id.0 as usize].as_ref().is_some_and(|c| {
                    c.destination == destination
                        && c.source_output == source_output
                        && c.destination_input == destination_input
                })
            })
        });
        if duplicate {
            return Err(GraphError::DuplicateConnection(source, destination));
        }

        // Would source → destination close a loop? It does exactly when
        // destination already reaches source through existing connections.
        if self.can_reach(destination, source) {
            return Err(GraphError::CycleDetected(source, destination));
        }

        let connection_id = ConnectionId(self.connections.len() as u32);
        self.connections.push(Some(Connection {
            source,
            destination,
            source_output,
            destination_input,
            format,
            is_active: true,
            gain: 1.0,
        }));

        if let Some(node) = self.nodes[source_slot].as_mut() {
            node.outgoing.push(connection_id);
        }
        if let Some(node) = self.nodes[destination_slot].as_mut() {
            node.incoming.push(connection_id);
        }

        self.recompute_order();
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {source} → {destination}");
        Ok(connection_id)
    }

    /// Removes the connection between two nodes, if one exists.
    ///
    /// Returns `true` when a connection was removed. Calling this for a
    /// pair that is not connected is a no-op.
    pub fn disconnect(&mut self, source: NodeId, destination: NodeId) -> bool {
        let Some(connection_id) = self.find_connection(source, destination) else {
            return false;
        };
        self.remove_connection_internal(connection_id);
        self.recompute_order();
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: {source} → {destination}");
        true
    }

    /// Removes a connection by id.
    ///
    /// Returns `true` when the id referred to a live connection.
    pub fn remove_connection(&mut self, id: ConnectionId) -> bool {
        if self
            .connections
            .get(id.0 as usize)
            .and_then(|c| c.as_ref())
            .is_none()
        {
            return false;
        }
        self.remove_connection_internal(id);
        self.recompute_order();
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: connection {id}");
        true
    }

    /// Sets the mix weight of a connection.
    ///
    /// The gain applies when the destination mixes several inputs; a lone
    /// input passes through unscaled.
    pub fn set_connection_gain(&mut self, id: ConnectionId, gain: f32) -> bool {
        match self.connections.get_mut(id.0 as usize).and_then(|c| c.as_mut()) {
            Some(connection) => {
                connection.gain = gain;
                true
            }
            None => false,
        }
    }

    /// Activates or deactivates a connection without removing it.
    ///
    /// Inactive connections are skipped during input collection but still
    /// count toward connection limits and cycle checks.
    pub fn set_connection_active(&mut self, id: ConnectionId, active: bool) -> bool {
        match self.connections.get_mut(id.0 as usize).and_then(|c| c.as_mut()) {
            Some(connection) => {
                connection.is_active = active;
                true
            }
            None => false,
        }
    }

    // --- Introspection ---

    /// The derived topological order, source side first.
    pub fn processing_order(&self) -> &[NodeId] {
        &self.processing_order
    }

    /// The format a connection was established with.
    pub fn connection_format(&self, id: ConnectionId) -> Option<AudioFormat> {
        self.connections
            .get(id.0 as usize)?
            .as_ref()
            .map(|connection| connection.format)
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.iter().filter(|c| c.is_some()).count()
    }

    // --- Parameters and reset ---

    /// Broadcasts a named parameter value to every unit in the graph.
    ///
    /// Units ignore names they do not own, so a single namespace serves
    /// the whole graph.
    pub fn set_parameter(&mut self, name: &str, value: f32) {
        for node in self.nodes.iter_mut().flatten() {
            if let Some(unit) = node.unit_mut() {
                unit.set_param(name, value);
            }
        }
    }

    /// Resets every unit and drops all in-flight block state.
    ///
    /// Nodes in [`NodeStatus::Error`] return to [`NodeStatus::Active`];
    /// their units start from clean state.
    pub fn reset(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            if let Some(unit) = node.unit_mut() {
                unit.reset();
            }
            if node.status == NodeStatus::Error {
                node.status = NodeStatus::Active;
            }
        }
        self.clear_block_state();
    }

    // --- Internal helpers ---

    /// Arena slot for a node id. Linear scan; graphs stay small enough
    /// that an id index would not pay for itself.
    pub(crate) fn slot_of(&self, id: NodeId) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.as_ref().is_some_and(|data| data.id == id))
    }

    /// DFS reachability check: can `from` reach `to` via live connections?
    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            let Some(slot) = self.slot_of(current) else {
                continue;
            };
            if visited[slot] {
                continue;
            }
            visited[slot] = true;

            if let Some(node) = self.nodes[slot].as_ref() {
                for connection_id in &node.outgoing {
                    if let Some(connection) = &self.connections[connection_id.0 as usize] {
                        stack.push(connection.destination);
                    }
                }
            }
        }
        false
    }

    /// Finds the connection from `source` to `destination`, if one exists.
    pub fn find_connection(&self, source: NodeId, destination: NodeId) -> Option<ConnectionId> {
        let slot = self.slot_of(source)?;
        let node = self.nodes[slot].as_ref()?;
        for &connection_id in &node.outgoing {
            if let Some(connection) = &self.connections[connection_id.0 as usize]
                && connection.destination == destination
            {
                return Some(connection_id);
            }
        }
        None
    }

    /// Unregisters a connection from both endpoints without recomputing
    /// the order (caller does that once per mutation).
    fn remove_connection_internal(&mut self, id: ConnectionId) {
        let index = id.0 as usize;
        if let Some(connection) = self.connections[index].take() {
            if let Some(slot) = self.slot_of(connection.source)
                && let Some(node) = self.nodes[slot].as_mut()
            {
                node.outgoing.retain(|c| *c != id);
            }
            if let Some(slot) = self.slot_of(connection.destination)
                && let Some(node) = self.nodes[slot].as_mut()
            {
                node.incoming.retain(|c| *c != id);
            }
        }
    }

    /// Recomputes the processing order with a depth-first post-order walk.
    ///
    /// Upstream (input-side) dependencies are visited before the node
    /// itself, so every node lands after everything it depends on. Seeds
    /// iterate in slot order, which is insertion order, making insertion
    /// order the tie-break between unrelated nodes.
    fn recompute_order(&mut self) {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());

        for slot in 0..self.nodes.len() {
            if self.nodes[slot].is_some() {
                self.visit_upstream(slot, &mut visited, &mut order);
            }
        }

        self.processing_order = order;
    }

    fn visit_upstream(&self, slot: usize, visited: &mut [bool], order: &mut Vec<NodeId>) {
        if visited[slot] {
            return;
        }
        visited[slot] = true;

        let Some(node) = self.nodes[slot].as_ref() else {
            return;
        };
        for connection_id in &node.incoming {
            if let Some(connection) = &self.connections[connection_id.0 as usize]
                && let Some(source_slot) = self.slot_of(connection.source)
            {
                self.visit_upstream(source_slot, visited, order);
            }
        }
        order.push(node.id);
    }
}
