//! Block execution: walks the processing order and moves buffers
//! between nodes.
//!
//! Each block runs in three phases per node: collect inputs from upstream
//! output caches (zero-copy when a single consumer remains, pool copies
//! for fan-out, gain-weighted mixing for multiple inputs), run the node's
//! unit, then publish the result for downstream consumers. Leftover
//! buffers return to the pool at the end of the block, so a steady-state
//! graph neither leaks nor allocates.

use core::mem;

use crate::node::NodeStatus;
use crate::SampleBuffer;

use super::manager::{AudioGraph, CachedOutput, GraphError};
use super::node::{NodeId, NodeKind};

impl AudioGraph {
    /// Stages an externally produced block as `node`'s input for the next
    /// [`process_block`](Self::process_block) call.
    ///
    /// A Source node receives the staged block as the `input` argument of
    /// its unit, so a [`Passthrough`](crate::node::Passthrough) source
    /// injects external audio into the graph. Publishing twice for the
    /// same node replaces the earlier block. The buffer is returned to
    /// the pool if the node does not exist.
    pub fn publish_input(&mut self, node: NodeId, buffer: SampleBuffer) -> Result<(), GraphError> {
        if self.slot_of(node).is_none() {
            self.release_buffer(buffer);
            return Err(GraphError::NodeNotFound(node));
        }
        if let Some(position) = self.staged.iter().position(|(id, _)| *id == node) {
            let (_, previous) = self.staged.swap_remove(position);
            self.release_buffer(previous);
        }
        self.staged.push((node, buffer));
        Ok(())
    }

    /// Runs one block through the graph in processing order.
    ///
    /// Returns the block collected by the last Output node, or `None`
    /// when the graph is unprepared, has no Output input this block, or
    /// the output path produced silence. The caller owns the returned
    /// buffer and gives it back with [`release`](Self::release).
    pub fn process_block(&mut self) -> Option<SampleBuffer> {
        if self.pool.is_none() {
            self.clear_block_state();
            return None;
        }
        if self.cached.len() < self.nodes.len() {
            self.cached.resize_with(self.nodes.len(), || None);
        }

        let mut graph_output: Option<SampleBuffer> = None;

        let count = self.processing_order().len();
        for position in 0..count {
            let id = self.processing_order()[position];
            let Some(slot) = self.slot_of(id) else {
                continue;
            };
            let (status, is_output) = match self.nodes[slot].as_ref() {
                Some(node) => (node.status, matches!(node.kind, NodeKind::Output)),
                None => continue,
            };

            // Inactive and errored nodes contribute nothing; whatever
            // their upstreams cached for them is reclaimed below.
            if matches!(status, NodeStatus::Inactive | NodeStatus::Error) {
                continue;
            }

            let input = self.collect_inputs(id, slot);
            let output = match status {
                NodeStatus::Bypassed => input,
                _ => self.run_unit(slot, input),
            };

            if is_output {
                if let Some(previous) = graph_output.take() {
                    self.release_buffer(previous);
                }
                graph_output = output;
                continue;
            }

            if let Some(buffer) = output {
                let consumers = self.active_consumers(slot);
                if consumers == 0 {
                    self.release_buffer(buffer);
                } else {
                    self.cached[slot] = Some(CachedOutput {
                        buffer,
                        remaining_consumers: consumers,
                    });
                }
            }
        }

        self.clear_block_state();
        graph_output
    }

    /// Returns a buffer handed out by [`process_block`](Self::process_block)
    /// to the graph's pool.
    pub fn release(&self, buffer: SampleBuffer) {
        self.release_buffer(buffer);
    }

    /// Gathers a node's input block from staged external audio and the
    /// output caches of its active upstream connections.
    ///
    /// Zero available inputs yield `None`. Exactly one is passed through
    /// untouched. Two or more are mixed into a zeroed pool buffer, each
    /// scaled by its connection gain (staged audio mixes at unity).
    fn collect_inputs(&mut self, id: NodeId, slot: usize) -> Option<SampleBuffer> {
        let staged = self
            .staged
            .iter()
            .position(|(staged_id, _)| *staged_id == id)
            .map(|position| self.staged.swap_remove(position).1);

        let mut contribs = mem::take(&mut self.scratch_contribs);
        contribs.clear();
        if let Some(node) = self.nodes[slot].as_ref() {
            for connection_id in &node.incoming {
                if let Some(connection) = &self.connections[connection_id.0 as usize]
                    && connection.is_active
                    && let Some(source_slot) = self.slot_of(connection.source)
                    && self.cached.get(source_slot).is_some_and(Option::is_some)
                {
                    contribs.push((source_slot, connection.gain));
                }
            }
        }

        let available = contribs.len() + usize::from(staged.is_some());
        let input = match available {
            0 => None,
            1 => match staged {
                Some(buffer) => Some(buffer),
                None => {
                    let (source_slot, _) = contribs[0];
                    self.consume_cached(source_slot)
                }
            },
            _ => self.mix_inputs(staged, &contribs),
        };

        self.scratch_contribs = contribs;
        input
    }

    /// Sums contributions into a fresh pool buffer. On pool exhaustion
    /// the inputs are reclaimed and the node sees silence for the block.
    fn mix_inputs(
        &mut self,
        staged: Option<SampleBuffer>,
        contribs: &[(usize, f32)],
    ) -> Option<SampleBuffer> {
        let acquired = self.pool.as_ref().and_then(|pool| pool.acquire().ok());
        let Some(mut mix) = acquired else {
            if let Some(buffer) = staged {
                self.release_buffer(buffer);
            }
            for &(source_slot, _) in contribs {
                if let Some(buffer) = self.consume_cached(source_slot) {
                    self.release_buffer(buffer);
                }
            }
            return None;
        };

        if let Some(buffer) = staged {
            mix.accumulate_from(&buffer, 1.0);
            self.release_buffer(buffer);
        }
        for &(source_slot, gain) in contribs {
            if let Some(buffer) = self.consume_cached(source_slot) {
                mix.accumulate_from(&buffer, gain);
                self.release_buffer(buffer);
            }
        }
        Some(mix)
    }

    /// Takes one consumption from a cached upstream output.
    ///
    /// The last consumer receives the cached buffer itself; earlier
    /// consumers receive a pool copy so fan-out never aliases.
    fn consume_cached(&mut self, source_slot: usize) -> Option<SampleBuffer> {
        let remaining = self
            .cached
            .get(source_slot)?
            .as_ref()
            .map(|cached| cached.remaining_consumers)?;

        if remaining <= 1 {
            self.cached[source_slot].take().map(|cached| cached.buffer)
        } else {
            let mut copy = self.pool.as_ref()?.acquire().ok()?;
            let cached = self.cached.get_mut(source_slot)?.as_mut()?;
            cached.remaining_consumers -= 1;
            copy.accumulate_from(&cached.buffer, 1.0);
            Some(copy)
        }
    }

    /// Runs the node's unit on the collected input. Mixer and Output
    /// nodes have no unit and forward the input as-is.
    fn run_unit(&mut self, slot: usize, input: Option<SampleBuffer>) -> Option<SampleBuffer> {
        let Some(pool) = self.pool.as_ref() else {
            return input;
        };
        let Some(node) = self.nodes[slot].as_mut() else {
            return input;
        };
        match &mut node.kind {
            NodeKind::Source(unit) | NodeKind::Processor(unit) => unit.process(input, pool),
            NodeKind::Mixer | NodeKind::Output => input,
        }
    }

    /// Live, active outgoing connections for a node this block.
    fn active_consumers(&self, slot: usize) -> usize {
        let Some(node) = self.nodes[slot].as_ref() else {
            return 0;
        };
        node.outgoing
            .iter()
            .filter(|id| {
                self.connections[id.0 as usize]
                    .as_ref()
                    .is_some_and(|connection| connection.is_active)
            })
            .count()
    }

    /// Returns all unconsumed cached outputs and staged inputs to the
    /// pool.
    pub(crate) fn clear_block_state(&mut self) {
        for slot in 0..self.cached.len() {
            if let Some(cached) = self.cached[slot].take() {
                self.release_buffer(cached.buffer);
            }
        }
        while let Some((_, buffer)) = self.staged.pop() {
            self.release_buffer(buffer);
        }
    }

    pub(crate) fn release_buffer(&self, buffer: SampleBuffer) {
        if let Some(pool) = self.pool.as_ref() {
            pool.release(buffer);
        }
    }
}
