//! The audio engine facade.
//!
//! [`AudioEngine`] wraps an [`AudioGraph`] in a mutex and exposes the two
//! faces a host needs: a control surface (graph mutation, parameter
//! changes, lifecycle) callable from any thread, and [`render`], called
//! once per hardware block from the audio callback. Graph mutations and
//! block processing are mutually exclusive; the callback never waits for
//! a mutation to finish, it degrades to pass-through instead.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use resonar_core::{
    AudioFormat, AudioGraph, AudioNode, BufferPool, ConnectionId, GraphError, MultiParamSmoother,
    NodeId, NodeStatus, PoolStats, SampleBuffer,
};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::workers::{TaskPriority, WorkerPool};

/// Event channel capacity. Events published past an unread backlog of
/// this size are dropped.
const EVENT_CAPACITY: usize = 64;

/// Sentinel for "no designated input node".
const NO_INPUT_NODE: u64 = u64::MAX;

/// Timing context for one render call, supplied by the host callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallbackInfo {
    /// Stream position of the block's first frame, in samples.
    pub sample_time: f64,
    /// Host clock reading when the callback fired, in host ticks.
    pub host_time: u64,
    /// Host clock deadline for returning from the callback, in host ticks.
    pub deadline: u64,
    /// Frames in this block.
    pub frames: usize,
    /// Stream sample rate in Hz.
    pub sample_rate: f32,
}

impl CallbackInfo {
    /// Context with zeroed clocks, for hosts that do not supply timing.
    pub fn new(frames: usize, sample_rate: f32) -> Self {
        Self {
            sample_time: 0.0,
            host_time: 0,
            deadline: 0,
            frames,
            sample_rate,
        }
    }
}

/// Notifications delivered to control-side subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The engine began rendering.
    Started,
    /// The engine stopped rendering.
    Stopped,
    /// The graph's topology changed.
    GraphChanged,
}

/// Real-time audio engine: a prepared graph, smoothed parameters, and a
/// background worker pool behind one control surface.
///
/// All methods take `&self`, so an engine can be shared across threads in
/// an `Arc` with the audio callback holding a clone.
pub struct AudioEngine {
    graph: Mutex<AudioGraph>,
    params: Mutex<MultiParamSmoother>,
    workers: WorkerPool,
    config: EngineConfig,
    format: AudioFormat,
    /// Node that receives hardware input blocks. `NO_INPUT_NODE` when
    /// unset.
    input_node: AtomicU64,
    active: AtomicBool,
    /// Set by `set_parameter`, consumed by `render` to force a broadcast
    /// even when no ramp is in flight.
    params_dirty: AtomicBool,
    events_tx: Sender<EngineEvent>,
    events_rx: Receiver<EngineEvent>,
}

impl AudioEngine {
    /// Builds an engine from a validated config: prepared graph and
    /// buffer pool, parameter smoother, worker pool, and event channel.
    ///
    /// The engine starts inactive; call [`activate`](Self::activate)
    /// before expecting output from [`render`](Self::render).
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] if the config fails validation,
    /// [`EngineError::Workers`] if worker threads cannot be spawned.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let format = config.format();

        let mut graph =
            AudioGraph::with_pool_config(config.pool_buffers, config.pool_policy.into());
        graph.prepare(format);

        let params = MultiParamSmoother::new(format.sample_rate, config.smoothing_ms);
        let workers = WorkerPool::with_limits(config.min_workers, config.max_workers)?;
        let (events_tx, events_rx) = bounded(EVENT_CAPACITY);

        tracing::info!(
            sample_rate = format.sample_rate,
            block_size = format.max_frames,
            channels = format.channels,
            workers = workers.worker_count(),
            "engine ready"
        );

        Ok(Self {
            graph: Mutex::new(graph),
            params: Mutex::new(params),
            workers,
            config,
            format,
            input_node: AtomicU64::new(NO_INPUT_NODE),
            active: AtomicBool::new(false),
            params_dirty: AtomicBool::new(false),
            events_tx,
            events_rx,
        })
    }

    // --- Lifecycle ---

    /// Starts rendering. Idempotent; emits [`EngineEvent::Started`] on
    /// the first call.
    pub fn activate(&self) {
        if !self.active.swap(true, Ordering::AcqRel) {
            tracing::info!("engine started");
            self.emit(EngineEvent::Started);
        }
    }

    /// Stops rendering; [`render`](Self::render) reverts to pass-through.
    /// Idempotent; emits [`EngineEvent::Stopped`] when the engine was
    /// active.
    pub fn deactivate(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            tracing::info!("engine stopped");
            self.emit(EngineEvent::Stopped);
        }
    }

    /// Whether the engine is currently rendering.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Deactivates the engine and shuts the worker pool down, discarding
    /// queued tasks and joining the worker threads.
    pub fn shutdown(&self) {
        self.deactivate();
        self.workers.shutdown();
    }

    /// Clears all DSP state in the graph without touching its topology.
    pub fn reset(&self) {
        self.graph.lock().reset();
    }

    // --- Rendering ---

    /// Renders one block from the audio callback.
    ///
    /// When inactive, hands `input` back untouched. When active, the
    /// input block (if any) is published to the designated input node,
    /// smoothed parameters advance by `info.frames` and are broadcast to
    /// the graph, and the graph runs; the returned buffer is the output
    /// node's block, owned by the caller until passed to
    /// [`release`](Self::release).
    ///
    /// If a control-side mutation holds the graph when the callback
    /// arrives, the block degrades to untouched pass-through rather than
    /// blocking the audio thread.
    pub fn render(&self, input: Option<SampleBuffer>, info: &CallbackInfo) -> Option<SampleBuffer> {
        if !self.active.load(Ordering::Acquire) {
            return input;
        }
        let Some(mut graph) = self.graph.try_lock() else {
            return input;
        };

        if let Some(mut params) = self.params.try_lock() {
            // A ramp that settles mid-block still needs one final
            // broadcast carrying the exact target, so the decision is
            // made before advancing.
            let broadcast =
                self.params_dirty.swap(false, Ordering::AcqRel) || params.is_any_smoothing();
            params.advance_by(info.frames);
            if broadcast {
                for (name, value) in params.current_values() {
                    graph.set_parameter(name, value);
                }
            }
        }

        if let Some(buffer) = input {
            match self.input_node() {
                Some(node) => {
                    // Publish failures reclaim the buffer internally.
                    let _ = graph.publish_input(node, buffer);
                }
                None => graph.release(buffer),
            }
        }

        graph.process_block()
    }

    // --- Buffers ---

    /// Acquires a block-sized buffer from the engine's pool, for filling
    /// with input samples before [`render`](Self::render).
    ///
    /// # Errors
    ///
    /// [`EngineError::Pool`] when a bounded pool is exhausted.
    pub fn acquire(&self) -> Result<SampleBuffer, EngineError> {
        let graph = self.graph.lock();
        let pool = graph.pool().ok_or(EngineError::NotPrepared)?;
        Ok(pool.acquire()?)
    }

    /// Returns a buffer to the engine's pool.
    pub fn release(&self, buffer: SampleBuffer) {
        self.graph.lock().release(buffer);
    }

    /// Current buffer pool counters.
    pub fn pool_stats(&self) -> Option<PoolStats> {
        self.graph.lock().pool().map(BufferPool::stats)
    }

    // --- Graph control ---

    /// Adds a node and announces the topology change.
    ///
    /// # Errors
    ///
    /// [`EngineError::Graph`] if the id is already registered.
    pub fn add_node(&self, node: AudioNode) -> Result<(), EngineError> {
        self.graph.lock().add_node(node)?;
        self.emit(EngineEvent::GraphChanged);
        Ok(())
    }

    /// Removes a node and its connections. Clears the input designation
    /// if it pointed at this node.
    ///
    /// # Errors
    ///
    /// [`EngineError::Graph`] if the node is not registered.
    pub fn remove_node(&self, node: NodeId) -> Result<(), EngineError> {
        self.graph.lock().remove_node(node)?;
        if self.input_node() == Some(node) {
            self.input_node.store(NO_INPUT_NODE, Ordering::Release);
        }
        self.emit(EngineEvent::GraphChanged);
        Ok(())
    }

    /// Connects two nodes at the engine's stream format.
    ///
    /// # Errors
    ///
    /// [`EngineError::Graph`] on missing endpoints, full ports, duplicate
    /// edges, or a cycle.
    pub fn connect(
        &self,
        source: NodeId,
        destination: NodeId,
        source_output: usize,
        destination_input: usize,
    ) -> Result<ConnectionId, EngineError> {
        let id = self.graph.lock().connect(
            source,
            destination,
            source_output,
            destination_input,
            self.format,
        )?;
        self.emit(EngineEvent::GraphChanged);
        Ok(id)
    }

    /// Removes the connection between two nodes, if one exists.
    pub fn disconnect(&self, source: NodeId, destination: NodeId) -> bool {
        let removed = self.graph.lock().disconnect(source, destination);
        if removed {
            self.emit(EngineEvent::GraphChanged);
        }
        removed
    }

    /// Removes a connection by id.
    pub fn remove_connection(&self, connection: ConnectionId) -> bool {
        let removed = self.graph.lock().remove_connection(connection);
        if removed {
            self.emit(EngineEvent::GraphChanged);
        }
        removed
    }

    /// Changes a node's processing status (activate, bypass, take
    /// offline).
    ///
    /// # Errors
    ///
    /// [`EngineError::Graph`] if the node is not registered.
    pub fn set_node_status(&self, node: NodeId, status: NodeStatus) -> Result<(), EngineError> {
        self.graph.lock().set_status(node, status)?;
        self.emit(EngineEvent::GraphChanged);
        Ok(())
    }

    /// A node's current processing status.
    pub fn node_status(&self, node: NodeId) -> Option<NodeStatus> {
        self.graph.lock().status(node)
    }

    /// Scales the mix weight of a connection. Returns `false` for an
    /// unknown connection id.
    pub fn set_connection_gain(&self, connection: ConnectionId, gain: f32) -> bool {
        self.graph.lock().set_connection_gain(connection, gain)
    }

    /// Mutes or unmutes a connection without removing it. Returns
    /// `false` for an unknown connection id.
    pub fn set_connection_active(&self, connection: ConnectionId, active: bool) -> bool {
        self.graph.lock().set_connection_active(connection, active)
    }

    /// Designates the node that receives hardware input blocks.
    ///
    /// # Errors
    ///
    /// [`EngineError::Graph`] if the node is not registered.
    pub fn set_input_node(&self, node: NodeId) -> Result<(), EngineError> {
        if self.graph.lock().status(node).is_none() {
            return Err(GraphError::NodeNotFound(node).into());
        }
        self.input_node.store(u64::from(node.0), Ordering::Release);
        Ok(())
    }

    /// Clears the input designation; subsequent input blocks are
    /// returned to the pool unheard.
    pub fn clear_input_node(&self) {
        self.input_node.store(NO_INPUT_NODE, Ordering::Release);
    }

    /// The node currently designated to receive input, if any.
    pub fn input_node(&self) -> Option<NodeId> {
        let raw = self.input_node.load(Ordering::Acquire);
        (raw != NO_INPUT_NODE).then_some(NodeId(raw as u32))
    }

    /// Runs `f` with exclusive access to the graph.
    ///
    /// Blocks until the graph is free; the callback skips blocks
    /// rendered while `f` runs. Intended for control-side access that
    /// has no dedicated method, such as tweaking a node's unit.
    pub fn with_graph<R>(&self, f: impl FnOnce(&mut AudioGraph) -> R) -> R {
        f(&mut self.graph.lock())
    }

    /// Snapshot of the current processing order.
    pub fn processing_order(&self) -> Vec<NodeId> {
        self.graph.lock().processing_order().to_vec()
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.graph.lock().node_count()
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.graph.lock().connection_count()
    }

    // --- Parameters ---

    /// Sets a named parameter target. The value ramps over the smoothing
    /// window and is broadcast to every node on the following renders.
    pub fn set_parameter(&self, name: &str, value: f32) {
        self.params.lock().set(name, value);
        self.params_dirty.store(true, Ordering::Release);
    }

    /// Current (possibly mid-ramp) value of a parameter.
    pub fn parameter(&self, name: &str) -> Option<f32> {
        self.params.lock().get(name)
    }

    // --- Workers and events ---

    /// Queues a task on the background worker pool.
    ///
    /// # Errors
    ///
    /// [`EngineError::Workers`] once the engine has shut down.
    pub fn submit<F>(&self, priority: TaskPriority, task: F) -> Result<(), EngineError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.workers.submit(priority, task)?;
        Ok(())
    }

    /// A receiver for engine events. Each call returns a handle onto the
    /// same queue, so clones compete for events rather than each seeing
    /// every one.
    pub fn events(&self) -> Receiver<EngineEvent> {
        self.events_rx.clone()
    }

    /// The engine's stream format.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// The config this engine was built from.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn emit(&self, event: EngineEvent) {
        // Dropped rather than blocking when no one is draining.
        let _ = self.events_tx.try_send(event);
    }
}

impl core::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("config", &self.config)
            .field("format", &self.format)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
