//! Real-time engine facade for resonar.
//!
//! This crate ties the pieces of `resonar-core` into something a host
//! application can drive:
//!
//! - [`AudioEngine`]: a mutex-wrapped audio graph with a thread-safe
//!   control surface and a non-blocking per-block [`render`] entry point
//! - [`EngineConfig`]: TOML-backed configuration for stream format,
//!   pool sizing, worker bounds, and parameter smoothing
//! - [`WorkerPool`]: priority work-stealing threads for anything that
//!   must stay off the audio callback
//!
//! [`render`]: AudioEngine::render
//!
//! # Quick start
//!
//! ```
//! use resonar_core::{AudioNode, NodeId, Passthrough};
//! use resonar_engine::{AudioEngine, CallbackInfo, EngineConfig};
//!
//! let engine = AudioEngine::new(EngineConfig::default())?;
//!
//! let source = NodeId(1);
//! let output = NodeId(2);
//! engine.add_node(AudioNode::source(source, Box::new(Passthrough)))?;
//! engine.add_node(AudioNode::output(output))?;
//! engine.connect(source, output, 0, 0)?;
//! engine.set_input_node(source)?;
//! engine.activate();
//!
//! // One callback's worth of work.
//! let mut block = engine.acquire()?;
//! block.samples_mut().fill(0.25);
//! let info = CallbackInfo::new(engine.format().max_frames, engine.format().sample_rate);
//! if let Some(rendered) = engine.render(Some(block), &info) {
//!     engine.release(rendered);
//! }
//!
//! engine.shutdown();
//! # Ok::<(), resonar_engine::EngineError>(())
//! ```

mod config;
mod engine;
mod error;
mod workers;

pub use config::{ConfigError, EngineConfig, PoolPolicy};
pub use engine::{AudioEngine, CallbackInfo, EngineEvent};
pub use error::{EngineError, Result};
pub use workers::{TaskPriority, WorkerPool, WorkerPoolError};
