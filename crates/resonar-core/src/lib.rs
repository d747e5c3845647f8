//! Resonar Core - real-time audio infrastructure and DSP primitives
//!
//! This crate provides the foundational building blocks for a node-based
//! audio engine: buffer management that keeps the audio path allocation
//! free, a validated processing graph with derived topological order, and
//! the filter/smoothing primitives effects are built from.
//!
//! # Core Abstractions
//!
//! ## Buffers
//!
//! - [`SampleBuffer`] - Fixed-shape interleaved audio block
//! - [`BufferPool`] - Pre-allocated recycling pool with origin tracking
//! - [`CircularBuffer`] - Multi-channel FIFO for rate-decoupled transfer
//! - [`spsc_ring`] - Lock-free single-producer single-consumer ring
//!
//! ## Processing Graph
//!
//! - [`AudioGraph`] - Node/connection registry with cycle rejection and
//!   depth-first post-order scheduling
//! - [`AudioNode`] / [`NodeKind`] - Source, Processor, Mixer, and Output
//!   node descriptors
//! - [`AudioUnit`] - Processing contract implemented by sources and
//!   processors
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//! - [`CombFilter`] - Comb filter with damping for reverb algorithms
//! - [`AllpassFilter`] - Schroeder allpass for diffusion
//! - [`DelayLine`] - Fixed-capacity delay with tapped reads
//!
//! ## Parameter Smoothing
//!
//! Zipper-free parameter changes for click-free automation:
//!
//! - [`ParamSmoother`] - Exponential smoothing (RC-like response)
//! - [`MultiParamSmoother`] - Named-parameter set with adaptive timing
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`ms_to_samples`],
//!   [`flush_denormal`], etc.
//!
//! # Example
//!
//! ```
//! use resonar_core::{Biquad, ParamSmoother, peaking_eq_coefficients};
//!
//! let mut filter = Biquad::new();
//! let (b0, b1, b2, a0, a1, a2) = peaking_eq_coefficients(1000.0, 0.707, 6.0, 48000.0);
//! filter.set_coefficients(b0, b1, b2, a0, a1, a2);
//!
//! let mut gain = ParamSmoother::new(48000.0, 5.0);
//! gain.set_target(0.8);
//!
//! let mut block = [0.25f32; 64];
//! for sample in block.iter_mut() {
//!     *sample = filter.process(*sample) * gain.advance();
//! }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: steady-state processing recycles pooled buffers
//!   instead of allocating
//! - **Validated topology**: graphs reject cycles and limit violations at
//!   mutation time, never during processing
//! - **Explicit ownership**: buffers move between pool, nodes, and caller;
//!   nothing is shared behind locks on the audio path

pub mod allpass;
pub mod biquad;
pub mod buffer;
pub mod circular;
pub mod comb;
pub mod delay;
pub mod graph;
pub mod math;
pub mod node;
pub mod param;
pub mod pool;
pub mod spsc;

// Re-export main types at crate root
pub use allpass::AllpassFilter;
pub use biquad::{
    Biquad, highpass_coefficients, lowpass_coefficients, peaking_eq_coefficients,
};
pub use buffer::SampleBuffer;
pub use circular::CircularBuffer;
pub use comb::CombFilter;
pub use delay::DelayLine;
pub use graph::{AudioGraph, AudioNode, ConnectionId, GraphError, NodeId, NodeKind};
pub use math::{
    db_to_linear, flush_denormal, linear_to_db, ms_to_samples, samples_to_ms, wet_dry_mix,
};
pub use node::{AudioFormat, AudioUnit, NodeStatus, Passthrough};
pub use param::{MultiParamSmoother, ParamSmoother};
pub use pool::{BufferPool, GrowthPolicy, PoolError, PoolStats};
pub use spsc::{RingConsumer, RingProducer, spsc_ring};
