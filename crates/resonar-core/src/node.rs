//! The node processing contract shared by everything that lives in the graph.
//!
//! An [`AudioUnit`] is the single capability interface a graph node wraps:
//! transform (or generate) one block of audio per call. Units are prepared
//! with an [`AudioFormat`] before the first block and may be reset at any
//! time between blocks.

use crate::buffer::SampleBuffer;
use crate::pool::BufferPool;

/// Stream format a graph is prepared with.
///
/// Connections carry a copy of this descriptor; the graph rejects
/// connections whose format differs from the prepared one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Interleaved channel count.
    pub channels: usize,
    /// Largest block length, in frames, a single process call will see.
    pub max_frames: usize,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            channels: 2,
            max_frames: 256,
        }
    }
}

impl AudioFormat {
    /// Create a format descriptor.
    pub fn new(sample_rate: f32, channels: usize, max_frames: usize) -> Self {
        Self {
            sample_rate,
            channels,
            max_frames,
        }
    }
}

/// Lifecycle state of a graph node.
///
/// Only `Active` nodes run their unit; `Bypassed` nodes pass their input
/// through unchanged; `Inactive` and `Error` nodes produce no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Present in the graph but producing nothing.
    Inactive,
    /// Processing normally.
    Active,
    /// Forwarding input unchanged.
    Bypassed,
    /// Failed validation or processing; producing nothing until reset.
    Error,
}

/// A unit of audio processing hosted by a graph node.
///
/// `process` consumes the collected upstream input (`None` when the node
/// has no incoming signal this block) and returns the block it produced.
/// Source units acquire their output buffers from `pool`; processors
/// usually transform `input` in place and return it. Returning `None`
/// means silence downstream.
pub trait AudioUnit: Send {
    /// Process one block.
    fn process(&mut self, input: Option<SampleBuffer>, pool: &BufferPool) -> Option<SampleBuffer>;

    /// Called before the first block and whenever the stream format changes.
    fn prepare(&mut self, format: AudioFormat);

    /// Clear all internal state (delay lines, filter histories, ramps).
    fn reset(&mut self);

    /// True when the unit is in a usable configuration.
    fn validate(&self) -> bool {
        true
    }

    /// Update a named parameter. Units ignore names they do not own.
    fn set_param(&mut self, name: &str, value: f32) {
        let _ = (name, value);
    }
}

/// Identity unit: returns its input untouched.
///
/// Useful as the entry point for externally published audio, where the
/// node exists only to hand the callback's input buffer to the graph.
#[derive(Debug, Default, Clone)]
pub struct Passthrough;

impl AudioUnit for Passthrough {
    fn process(&mut self, input: Option<SampleBuffer>, _pool: &BufferPool) -> Option<SampleBuffer> {
        input
    }

    fn prepare(&mut self, _format: AudioFormat) {}

    fn reset(&mut self) {}
}
