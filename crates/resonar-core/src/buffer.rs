//! Interleaved audio sample buffers.
//!
//! A [`SampleBuffer`] is a fixed-shape block of interleaved `f32` samples:
//! `frames * channels` values at a given sample rate. Buffers are owned by
//! exactly one component at a time (pool, node, or caller) and, when they
//! came from a [`BufferPool`](crate::pool::BufferPool), carry an origin tag
//! so they can be returned to the right pool.

use crate::pool::PoolId;

/// A fixed-shape block of interleaved audio samples.
///
/// Sample layout is frame-major: `samples[frame * channels + channel]`.
/// The storage length always equals `frames * channels`.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    frames: usize,
    channels: usize,
    sample_rate: f32,
    samples: Vec<f32>,
    origin: Option<PoolId>,
}

impl SampleBuffer {
    /// Creates a zeroed ad hoc buffer (no pool origin).
    pub fn new(frames: usize, channels: usize, sample_rate: f32) -> Self {
        Self {
            frames,
            channels,
            sample_rate,
            samples: vec![0.0; frames * channels],
            origin: None,
        }
    }

    /// Creates a zeroed buffer tagged with its originating pool.
    pub(crate) fn with_origin(
        frames: usize,
        channels: usize,
        sample_rate: f32,
        origin: PoolId,
    ) -> Self {
        Self {
            frames,
            channels,
            sample_rate,
            samples: vec![0.0; frames * channels],
            origin: Some(origin),
        }
    }

    /// Number of frames (samples per channel).
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of interleaved channels.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Sample rate this buffer was shaped for.
    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// The pool this buffer originated from, if any.
    #[inline]
    pub(crate) fn origin(&self) -> Option<PoolId> {
        self.origin
    }

    /// Interleaved sample storage, length `frames * channels`.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Mutable interleaved sample storage.
    #[inline]
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// True when the shape matches `frames` x `channels`.
    #[inline]
    pub fn matches_shape(&self, frames: usize, channels: usize) -> bool {
        self.frames == frames && self.channels == channels
    }

    /// Fills the buffer with silence.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Copies another buffer's samples into this one.
    ///
    /// # Panics
    ///
    /// Panics if the two buffers have different storage lengths.
    pub fn copy_from(&mut self, other: &SampleBuffer) {
        self.samples.copy_from_slice(&other.samples);
    }

    /// Adds another buffer's samples scaled by `gain` (mix/accumulate).
    ///
    /// Shorter of the two storage lengths wins; no resizing happens here.
    pub fn accumulate_from(&mut self, other: &SampleBuffer, gain: f32) {
        for (dst, src) in self.samples.iter_mut().zip(other.samples.iter()) {
            *dst += *src * gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_invariant() {
        let buf = SampleBuffer::new(128, 2, 48000.0);
        assert_eq!(buf.samples().len(), 128 * 2);
        assert_eq!(buf.frames(), 128);
        assert_eq!(buf.channels(), 2);
        assert!(buf.matches_shape(128, 2));
        assert!(!buf.matches_shape(64, 2));
    }

    #[test]
    fn test_new_buffer_is_silent() {
        let buf = SampleBuffer::new(64, 1, 44100.0);
        assert!(buf.samples().iter().all(|&s| s == 0.0));
        assert!(buf.origin().is_none());
    }

    #[test]
    fn test_accumulate_with_gain() {
        let mut a = SampleBuffer::new(4, 1, 48000.0);
        let mut b = SampleBuffer::new(4, 1, 48000.0);
        b.samples_mut().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);

        a.accumulate_from(&b, 0.5);
        a.accumulate_from(&b, 1.0);
        assert_eq!(a.samples(), &[1.5, 3.0, 4.5, 6.0]);
    }

    #[test]
    fn test_copy_then_clear() {
        let mut a = SampleBuffer::new(4, 1, 48000.0);
        let mut b = SampleBuffer::new(4, 1, 48000.0);
        b.samples_mut().fill(0.25);

        a.copy_from(&b);
        assert_eq!(a.samples(), b.samples());

        a.clear();
        assert!(a.samples().iter().all(|&s| s == 0.0));
    }
}
