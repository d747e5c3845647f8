//! Bounded FIFO of interleaved audio frames.
//!
//! Bridges producer/consumer rate mismatches (file streaming, cross-callback
//! buffering) where blocking briefly is acceptable. Every mutating operation
//! runs under one critical section; the wait-free path for real-time handoff
//! is [`crate::spsc`] instead.

use parking_lot::Mutex;

struct Inner {
    samples: Vec<f32>,
    write_index: usize,
    read_index: usize,
    available: usize,
}

/// Fixed-capacity circular buffer of interleaved frames.
///
/// Writes and reads move whole frames (`channels` samples each); partial
/// transfers are allowed and reported through the return count, never by
/// overwriting unread data.
pub struct CircularBuffer {
    capacity: usize,
    channels: usize,
    inner: Mutex<Inner>,
}

impl CircularBuffer {
    /// Creates a buffer holding up to `capacity` frames of `channels`
    /// interleaved samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` or `channels` is zero.
    pub fn new(capacity: usize, channels: usize) -> Self {
        assert!(capacity > 0, "circular buffer capacity must be non-zero");
        assert!(channels > 0, "circular buffer needs at least one channel");
        Self {
            capacity,
            channels,
            inner: Mutex::new(Inner {
                samples: vec![0.0; capacity * channels],
                write_index: 0,
                read_index: 0,
                available: 0,
            }),
        }
    }

    /// Capacity in frames.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Interleaved channel count.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Frames ready to read. O(1).
    pub fn available_frames(&self) -> usize {
        self.inner.lock().available
    }

    /// Frames of free space. O(1).
    pub fn free_frames(&self) -> usize {
        let inner = self.inner.lock();
        self.capacity - inner.available
    }

    /// Copies as many whole frames from `data` as fit without overrun.
    ///
    /// `data` is interleaved; a trailing partial frame is ignored. Returns
    /// the number of frames actually written.
    pub fn write(&self, data: &[f32]) -> usize {
        let frames_in = data.len() / self.channels;
        let mut inner = self.inner.lock();

        let n = frames_in.min(self.capacity - inner.available);
        if n == 0 {
            return 0;
        }

        // At most two contiguous segments around the wrap point.
        let first = n.min(self.capacity - inner.write_index);
        let second = n - first;
        let ch = self.channels;

        let start = inner.write_index * ch;
        inner.samples[start..start + first * ch].copy_from_slice(&data[..first * ch]);
        if second > 0 {
            inner.samples[..second * ch].copy_from_slice(&data[first * ch..n * ch]);
        }

        inner.write_index = (inner.write_index + n) % self.capacity;
        inner.available += n;
        n
    }

    /// Copies up to `frames` frames into `into`.
    ///
    /// Bounded by what is available and by `into`'s whole-frame capacity.
    /// Returns the number of frames actually read.
    pub fn read(&self, frames: usize, into: &mut [f32]) -> usize {
        let dest_frames = into.len() / self.channels;
        let mut inner = self.inner.lock();

        let n = frames.min(inner.available).min(dest_frames);
        if n == 0 {
            return 0;
        }

        let first = n.min(self.capacity - inner.read_index);
        let second = n - first;
        let ch = self.channels;

        let start = inner.read_index * ch;
        into[..first * ch].copy_from_slice(&inner.samples[start..start + first * ch]);
        if second > 0 {
            into[first * ch..n * ch].copy_from_slice(&inner.samples[..second * ch]);
        }

        inner.read_index = (inner.read_index + n) % self.capacity;
        inner.available -= n;
        n
    }

    /// Resets both indices and zeroes the storage.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.samples.fill(0.0);
        inner.write_index = 0;
        inner.read_index = 0;
        inner.available = 0;
    }
}
