//! Wait-free single-producer/single-consumer sample ring.
//!
//! Built for cross-thread handoff where blocking is forbidden (device
//! callback to file writer, streaming reader to callback). Exactly one
//! thread holds the [`RingProducer`] and one the [`RingConsumer`]; the
//! `&mut self` methods make a second writer or reader a compile error.
//!
//! Positions are monotonic sample counts. The producer publishes with a
//! release store matched by the consumer's acquire load, so a sample is
//! never observed before its write commits; the symmetric pairing on the
//! read position keeps the producer from reusing a slot still being read.
//! The workspace denies `unsafe_code`, so slots are atomic bit-cells
//! rather than raw storage; both copies still split into at most two
//! contiguous segments around the wrap point.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

struct Shared {
    slots: Box<[AtomicU32]>,
    capacity: usize,
    /// Total samples written. Stored by the producer, loaded by both.
    head: AtomicUsize,
    /// Total samples read. Stored by the consumer, loaded by both.
    tail: AtomicUsize,
}

/// Write end of an SPSC sample ring. Send it to the producing thread.
pub struct RingProducer {
    shared: Arc<Shared>,
}

/// Read end of an SPSC sample ring. Send it to the consuming thread.
pub struct RingConsumer {
    shared: Arc<Shared>,
}

/// Creates a ring holding up to `capacity` samples.
///
/// # Panics
///
/// Panics if `capacity` is zero.
///
/// # Example
///
/// ```rust
/// use resonar_core::spsc_ring;
///
/// let (mut tx, mut rx) = spsc_ring(8);
/// assert_eq!(tx.write(&[1.0, 2.0, 3.0]), 3);
///
/// let mut out = [0.0; 3];
/// assert_eq!(rx.read(&mut out), 3);
/// assert_eq!(out, [1.0, 2.0, 3.0]);
/// ```
pub fn spsc_ring(capacity: usize) -> (RingProducer, RingConsumer) {
    assert!(capacity > 0, "ring capacity must be non-zero");
    let slots = (0..capacity).map(|_| AtomicU32::new(0)).collect();
    let shared = Arc::new(Shared {
        slots,
        capacity,
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
    });
    (
        RingProducer {
            shared: Arc::clone(&shared),
        },
        RingConsumer { shared },
    )
}

impl RingProducer {
    /// Samples that can currently be written without overwriting unread
    /// data. A concurrent read can only increase this.
    pub fn free(&self) -> usize {
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);
        self.shared.capacity - head.wrapping_sub(tail)
    }

    /// Ring capacity in samples.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Writes as many samples from `data` as fit, returning the count.
    ///
    /// Truncates rather than overwriting unread data; wait-free.
    pub fn write(&mut self, data: &[f32]) -> usize {
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);
        let free = self.shared.capacity - head.wrapping_sub(tail);

        let n = data.len().min(free);
        if n == 0 {
            return 0;
        }

        let start = head % self.shared.capacity;
        let first = n.min(self.shared.capacity - start);

        for (slot, &sample) in self.shared.slots[start..start + first]
            .iter()
            .zip(&data[..first])
        {
            slot.store(sample.to_bits(), Ordering::Relaxed);
        }
        for (slot, &sample) in self.shared.slots[..n - first]
            .iter()
            .zip(&data[first..n])
        {
            slot.store(sample.to_bits(), Ordering::Relaxed);
        }

        // Publish: samples become visible to the consumer here.
        self.shared.head.store(head.wrapping_add(n), Ordering::Release);
        n
    }
}

impl RingConsumer {
    /// Samples ready to read. A concurrent write can only increase this.
    pub fn available(&self) -> usize {
        let head = self.shared.head.load(Ordering::Acquire);
        let tail = self.shared.tail.load(Ordering::Relaxed);
        head.wrapping_sub(tail)
    }

    /// Ring capacity in samples.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Reads up to `into.len()` samples, returning the count (0 if empty).
    ///
    /// Never reads past the producer's published position; wait-free.
    pub fn read(&mut self, into: &mut [f32]) -> usize {
        let head = self.shared.head.load(Ordering::Acquire);
        let tail = self.shared.tail.load(Ordering::Relaxed);
        let used = head.wrapping_sub(tail);

        let n = into.len().min(used);
        if n == 0 {
            return 0;
        }

        let start = tail % self.shared.capacity;
        let first = n.min(self.shared.capacity - start);

        for (sample, slot) in into[..first]
            .iter_mut()
            .zip(&self.shared.slots[start..start + first])
        {
            *sample = f32::from_bits(slot.load(Ordering::Relaxed));
        }
        for (sample, slot) in into[first..n]
            .iter_mut()
            .zip(&self.shared.slots[..n - first])
        {
            *sample = f32::from_bits(slot.load(Ordering::Relaxed));
        }

        // Free the slots for the producer.
        self.shared.tail.store(tail.wrapping_add(n), Ordering::Release);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let (mut tx, mut rx) = spsc_ring(8);
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(tx.write(&data), 5);

        let mut out = [0.0; 5];
        assert_eq!(rx.read(&mut out), 5);
        assert_eq!(out, data);
    }

    #[test]
    fn test_write_truncates_at_capacity() {
        let (mut tx, mut rx) = spsc_ring(4);
        assert_eq!(tx.write(&[1.0; 6]), 4);
        assert_eq!(tx.write(&[2.0]), 0);
        assert_eq!(tx.free(), 0);

        let mut out = [0.0; 2];
        assert_eq!(rx.read(&mut out), 2);
        assert_eq!(tx.free(), 2);
        assert_eq!(tx.write(&[3.0, 4.0, 5.0]), 2);
    }

    #[test]
    fn test_empty_read_returns_zero() {
        let (_tx, mut rx) = spsc_ring(4);
        let mut out = [0.0; 4];
        assert_eq!(rx.read(&mut out), 0);
    }

    #[test]
    fn test_wraparound_keeps_order() {
        let (mut tx, mut rx) = spsc_ring(4);
        let mut out = [0.0; 4];

        tx.write(&[1.0, 2.0, 3.0]);
        assert_eq!(rx.read(&mut out[..2]), 2);

        // Head is at 3; this write wraps past the end.
        assert_eq!(tx.write(&[4.0, 5.0, 6.0]), 3);
        assert_eq!(rx.read(&mut out), 4);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_counts_track_both_sides() {
        let (mut tx, mut rx) = spsc_ring(8);
        assert_eq!(tx.free(), 8);
        assert_eq!(rx.available(), 0);

        tx.write(&[0.5; 5]);
        assert_eq!(tx.free(), 3);
        assert_eq!(rx.available(), 5);

        let mut out = [0.0; 3];
        rx.read(&mut out);
        assert_eq!(tx.free(), 6);
        assert_eq!(rx.available(), 2);
    }
}
