//! Reusable sample buffer pool.
//!
//! The pool pre-shapes every buffer it hands out (one fixed frame count,
//! channel count, and sample rate) so steady-state processing never
//! allocates: buffers cycle between the pool's free list and the components
//! holding them. Acquire and release take one short critical section; this
//! is acceptable on the callback thread because the lock is never held
//! across processing.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use thiserror::Error;

use crate::buffer::SampleBuffer;

/// Process-unique identity of a pool, stamped on every buffer it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolId(u64);

impl PoolId {
    fn generate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// What happens when every pooled buffer is already handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthPolicy {
    /// Allocate a fresh buffer past the maximum rather than failing.
    /// The maximum is advisory; release shrinks the pool back toward it.
    #[default]
    OnDemand,
    /// Hard cap: [`BufferPool::acquire`] returns [`PoolError::Exhausted`]
    /// once `max_buffers` are out.
    Bounded,
}

/// Errors from pool acquire/release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The released buffer did not originate from this pool.
    #[error("buffer did not originate from this pool")]
    OriginMismatch,
    /// All buffers are in use and the pool is hard-bounded.
    #[error("pool exhausted: all {0} buffers in use")]
    Exhausted(usize),
}

/// Snapshot of pool occupancy for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers sitting on the free list, ready to hand out.
    pub available: usize,
    /// Buffers currently handed out to callers.
    pub allocated: usize,
    /// Every live buffer this pool has created (`available + allocated`).
    pub total: usize,
}

struct PoolInner {
    free: Vec<SampleBuffer>,
    outstanding: usize,
}

/// Fixed-shape recycling pool of [`SampleBuffer`]s.
///
/// Buffers are created lazily up to `max_buffers`, then recycled through the
/// free list. Every buffer handed out is zeroed. Growth beyond the maximum
/// is governed by [`GrowthPolicy`].
///
/// # Example
///
/// ```rust
/// use resonar_core::{BufferPool, GrowthPolicy};
///
/// let pool = BufferPool::new(8, 256, 2, 48000.0, GrowthPolicy::OnDemand);
/// let buf = pool.acquire().unwrap();
/// assert_eq!(buf.frames(), 256);
/// pool.release(buf);
/// ```
pub struct BufferPool {
    id: PoolId,
    frames: usize,
    channels: usize,
    sample_rate: f32,
    max_buffers: usize,
    policy: GrowthPolicy,
    inner: Mutex<PoolInner>,
}

impl BufferPool {
    /// Creates an empty pool of `max_buffers` buffers shaped
    /// `frames` x `channels` at `sample_rate`.
    pub fn new(
        max_buffers: usize,
        frames: usize,
        channels: usize,
        sample_rate: f32,
        policy: GrowthPolicy,
    ) -> Self {
        Self {
            id: PoolId::generate(),
            frames,
            channels,
            sample_rate,
            max_buffers,
            policy,
            inner: Mutex::new(PoolInner {
                free: Vec::with_capacity(max_buffers),
                outstanding: 0,
            }),
        }
    }

    /// Frames per pooled buffer.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Channels per pooled buffer.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Sample rate the pool's buffers are shaped for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Configured buffer maximum (advisory under [`GrowthPolicy::OnDemand`]).
    pub fn max_buffers(&self) -> usize {
        self.max_buffers
    }

    /// Fetches a zeroed buffer of the pool's shape.
    ///
    /// Recycles from the free list when possible, creates lazily while under
    /// `max_buffers`, and past that either grows ([`GrowthPolicy::OnDemand`])
    /// or fails with [`PoolError::Exhausted`] ([`GrowthPolicy::Bounded`]).
    pub fn acquire(&self) -> Result<SampleBuffer, PoolError> {
        let mut inner = self.inner.lock();

        if let Some(mut buf) = inner.free.pop() {
            buf.clear();
            inner.outstanding += 1;
            return Ok(buf);
        }

        if inner.outstanding >= self.max_buffers {
            match self.policy {
                GrowthPolicy::Bounded => return Err(PoolError::Exhausted(self.max_buffers)),
                GrowthPolicy::OnDemand => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        outstanding = inner.outstanding,
                        max = self.max_buffers,
                        "pool growing past its advisory maximum"
                    );
                }
            }
        }

        inner.outstanding += 1;
        Ok(SampleBuffer::with_origin(
            self.frames,
            self.channels,
            self.sample_rate,
            self.id,
        ))
    }

    /// Returns a buffer to the pool.
    ///
    /// Buffers that did not originate here are discarded without touching the
    /// pool (benign double-release patterns must not fail at audio rate).
    /// Own buffers go back on the free list, or are dropped once the free
    /// list holds `max_buffers` so an overgrown pool shrinks back.
    pub fn release(&self, buffer: SampleBuffer) {
        if self.try_release(buffer).is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!("ignoring buffer returned to a pool it did not come from");
        }
    }

    /// Strict release: rejects foreign buffers with
    /// [`PoolError::OriginMismatch`] instead of silently discarding them.
    pub fn try_release(&self, buffer: SampleBuffer) -> Result<(), PoolError> {
        if buffer.origin() != Some(self.id) {
            return Err(PoolError::OriginMismatch);
        }

        let mut inner = self.inner.lock();
        inner.outstanding = inner.outstanding.saturating_sub(1);
        if inner.free.len() < self.max_buffers {
            inner.free.push(buffer);
        }
        // Else drop: the free list is at capacity, so the pool sheds the
        // surplus created under OnDemand growth.
        Ok(())
    }

    /// Occupancy snapshot: (available, allocated, total).
    pub fn stats(&self) -> PoolStats {
        let inner = self.inner.lock();
        PoolStats {
            available: inner.free.len(),
            allocated: inner.outstanding,
            total: inner.free.len() + inner.outstanding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool(max: usize, policy: GrowthPolicy) -> BufferPool {
        BufferPool::new(max, 64, 2, 48000.0, policy)
    }

    #[test]
    fn test_acquire_release_roundtrip_preserves_available() {
        let pool = test_pool(4, GrowthPolicy::OnDemand);

        // Warm the pool so the free list is non-trivial.
        let warm: Vec<_> = (0..3).map(|_| pool.acquire().unwrap()).collect();
        for buf in warm {
            pool.release(buf);
        }

        let before = pool.stats();
        let buf = pool.acquire().unwrap();
        pool.release(buf);
        let after = pool.stats();

        assert_eq!(before.available, after.available);
        assert_eq!(before.total, after.total);
    }

    #[test]
    fn test_buffers_are_zeroed_on_reuse() {
        let pool = test_pool(2, GrowthPolicy::OnDemand);

        let mut buf = pool.acquire().unwrap();
        buf.samples_mut().fill(0.7);
        pool.release(buf);

        let recycled = pool.acquire().unwrap();
        assert!(recycled.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_lazy_creation_counts() {
        let pool = test_pool(4, GrowthPolicy::OnDemand);
        assert_eq!(pool.stats().total, 0);

        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        let stats = pool.stats();
        assert_eq!(stats.allocated, 2);
        assert_eq!(stats.available, 0);
        assert_eq!(stats.total, 2);

        pool.release(a);
        pool.release(b);
        let stats = pool.stats();
        assert_eq!(stats.allocated, 0);
        assert_eq!(stats.available, 2);
    }

    #[test]
    fn test_bounded_policy_exhausts() {
        let pool = test_pool(2, GrowthPolicy::Bounded);
        let _a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();

        assert_eq!(pool.acquire().unwrap_err(), PoolError::Exhausted(2));
    }

    #[test]
    fn test_on_demand_grows_then_shrinks() {
        let pool = test_pool(1, GrowthPolicy::OnDemand);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        assert_eq!(pool.stats().total, 2);

        // First release fills the one-slot free list; the second sheds.
        pool.release(a);
        pool.release(b);
        let stats = pool.stats();
        assert_eq!(stats.available, 1);
        assert_eq!(stats.total, 1);
    }

    #[test]
    fn test_foreign_buffer_release_is_a_noop() {
        let pool = test_pool(2, GrowthPolicy::OnDemand);
        let other = test_pool(2, GrowthPolicy::OnDemand);

        let before = pool.stats();
        pool.release(SampleBuffer::new(64, 2, 48000.0));
        pool.release(other.acquire().unwrap());
        assert_eq!(pool.stats(), before);

        let foreign = other.acquire().unwrap();
        assert_eq!(
            pool.try_release(foreign).unwrap_err(),
            PoolError::OriginMismatch
        );
    }

    #[test]
    fn test_double_release_cycle_is_stable() {
        let pool = test_pool(3, GrowthPolicy::OnDemand);
        for _ in 0..10 {
            let buf = pool.acquire().unwrap();
            pool.release(buf);
        }
        let stats = pool.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.available, 1);
    }
}
