//! Fixed-capacity delay line.
//!
//! The building block under the comb and allpass filters and the delay
//! effect. Storage is heap-allocated once at construction and never
//! reallocates; nothing in the processing path allocates.

/// Circular delay line with independent write and read cursors.
///
/// Two ways to read:
///
/// - [`read`](Self::read) advances the read cursor and returns the oldest
///   sample not yet consumed that way (FIFO use).
/// - [`read_with_delay`](Self::read_with_delay) is a non-destructive tap a
///   fixed number of samples behind the write cursor (filter use). Reading
///   at the full capacity before each write makes the line a loop of
///   exactly `capacity` samples.
///
/// # Example
///
/// ```rust
/// use resonar_core::DelayLine;
///
/// let mut line = DelayLine::new(4);
/// for s in [1.0, 2.0, 3.0] {
///     line.write(s);
/// }
/// assert_eq!(line.read_with_delay(3), 1.0);
/// assert_eq!(line.read(), 1.0); // FIFO cursor advances independently
/// assert_eq!(line.read(), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    read_pos: usize,
}

impl DelayLine {
    /// Creates a delay line holding `capacity` samples, initially silent.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "delay line capacity must be > 0");
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            read_pos: 0,
        }
    }

    /// Capacity in samples.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Stores a sample and advances the write cursor.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Returns the oldest unread sample and advances the read cursor.
    ///
    /// The read cursor is independent of the write cursor; if the writer
    /// laps the reader, old samples are simply overwritten (this is a delay
    /// line, not a queue).
    #[inline]
    pub fn read(&mut self) -> f32 {
        let sample = self.buffer[self.read_pos];
        self.read_pos = (self.read_pos + 1) % self.buffer.len();
        sample
    }

    /// Non-destructive tap: the sample written `delay` writes ago.
    ///
    /// `delay` is clamped to `1..=capacity`; neither cursor moves.
    #[inline]
    pub fn read_with_delay(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay.clamp(1, len);
        self.buffer[(self.write_pos + len - delay) % len]
    }

    /// Zeroes the storage and rewinds both cursors.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.read_pos = 0;
    }
}
