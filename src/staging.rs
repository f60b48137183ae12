//! Staging buffer for not-yet-flushed message bytes.
//!
//! The encoder accumulates raw message data here between `advance` calls
//! until a complete 254-byte block (or a commit) lets it stream encoded
//! output. The buffer is a single allocation with `start`/`end` cursors:
//!
//! ```text
//! ┌──────────────┬─────────────────┬──────────────┐
//! │ consumed     │ cached bytes    │ free tail    │
//! │ 0 .. start   │ start .. end    │ end .. cap   │
//! └──────────────┴─────────────────┴──────────────┘
//! ```
//!
//! The compact-vs-reallocate decision lives in one place (`ensure_space`):
//! reuse the tail if it is big enough, otherwise compact the cached range
//! to offset 0, otherwise reallocate and copy the cached range forward.
//! Cached bytes are never lost; the buffer never shrinks on its own.

/// Initial backing allocation in bytes.
const INITIAL_CAPACITY: usize = 512;

/// Growable byte region with start/end cursors, owned by the encoder.
pub struct StagingBuffer {
    buf: Vec<u8>,
    /// Start of cached data.
    start: usize,
    /// End of cached data; also where new data is written.
    end: usize,
}

impl StagingBuffer {
    /// Create a staging buffer with the default initial capacity.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Create a staging buffer with a specific initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity.max(1)],
            start: 0,
            end: 0,
        }
    }

    /// Number of cached, not-yet-flushed bytes.
    #[inline]
    pub fn bytes_cached(&self) -> usize {
        self.end - self.start
    }

    /// The cached byte range.
    #[inline]
    pub fn cached(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    /// A writable region of exactly `size_hint` bytes at the tail.
    ///
    /// Valid until the next call to [`advance`](Self::advance). Any cached
    /// bytes survive the call, possibly at a different offset.
    pub fn writable(&mut self, size_hint: usize) -> &mut [u8] {
        self.ensure_space(size_hint);
        &mut self.buf[self.end..self.end + size_hint]
    }

    /// Mark `n` bytes written into the last requested region as cached.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.end + n <= self.buf.len());
        self.end += n;
    }

    /// Drop `n` bytes from the front of the cached range.
    #[inline]
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.bytes_cached());
        self.start += n;
    }

    /// Reset to empty. Keeps the backing allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.start = 0;
        self.end = 0;
    }

    /// Current backing capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn ensure_space(&mut self, size_hint: usize) {
        let tail_free = self.buf.len() - self.end;
        if size_hint <= tail_free {
            return;
        }

        let cached = self.bytes_cached();
        if size_hint <= self.buf.len() - cached {
            // Total free space suffices: reclaim the consumed head.
            self.buf.copy_within(self.start..self.end, 0);
            self.start = 0;
            self.end = cached;
            return;
        }

        // Reallocate and copy the cached range forward.
        let required = cached + size_hint;
        let mut next = vec![0u8; required.next_power_of_two()];
        next[..cached].copy_from_slice(&self.buf[self.start..self.end]);
        self.buf = next;
        self.start = 0;
        self.end = cached;
    }
}

impl Default for StagingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
