//! Abstract sink consumed by the encoder.
//!
//! The encoder writes encoded bytes through [`FrameSink`] without knowing
//! where they go. [`BufferSink`] is the in-memory implementation backed by
//! `bytes::BytesMut`; the async writer adapter drains one into a pipe.

use bytes::BytesMut;

/// Capability interface for receiving encoded bytes.
///
/// Assumed growable and infallible; delivery failures belong to whatever
/// eventually drains the sink.
pub trait FrameSink {
    /// A mutable region of at least `min` bytes.
    ///
    /// Valid until the next call to [`commit`](Self::commit). Requesting a
    /// new region discards any uncommitted bytes from the previous one.
    fn writable(&mut self, min: usize) -> &mut [u8];

    /// Finalize the first `n` bytes of the last requested region.
    ///
    /// `n` must not exceed the size of that region.
    fn commit(&mut self, n: usize);
}

/// Growable in-memory sink backed by [`BytesMut`].
#[derive(Debug, Default)]
pub struct BufferSink {
    buf: BytesMut,
    /// Size of the outstanding writable region, 0 when none.
    pending: usize,
}

impl BufferSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed bytes so far.
    pub fn as_slice(&self) -> &[u8] {
        debug_assert_eq!(self.pending, 0);
        &self.buf
    }

    /// Number of committed bytes.
    pub fn len(&self) -> usize {
        self.buf.len() - self.pending
    }

    /// Check if no bytes have been committed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split off all committed bytes, leaving the sink empty.
    pub fn split(&mut self) -> BytesMut {
        debug_assert_eq!(self.pending, 0);
        self.buf.split()
    }

    /// Consume the sink, returning the committed bytes.
    pub fn into_inner(mut self) -> BytesMut {
        self.rollback();
        self.buf
    }

    fn rollback(&mut self) {
        let keep = self.buf.len() - self.pending;
        self.buf.truncate(keep);
        self.pending = 0;
    }
}

impl FrameSink for BufferSink {
    fn writable(&mut self, min: usize) -> &mut [u8] {
        self.rollback();
        let at = self.buf.len();
        self.buf.resize(at + min, 0);
        self.pending = min;
        &mut self.buf[at..]
    }

    fn commit(&mut self, n: usize) {
        debug_assert!(n <= self.pending);
        let keep = self.buf.len() - (self.pending - n);
        self.buf.truncate(keep);
        self.pending = 0;
    }
}

/// Copy `bytes` into `sink` as one region-commit pair.
pub(crate) fn put<S: FrameSink>(sink: &mut S, bytes: &[u8]) {
    sink.writable(bytes.len())[..bytes.len()].copy_from_slice(bytes);
    sink.commit(bytes.len());
}

/// Write a single byte to `sink`.
pub(crate) fn put_byte<S: FrameSink>(sink: &mut S, byte: u8) {
    sink.writable(1)[0] = byte;
    sink.commit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writable_then_commit() {
        let mut sink = BufferSink::new();
        let region = sink.writable(4);
        region.copy_from_slice(b"abcd");
        sink.commit(4);
        assert_eq!(sink.as_slice(), b"abcd");
    }

    #[test]
    fn test_partial_commit_trims_tail() {
        let mut sink = BufferSink::new();
        let region = sink.writable(8);
        region[..3].copy_from_slice(b"xyz");
        sink.commit(3);
        assert_eq!(sink.as_slice(), b"xyz");
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn test_new_region_discards_uncommitted() {
        let mut sink = BufferSink::new();
        sink.writable(16);
        put(&mut sink, b"ok");
        assert_eq!(sink.as_slice(), b"ok");
    }

    #[test]
    fn test_put_helpers() {
        let mut sink = BufferSink::new();
        put_byte(&mut sink, 0x05);
        put(&mut sink, &[0x11, 0x22]);
        put_byte(&mut sink, 0x00);
        assert_eq!(sink.as_slice(), &[0x05, 0x11, 0x22, 0x00]);
    }

    #[test]
    fn test_split_empties_sink() {
        let mut sink = BufferSink::new();
        put(&mut sink, b"first");
        let taken = sink.split();
        assert_eq!(&taken[..], b"first");
        assert!(sink.is_empty());

        put(&mut sink, b"second");
        assert_eq!(sink.as_slice(), b"second");
    }
}
