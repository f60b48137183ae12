//! Streaming COBS encoder.
//!
//! Messages are written incrementally: request a writable region, fill it,
//! call [`advance`](CobsEncoder::advance). The encoder frames complete
//! 254-byte blocks as soon as they accumulate, so output starts flowing
//! before the message ends. [`commit_message`](CobsEncoder::commit_message)
//! flushes the remainder and appends the `0x00` delimiter.
//!
//! # Example
//!
//! ```
//! use cobswire::{BufferSink, CobsEncoder};
//!
//! let mut encoder = CobsEncoder::new(BufferSink::new());
//! encoder.write(&[0x11, 0x22, 0x00, 0x33]);
//! encoder.commit_message();
//!
//! let encoded = encoder.into_sink().into_inner();
//! assert_eq!(&encoded[..], &[0x03, 0x11, 0x22, 0x02, 0x33, 0x00]);
//! ```

use crate::frame::{DELIMITER, MAX_BLOCK};
use crate::sink::{put, put_byte, FrameSink};
use crate::staging::StagingBuffer;

/// Incremental COBS encoder writing framed output to a [`FrameSink`].
///
/// Owns a [`StagingBuffer`] for not-yet-flushed message bytes. The backing
/// storage is released when the encoder drops.
pub struct CobsEncoder<S: FrameSink> {
    staging: StagingBuffer,
    sink: S,
}

impl<S: FrameSink> CobsEncoder<S> {
    /// Create an encoder writing to `sink`.
    pub fn new(sink: S) -> Self {
        Self {
            staging: StagingBuffer::new(),
            sink,
        }
    }

    /// A writable region of `size_hint` bytes for the next message chunk.
    ///
    /// Valid until the next call to [`advance`](Self::advance). Bytes from
    /// earlier `advance` calls are never lost, even when the staging buffer
    /// compacts or reallocates to satisfy the request.
    pub fn writable(&mut self, size_hint: usize) -> &mut [u8] {
        self.staging.writable(size_hint)
    }

    /// Mark `n` bytes of the last requested region as message data.
    ///
    /// Immediately streams out any complete 254-byte blocks.
    pub fn advance(&mut self, n: usize) {
        self.staging.advance(n);
        self.encode(false);
    }

    /// Copy `data` into the encoder. Equivalent to a `writable` + `advance`
    /// pair.
    pub fn write(&mut self, data: &[u8]) {
        self.writable(data.len())[..data.len()].copy_from_slice(data);
        self.advance(data.len());
    }

    /// Mark the end of the current message.
    ///
    /// Flushes all remaining cached bytes as final block(s), appends the
    /// delimiter, and resets the staging buffer for the next message. An
    /// empty message encodes to the bare delimiter.
    pub fn commit_message(&mut self) {
        self.encode(true);
        self.staging.reset();
        tracing::trace!("message committed");
    }

    /// Shared encode pass.
    ///
    /// A non-committing pass only drains full 254-byte windows; a
    /// committing pass drains everything and appends the delimiter.
    fn encode(&mut self, committing: bool) {
        while self.staging.bytes_cached() > 0
            && (committing || self.staging.bytes_cached() >= MAX_BLOCK)
        {
            let window_len = MAX_BLOCK.min(self.staging.bytes_cached());
            let window = &self.staging.cached()[..window_len];

            match window.iter().position(|&b| b == DELIMITER) {
                None => {
                    put_byte(&mut self.sink, (window_len + 1) as u8);
                    put(&mut self.sink, window);
                    self.staging.consume(window_len);
                }
                Some(idx) => {
                    put_byte(&mut self.sink, (idx + 1) as u8);
                    put(&mut self.sink, &window[..idx]);
                    self.staging.consume(idx + 1);

                    // A block with header < 255 restores a zero after it on
                    // decode, unless it ends the frame. When the consumed
                    // zero was the message's last byte, this empty block
                    // becomes the frame's last block instead, so the zero
                    // is still restored.
                    if committing && self.staging.bytes_cached() == 0 {
                        put_byte(&mut self.sink, 1);
                    }
                }
            }
        }

        if committing {
            put_byte(&mut self.sink, DELIMITER);
        }
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the encoder, returning the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
