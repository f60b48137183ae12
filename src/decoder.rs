//! Lazy, cancelable, resumable message reader.
//!
//! [`MessageReader`] pulls chunks from a [`FrameSource`], scans for the
//! `0x00` delimiter, decodes each frame into a rented scratch buffer, and
//! hands out decoded messages one `next_message` call at a time.
//!
//! The reader borrows its source for one consumption pass. Stopping the
//! pass — cancellation, an early break, or a panic unwinding through the
//! caller — never closes the source: building a new reader on the same
//! source resumes at the next unconsumed, delimiter-aligned byte, with no
//! message skipped or replayed. The scratch buffer goes back to its pool
//! on every one of those exit paths.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> cobswire::Result<()> {
//! use cobswire::{ChunkSource, MessageReader};
//!
//! let (_tx, rx) = tokio::io::duplex(4096);
//! let mut source = ChunkSource::new(rx);
//! let mut reader = MessageReader::new(&mut source);
//! while let Some(message) = reader.next_message().await? {
//!     println!("{} bytes", message.len());
//! }
//! # Ok(())
//! # }
//! ```

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::frame::{decode_frame, DELIMITER};
use crate::pool::{ScratchGuard, ScratchPool};
use crate::source::FrameSource;

/// Initial scratch rent, grown to fit the largest frame seen.
const INITIAL_SCRATCH_SIZE: usize = 1024;

/// One consumption pass over a source of COBS-framed messages.
pub struct MessageReader<'a, S: FrameSource> {
    source: &'a mut S,
    cancel: CancellationToken,
    scratch: ScratchGuard,
}

impl<'a, S: FrameSource> MessageReader<'a, S> {
    /// Start a consumption pass with a fresh cancellation token.
    pub fn new(source: &'a mut S) -> Self {
        Self::with_cancellation(source, CancellationToken::new())
    }

    /// Start a consumption pass observing `cancel`.
    ///
    /// When the token fires, the sequence stops silently at its next
    /// suspension point; no error reaches the caller.
    pub fn with_cancellation(source: &'a mut S, cancel: CancellationToken) -> Self {
        Self {
            source,
            cancel,
            scratch: ScratchPool::global().rent(INITIAL_SCRATCH_SIZE),
        }
    }

    /// Start a consumption pass renting its scratch buffer from `pool`.
    pub fn with_pool(source: &'a mut S, cancel: CancellationToken, pool: &ScratchPool) -> Self {
        Self {
            source,
            cancel,
            scratch: pool.rent(INITIAL_SCRATCH_SIZE),
        }
    }

    /// Pull the next decoded message.
    ///
    /// - `Ok(Some(message))` — the slice is valid until the next call.
    /// - `Ok(None)` — the sequence stopped: end-of-data or cancellation
    ///   (either channel). After a cancellation the source remains open
    ///   and a new reader resumes where this one left off.
    /// - `Err(_)` — a malformed frame ([`CobswireError::Framing`]) or a
    ///   source I/O failure. The malformed frame's bytes are already
    ///   consumed, so the reader stays usable for the frames after it.
    ///
    /// [`CobswireError::Framing`]: crate::CobswireError::Framing
    pub async fn next_message(&mut self) -> Result<Option<&[u8]>> {
        loop {
            let outcome = self.source.await_bytes(&self.cancel).await?;
            if outcome.is_canceled {
                return Ok(None);
            }

            let buffered = self.source.buffered();
            match buffered.iter().position(|&b| b == DELIMITER) {
                Some(at) => {
                    let frame_len = at + 1;
                    self.scratch.ensure_capacity(frame_len);
                    let decoded = decode_frame(
                        self.scratch.as_mut_slice(),
                        &self.source.buffered()[..frame_len],
                    );
                    // Consume the frame before surfacing any error, so a
                    // malformed frame does not poison the ones behind it.
                    self.source.consume(frame_len);
                    let len = decoded.inspect_err(|e| {
                        tracing::debug!("discarding malformed frame: {e}");
                    })?;
                    return Ok(Some(&self.scratch.as_slice()[..len]));
                }
                None => {
                    self.source.mark_examined();
                    if outcome.is_eof {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// The token this pass observes.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BufferSink;
    use crate::source::ChunkSource;
    use crate::CobsEncoder;

    fn encode_all(messages: &[&[u8]]) -> Vec<u8> {
        let mut encoder = CobsEncoder::new(BufferSink::new());
        for message in messages {
            encoder.write(message);
            encoder.commit_message();
        }
        encoder.into_sink().into_inner().to_vec()
    }

    #[tokio::test]
    async fn test_reads_messages_in_order() {
        let encoded = encode_all(&[b"first", b"second", &[0x00, 0x01, 0x00]]);
        let mut source = ChunkSource::new(&encoded[..]);
        let mut reader = MessageReader::new(&mut source);

        assert_eq!(reader.next_message().await.unwrap().unwrap(), b"first");
        assert_eq!(reader.next_message().await.unwrap().unwrap(), b"second");
        assert_eq!(
            reader.next_message().await.unwrap().unwrap(),
            &[0x00, 0x01, 0x00]
        );
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_message_round_trips() {
        let encoded = encode_all(&[b"", b"x"]);
        let mut source = ChunkSource::new(&encoded[..]);
        let mut reader = MessageReader::new(&mut source);

        assert_eq!(reader.next_message().await.unwrap().unwrap(), b"");
        assert_eq!(reader.next_message().await.unwrap().unwrap(), b"x");
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_frame_at_eof_yields_nothing() {
        // A frame with its terminator cut off.
        let encoded = encode_all(&[b"abc"]);
        let truncated = &encoded[..encoded.len() - 1];
        let mut source = ChunkSource::new(truncated);
        let mut reader = MessageReader::new(&mut source);

        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_framing_error_does_not_poison_reader() {
        // First frame claims 4 payload bytes but the delimiter arrives early.
        let mut encoded = vec![0x05, 0x11, 0x22, 0x00];
        encoded.extend(encode_all(&[b"ok"]));
        let mut source = ChunkSource::new(&encoded[..]);
        let mut reader = MessageReader::new(&mut source);

        assert!(reader.next_message().await.unwrap_err().is_framing());
        assert_eq!(reader.next_message().await.unwrap().unwrap(), b"ok");
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scratch_grows_for_large_frames() {
        let big: Vec<u8> = (0..50_000).map(|i| (i % 251) as u8).collect();
        let encoded = encode_all(&[&big]);
        let mut source = ChunkSource::new(&encoded[..]);
        let mut reader = MessageReader::new(&mut source);

        assert_eq!(reader.next_message().await.unwrap().unwrap(), &big[..]);
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_stops_sequence_silently() {
        let encoded = encode_all(&[b"a", b"b", b"c"]);
        let mut source = ChunkSource::new(&encoded[..]);
        let cancel = CancellationToken::new();
        let mut reader = MessageReader::with_cancellation(&mut source, cancel.clone());

        assert_eq!(reader.next_message().await.unwrap().unwrap(), b"a");
        cancel.cancel();
        assert!(reader.next_message().await.unwrap().is_none());

        // A fresh pass resumes at the next message.
        let mut reader = MessageReader::new(&mut source);
        assert_eq!(reader.next_message().await.unwrap().unwrap(), b"b");
        assert_eq!(reader.next_message().await.unwrap().unwrap(), b"c");
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_drop_mid_pass_releases_scratch() {
        let pool = ScratchPool::new();
        let encoded = encode_all(&[b"a", b"b"]);
        let mut source = ChunkSource::new(&encoded[..]);
        {
            let mut reader =
                MessageReader::with_pool(&mut source, CancellationToken::new(), &pool);
            assert_eq!(reader.next_message().await.unwrap().unwrap(), b"a");
            // Early break: reader dropped with messages still pending.
        }
        let stats = pool.stats();
        assert_eq!(stats.rented, stats.returned);

        let mut reader = MessageReader::with_pool(&mut source, CancellationToken::new(), &pool);
        assert_eq!(reader.next_message().await.unwrap().unwrap(), b"b");
    }
}
