//! Async writer adapter over the encoder.
//!
//! Binds a [`CobsEncoder`] to any `tokio::io::AsyncWrite`: write message
//! bytes, commit, then `flush` to push the staged encoded frames down the
//! pipe. The codec core never performs I/O itself; this adapter is the thin
//! wrapper that does.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::encoder::CobsEncoder;
use crate::error::Result;
use crate::sink::BufferSink;

/// Writes COBS-framed messages to an async byte stream.
pub struct CobsWriter<W> {
    inner: W,
    encoder: CobsEncoder<BufferSink>,
}

impl<W: AsyncWrite + Unpin> CobsWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            encoder: CobsEncoder::new(BufferSink::new()),
        }
    }

    /// Append message bytes to the current message.
    pub fn write(&mut self, data: &[u8]) {
        self.encoder.write(data);
    }

    /// Mark the end of the current message.
    ///
    /// The encoded frame is staged in memory until [`flush`](Self::flush).
    pub fn commit_message(&mut self) {
        self.encoder.commit_message();
    }

    /// Write one whole message and commit it.
    pub fn send(&mut self, message: &[u8]) {
        self.write(message);
        self.commit_message();
    }

    /// Push all staged encoded bytes to the inner writer and flush it.
    pub async fn flush(&mut self) -> Result<()> {
        let staged = self.encoder.sink_mut().split();
        if !staged.is_empty() {
            self.inner.write_all(&staged).await?;
        }
        self.inner.flush().await?;
        Ok(())
    }

    /// Consume the adapter, returning the inner writer.
    ///
    /// Staged bytes that were never flushed are discarded.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_flush_writes_committed_frames() {
        let (tx, mut rx) = tokio::io::duplex(4096);
        let mut writer = CobsWriter::new(tx);

        writer.send(&[0x11, 0x22, 0x00, 0x33]);
        writer.flush().await.unwrap();
        drop(writer);

        let mut received = Vec::new();
        rx.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, vec![0x03, 0x11, 0x22, 0x02, 0x33, 0x00]);
    }

    #[tokio::test]
    async fn test_incremental_writes_one_frame() {
        let (tx, mut rx) = tokio::io::duplex(4096);
        let mut writer = CobsWriter::new(tx);

        writer.write(&[0x11]);
        writer.write(&[0x22, 0x33]);
        writer.write(&[0x44]);
        writer.commit_message();
        writer.flush().await.unwrap();
        drop(writer);

        let mut received = Vec::new();
        rx.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, vec![0x05, 0x11, 0x22, 0x33, 0x44, 0x00]);
    }

    #[tokio::test]
    async fn test_flush_without_commit_writes_nothing_for_short_message() {
        let (tx, mut rx) = tokio::io::duplex(4096);
        let mut writer = CobsWriter::new(tx);

        // Fewer than 254 bytes: nothing is framed until commit.
        writer.write(&[0xAA; 100]);
        writer.flush().await.unwrap();
        drop(writer);

        let mut received = Vec::new();
        rx.read_to_end(&mut received).await.unwrap();
        assert!(received.is_empty());
    }
}
