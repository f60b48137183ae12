//! # cobswire
//!
//! Streaming [Consistent Overhead Byte Stuffing][cobs] (COBS) framing codec.
//!
//! COBS removes every zero byte from a message so that a single `0x00` can
//! delimit messages unambiguously in a continuous byte stream. This crate
//! provides both directions as streaming components:
//!
//! - [`CobsEncoder`] accepts raw message bytes a chunk at a time, frames
//!   complete 254-byte blocks as they accumulate, and finalizes a message
//!   on [`commit_message`](CobsEncoder::commit_message) — the whole message
//!   never has to be in memory at once.
//! - [`MessageReader`] pulls chunks from an abstract [`FrameSource`] and
//!   lazily yields decoded messages, with silent cancellation and the
//!   ability to resume a stopped pass on the same source.
//!
//! [cobs]: https://en.wikipedia.org/wiki/Consistent_Overhead_Byte_Stuffing
//!
//! # Example
//!
//! ```
//! use cobswire::{BufferSink, ChunkSource, CobsEncoder, MessageReader};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cobswire::Result<()> {
//! let mut encoder = CobsEncoder::new(BufferSink::new());
//! encoder.write(b"hello");
//! encoder.commit_message();
//! encoder.write(&[0x00, 0x01, 0x02]);
//! encoder.commit_message();
//! let wire = encoder.into_sink().into_inner();
//!
//! let mut source = ChunkSource::new(&wire[..]);
//! let mut reader = MessageReader::new(&mut source);
//! assert_eq!(reader.next_message().await?, Some(&b"hello"[..]));
//! assert_eq!(reader.next_message().await?, Some(&[0x00, 0x01, 0x02][..]));
//! assert_eq!(reader.next_message().await?, None);
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Neither the encoder nor the reader supports concurrent use of one
//! instance from multiple threads; callers serialize access. The reader's
//! only suspension point is waiting for more bytes from its source.

pub mod error;
pub mod frame;
pub mod pool;
pub mod sink;
pub mod source;

mod decoder;
mod encoder;
mod staging;
mod writer;

pub use decoder::MessageReader;
pub use encoder::CobsEncoder;
pub use error::{CobswireError, Result};
pub use frame::{decode_frame, max_encoded_len, DELIMITER, MAX_BLOCK};
pub use pool::{PoolStats, ScratchPool};
pub use sink::{BufferSink, FrameSink};
pub use source::{CancelHandle, ChunkSource, FrameSource, ReadOutcome};
pub use staging::StagingBuffer;
pub use writer::CobsWriter;
