//! Abstract chunked byte source consumed by the decoder.
//!
//! [`FrameSource`] hides the concrete transport behind a pull contract:
//! wait for bytes, inspect what is buffered, consume what was decoded,
//! or mark everything examined and wait for more. [`ChunkSource`] is the
//! implementation over any `tokio::io::AsyncRead`.
//!
//! Two independent cancellation channels exist, and both stop a pending
//! wait silently rather than failing it:
//!
//! - an external [`CancellationToken`] passed to `await_bytes`,
//! - the source-directed [`CancelHandle::cancel_pending_read`].

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Read buffer reserve size per wait.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Outcome of one wait on a source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOutcome {
    /// No more bytes will ever arrive after the currently buffered ones.
    pub is_eof: bool,
    /// The wait was canceled; buffered bytes remain untouched.
    pub is_canceled: bool,
}

/// Capability interface for a chunked, possibly-partial byte stream.
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    /// Wait until new bytes are buffered, end-of-data is reached, or the
    /// wait is canceled.
    ///
    /// Returns immediately when unexamined bytes are already buffered.
    /// Cancellation is reported through [`ReadOutcome::is_canceled`],
    /// never as an error.
    async fn await_bytes(&mut self, cancel: &CancellationToken) -> io::Result<ReadOutcome>;

    /// All currently buffered, unconsumed bytes.
    fn buffered(&self) -> &[u8];

    /// Drop the first `n` buffered bytes; they are never presented again.
    fn consume(&mut self, n: usize);

    /// Mark all buffered bytes as examined but not consumed.
    ///
    /// They stay buffered and are re-presented together with newly arrived
    /// bytes, but do not satisfy the next `await_bytes` on their own.
    fn mark_examined(&mut self);

    /// Handle for canceling a pending wait from outside.
    fn cancel_handle(&self) -> CancelHandle;
}

struct CancelState {
    notify: Notify,
    requested: AtomicBool,
}

/// Requests cancellation of a source's pending (or next) wait.
///
/// Cloneable and usable from other tasks. Each request cancels one wait;
/// a consumption pass started afterwards reads normally again.
#[derive(Clone)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    /// Resolve the pending or next `await_bytes` with `is_canceled = true`.
    ///
    /// Non-throwing by contract. Buffered bytes and the source itself are
    /// unaffected.
    pub fn cancel_pending_read(&self) {
        self.state.requested.store(true, Ordering::Release);
        self.state.notify.notify_one();
    }
}

/// [`FrameSource`] over any `AsyncRead`, accumulating chunks in a
/// `BytesMut` until the decoder consumes them.
pub struct ChunkSource<R> {
    reader: R,
    buf: BytesMut,
    /// Bytes already inspected without finding a delimiter.
    examined: usize,
    eof: bool,
    cancel: Arc<CancelState>,
}

impl<R> ChunkSource<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            examined: 0,
            eof: false,
            cancel: Arc::new(CancelState {
                notify: Notify::new(),
                requested: AtomicBool::new(false),
            }),
        }
    }

    /// Consume the source, returning the reader. Buffered bytes are lost.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncRead + Unpin> FrameSource for ChunkSource<R> {
    async fn await_bytes(&mut self, cancel: &CancellationToken) -> io::Result<ReadOutcome> {
        // Both cancellation channels are checked before suspending, so a
        // request made between waits is not missed.
        if cancel.is_cancelled() || self.cancel.requested.swap(false, Ordering::AcqRel) {
            return Ok(ReadOutcome {
                is_eof: self.eof,
                is_canceled: true,
            });
        }

        // Unexamined bytes (or a known end of data) satisfy the wait
        // without touching the reader.
        if self.buf.len() > self.examined || self.eof {
            return Ok(ReadOutcome {
                is_eof: self.eof,
                is_canceled: false,
            });
        }

        self.buf.reserve(READ_CHUNK_SIZE);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Ok(ReadOutcome {
                        is_eof: self.eof,
                        is_canceled: true,
                    });
                }
                _ = self.cancel.notify.notified() => {
                    // A notify permit can outlive the request that stored
                    // it (the flag was consumed before a wait started).
                    // Only a live request cancels.
                    if self.cancel.requested.swap(false, Ordering::AcqRel) {
                        return Ok(ReadOutcome {
                            is_eof: self.eof,
                            is_canceled: true,
                        });
                    }
                }
                read = self.reader.read_buf(&mut self.buf) => {
                    if read? == 0 {
                        self.eof = true;
                    }
                    return Ok(ReadOutcome {
                        is_eof: self.eof,
                        is_canceled: false,
                    });
                }
            }
        }
    }

    fn buffered(&self) -> &[u8] {
        &self.buf
    }

    fn consume(&mut self, n: usize) {
        let _ = self.buf.split_to(n);
        // Consumption ends at a delimiter; what follows is unexamined.
        self.examined = 0;
    }

    fn mark_examined(&mut self) {
        self.examined = self.buf.len();
    }

    fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            state: self.cancel.clone(),
        }
    }
}
