//! Error types for cobswire.

use thiserror::Error;

/// Main error type for all cobswire operations.
#[derive(Debug, Error)]
pub enum CobswireError {
    /// I/O error from the underlying source or writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed COBS frame: a truncated payload run, a zero header byte
    /// before the end of the frame, or a frame that never terminates.
    ///
    /// Fatal to the current message only; the reader stays usable for
    /// the frames that follow.
    #[error("Framing error: {0}")]
    Framing(String),
}

impl CobswireError {
    /// True if this is a framing error rather than an I/O failure.
    pub fn is_framing(&self) -> bool {
        matches!(self, CobswireError::Framing(_))
    }
}

/// Result type alias using CobswireError.
pub type Result<T> = std::result::Result<T, CobswireError>;
