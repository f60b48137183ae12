//! COBS frame constants and the frame decode routine.
//!
//! Wire format of one encoded frame:
//! ```text
//! ┌────────┬─────────────────┬────────┬──────────────┬──────┐
//! │ header │ payload (h-1 B) │ header │ payload ...  │ 0x00 │
//! └────────┴─────────────────┴────────┴──────────────┴──────┘
//! ```
//!
//! Every header byte lies in `[1, 255]`. A header value `h` means the next
//! `h - 1` bytes are raw non-zero payload; if `h < 255` a zero byte is
//! restored after the block when decoding, unless the block is the frame's
//! last. The single `0x00` terminator is the only zero in the frame, which
//! is what makes it usable as a message delimiter in a continuous stream.

use crate::error::{CobswireError, Result};

/// The message delimiter. Never appears inside an encoded frame.
pub const DELIMITER: u8 = 0x00;

/// Maximum number of raw bytes covered by one header byte.
pub const MAX_BLOCK: usize = 254;

/// Worst-case encoded size for a message of `len` bytes.
///
/// One overhead byte per started 254-byte block, plus the leading header
/// and the trailing delimiter.
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / MAX_BLOCK + 2
}

/// Decode one complete COBS frame (terminator included) into `scratch`.
///
/// Returns the decoded message length. The caller must provide
/// `scratch.len() >= frame.len()`; decoded output is always strictly
/// shorter than the frame.
///
/// # Errors
///
/// Returns [`CobswireError::Framing`] if a header byte demands more payload
/// bytes than remain, if a zero header appears before the frame's true end,
/// or if the frame has no terminator at all.
pub fn decode_frame(scratch: &mut [u8], frame: &[u8]) -> Result<usize> {
    debug_assert!(scratch.len() >= frame.len());

    let mut position = 0;
    let mut insert_zero = false;
    let mut rest = frame;

    loop {
        let (&header, tail) = rest.split_first().ok_or_else(|| {
            CobswireError::Framing("frame ended without a terminator".to_string())
        })?;
        rest = tail;

        if header == DELIMITER {
            if !rest.is_empty() {
                return Err(CobswireError::Framing(format!(
                    "zero header with {} bytes left before the end of the frame",
                    rest.len()
                )));
            }
            return Ok(position);
        }

        if insert_zero {
            scratch[position] = 0;
            position += 1;
        }

        let run = header as usize - 1;
        if run > 0 {
            if rest.len() < run {
                return Err(CobswireError::Framing(format!(
                    "header {} demands {} payload bytes but only {} remain",
                    header,
                    run,
                    rest.len()
                )));
            }
            scratch[position..position + run].copy_from_slice(&rest[..run]);
            rest = &rest[run..];
            position += run;
        }

        // A full 255 block carries no implicit zero.
        insert_zero = header != 0xFF;
    }
}
