//! WAL entry encoding with CRC32 checksums
//!
//! Frame layout:
//!
//! ```text
//! +----------------+----------------+-------------------------+
//! | len: u32 (LE)  | crc: u32 (LE)  | payload: len bytes      |
//! +----------------+----------------+-------------------------+
//! ```
//!
//! `crc` covers the payload only. The payload is a MessagePack-encoded
//! [`WalEntry`].

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::wal::WalEntry;

/// Size of the frame header in bytes
pub const HEADER_SIZE: usize = 8;

/// Frame decoding failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// Buffer ends inside a frame
    #[error("incomplete frame: need {needed} bytes, have {available}")]
    Incomplete {
        /// Bytes the frame needs
        needed: usize,
        /// Bytes available
        available: usize,
    },

    /// Stored checksum does not match the payload
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum read from the header
        stored: u32,
        /// Checksum of the payload
        computed: u32,
    },

    /// Payload failed to serialize
    #[error("encode failed: {0}")]
    Encode(String),

    /// Payload failed to deserialize
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Encode one entry as a checksummed frame
pub fn encode_entry(entry: &WalEntry) -> Result<Vec<u8>, EncodingError> {
    let payload = rmp_serde::to_vec_named(entry).map_err(|e| EncodingError::Encode(e.to_string()))?;
    let len = u32::try_from(payload.len())
        .map_err(|_| EncodingError::Encode(format!("entry too large: {} bytes", payload.len())))?;

    let mut buf = vec![0u8; HEADER_SIZE + payload.len()];
    LittleEndian::write_u32(&mut buf[0..4], len);
    LittleEndian::write_u32(&mut buf[4..8], crc32fast::hash(&payload));
    buf[HEADER_SIZE..].copy_from_slice(&payload);
    Ok(buf)
}

/// Decode the frame at the start of `buf`
///
/// Returns the entry and the number of bytes consumed.
pub fn decode_entry(buf: &[u8]) -> Result<(WalEntry, usize), EncodingError> {
    if buf.len() < HEADER_SIZE {
        return Err(EncodingError::Incomplete {
            needed: HEADER_SIZE,
            available: buf.len(),
        });
    }

    let len = LittleEndian::read_u32(&buf[0..4]) as usize;
    let stored = LittleEndian::read_u32(&buf[4..8]);
    let total = HEADER_SIZE + len;
    if buf.len() < total {
        return Err(EncodingError::Incomplete {
            needed: total,
            available: buf.len(),
        });
    }

    let payload = &buf[HEADER_SIZE..total];
    let computed = crc32fast::hash(payload);
    if computed != stored {
        return Err(EncodingError::ChecksumMismatch { stored, computed });
    }

    let entry = rmp_serde::from_slice(payload).map_err(|e| EncodingError::Decode(e.to_string()))?;
    Ok((entry, total))
}
