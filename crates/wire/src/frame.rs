//! Length-prefixed payload frames
//!
//! Layout: a sequence of `[len: u32 LE][payload: len bytes]` records. An
//! empty buffer holds zero frames. A truncated trailing record is reported
//! as a decode error rather than silently dropped.

use byteorder::{ByteOrder, LittleEndian};
use spanstore_core::CodecError;

const LEN_SIZE: usize = 4;

/// Append one frame to `buf`
pub fn append_frame(buf: &mut Vec<u8>, payload: &[u8]) -> Result<(), CodecError> {
    let len = u32::try_from(payload.len())
        .map_err(|_| CodecError::Encode(format!("frame too large: {} bytes", payload.len())))?;
    let mut header = [0u8; LEN_SIZE];
    LittleEndian::write_u32(&mut header, len);
    buf.reserve(LEN_SIZE + payload.len());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(payload);
    Ok(())
}

/// Split a buffer into its frames
pub fn split_frames(buf: &[u8]) -> Result<Vec<&[u8]>, CodecError> {
    let mut frames = Vec::new();
    let mut offset = 0;
    while offset < buf.len() {
        if buf.len() - offset < LEN_SIZE {
            return Err(CodecError::Decode(format!(
                "truncated frame header at offset {}",
                offset
            )));
        }
        let len = LittleEndian::read_u32(&buf[offset..offset + LEN_SIZE]) as usize;
        let start = offset + LEN_SIZE;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= buf.len())
            .ok_or_else(|| {
                CodecError::Decode(format!(
                    "frame at offset {} needs {} bytes, have {}",
                    offset,
                    len,
                    buf.len() - start
                ))
            })?;
        frames.push(&buf[start..end]);
        offset = end;
    }
    Ok(frames)
}
