//! WAL replay
//!
//! ## Recovery Sequence
//!
//! 1. List segment files in sequence order
//! 2. Decode frames from each segment until the end or the first bad frame
//! 3. Truncate a segment at its first bad frame (torn write or corruption)
//! 4. Hand every decoded entry to the caller, in order
//!
//! After recovery the engine state corresponds to a prefix of the committed
//! history of each segment.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::encoding::decode_entry;
use crate::wal::{WalEntry, WalError};

// ============================================================================
// Replay Result
// ============================================================================

/// WAL replay statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Segment files read
    pub segments_replayed: usize,
    /// Entries handed to the caller
    pub entries_replayed: u64,
    /// Segments that ended in a bad frame
    pub torn_segments: usize,
    /// Bytes cut off while truncating bad tails
    pub truncated_bytes: u64,
    /// Total replay time (microseconds)
    pub elapsed_micros: u64,
}

impl ReplayStats {
    /// Get human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "WAL replay complete: {} entries from {} segments, {} torn ({} bytes truncated), {:.2}ms",
            self.entries_replayed,
            self.segments_replayed,
            self.torn_segments,
            self.truncated_bytes,
            self.elapsed_micros as f64 / 1000.0
        )
    }

    /// Check if replay had to discard data
    pub fn has_issues(&self) -> bool {
        self.torn_segments > 0
    }

    pub(crate) fn absorb(&mut self, segment: &SegmentReplay) {
        self.segments_replayed += 1;
        self.entries_replayed += segment.entries;
        if segment.truncated_bytes > 0 {
            self.torn_segments += 1;
            self.truncated_bytes += segment.truncated_bytes;
        }
    }
}

/// Outcome of replaying one segment
#[derive(Debug, Default, Clone)]
pub struct SegmentReplay {
    /// Entries decoded
    pub entries: u64,
    /// Length of the valid prefix
    pub valid_len: u64,
    /// Bytes removed from the tail
    pub truncated_bytes: u64,
    /// Largest entry time seen
    pub max_time: Option<i64>,
}

// ============================================================================
// Segment discovery
// ============================================================================

/// Segment files in `dir`, ordered by sequence number
///
/// Files that don't look like `<seq>.wal` are ignored.
pub fn list_segments(dir: &Path) -> Result<Vec<(u64, PathBuf)>, WalError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != "wal") {
            continue;
        }
        let seq = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u64>().ok());
        match seq {
            Some(seq) => segments.push((seq, path)),
            None => debug!(path = %path.display(), "Skipping unrecognised file in WAL dir"),
        }
    }
    segments.sort_by_key(|(seq, _)| *seq);
    Ok(segments)
}

/// Replay one segment, truncating it at the first bad frame
pub fn replay_segment<F>(path: &Path, on_entry: &mut F) -> Result<SegmentReplay, WalError>
where
    F: FnMut(WalEntry),
{
    let buf = fs::read(path)?;
    let mut result = SegmentReplay::default();
    let mut offset = 0usize;

    while offset < buf.len() {
        match decode_entry(&buf[offset..]) {
            Ok((entry, consumed)) => {
                if let Some(t) = entry.max_time() {
                    result.max_time = Some(result.max_time.map_or(t, |m| m.max(t)));
                }
                on_entry(entry);
                result.entries += 1;
                offset += consumed;
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    offset,
                    error = %e,
                    "Bad WAL frame, truncating segment"
                );
                let file = OpenOptions::new().write(true).open(path)?;
                file.set_len(offset as u64)?;
                file.sync_all()?;
                result.truncated_bytes = (buf.len() - offset) as u64;
                break;
            }
        }
    }

    result.valid_len = offset as u64;
    Ok(result)
}
