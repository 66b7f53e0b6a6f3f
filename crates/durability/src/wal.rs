//! Segmented write-ahead log
//!
//! The WAL is a directory of numbered segment files (`00000000.wal`,
//! `00000001.wal`, ...). Entries are appended to the active segment; when it
//! would grow past `segment_size` a new segment is started. Each segment
//! remembers the largest time coordinate written to it so whole segments can
//! be dropped once everything in them falls behind the retention cutoff.
//!
//! Entry types:
//! - `Samples`: one committed append batch of the time-series engine
//! - `BlobPut`: one key/value write of the blob store

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use spanstore_core::{Labels, StorageError};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::encoding::{encode_entry, EncodingError};
use crate::mode::DurabilityMode;
use crate::recovery::{list_segments, replay_segment, ReplayStats};

/// Default segment size (128 MiB)
pub const DEFAULT_SEGMENT_SIZE: u64 = 128 * 1024 * 1024;

// ============================================================================
// Entries
// ============================================================================

/// One sample as recorded in the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Series labels
    pub labels: Labels,
    /// Sample timestamp
    pub timestamp: i64,
    /// Opaque sample payload
    pub payload: Vec<u8>,
}

/// WAL entry types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalEntry {
    /// A committed batch of samples
    ///
    /// A batch is written as one entry, so replay never observes half of a
    /// commit.
    Samples {
        /// Samples in append order
        records: Vec<SampleRecord>,
    },

    /// A blob write
    BlobPut {
        /// Key
        key: Vec<u8>,
        /// Value
        value: Vec<u8>,
        /// Expiry, milliseconds since the Unix epoch
        expires_at_ms: i64,
    },
}

impl WalEntry {
    /// Largest time coordinate carried by the entry
    ///
    /// Sample timestamps for `Samples`, the expiry for `BlobPut`.
    pub fn max_time(&self) -> Option<i64> {
        match self {
            WalEntry::Samples { records } => records.iter().map(|r| r.timestamp).max(),
            WalEntry::BlobPut { expires_at_ms, .. } => Some(*expires_at_ms),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// WAL errors
#[derive(Debug, Error)]
pub enum WalError {
    /// I/O error
    #[error("WAL I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be encoded or decoded
    #[error("WAL encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

impl From<WalError> for StorageError {
    fn from(err: WalError) -> Self {
        match err {
            WalError::Io(e) => StorageError::Io(e),
            WalError::Encoding(e) => StorageError::Corruption(e.to_string()),
        }
    }
}

// ============================================================================
// Segments
// ============================================================================

/// Metadata of one segment file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMeta {
    /// Sequence number
    pub seq: u64,
    /// File path
    pub path: PathBuf,
    /// Largest time coordinate written to the segment
    pub max_time: Option<i64>,
}

impl SegmentMeta {
    fn merge_time(&mut self, time: Option<i64>) {
        self.max_time = match (self.max_time, time) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

/// Path of segment `seq` in `dir`
pub fn segment_path(dir: &Path, seq: u64) -> PathBuf {
    dir.join(format!("{:08}.wal", seq))
}

struct ActiveSegment {
    meta: SegmentMeta,
    writer: BufWriter<File>,
    written: u64,
}

impl ActiveSegment {
    fn create(dir: &Path, seq: u64) -> Result<Self, WalError> {
        let path = segment_path(dir, seq);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(ActiveSegment {
            meta: SegmentMeta {
                seq,
                path,
                max_time: None,
            },
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    fn sync(&mut self) -> Result<(), WalError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }
}

struct WalInner {
    active: ActiveSegment,
    sealed: Vec<SegmentMeta>,
    pending_sync: usize,
    last_sync: Instant,
}

// ============================================================================
// WAL
// ============================================================================

/// WAL configuration
#[derive(Debug, Clone, Copy)]
pub struct WalOptions {
    /// Rotate once the active segment would exceed this many bytes
    pub segment_size: u64,
    /// fsync policy
    pub mode: DurabilityMode,
}

impl Default for WalOptions {
    fn default() -> Self {
        WalOptions {
            segment_size: DEFAULT_SEGMENT_SIZE,
            mode: DurabilityMode::default(),
        }
    }
}

/// Segmented write-ahead log
///
/// Thread-safe; appends are serialized by an internal lock.
pub struct Wal {
    dir: PathBuf,
    options: WalOptions,
    inner: Mutex<WalInner>,
}

impl std::fmt::Debug for Wal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wal")
            .field("dir", &self.dir)
            .field("options", &self.options)
            .finish()
    }
}

impl Wal {
    /// Open the WAL in `dir`, replaying every existing entry into `on_entry`
    ///
    /// Segments are replayed in sequence order. A segment that ends in a torn
    /// or corrupt frame is truncated at that frame. Appends after open go to a
    /// fresh segment.
    pub fn open<F>(dir: &Path, options: WalOptions, mut on_entry: F) -> Result<(Self, ReplayStats), WalError>
    where
        F: FnMut(WalEntry),
    {
        let start = Instant::now();
        fs::create_dir_all(dir)?;

        let mut stats = ReplayStats::default();
        let mut sealed = Vec::new();
        let mut next_seq = 0;

        for (seq, path) in list_segments(dir)? {
            next_seq = seq + 1;
            let outcome = replay_segment(&path, &mut on_entry)?;
            stats.absorb(&outcome);

            if outcome.valid_len == 0 {
                fs::remove_file(&path)?;
                continue;
            }
            sealed.push(SegmentMeta {
                seq,
                path,
                max_time: outcome.max_time,
            });
        }

        let active = ActiveSegment::create(dir, next_seq)?;
        stats.elapsed_micros = start.elapsed().as_micros() as u64;
        if stats.segments_replayed > 0 {
            info!(dir = %dir.display(), "{}", stats.summary());
        }

        Ok((
            Wal {
                dir: dir.to_path_buf(),
                options,
                inner: Mutex::new(WalInner {
                    active,
                    sealed,
                    pending_sync: 0,
                    last_sync: Instant::now(),
                }),
            },
            stats,
        ))
    }

    /// Directory holding the segments
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one entry, syncing per the durability mode
    pub fn append(&self, entry: &WalEntry) -> Result<(), WalError> {
        let frame = encode_entry(entry)?;
        let mut inner = self.inner.lock();

        if inner.active.written > 0
            && inner.active.written + frame.len() as u64 > self.options.segment_size
        {
            self.rotate(&mut inner)?;
        }

        inner.active.writer.write_all(&frame)?;
        inner.active.writer.flush()?;
        inner.active.written += frame.len() as u64;
        inner.active.meta.merge_time(entry.max_time());
        inner.pending_sync += 1;

        if self
            .options
            .mode
            .should_sync(inner.pending_sync, inner.last_sync.elapsed())
        {
            inner.active.sync()?;
            inner.pending_sync = 0;
            inner.last_sync = Instant::now();
        }
        Ok(())
    }

    /// Flush and fsync the active segment
    pub fn sync(&self) -> Result<(), WalError> {
        let mut inner = self.inner.lock();
        inner.active.sync()?;
        inner.pending_sync = 0;
        inner.last_sync = Instant::now();
        Ok(())
    }

    /// Delete the oldest sealed segments whose entries all lie before `cutoff`
    ///
    /// Only a leading run of segments is removed, so a newer entry is never
    /// dropped while an older one for the same key survives. The active
    /// segment is never removed. Returns the number of deleted segments.
    pub fn truncate_before(&self, cutoff: i64) -> Result<usize, WalError> {
        let mut inner = self.inner.lock();
        let mut removed = 0;
        while let Some(meta) = inner.sealed.first() {
            if meta.max_time.map_or(false, |t| t >= cutoff) {
                break;
            }
            fs::remove_file(&meta.path)?;
            inner.sealed.remove(0);
            removed += 1;
        }
        if removed > 0 {
            debug!(dir = %self.dir.display(), removed, cutoff, "Truncated WAL segments");
        }
        Ok(removed)
    }

    /// Number of segment files, the active one included
    pub fn segment_count(&self) -> usize {
        self.inner.lock().sealed.len() + 1
    }

    /// Sealed segment metadata, oldest first
    pub fn sealed_segments(&self) -> Vec<SegmentMeta> {
        self.inner.lock().sealed.clone()
    }

    /// Flush everything to disk
    pub fn close(&self) -> Result<(), WalError> {
        self.sync()
    }

    fn rotate(&self, inner: &mut WalInner) -> Result<(), WalError> {
        inner.active.sync()?;
        let next = ActiveSegment::create(&self.dir, inner.active.meta.seq + 1)?;
        let old = std::mem::replace(&mut inner.active, next);
        debug!(seq = old.meta.seq, bytes = old.written, "Sealed WAL segment");
        inner.sealed.push(old.meta);
        inner.pending_sync = 0;
        inner.last_sync = Instant::now();
        Ok(())
    }
}
