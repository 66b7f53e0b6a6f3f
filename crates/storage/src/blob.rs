//! Key-value blob store with per-entry TTL
//!
//! # Design
//!
//! - DashMap: sharded map, reads never block other shards
//! - Entries carry an absolute expiry in milliseconds; expired entries are
//!   invisible to `get` and removed by [`MemBlobStore::purge_expired`]
//! - Optional WAL: every put is logged before it becomes visible and the
//!   log is replayed on open (last write wins)

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use spanstore_core::StorageError;
use spanstore_durability::{DurabilityMode, Wal, WalEntry, WalOptions, DEFAULT_SEGMENT_SIZE};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::lock::DirLock;
use crate::memdb::WAL_DIR;

/// Key-value store consumed by the blob payload backend
pub trait BlobStore: Send + Sync {
    /// Store `value` under `key`; a zero `ttl` never expires
    fn put(&self, key: &[u8], value: &[u8], ttl: Duration) -> Result<(), StorageError>;

    /// Value under `key`, `None` when absent or expired
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Flush and release the store; later calls fail with `Closed`
    fn close(&self) -> Result<(), StorageError>;
}

/// Blob store options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobOptions {
    /// WAL segment size in bytes
    pub wal_segment_size: u64,
    /// Skip the directory lockfile
    pub no_lockfile: bool,
    /// WAL fsync policy; `None` disables the WAL
    pub durability: DurabilityMode,
}

impl Default for BlobOptions {
    fn default() -> Self {
        BlobOptions {
            wal_segment_size: DEFAULT_SEGMENT_SIZE,
            no_lockfile: true,
            durability: DurabilityMode::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct BlobEntry {
    value: Vec<u8>,
    /// `i64::MAX` when the entry never expires
    expires_at_ms: i64,
}

impl BlobEntry {
    fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms <= now_ms
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn expiry(ttl: Duration, now_ms: i64) -> i64 {
    if ttl.is_zero() {
        return i64::MAX;
    }
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1);
    now_ms.saturating_add(ttl_ms)
}

/// In-memory blob store with optional WAL
pub struct MemBlobStore {
    dir: Option<PathBuf>,
    entries: DashMap<Vec<u8>, BlobEntry>,
    wal: Option<Wal>,
    lock: Mutex<Option<DirLock>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for MemBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemBlobStore")
            .field("dir", &self.dir)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl MemBlobStore {
    /// Open (or create) a store in `dir`, replaying its WAL
    pub fn open(dir: impl AsRef<Path>, options: BlobOptions) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let lock = if options.no_lockfile {
            None
        } else {
            Some(DirLock::acquire(dir)?)
        };

        let entries = DashMap::new();
        let wal = if options.durability.requires_wal() {
            let wal_options = WalOptions {
                segment_size: options.wal_segment_size,
                mode: options.durability,
            };
            let (wal, stats) = Wal::open(&dir.join(WAL_DIR), wal_options, |entry| {
                if let WalEntry::BlobPut {
                    key,
                    value,
                    expires_at_ms,
                } = entry
                {
                    entries.insert(
                        key,
                        BlobEntry {
                            value,
                            expires_at_ms,
                        },
                    );
                }
            })?;
            if stats.has_issues() {
                warn!(dir = %dir.display(), "{}", stats.summary());
            }
            Some(wal)
        } else {
            None
        };

        let store = MemBlobStore {
            dir: Some(dir.to_path_buf()),
            entries,
            wal,
            lock: Mutex::new(lock),
            closed: AtomicBool::new(false),
        };
        store.purge_expired()?;
        info!(dir = %dir.display(), entries = store.len(), "Opened blob store");
        Ok(store)
    }

    /// Store with no directory, no WAL and no lockfile
    pub fn ephemeral() -> Self {
        MemBlobStore {
            dir: None,
            entries: DashMap::new(),
            wal: None,
            lock: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove expired entries and WAL segments that only hold expired puts
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> Result<usize, StorageError> {
        self.ensure_open()?;
        let now = now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if let Some(wal) = &self.wal {
            wal.truncate_before(now)?;
        }
        if removed > 0 {
            debug!(removed, "Purged expired blobs");
        }
        Ok(removed)
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::Acquire) {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }
}

impl BlobStore for MemBlobStore {
    fn put(&self, key: &[u8], value: &[u8], ttl: Duration) -> Result<(), StorageError> {
        self.ensure_open()?;
        let expires_at_ms = expiry(ttl, now_ms());
        if let Some(wal) = &self.wal {
            wal.append(&WalEntry::BlobPut {
                key: key.to_vec(),
                value: value.to_vec(),
                expires_at_ms,
            })?;
        }
        self.entries.insert(
            key.to_vec(),
            BlobEntry {
                value: value.to_vec(),
                expires_at_ms,
            },
        );
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.ensure_open()?;
        let now = now_ms();
        Ok(self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    fn close(&self) -> Result<(), StorageError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(wal) = &self.wal {
            wal.close()?;
        }
        drop(self.lock.lock().take());
        debug!(dir = ?self.dir, "Closed blob store");
        Ok(())
    }
}
