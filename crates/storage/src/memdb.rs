//! Reference time-series engine
//!
//! An in-memory [`Head`] behind a `RwLock`, optionally backed by a WAL so a
//! storage directory survives restart.
//!
//! # Thread Safety
//!
//! - Queriers take the read lock per call; any number may be open at once
//! - Appenders stage samples privately and take the write lock only to
//!   create series and at commit
//! - A commit writes one WAL entry before touching the head, so a crash
//!   never exposes half a commit
//!
//! # Retention
//!
//! After each commit the cutoff `max_time - retention` (aligned down to the
//! smallest block range) is recomputed. Samples behind it are dropped, fully
//! expired WAL segments are deleted and later appends behind it fail with
//! `OutOfBounds`.

use parking_lot::{Mutex, RwLock};
use spanstore_core::{Labels, Matcher, StorageError};
use spanstore_durability::{SampleRecord, Wal, WalEntry, WalOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::head::Head;
use crate::lock::DirLock;
use crate::options::TsdbOptions;
use crate::tsdb::{Appender, Querier, SeriesRef, SeriesSet, TimeSeriesDb};

/// WAL directory inside the storage directory
pub const WAL_DIR: &str = "wal";

struct State {
    head: Head,
    /// Oldest accepted timestamp
    min_valid: i64,
}

/// In-memory time-series engine with optional WAL
pub struct MemTsdb {
    dir: Option<PathBuf>,
    options: TsdbOptions,
    state: RwLock<State>,
    wal: Option<Wal>,
    lock: Mutex<Option<DirLock>>,
    closed: AtomicBool,
    open_queriers: AtomicUsize,
}

impl std::fmt::Debug for MemTsdb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemTsdb")
            .field("dir", &self.dir)
            .field("options", &self.options)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl MemTsdb {
    /// Open (or create) an engine in `dir`
    ///
    /// Replays the WAL when the durability mode keeps one.
    pub fn open(dir: impl AsRef<Path>, options: TsdbOptions) -> Result<Self, StorageError> {
        options.validate()?;
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let lock = if options.no_lockfile {
            None
        } else {
            Some(DirLock::acquire(dir)?)
        };

        let mut head = Head::new();
        let wal = if options.durability.requires_wal() {
            let wal_options = WalOptions {
                segment_size: options.wal_segment_size,
                mode: options.durability,
            };
            let (wal, stats) = Wal::open(&dir.join(WAL_DIR), wal_options, |entry| {
                if let WalEntry::Samples { records } = entry {
                    for r in records {
                        head.append(&r.labels, r.timestamp, Arc::from(r.payload));
                    }
                }
            })?;
            if stats.has_issues() {
                warn!(dir = %dir.display(), "{}", stats.summary());
            }
            Some(wal)
        } else {
            None
        };

        let min_valid = match head.max_time() {
            Some(max_time) => {
                let cutoff = options.retention_cutoff(max_time);
                let removed = head.truncate_before(cutoff);
                if removed > 0 {
                    debug!(removed, cutoff, "Dropped expired samples after replay");
                }
                if let Some(wal) = &wal {
                    wal.truncate_before(cutoff)?;
                }
                cutoff
            }
            None => i64::MIN,
        };

        info!(
            dir = %dir.display(),
            series = head.num_series(),
            samples = head.num_samples(),
            durability = options.durability.as_str(),
            "Opened time-series engine"
        );

        Ok(MemTsdb {
            dir: Some(dir.to_path_buf()),
            options,
            state: RwLock::new(State { head, min_valid }),
            wal,
            lock: Mutex::new(lock),
            closed: AtomicBool::new(false),
            open_queriers: AtomicUsize::new(0),
        })
    }

    /// Engine with no directory, no WAL and no lockfile
    pub fn ephemeral(options: TsdbOptions) -> Result<Self, StorageError> {
        options.validate()?;
        Ok(MemTsdb {
            dir: None,
            options,
            state: RwLock::new(State {
                head: Head::new(),
                min_valid: i64::MIN,
            }),
            wal: None,
            lock: Mutex::new(None),
            closed: AtomicBool::new(false),
            open_queriers: AtomicUsize::new(0),
        })
    }

    /// Storage directory, `None` when ephemeral
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Engine options
    pub fn options(&self) -> &TsdbOptions {
        &self.options
    }

    /// Queriers currently alive
    pub fn open_queriers(&self) -> usize {
        self.open_queriers.load(Ordering::Acquire)
    }

    /// Oldest timestamp an append may carry
    pub fn min_valid_time(&self) -> i64 {
        self.state.read().min_valid
    }

    /// Number of retained series
    pub fn num_series(&self) -> usize {
        self.state.read().head.num_series()
    }

    /// Number of retained samples
    pub fn num_samples(&self) -> usize {
        self.state.read().head.num_samples()
    }

    /// Whether [`TimeSeriesDb::close`] was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.is_closed() {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }

    fn commit_records(&self, records: Vec<SampleRecord>) -> Result<(), StorageError> {
        self.ensure_open()?;
        let entry = WalEntry::Samples { records };
        if let Some(wal) = &self.wal {
            wal.append(&entry)?;
        }
        let WalEntry::Samples { records } = entry else {
            return Ok(());
        };

        let mut state = self.state.write();
        for r in records {
            state.head.append(&r.labels, r.timestamp, Arc::from(r.payload));
        }

        let Some(max_time) = state.head.max_time() else {
            return Ok(());
        };
        let cutoff = self.options.retention_cutoff(max_time);
        if cutoff <= state.min_valid {
            return Ok(());
        }
        state.min_valid = cutoff;
        let removed = state.head.truncate_before(cutoff);
        drop(state);

        debug!(cutoff, removed, "Advanced retention cutoff");
        if let Some(wal) = &self.wal {
            if let Err(e) = wal.truncate_before(cutoff) {
                warn!(cutoff, error = %e, "Failed to truncate WAL");
            }
        }
        Ok(())
    }
}

impl TimeSeriesDb for MemTsdb {
    fn querier(&self, mint: i64, maxt: i64) -> Result<Box<dyn Querier + '_>, StorageError> {
        self.ensure_open()?;
        self.open_queriers.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(MemQuerier { db: self, mint, maxt }))
    }

    fn appender(&self) -> Result<Box<dyn Appender + '_>, StorageError> {
        self.ensure_open()?;
        Ok(Box::new(MemAppender {
            db: self,
            pending: Vec::new(),
            created: Vec::new(),
        }))
    }

    fn close(&self) -> Result<(), StorageError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(wal) = &self.wal {
            wal.close()?;
        }
        drop(self.lock.lock().take());
        debug!(dir = ?self.dir, "Closed time-series engine");
        Ok(())
    }
}

// ============================================================================
// Querier
// ============================================================================

struct MemQuerier<'a> {
    db: &'a MemTsdb,
    mint: i64,
    maxt: i64,
}

impl Querier for MemQuerier<'_> {
    fn select(&self, matchers: &[Matcher]) -> Result<SeriesSet<'_>, StorageError> {
        self.db.ensure_open()?;
        let series = self.db.state.read().head.select(matchers, self.mint, self.maxt);
        Ok(SeriesSet::from_vec(series))
    }

    fn label_values(&self, name: &str) -> Result<Vec<String>, StorageError> {
        self.db.ensure_open()?;
        Ok(self.db.state.read().head.label_values(name, self.mint, self.maxt))
    }
}

impl Drop for MemQuerier<'_> {
    fn drop(&mut self) {
        self.db.open_queriers.fetch_sub(1, Ordering::AcqRel);
    }
}

// ============================================================================
// Appender
// ============================================================================

struct MemAppender<'a> {
    db: &'a MemTsdb,
    pending: Vec<SampleRecord>,
    /// Series created by `add`; dropped again unless a commit fills them
    created: Vec<SeriesRef>,
}

impl Appender for MemAppender<'_> {
    fn add(
        &mut self,
        labels: &Labels,
        timestamp: i64,
        payload: &[u8],
    ) -> Result<SeriesRef, StorageError> {
        self.db.ensure_open()?;
        if labels.is_empty() {
            return Err(StorageError::InvalidLabels("empty label set".into()));
        }
        if labels.iter().any(|l| l.name.is_empty()) {
            return Err(StorageError::InvalidLabels(format!("empty label name in {}", labels)));
        }

        let existing = {
            let state = self.db.state.read();
            if timestamp < state.min_valid {
                return Err(StorageError::OutOfBounds {
                    timestamp,
                    min_valid: state.min_valid,
                });
            }
            state.head.lookup(labels)
        };
        let series_ref = match existing {
            Some(r) => r,
            None => {
                let mut state = self.db.state.write();
                let known = state.head.lookup(labels);
                let r = state.head.get_or_create(labels);
                if known.is_none() {
                    self.created.push(r);
                }
                r
            }
        };

        self.pending.push(SampleRecord {
            labels: labels.clone(),
            timestamp,
            payload: payload.to_vec(),
        });
        Ok(series_ref)
    }

    fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(());
        }
        self.db.commit_records(pending)?;
        self.created.clear();
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        if !self.pending.is_empty() {
            debug!(samples = self.pending.len(), "Rolled back appender");
        }
    }
}

impl Drop for MemAppender<'_> {
    fn drop(&mut self) {
        if self.created.is_empty() {
            return;
        }
        let mut state = self.db.state.write();
        for r in self.created.drain(..) {
            state.head.remove_if_empty(r);
        }
    }
}
