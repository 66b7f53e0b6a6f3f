//! Engine database: one time-series engine, one payload store, one codec
//!
//! # Layout
//!
//! ```text
//! <storage_path>/
//!   tsdb/   time-series engine (WAL, lockfile)
//!   blob/   blob store, only with the blob payload backend
//! ```

use spanstore_core::{Error, Operation, Result, StorageError};
use spanstore_durability::DurabilityMode;
use spanstore_storage::{BlobStore, MemBlobStore, MemTsdb, TimeSeriesDb, TsdbOptions};
use spanstore_wire::{MsgPackCodec, SpanCodec};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::{EngineConfig, PayloadBackend};
use crate::observer::{NoopObserver, StoreObserver};
use crate::payload::{BlobPayloads, SeriesPayloads, TracePayloadStore};

/// Time-series engine directory below the storage root
pub const TSDB_DIR: &str = "tsdb";

/// Blob store directory below the storage root
pub const BLOB_DIR: &str = "blob";

/// Span index over a time-series engine
///
/// All methods take `&self`; share it behind an `Arc` across threads.
/// Writes and reads live in the `writer` and `reader` modules.
pub struct Database {
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) config: EngineConfig,
    pub(crate) tsdb: Arc<dyn TimeSeriesDb>,
    pub(crate) payloads: Box<dyn TracePayloadStore>,
    pub(crate) codec: Arc<dyn SpanCodec>,
    pub(crate) observer: Arc<dyn StoreObserver>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("data_dir", &self.data_dir)
            .field("payload_backend", &self.payloads.backend())
            .field("codec", &self.codec.name())
            .finish()
    }
}

impl Database {
    /// Open with default settings at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        DatabaseBuilder::new().path(path).open()
    }

    /// Database with no disk I/O at all
    pub fn ephemeral() -> Result<Self> {
        DatabaseBuilder::new().ephemeral()
    }

    /// Builder
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Storage root, `None` when ephemeral
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Whether created with [`Database::ephemeral`]
    pub fn is_ephemeral(&self) -> bool {
        self.data_dir.is_none()
    }

    /// Effective configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Configured payload backend
    pub fn payload_backend(&self) -> PayloadBackend {
        self.payloads.backend()
    }

    /// Close the payload store and the time-series engine
    ///
    /// Both are closed even if the first fails; the first error is returned.
    pub fn shutdown(&self) -> Result<()> {
        let payloads = self.payloads.close();
        let tsdb = self
            .tsdb
            .close()
            .map_err(|e| Error::storage(Operation::Close, e));
        if let Err(e) = payloads.as_ref().and(tsdb.as_ref()) {
            self.observer.operation_failed(Operation::Close, e);
        }
        payloads.and(tsdb)
    }

    /// Report the outcome of an operation to the observer
    pub(crate) fn observe<T>(
        &self,
        operation: Operation,
        start: Instant,
        result: Result<T>,
        count: impl FnOnce(&T) -> usize,
    ) -> Result<T> {
        match &result {
            Ok(value) => self
                .observer
                .query_completed(operation, count(value), start.elapsed()),
            Err(e) => self.observer.operation_failed(operation, e),
        }
        result
    }
}

/// Builder for [`Database`]
///
/// # Example
///
/// ```ignore
/// let db = Database::builder()
///     .path("./spans")
///     .retention(Duration::from_secs(3600))
///     .payload_backend(PayloadBackend::Blob)
///     .strict()
///     .open()?;
/// ```
pub struct DatabaseBuilder {
    path: Option<PathBuf>,
    config: EngineConfig,
    tsdb: Option<Arc<dyn TimeSeriesDb>>,
    blobs: Option<Arc<dyn BlobStore>>,
    codec: Arc<dyn SpanCodec>,
    observer: Arc<dyn StoreObserver>,
}

impl DatabaseBuilder {
    /// Builder with default settings
    pub fn new() -> Self {
        Self::from_config(EngineConfig::default())
    }

    /// Builder starting from a loaded configuration
    pub fn from_config(config: EngineConfig) -> Self {
        DatabaseBuilder {
            path: None,
            config,
            tsdb: None,
            blobs: None,
            codec: Arc::new(MsgPackCodec),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Storage root; overrides the configured `storage_path`
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Data retention
    pub fn retention(mut self, retention: Duration) -> Self {
        self.config.retention_secs = retention.as_secs();
        self
    }

    /// Payload source for get-trace
    pub fn payload_backend(mut self, backend: PayloadBackend) -> Self {
        self.config.payload_backend = backend;
        self
    }

    /// No WAL; files are still created
    pub fn no_durability(mut self) -> Self {
        self.config.durability = DurabilityMode::None;
        self
    }

    /// Batched fsync with default parameters
    pub fn buffered(mut self) -> Self {
        self.config.durability = DurabilityMode::default();
        self
    }

    /// Batched fsync with custom parameters
    pub fn buffered_with(mut self, interval_ms: u64, batch_size: usize) -> Self {
        self.config.durability = DurabilityMode::Batched {
            interval_ms,
            batch_size,
        };
        self
    }

    /// fsync on every commit
    pub fn strict(mut self) -> Self {
        self.config.durability = DurabilityMode::Strict;
        self
    }

    /// Take lockfiles on the storage directories
    pub fn lockfile(mut self, enabled: bool) -> Self {
        self.config.lockfile = enabled;
        self
    }

    /// Span codec (MessagePack by default)
    pub fn codec(mut self, codec: Arc<dyn SpanCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Telemetry observer (no-op by default)
    pub fn observer(mut self, observer: Arc<dyn StoreObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Use an already opened time-series engine instead of opening one
    pub fn tsdb(mut self, tsdb: Arc<dyn TimeSeriesDb>) -> Self {
        self.tsdb = Some(tsdb);
        self
    }

    /// Use an already opened blob store instead of opening one
    pub fn blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    /// Open on disk at the configured path
    pub fn open(mut self) -> Result<Database> {
        self.config.validate()?;
        let root = self
            .path
            .take()
            .unwrap_or_else(|| self.config.storage_path.clone());
        self.config.storage_path = root.clone();

        let open_err = |e: StorageError| Error::storage(Operation::Open, e);
        let tsdb: Arc<dyn TimeSeriesDb> = match self.tsdb.take() {
            Some(tsdb) => tsdb,
            None => Arc::new(
                MemTsdb::open(root.join(TSDB_DIR), self.config.tsdb_options()).map_err(open_err)?,
            ),
        };
        let blobs = match (self.config.payload_backend, self.blobs.take()) {
            (PayloadBackend::Blob, None) => Some(Arc::new(
                MemBlobStore::open(root.join(BLOB_DIR), self.config.blob_options())
                    .map_err(open_err)?,
            ) as Arc<dyn BlobStore>),
            (_, injected) => injected,
        };

        info!(
            path = %root.display(),
            backend = self.config.payload_backend.as_str(),
            retention_secs = self.config.retention_secs,
            "Opened span store"
        );
        Ok(self.assemble(Some(root), tsdb, blobs))
    }

    /// Build a database with no disk I/O
    pub fn ephemeral(mut self) -> Result<Database> {
        self.config.validate()?;
        let tsdb: Arc<dyn TimeSeriesDb> = match self.tsdb.take() {
            Some(tsdb) => tsdb,
            None => Arc::new(
                MemTsdb::ephemeral(TsdbOptions::with_retention(self.config.retention()))
                    .map_err(|e| Error::storage(Operation::Open, e))?,
            ),
        };
        let blobs = match (self.config.payload_backend, self.blobs.take()) {
            (PayloadBackend::Blob, None) => {
                Some(Arc::new(MemBlobStore::ephemeral()) as Arc<dyn BlobStore>)
            }
            (_, injected) => injected,
        };
        Ok(self.assemble(None, tsdb, blobs))
    }

    fn assemble(
        self,
        data_dir: Option<PathBuf>,
        tsdb: Arc<dyn TimeSeriesDb>,
        blobs: Option<Arc<dyn BlobStore>>,
    ) -> Database {
        let payloads: Box<dyn TracePayloadStore> = match (self.config.payload_backend, blobs) {
            (PayloadBackend::Blob, Some(blobs)) => {
                Box::new(BlobPayloads::new(blobs, self.config.retention()))
            }
            _ => Box::new(SeriesPayloads::new(tsdb.clone())),
        };
        Database {
            data_dir,
            config: self.config,
            tsdb,
            payloads,
            codec: self.codec,
            observer: self.observer,
        }
    }
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
