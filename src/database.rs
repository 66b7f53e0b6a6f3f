//! Main entry point for spanstore.
//!
//! This module provides the `Store` struct, the handle every plugin surface
//! call goes through.

use crate::error::Result;
use spanstore_engine::{Database, DatabaseBuilder, EngineConfig, PayloadBackend, StoreObserver};
use spanstore_wire::SpanCodec;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The span store.
///
/// Cheap to clone; clones share the same engines. Create one with
/// [`Store::open`], [`Store::ephemeral`] or [`Store::builder`].
///
/// # Example
///
/// ```ignore
/// use spanstore::prelude::*;
///
/// let store = Store::open("./spans")?;
/// store.write_span(&span)?;
///
/// let ctx = QueryContext::background();
/// let trace = store.get_trace(&ctx, span.trace_id)?;
///
/// store.close()?;
/// ```
#[derive(Clone, Debug)]
pub struct Store {
    pub(crate) inner: Arc<Database>,
}

impl Store {
    /// Open a store at the given path with default settings.
    ///
    /// Defaults: one hour retention, series payload backend, batched WAL
    /// fsync, no lockfile.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create a store with no disk I/O.
    ///
    /// Nothing survives the process. Use for tests and short-lived tools.
    ///
    /// | Method | Disk Files | Survives restart |
    /// |--------|------------|------------------|
    /// | `Store::ephemeral()` | None | No |
    /// | `Store::open(path)` | `path/tsdb`, `path/blob` | Yes |
    pub fn ephemeral() -> Result<Self> {
        Self::builder().ephemeral()
    }

    /// Create a builder for store configuration.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Gracefully close the store.
    ///
    /// Closes the payload store and the time-series engine. Later writes
    /// fail with a storage error.
    pub fn close(&self) -> Result<()> {
        self.inner.shutdown()
    }

    /// Storage root, `None` for an ephemeral store.
    pub fn path(&self) -> Option<&Path> {
        self.inner.data_dir()
    }

    /// Check if this is an ephemeral (no-disk) store.
    pub fn is_ephemeral(&self) -> bool {
        self.inner.is_ephemeral()
    }

    /// Where get-trace reads payloads from.
    pub fn payload_backend(&self) -> PayloadBackend {
        self.inner.payload_backend()
    }

    /// Effective configuration.
    pub fn config(&self) -> &EngineConfig {
        self.inner.config()
    }

    /// The underlying engine database.
    pub fn engine(&self) -> &Arc<Database> {
        &self.inner
    }
}

/// Builder for store configuration.
///
/// # Example
///
/// ```ignore
/// // Disk-backed, blob payloads, fsync on every write
/// let store = Store::builder()
///     .path("./spans")
///     .retention(Duration::from_secs(24 * 3600))
///     .payload_backend(PayloadBackend::Blob)
///     .strict()
///     .open()?;
///
/// // From a TOML file
/// let store = Store::builder()
///     .config(EngineConfig::load("spanstore.toml")?)
///     .open()?;
/// ```
pub struct StoreBuilder {
    inner: DatabaseBuilder,
}

impl StoreBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            inner: DatabaseBuilder::new(),
        }
    }

    /// Replace every setting with a loaded configuration.
    ///
    /// Call first; later builder calls override individual fields.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.inner = DatabaseBuilder::from_config(config);
        self
    }

    /// Set the storage directory.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.inner = self.inner.path(path);
        self
    }

    /// Set data retention.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.inner = self.inner.retention(retention);
        self
    }

    /// Choose where get-trace reads payloads from.
    pub fn payload_backend(mut self, backend: PayloadBackend) -> Self {
        self.inner = self.inner.payload_backend(backend);
        self
    }

    /// Skip the WAL (files are still created).
    ///
    /// Data written since open is lost on restart.
    pub fn no_durability(mut self) -> Self {
        self.inner = self.inner.no_durability();
        self
    }

    /// Use buffered mode (default).
    ///
    /// Default flush interval: 100ms or 1000 writes.
    pub fn buffered(mut self) -> Self {
        self.inner = self.inner.buffered();
        self
    }

    /// Use buffered mode with custom parameters.
    pub fn buffered_with(mut self, flush_interval_ms: u64, max_pending_writes: usize) -> Self {
        self.inner = self.inner.buffered_with(flush_interval_ms, max_pending_writes);
        self
    }

    /// Use strict mode: fsync on every write.
    pub fn strict(mut self) -> Self {
        self.inner = self.inner.strict();
        self
    }

    /// Take lockfiles on the storage directories.
    pub fn lockfile(mut self, enabled: bool) -> Self {
        self.inner = self.inner.lockfile(enabled);
        self
    }

    /// Use a different span codec.
    pub fn codec(mut self, codec: Arc<dyn SpanCodec>) -> Self {
        self.inner = self.inner.codec(codec);
        self
    }

    /// Report operation outcomes to `observer`.
    pub fn observer(mut self, observer: Arc<dyn StoreObserver>) -> Self {
        self.inner = self.inner.observer(observer);
        self
    }

    /// Open the store on disk.
    pub fn open(self) -> Result<Store> {
        Ok(Store::from_engine(Arc::new(self.inner.open()?)))
    }

    /// Build a store with no disk I/O.
    pub fn ephemeral(self) -> Result<Store> {
        Ok(Store::from_engine(Arc::new(self.inner.ephemeral()?)))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create a Store from an engine Database.
    pub fn from_engine(db: Arc<Database>) -> Self {
        Self { inner: db }
    }
}
