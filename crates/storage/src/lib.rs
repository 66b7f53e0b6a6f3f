//! Storage layer for spanstore
//!
//! This crate defines the engines the span index is built on, plus in-memory
//! reference implementations:
//! - [`TimeSeriesDb`]: label-indexed samples, read via [`Querier`], written
//!   via [`Appender`]
//! - [`MemTsdb`]: head block with postings, WAL, retention and lockfile
//! - [`BlobStore`]: keyed blobs with TTL
//! - [`MemBlobStore`]: DashMap-backed blob store with WAL

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blob;
pub mod head;
pub mod lock;
pub mod memdb;
pub mod options;
pub mod tsdb;

pub use blob::{BlobOptions, BlobStore, MemBlobStore};
pub use head::Head;
pub use lock::{DirLock, LOCK_FILE};
pub use memdb::{MemTsdb, WAL_DIR};
pub use options::{default_block_ranges, TsdbOptions};
pub use tsdb::{Appender, Querier, Sample, Series, SeriesRef, SeriesSet, TimeSeriesDb};

pub use spanstore_durability::DurabilityMode;
