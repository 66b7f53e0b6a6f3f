//! Time-series engine interface
//!
//! The engine stores `(labels, timestamp, payload)` samples. Samples sharing
//! one exact label set form a [`Series`]. Reads go through a [`Querier`]
//! bound to a closed time range; writes go through an [`Appender`] whose
//! commit is the visibility boundary.

use spanstore_core::{Labels, Matcher, StorageError};
use std::sync::Arc;

/// Opaque handle of a series, stable while the series is retained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesRef(pub u64);

/// One timestamped payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Sample timestamp (microseconds)
    pub timestamp: i64,
    /// Opaque payload
    pub payload: Arc<[u8]>,
}

/// Samples sharing one label set, ordered by timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    /// Exact label set
    pub labels: Labels,
    /// Samples within the querier's range
    pub samples: Vec<Sample>,
}

/// Result of [`Querier::select`]
///
/// Iteration may fail midway; an `Err` item ends the useful part of the set.
pub struct SeriesSet<'a> {
    inner: Box<dyn Iterator<Item = Result<Series, StorageError>> + Send + 'a>,
}

impl<'a> SeriesSet<'a> {
    /// Wrap an iterator
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<Series, StorageError>> + Send + 'a,
    {
        SeriesSet {
            inner: Box::new(iter),
        }
    }

    /// Set over already materialised series
    pub fn from_vec(series: Vec<Series>) -> Self {
        Self::new(series.into_iter().map(Ok))
    }

    /// Empty set
    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl Iterator for SeriesSet<'_> {
    type Item = Result<Series, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl std::fmt::Debug for SeriesSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesSet").finish_non_exhaustive()
    }
}

/// Read handle bound to `[mint, maxt]`
///
/// Released when dropped.
pub trait Querier: Send {
    /// Series whose labels satisfy every matcher and that have at least one
    /// sample in range
    fn select(&self, matchers: &[Matcher]) -> Result<SeriesSet<'_>, StorageError>;

    /// Distinct non-empty values of `name` among series with samples in
    /// range, sorted
    fn label_values(&self, name: &str) -> Result<Vec<String>, StorageError>;
}

/// Write transaction
///
/// Samples added to an appender are invisible until [`Appender::commit`]
/// returns `Ok`. Dropping an appender without committing discards it.
pub trait Appender: Send {
    /// Stage one sample
    fn add(&mut self, labels: &Labels, timestamp: i64, payload: &[u8])
        -> Result<SeriesRef, StorageError>;

    /// Make every staged sample visible atomically
    fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// Discard every staged sample
    fn rollback(self: Box<Self>);
}

/// Label-indexed time-series engine
pub trait TimeSeriesDb: Send + Sync {
    /// Read handle over `[mint, maxt]` (inclusive, microseconds)
    fn querier(&self, mint: i64, maxt: i64) -> Result<Box<dyn Querier + '_>, StorageError>;

    /// New write transaction
    fn appender(&self) -> Result<Box<dyn Appender + '_>, StorageError>;

    /// Flush and release the engine; later calls fail with `Closed`
    fn close(&self) -> Result<(), StorageError>;
}
