//! Trace payload stores
//!
//! Get-trace needs every encoded span of one trace. Two sources exist:
//!
//! | Store | Write | Read |
//! |-------|-------|------|
//! | [`SeriesPayloads`] | nothing extra, the index sample carries the payload | select `__traceid__ = id` over all time |
//! | [`BlobPayloads`] | append the payload to the trace's blob | one key lookup |
//!
//! The store is picked once at construction from [`PayloadBackend`].

use parking_lot::Mutex;
use spanstore_core::{
    Error, Matcher, Operation, QueryContext, Result, Span, StorageError, TraceId,
};
use spanstore_storage::{BlobStore, TimeSeriesDb};
use spanstore_wire::frame::{append_frame, split_frames};
use std::sync::Arc;
use std::time::Duration;

use crate::config::PayloadBackend;
use crate::labels::{trace_key, TRACE_ID_LABEL};

/// Source of encoded spans for trace-by-id lookups
pub trait TracePayloadStore: Send + Sync {
    /// Which backend this is
    fn backend(&self) -> PayloadBackend;

    /// Remember the payload of a span whose index sample was just committed
    fn record(&self, span: &Span, payload: &[u8]) -> Result<()>;

    /// Every stored payload of a trace; empty when the trace is unknown
    fn load(&self, ctx: &QueryContext, trace_id: TraceId) -> Result<Vec<Arc<[u8]>>>;

    /// Release resources owned by the store
    fn close(&self) -> Result<()>;
}

// ============================================================================
// Series-backed
// ============================================================================

/// Payloads read straight from index samples
pub struct SeriesPayloads {
    tsdb: Arc<dyn TimeSeriesDb>,
}

impl SeriesPayloads {
    /// Read payloads from `tsdb`
    pub fn new(tsdb: Arc<dyn TimeSeriesDb>) -> Self {
        SeriesPayloads { tsdb }
    }
}

impl TracePayloadStore for SeriesPayloads {
    fn backend(&self) -> PayloadBackend {
        PayloadBackend::Series
    }

    fn record(&self, _span: &Span, _payload: &[u8]) -> Result<()> {
        Ok(())
    }

    fn load(&self, ctx: &QueryContext, trace_id: TraceId) -> Result<Vec<Arc<[u8]>>> {
        let storage = |e: StorageError| Error::storage(Operation::GetTrace, e);

        ctx.check()?;
        let querier = self.tsdb.querier(i64::MIN, i64::MAX).map_err(storage)?;
        let matchers = [Matcher::equal(TRACE_ID_LABEL, trace_id.to_string())];

        let mut payloads = Vec::new();
        for series in querier.select(&matchers).map_err(storage)? {
            ctx.check()?;
            let series = series.map_err(storage)?;
            payloads.extend(series.samples.into_iter().map(|s| s.payload));
        }
        Ok(payloads)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Blob-backed
// ============================================================================

const LOCK_STRIPES: usize = 64;

/// Payloads kept as one framed blob per trace
///
/// Appending a span is a read-modify-write of the trace's blob; writers of
/// the same trace are serialised by a striped lock.
pub struct BlobPayloads {
    blobs: Arc<dyn BlobStore>,
    ttl: Duration,
    stripes: Vec<Mutex<()>>,
}

impl BlobPayloads {
    /// Store blobs in `blobs`, each living `ttl` after its last write
    pub fn new(blobs: Arc<dyn BlobStore>, ttl: Duration) -> Self {
        BlobPayloads {
            blobs,
            ttl,
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    fn stripe(&self, trace_id: TraceId) -> &Mutex<()> {
        let h = trace_id.high ^ trace_id.low.rotate_left(17);
        &self.stripes[(h % LOCK_STRIPES as u64) as usize]
    }
}

impl TracePayloadStore for BlobPayloads {
    fn backend(&self) -> PayloadBackend {
        PayloadBackend::Blob
    }

    fn record(&self, span: &Span, payload: &[u8]) -> Result<()> {
        let key = trace_key(span.trace_id);
        let _guard = self.stripe(span.trace_id).lock();

        let mut blob = self
            .blobs
            .get(&key)
            .map_err(|e| Error::storage(Operation::WriteSpan, e))?
            .unwrap_or_default();
        append_frame(&mut blob, payload).map_err(|e| Error::codec(Operation::WriteSpan, e))?;
        self.blobs
            .put(&key, &blob, self.ttl)
            .map_err(|e| Error::storage(Operation::WriteSpan, e))
    }

    fn load(&self, ctx: &QueryContext, trace_id: TraceId) -> Result<Vec<Arc<[u8]>>> {
        ctx.check()?;
        let Some(blob) = self
            .blobs
            .get(&trace_key(trace_id))
            .map_err(|e| Error::storage(Operation::GetTrace, e))?
        else {
            return Ok(Vec::new());
        };
        let frames = split_frames(&blob).map_err(|e| Error::codec(Operation::GetTrace, e))?;
        Ok(frames.into_iter().map(Arc::from).collect())
    }

    fn close(&self) -> Result<()> {
        self.blobs
            .close()
            .map_err(|e: StorageError| Error::storage(Operation::Close, e))
    }
}
