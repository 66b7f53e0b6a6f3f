//! Read/write telemetry hooks
//!
//! The engine reports every completed or failed operation to a
//! [`StoreObserver`]. [`NoopObserver`] is the default; [`TracingObserver`]
//! forwards to `tracing`.

use spanstore_core::{Error, ErrorKind, Operation, Span};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Receives operation outcomes
///
/// Implementations must be cheap; they run inline on the calling thread.
pub trait StoreObserver: Send + Sync {
    /// A span was indexed and its payload stored
    fn span_written(&self, _span: &Span, _elapsed: Duration) {}

    /// A read finished successfully with `results` items
    fn query_completed(&self, _operation: Operation, _results: usize, _elapsed: Duration) {}

    /// An operation returned an error
    fn operation_failed(&self, _operation: Operation, _error: &Error) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StoreObserver for NoopObserver {}

/// Observer that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StoreObserver for TracingObserver {
    fn span_written(&self, span: &Span, elapsed: Duration) {
        debug!(
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            service = span.service_name(),
            elapsed_us = elapsed.as_micros() as u64,
            "Span written"
        );
    }

    fn query_completed(&self, operation: Operation, results: usize, elapsed: Duration) {
        debug!(
            operation = operation.as_str(),
            results,
            elapsed_us = elapsed.as_micros() as u64,
            "Query completed"
        );
    }

    fn operation_failed(&self, operation: Operation, err: &Error) {
        match err.kind() {
            ErrorKind::EngineFailure | ErrorKind::Configuration => {
                error!(operation = operation.as_str(), error = %err, "Operation failed")
            }
            ErrorKind::Cancelled => {
                info!(operation = operation.as_str(), error = %err, "Operation cancelled")
            }
            ErrorKind::NotSupported => {
                warn!(operation = operation.as_str(), error = %err, "Unsupported request")
            }
            ErrorKind::Validation | ErrorKind::NotFound => {
                debug!(operation = operation.as_str(), error = %err, "Request rejected")
            }
        }
    }
}
