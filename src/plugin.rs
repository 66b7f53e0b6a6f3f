//! Storage plugin surface
//!
//! The three traits a tracing backend calls into. [`Store`] implements all
//! of them; a host can hold them as trait objects to swap in another store.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::database::Store;
use crate::error::Result;
use crate::types::{DependencyLink, QueryContext, Span, Trace, TraceId, TraceQueryParameters};

/// Span ingestion
pub trait SpanWriter: Send + Sync {
    /// Index and store one span
    fn write_span(&self, span: &Span) -> Result<()>;
}

/// Trace queries
pub trait SpanReader: Send + Sync {
    /// All spans of one trace, sorted by start time then span id
    fn get_trace(&self, ctx: &QueryContext, trace_id: TraceId) -> Result<Trace>;

    /// Distinct service names, sorted
    fn get_services(&self, ctx: &QueryContext) -> Result<Vec<String>>;

    /// Distinct operation names of a service
    fn get_operations(&self, ctx: &QueryContext, service: &str) -> Result<Vec<String>>;

    /// Traces containing at least one matching span
    fn find_traces(
        &self,
        ctx: &QueryContext,
        query: Option<&TraceQueryParameters>,
    ) -> Result<Vec<Trace>>;

    /// Ids of the traces `find_traces` would return
    fn find_trace_ids(
        &self,
        ctx: &QueryContext,
        query: Option<&TraceQueryParameters>,
    ) -> Result<Vec<TraceId>>;
}

/// Service dependency graph
pub trait DependencyReader: Send + Sync {
    /// Links observed in `[end_time - lookback, end_time]`
    fn get_dependencies(
        &self,
        end_time: DateTime<Utc>,
        lookback: Duration,
    ) -> Result<Vec<DependencyLink>>;
}

impl SpanWriter for Store {
    fn write_span(&self, span: &Span) -> Result<()> {
        self.inner.write_span(span)
    }
}

impl SpanReader for Store {
    fn get_trace(&self, ctx: &QueryContext, trace_id: TraceId) -> Result<Trace> {
        self.inner.get_trace(ctx, trace_id)
    }

    fn get_services(&self, ctx: &QueryContext) -> Result<Vec<String>> {
        self.inner.get_services(ctx)
    }

    fn get_operations(&self, ctx: &QueryContext, service: &str) -> Result<Vec<String>> {
        self.inner.get_operations(ctx, service)
    }

    fn find_traces(
        &self,
        ctx: &QueryContext,
        query: Option<&TraceQueryParameters>,
    ) -> Result<Vec<Trace>> {
        self.inner.find_traces(ctx, query)
    }

    fn find_trace_ids(
        &self,
        ctx: &QueryContext,
        query: Option<&TraceQueryParameters>,
    ) -> Result<Vec<TraceId>> {
        self.inner.find_trace_ids(ctx, query)
    }
}

impl DependencyReader for Store {
    fn get_dependencies(
        &self,
        end_time: DateTime<Utc>,
        lookback: Duration,
    ) -> Result<Vec<DependencyLink>> {
        self.inner.get_dependencies(end_time, lookback)
    }
}
