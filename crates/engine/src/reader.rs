//! Read and aggregation path
//!
//! Every read acquires its own querier and drops it on every exit path.
//! Cancellation is checked before the querier is created, between series and
//! between samples.

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use spanstore_core::{
    DependencyLink, Error, Matcher, Operation, QueryContext, Result, Span, StorageError, Trace,
    TraceId, TraceQueryParameters,
};
use spanstore_storage::Series;
use std::time::{Duration, Instant};

use crate::database::Database;
use crate::labels::{OPERATION_LABEL, SERVICE_LABEL, TRACE_ID_LABEL};
use crate::translate::{translate, TranslatedQuery};
use crate::validate::validate_query;

fn parse_trace_label(series: &Series, operation: Operation) -> Result<TraceId> {
    let raw = series.labels.get(TRACE_ID_LABEL);
    raw.parse().map_err(|_| {
        Error::storage(
            operation,
            StorageError::Corruption(format!("series {} has bad trace id {:?}", series.labels, raw)),
        )
    })
}

impl Database {
    /// Distinct service names, sorted
    pub fn get_services(&self, ctx: &QueryContext) -> Result<Vec<String>> {
        let start = Instant::now();
        let result = self.services_inner(ctx);
        self.observe(Operation::GetServices, start, result, Vec::len)
    }

    /// Distinct operation names of a service in first-seen order
    ///
    /// An empty `service` lists operations of every series carrying a
    /// service label.
    pub fn get_operations(&self, ctx: &QueryContext, service: &str) -> Result<Vec<String>> {
        let start = Instant::now();
        let result = self.operations_inner(ctx, service);
        self.observe(Operation::GetOperations, start, result, Vec::len)
    }

    /// All spans of a trace, sorted by start time then span id
    ///
    /// `TraceNotFound` when no span of the trace is stored.
    pub fn get_trace(&self, ctx: &QueryContext, trace_id: TraceId) -> Result<Trace> {
        let start = Instant::now();
        let result = self.trace_inner(ctx, trace_id);
        self.observe(Operation::GetTrace, start, result, |t| t.spans.len())
    }

    /// Traces with at least one span matching `query`
    ///
    /// Only matching spans are returned. Traces come in order of first
    /// encounter; spans within a trace are sorted.
    pub fn find_traces(
        &self,
        ctx: &QueryContext,
        query: Option<&TraceQueryParameters>,
    ) -> Result<Vec<Trace>> {
        let start = Instant::now();
        let result = self.find_traces_inner(ctx, query);
        self.observe(Operation::FindTraces, start, result, Vec::len)
    }

    /// Ids of the traces [`Database::find_traces`] would return, same order
    ///
    /// Payloads are decoded only when the query has duration bounds.
    pub fn find_trace_ids(
        &self,
        ctx: &QueryContext,
        query: Option<&TraceQueryParameters>,
    ) -> Result<Vec<TraceId>> {
        let start = Instant::now();
        let result = self.find_trace_ids_inner(ctx, query);
        self.observe(Operation::FindTraceIds, start, result, Vec::len)
    }

    /// Service dependency links; none are derived by this store
    pub fn get_dependencies(
        &self,
        _end_time: DateTime<Utc>,
        _lookback: Duration,
    ) -> Result<Vec<DependencyLink>> {
        let start = Instant::now();
        self.observe(Operation::GetDependencies, start, Ok(Vec::new()), Vec::len)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn services_inner(&self, ctx: &QueryContext) -> Result<Vec<String>> {
        let storage = |e: StorageError| Error::storage(Operation::GetServices, e);
        ctx.check()?;
        let querier = self.tsdb.querier(i64::MIN, i64::MAX).map_err(storage)?;
        querier.label_values(SERVICE_LABEL).map_err(storage)
    }

    fn operations_inner(&self, ctx: &QueryContext, service: &str) -> Result<Vec<String>> {
        let storage = |e: StorageError| Error::storage(Operation::GetOperations, e);
        let matcher = if service.is_empty() {
            Matcher::not_equal(SERVICE_LABEL, "")
        } else {
            Matcher::equal(SERVICE_LABEL, service)
        };

        ctx.check()?;
        let querier = self.tsdb.querier(i64::MIN, i64::MAX).map_err(storage)?;
        let mut seen = FxHashSet::default();
        let mut operations = Vec::new();
        for series in querier.select(&[matcher]).map_err(storage)? {
            ctx.check()?;
            let series = series.map_err(storage)?;
            let op = series.labels.get(OPERATION_LABEL);
            if !op.is_empty() && seen.insert(op.to_string()) {
                operations.push(op.to_string());
            }
        }
        Ok(operations)
    }

    fn trace_inner(&self, ctx: &QueryContext, trace_id: TraceId) -> Result<Trace> {
        let payloads = self.payloads.load(ctx, trace_id)?;
        if payloads.is_empty() {
            return Err(Error::TraceNotFound(trace_id));
        }

        let mut trace = Trace::new(trace_id);
        trace.spans.reserve(payloads.len());
        for payload in payloads {
            ctx.check()?;
            let span = self
                .codec
                .decode(&payload)
                .map_err(|e| Error::codec(Operation::GetTrace, e))?;
            trace.spans.push(span);
        }
        trace.sort_spans();
        Ok(trace)
    }

    fn find_traces_inner(
        &self,
        ctx: &QueryContext,
        query: Option<&TraceQueryParameters>,
    ) -> Result<Vec<Trace>> {
        let operation = Operation::FindTraces;
        let storage = |e: StorageError| Error::storage(operation, e);
        validate_query(query)?;
        let tq = translate(query.ok_or(Error::MalformedRequest)?)?;

        ctx.check()?;
        let querier = self.tsdb.querier(tq.min_time, tq.max_time).map_err(storage)?;
        let mut traces: Vec<Trace> = Vec::new();
        let mut index: FxHashMap<TraceId, usize> = FxHashMap::default();

        for series in querier.select(&tq.matchers).map_err(storage)? {
            ctx.check()?;
            let series = series.map_err(storage)?;
            for sample in &series.samples {
                ctx.check()?;
                let span = self
                    .codec
                    .decode(&sample.payload)
                    .map_err(|e| Error::codec(operation, e))?;
                if !tq.accepts(&span) {
                    continue;
                }
                push_span(&mut traces, &mut index, &tq, span);
            }
        }

        for trace in &mut traces {
            trace.sort_spans();
        }
        Ok(traces)
    }

    fn find_trace_ids_inner(
        &self,
        ctx: &QueryContext,
        query: Option<&TraceQueryParameters>,
    ) -> Result<Vec<TraceId>> {
        let operation = Operation::FindTraceIds;
        let storage = |e: StorageError| Error::storage(operation, e);
        validate_query(query)?;
        let tq = translate(query.ok_or(Error::MalformedRequest)?)?;

        ctx.check()?;
        let querier = self.tsdb.querier(tq.min_time, tq.max_time).map_err(storage)?;
        let mut ids = Vec::new();
        let mut seen = FxHashSet::default();

        for series in querier.select(&tq.matchers).map_err(storage)? {
            if tq.is_full(ids.len()) {
                break;
            }
            ctx.check()?;
            let series = series.map_err(storage)?;
            let trace_id = parse_trace_label(&series, operation)?;
            if seen.contains(&trace_id) {
                continue;
            }
            if tq.has_duration_filter() && !self.any_sample_accepted(ctx, &series, &tq, operation)? {
                continue;
            }
            seen.insert(trace_id);
            ids.push(trace_id);
        }
        Ok(ids)
    }

    fn any_sample_accepted(
        &self,
        ctx: &QueryContext,
        series: &Series,
        tq: &TranslatedQuery,
        operation: Operation,
    ) -> Result<bool> {
        for sample in &series.samples {
            ctx.check()?;
            let span = self
                .codec
                .decode(&sample.payload)
                .map_err(|e| Error::codec(operation, e))?;
            if tq.accepts(&span) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Add a span to its trace, opening a new trace unless the limit is reached
fn push_span(
    traces: &mut Vec<Trace>,
    index: &mut FxHashMap<TraceId, usize>,
    tq: &TranslatedQuery,
    span: Span,
) {
    if let Some(&i) = index.get(&span.trace_id) {
        traces[i].spans.push(span);
        return;
    }
    if tq.is_full(traces.len()) {
        return;
    }
    index.insert(span.trace_id, traces.len());
    let mut trace = Trace::new(span.trace_id);
    trace.spans.push(span);
    traces.push(trace);
}
