//! Trace query → label matchers

use spanstore_core::{time_to_micros, Error, Matcher, Result, Span, TraceQueryParameters};
use std::time::Duration;

use crate::labels::{is_reserved, OPERATION_LABEL, SERVICE_LABEL};

/// A trace query in engine terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedQuery {
    /// Matchers, combined with AND
    pub matchers: Vec<Matcher>,
    /// Earliest sample timestamp (inclusive, microseconds)
    pub min_time: i64,
    /// Latest sample timestamp (inclusive, microseconds)
    pub max_time: i64,
    /// Minimum span duration, applied after decoding
    pub duration_min: Option<Duration>,
    /// Maximum span duration, applied after decoding
    pub duration_max: Option<Duration>,
    /// Maximum number of traces
    pub limit: Option<usize>,
}

impl TranslatedQuery {
    /// Whether results must be filtered by span duration
    pub fn has_duration_filter(&self) -> bool {
        self.duration_min.is_some() || self.duration_max.is_some()
    }

    /// Whether a span passes the duration filter
    pub fn accepts(&self, span: &Span) -> bool {
        self.duration_min.map_or(true, |min| span.duration >= min)
            && self.duration_max.map_or(true, |max| span.duration <= max)
    }

    /// Whether `count` traces already fill the limit
    pub fn is_full(&self, count: usize) -> bool {
        self.limit.map_or(false, |limit| count >= limit)
    }
}

fn non_zero(d: Duration) -> Option<Duration> {
    if d.is_zero() {
        None
    } else {
        Some(d)
    }
}

/// Translate a validated query
///
/// Matchers: operation (when set), then service, then one per tag in key
/// order. A tag filter on a reserved label name is `NotSupported`.
pub fn translate(query: &TraceQueryParameters) -> Result<TranslatedQuery> {
    let (min, max) = match (query.start_time_min, query.start_time_max) {
        (Some(min), Some(max)) => (min, max),
        _ => return Err(Error::StartAndEndTimeNotSet),
    };

    let mut matchers = Vec::with_capacity(2 + query.tags.len());
    if !query.operation_name.is_empty() {
        matchers.push(Matcher::equal(OPERATION_LABEL, query.operation_name.as_str()));
    }
    if !query.service_name.is_empty() {
        matchers.push(Matcher::equal(SERVICE_LABEL, query.service_name.as_str()));
    }
    for (key, value) in &query.tags {
        if is_reserved(key) {
            return Err(Error::NotSupported(format!("tag filter on reserved label {}", key)));
        }
        matchers.push(Matcher::equal(key.as_str(), value.as_str()));
    }

    Ok(TranslatedQuery {
        matchers,
        min_time: time_to_micros(&min),
        max_time: time_to_micros(&max),
        duration_min: non_zero(query.duration_min),
        duration_max: non_zero(query.duration_max),
        limit: if query.num_traces == 0 {
            None
        } else {
            Some(query.num_traces)
        },
    })
}
