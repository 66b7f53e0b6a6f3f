//! Trace query parameters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Parameters of a find-traces / find-trace-ids request
///
/// `service_name` and both start-time bounds are required; everything else
/// is optional. Zero durations and a zero `num_traces` mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceQueryParameters {
    /// Service that emitted the matching spans
    pub service_name: String,
    /// Operation name; empty matches any
    #[serde(default)]
    pub operation_name: String,
    /// Tag equality filters, ordered by key
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Earliest span start time (inclusive)
    pub start_time_min: Option<DateTime<Utc>>,
    /// Latest span start time (inclusive)
    pub start_time_max: Option<DateTime<Utc>>,
    /// Minimum span duration
    #[serde(default)]
    pub duration_min: Duration,
    /// Maximum span duration
    #[serde(default)]
    pub duration_max: Duration,
    /// Maximum number of traces to return
    #[serde(default)]
    pub num_traces: usize,
}

impl TraceQueryParameters {
    /// Query for a service over a start-time window
    pub fn new(
        service_name: impl Into<String>,
        start_time_min: DateTime<Utc>,
        start_time_max: DateTime<Utc>,
    ) -> Self {
        TraceQueryParameters {
            service_name: service_name.into(),
            start_time_min: Some(start_time_min),
            start_time_max: Some(start_time_max),
            ..Default::default()
        }
    }

    /// Restrict to one operation
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation_name = operation.into();
        self
    }

    /// Add a tag equality filter
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set duration bounds; a zero bound is unset
    pub fn with_duration(mut self, min: Duration, max: Duration) -> Self {
        self.duration_min = min;
        self.duration_max = max;
        self
    }

    /// Cap the number of traces returned
    pub fn with_limit(mut self, num_traces: usize) -> Self {
        self.num_traces = num_traces;
        self
    }

    /// Whether either duration bound is set
    pub fn has_duration_bounds(&self) -> bool {
        !self.duration_min.is_zero() || !self.duration_max.is_zero()
    }
}
