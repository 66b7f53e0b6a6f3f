//! Span and trace domain model
//!
//! This module defines the tracing data model stored by spanstore:
//! - [`TraceId`] / [`SpanId`]: fixed-width identifiers with canonical hex forms
//! - [`KeyValue`] / [`TagValue`]: typed tags with string coercion for indexing
//! - [`Process`], [`Log`], [`SpanRef`]: span attachments
//! - [`Span`]: one recorded operation
//! - [`Trace`]: spans sharing one trace id, assembled per query
//! - [`DependencyLink`]: service-to-service edge (reported empty for now)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// 128-bit trace identifier
///
/// The canonical string form is lowercase hex. When `high` is zero only the
/// low half is printed (without padding); otherwise the high half is followed
/// by the low half padded to 16 digits. Parsing accepts 1 to 32 hex digits.
///
/// # Examples
///
/// ```
/// use spanstore_core::TraceId;
///
/// let id = TraceId::new(0, 0xabc);
/// assert_eq!(id.to_string(), "abc");
///
/// let wide = TraceId::new(1, 2);
/// assert_eq!(wide.to_string(), "10000000000000002");
/// assert_eq!("10000000000000002".parse::<TraceId>().unwrap(), wide);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId {
    /// Upper 64 bits
    pub high: u64,
    /// Lower 64 bits
    pub low: u64,
}

impl TraceId {
    /// Create a trace id from its two halves
    pub const fn new(high: u64, low: u64) -> Self {
        TraceId { high, low }
    }

    /// Big-endian byte representation (high half first)
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.high.to_be_bytes());
        out[8..].copy_from_slice(&self.low.to_be_bytes());
        out
    }

    /// Inverse of [`TraceId::to_bytes`]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut high = [0u8; 8];
        let mut low = [0u8; 8];
        high.copy_from_slice(&bytes[..8]);
        low.copy_from_slice(&bytes[8..]);
        TraceId {
            high: u64::from_be_bytes(high),
            low: u64::from_be_bytes(low),
        }
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.high == 0 {
            write!(f, "{:x}", self.low)
        } else {
            write!(f, "{:x}{:016x}", self.high, self.low)
        }
    }
}

impl FromStr for TraceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidTraceId(s.to_string());
        if !is_hex_id(s, 32) {
            return Err(invalid());
        }
        if s.len() > 16 {
            let split = s.len() - 16;
            let high = u64::from_str_radix(&s[..split], 16).map_err(|_| invalid())?;
            let low = u64::from_str_radix(&s[split..], 16).map_err(|_| invalid())?;
            Ok(TraceId { high, low })
        } else {
            let low = u64::from_str_radix(s, 16).map_err(|_| invalid())?;
            Ok(TraceId { high: 0, low })
        }
    }
}

/// Between 1 and `max_len` ASCII hex digits, no sign
fn is_hex_id(s: &str, max_len: usize) -> bool {
    !s.is_empty() && s.len() <= max_len && s.bytes().all(|b| b.is_ascii_hexdigit())
}

impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TraceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 64-bit span identifier, rendered as lowercase hex
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(pub u64);

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl FromStr for SpanId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_hex_id(s, 16) {
            return Err(Error::InvalidSpanId(s.to_string()));
        }
        u64::from_str_radix(s, 16)
            .map(SpanId)
            .map_err(|_| Error::InvalidSpanId(s.to_string()))
    }
}

impl Serialize for SpanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpanId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Typed tag value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TagValue {
    /// UTF-8 string
    String(String),
    /// Boolean
    Bool(bool),
    /// Signed 64-bit integer
    Int64(i64),
    /// 64-bit float
    Float64(f64),
    /// Raw bytes
    Binary(Vec<u8>),
}

impl TagValue {
    /// Coerce the value to the string used as a label value
    ///
    /// Strings are returned as-is, booleans as `true`/`false`, integers in
    /// decimal, floats in shortest round-trip form and binary as lowercase hex.
    pub fn as_string(&self) -> String {
        match self {
            TagValue::String(s) => s.clone(),
            TagValue::Bool(b) => b.to_string(),
            TagValue::Int64(i) => i.to_string(),
            TagValue::Float64(v) => v.to_string(),
            TagValue::Binary(bytes) => {
                use fmt::Write;
                let mut out = String::with_capacity(bytes.len() * 2);
                for b in bytes {
                    let _ = write!(out, "{:02x}", b);
                }
                out
            }
        }
    }
}

/// Key plus typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: TagValue,
}

impl KeyValue {
    /// String tag
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        KeyValue {
            key: key.into(),
            value: TagValue::String(value.into()),
        }
    }

    /// Boolean tag
    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        KeyValue {
            key: key.into(),
            value: TagValue::Bool(value),
        }
    }

    /// Integer tag
    pub fn int64(key: impl Into<String>, value: i64) -> Self {
        KeyValue {
            key: key.into(),
            value: TagValue::Int64(value),
        }
    }

    /// Float tag
    pub fn float64(key: impl Into<String>, value: f64) -> Self {
        KeyValue {
            key: key.into(),
            value: TagValue::Float64(value),
        }
    }

    /// Binary tag
    pub fn binary(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        KeyValue {
            key: key.into(),
            value: TagValue::Binary(value.into()),
        }
    }

    /// Value coerced to a string, see [`TagValue::as_string`]
    pub fn as_string(&self) -> String {
        self.value.as_string()
    }
}

// ============================================================================
// Span attachments
// ============================================================================

/// The process that emitted a span
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Process {
    /// Owning service name
    pub service_name: String,
    /// Process-level tags
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

impl Process {
    /// Process with no tags
    pub fn new(service_name: impl Into<String>) -> Self {
        Process {
            service_name: service_name.into(),
            tags: Vec::new(),
        }
    }
}

/// Timestamped structured log attached to a span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    /// When the log was recorded
    pub timestamp: DateTime<Utc>,
    /// Log fields
    #[serde(default)]
    pub fields: Vec<KeyValue>,
}

/// Kind of causal reference between spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    /// Parent/child relationship
    ChildOf,
    /// Causal but non-blocking relationship
    FollowsFrom,
}

/// Reference from one span to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRef {
    /// Trace of the referenced span
    pub trace_id: TraceId,
    /// Referenced span
    pub span_id: SpanId,
    /// Relationship kind
    pub ref_type: RefType,
}

// ============================================================================
// Span / Trace
// ============================================================================

/// One recorded operation within a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Trace this span belongs to
    pub trace_id: TraceId,
    /// Span identifier, unique within the trace
    pub span_id: SpanId,
    /// Operation name
    pub operation_name: String,
    /// References to other spans
    #[serde(default)]
    pub references: Vec<SpanRef>,
    /// Sampling and debug flags
    #[serde(default)]
    pub flags: u32,
    /// Start time; its microsecond value is the index time coordinate
    pub start_time: DateTime<Utc>,
    /// Duration of the operation
    #[serde(default)]
    pub duration: Duration,
    /// Span tags
    #[serde(default)]
    pub tags: Vec<KeyValue>,
    /// Structured logs
    #[serde(default)]
    pub logs: Vec<Log>,
    /// Emitting process
    pub process: Process,
    /// Warnings attached during ingestion
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Span {
    /// Minimal span with no tags, logs or references
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        service: impl Into<String>,
        operation: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Span {
            trace_id,
            span_id,
            operation_name: operation.into(),
            references: Vec::new(),
            flags: 0,
            start_time,
            duration: Duration::ZERO,
            tags: Vec::new(),
            logs: Vec::new(),
            process: Process::new(service),
            warnings: Vec::new(),
        }
    }

    /// Service name of the emitting process
    pub fn service_name(&self) -> &str {
        &self.process.service_name
    }

    /// Start time in microseconds since the Unix epoch
    pub fn start_micros(&self) -> i64 {
        time_to_micros(&self.start_time)
    }

    /// Parent span id, taken from the first `ChildOf` reference in the same trace
    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.references
            .iter()
            .find(|r| r.ref_type == RefType::ChildOf && r.trace_id == self.trace_id)
            .map(|r| r.span_id)
    }
}

/// Spans sharing one trace id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Shared trace id
    pub trace_id: TraceId,
    /// Member spans
    pub spans: Vec<Span>,
}

impl Trace {
    /// Empty trace
    pub fn new(trace_id: TraceId) -> Self {
        Trace {
            trace_id,
            spans: Vec::new(),
        }
    }

    /// Sort spans by start time, then span id
    pub fn sort_spans(&mut self) {
        self.spans
            .sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.span_id.cmp(&b.span_id)));
    }

    /// Span ids in current order
    pub fn span_ids(&self) -> Vec<SpanId> {
        self.spans.iter().map(|s| s.span_id).collect()
    }
}

/// Directed call edge between two services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyLink {
    /// Calling service
    pub parent: String,
    /// Called service
    pub child: String,
    /// Number of calls observed
    pub call_count: u64,
    /// Where the link was derived from
    pub source: String,
}

// ============================================================================
// Time helpers
// ============================================================================

/// Microseconds since the Unix epoch
pub fn time_to_micros(t: &DateTime<Utc>) -> i64 {
    t.timestamp_micros()
}

/// Inverse of [`time_to_micros`]; out-of-range values clamp to the epoch
pub fn micros_to_time(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}
