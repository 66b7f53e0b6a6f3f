//! Core types for spanstore
//!
//! This crate defines the types shared by every layer:
//! - [`model`]: spans, traces and identifiers
//! - [`labels`]: label sets and matchers understood by the time-series engine
//! - [`query`]: trace query parameters
//! - [`error`]: storage, codec and request errors
//! - [`context`]: cancellation for read requests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod labels;
pub mod model;
pub mod query;

pub use context::QueryContext;
pub use error::{CodecError, Error, ErrorKind, Operation, Result, StorageError};
pub use labels::{Label, Labels, MatchType, Matcher};
pub use model::{
    micros_to_time, time_to_micros, DependencyLink, KeyValue, Log, Process, RefType, Span,
    SpanId, SpanRef, TagValue, Trace, TraceId,
};
pub use query::TraceQueryParameters;
