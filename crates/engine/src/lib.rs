//! Span index engine
//!
//! Maps spans onto label-indexed samples of a [`TimeSeriesDb`] and answers
//! trace queries from it:
//! - [`labels`]: span → label set, reserved label names
//! - [`validate`]: find-request validation
//! - [`translate`]: find-request → matchers, time range, post-filters
//! - [`payload`]: where get-trace reads encoded spans from
//! - [`database`]: [`Database`] and its builder; reads and writes are
//!   methods on it
//! - [`observer`]: telemetry hooks
//! - [`config`]: TOML configuration
//!
//! [`TimeSeriesDb`]: spanstore_storage::TimeSeriesDb

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod database;
pub mod labels;
pub mod observer;
pub mod payload;
pub mod translate;
pub mod validate;

mod reader;
mod writer;

pub use config::{EngineConfig, PayloadBackend};
pub use database::{Database, DatabaseBuilder, BLOB_DIR, TSDB_DIR};
pub use labels::{
    index_labels, is_reserved, OPERATION_LABEL, RESERVED_LABELS, SERVICE_LABEL, TRACE_ID_LABEL,
};
pub use observer::{NoopObserver, StoreObserver, TracingObserver};
pub use payload::{BlobPayloads, SeriesPayloads, TracePayloadStore};
pub use translate::{translate, TranslatedQuery};
pub use validate::validate_query;
