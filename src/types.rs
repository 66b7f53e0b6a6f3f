//! Public types for the spanstore API.
//!
//! Re-exported from the internal crates with one import path.

// Span model
pub use spanstore_core::{
    micros_to_time, time_to_micros, DependencyLink, KeyValue, Log, Process, RefType, Span,
    SpanId, SpanRef, TagValue, Trace, TraceId,
};

// Queries
pub use spanstore_core::{QueryContext, TraceQueryParameters};

// Configuration
pub use spanstore_engine::{EngineConfig, PayloadBackend};
pub use spanstore_storage::DurabilityMode;

// Telemetry
pub use spanstore_engine::{NoopObserver, StoreObserver, TracingObserver};

// Codecs
pub use spanstore_wire::{JsonCodec, MsgPackCodec, SpanCodec};
