//! Convenient imports for spanstore.
//!
//! ```ignore
//! use spanstore::prelude::*;
//!
//! let store = Store::ephemeral()?;
//! store.write_span(&span)?;
//! ```

// Main entry point
pub use crate::database::{Store, StoreBuilder};

// Plugin surface
pub use crate::plugin::{DependencyReader, SpanReader, SpanWriter};

// Error handling
pub use crate::error::{Error, ErrorKind, Result};

// Model and queries
pub use crate::types::{
    micros_to_time, KeyValue, PayloadBackend, Process, QueryContext, Span, SpanId, Trace,
    TraceId, TraceQueryParameters,
};
