//! # spanstore
//!
//! Span storage for distributed tracing, built on a label-indexed
//! time-series engine and an optional blob store.
//!
//! Every span becomes one sample at its start time, labelled with its
//! service, operation, trace id and tags. Trace searches are label matcher
//! queries over a time range; trace-by-id lookups read either the samples
//! themselves or a per-trace blob.
//!
//! ## Quick Start
//!
//! ```ignore
//! use spanstore::prelude::*;
//!
//! let store = Store::open("./spans")?;
//! store.write_span(&span)?;
//!
//! let ctx = QueryContext::background();
//! let query = TraceQueryParameters::new("checkout", from, to).with_tag("error", "true");
//! let traces = store.find_traces(&ctx, Some(&query))?;
//!
//! store.close()?;
//! ```
//!
//! ## Layers
//!
//! - [`Store`] / [`StoreBuilder`]: open, configure, close
//! - [`SpanWriter`], [`SpanReader`], [`DependencyReader`]: the plugin surface
//! - `spanstore-engine`: label mapping, validation, query translation
//! - `spanstore-storage`: time-series engine and blob store
//! - `spanstore-durability`: write-ahead log

#![warn(missing_docs)]

mod database;
mod error;
mod plugin;
mod types;

pub mod prelude;

// Re-export main entry points
pub use database::{Store, StoreBuilder};
pub use error::{CodecError, Error, ErrorKind, Operation, Result, StorageError};
pub use plugin::{DependencyReader, SpanReader, SpanWriter};

// Re-export types
pub use types::*;
