//! Wire encoding for spanstore
//!
//! This crate implements the span codec contract: a span is serialized to an
//! opaque byte payload before it is handed to a storage engine, and payloads
//! read back from storage are deserialized into spans.
//!
//! ## Codecs
//!
//! | Codec | Format | Used for |
//! |-------|--------|----------|
//! | [`MsgPackCodec`] | MessagePack, named fields | Stored payloads (default) |
//! | [`JsonCodec`] | JSON | CLI input/output, debugging |
//!
//! ## Frames
//!
//! [`frame`] packs several payloads into one length-prefixed blob, which is
//! how the blob payload store keeps all spans of a trace under one key.
//!
//! ## Example
//!
//! ```
//! use spanstore_core::{micros_to_time, Span, SpanId, TraceId};
//! use spanstore_wire::{MsgPackCodec, SpanCodec};
//!
//! let span = Span::new(TraceId::new(0, 1), SpanId(2), "checkout", "pay", micros_to_time(10));
//! let codec = MsgPackCodec;
//! let bytes = codec.encode(&span).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), span);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod frame;

mod codec;

pub use codec::{JsonCodec, MsgPackCodec, SpanCodec};
