//! Span codecs

use spanstore_core::{CodecError, Span};

/// Serialize spans to opaque payloads and back
pub trait SpanCodec: Send + Sync + std::fmt::Debug {
    /// Short codec name for logs
    fn name(&self) -> &'static str;

    /// Serialize a span
    fn encode(&self, span: &Span) -> Result<Vec<u8>, CodecError>;

    /// Deserialize a span
    fn decode(&self, bytes: &[u8]) -> Result<Span, CodecError>;
}

/// MessagePack with named fields
///
/// Named fields keep payloads readable by newer versions that add optional
/// span fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl SpanCodec for MsgPackCodec {
    fn name(&self) -> &'static str {
        "msgpack"
    }

    fn encode(&self, span: &Span) -> Result<Vec<u8>, CodecError> {
        rmp_serde::to_vec_named(span).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Span, CodecError> {
        rmp_serde::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Decode a JSON array of spans
    pub fn decode_many(&self, bytes: &[u8]) -> Result<Vec<Span>, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

impl SpanCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, span: &Span) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(span).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Span, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
