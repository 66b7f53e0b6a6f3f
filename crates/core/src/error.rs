//! Error types for spanstore
//!
//! Three layers of errors:
//! - [`StorageError`]: failures surfaced by a time-series engine or blob store
//! - [`CodecError`]: span encode/decode failures
//! - [`Error`]: what callers of the span reader/writer receive
//!
//! [`Error::kind`] separates "your query was invalid" from "the store failed"
//! from "this isn't supported yet", so hosts can decide whether to retry,
//! surface a user error, or treat the capability as degraded.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::TraceId;

/// Result type for spanstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by a storage engine
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The handle was closed
    #[error("storage is closed")]
    Closed,

    /// Another process holds the directory lock
    #[error("storage directory is locked: {}", .0.display())]
    Locked(PathBuf),

    /// Sample is older than the retained window
    #[error("sample timestamp {timestamp} is out of bounds (min valid {min_valid})")]
    OutOfBounds {
        /// Rejected timestamp
        timestamp: i64,
        /// Oldest accepted timestamp
        min_valid: i64,
    },

    /// Label set cannot be indexed
    #[error("invalid label set: {0}")]
    InvalidLabels(String),

    /// On-disk or in-index data is damaged
    #[error("corruption: {0}")]
    Corruption(String),

    /// Invalid engine options
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

/// Span encode/decode errors
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serialization failed
    #[error("encode failed: {0}")]
    Encode(String),

    /// Deserialization failed
    #[error("decode failed: {0}")]
    Decode(String),
}

/// The operation during which an engine failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Opening the storage
    Open,
    /// Closing the storage
    Close,
    /// Writing a span
    WriteSpan,
    /// Trace lookup by id
    GetTrace,
    /// Listing services
    GetServices,
    /// Listing operations
    GetOperations,
    /// Finding traces
    FindTraces,
    /// Finding trace ids
    FindTraceIds,
    /// Listing dependencies
    GetDependencies,
}

impl Operation {
    /// Stable name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Open => "open",
            Operation::Close => "close",
            Operation::WriteSpan => "write_span",
            Operation::GetTrace => "get_trace",
            Operation::GetServices => "get_services",
            Operation::GetOperations => "get_operations",
            Operation::FindTraces => "find_traces",
            Operation::FindTraceIds => "find_trace_ids",
            Operation::GetDependencies => "get_dependencies",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller sent an invalid request
    Validation,
    /// Request is well-formed but uses an unimplemented feature
    NotSupported,
    /// Storage or codec failed
    EngineFailure,
    /// Requested trace does not exist
    NotFound,
    /// Request was cancelled or timed out
    Cancelled,
    /// Invalid configuration
    Configuration,
}

/// All spanstore errors
#[derive(Debug, Error)]
pub enum Error {
    /// Query object was absent
    #[error("malformed request object")]
    MalformedRequest,

    /// Query has an empty service name
    #[error("service name must be set")]
    ServiceNameNotSet,

    /// A start-time bound is missing
    #[error("start and end time must be set")]
    StartAndEndTimeNotSet,

    /// Start-time max precedes min
    #[error("min start time is above max")]
    StartTimeMinGreaterThanMax,

    /// Duration min exceeds max
    #[error("min duration is above max")]
    DurationMinGreaterThanMax,

    /// Query parameter accepted but not implemented
    #[error("this query parameter is not supported yet: {0}")]
    NotSupported(String),

    /// Engine failure
    #[error("{operation}: {source}")]
    Storage {
        /// Failing operation
        operation: Operation,
        /// Underlying error
        #[source]
        source: StorageError,
    },

    /// Codec failure
    #[error("{operation}: {source}")]
    Codec {
        /// Failing operation
        operation: Operation,
        /// Underlying error
        #[source]
        source: CodecError,
    },

    /// No spans stored for the trace
    #[error("trace not found: {0}")]
    TraceNotFound(TraceId),

    /// Trace id string could not be parsed
    #[error("invalid trace id: {0:?}")]
    InvalidTraceId(String),

    /// Span id string could not be parsed
    #[error("invalid span id: {0:?}")]
    InvalidSpanId(String),

    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// Request deadline passed
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a storage error with the failing operation
    pub fn storage(operation: Operation, source: StorageError) -> Self {
        Error::Storage { operation, source }
    }

    /// Wrap a codec error with the failing operation
    pub fn codec(operation: Operation, source: CodecError) -> Self {
        Error::Codec { operation, source }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedRequest
            | Error::ServiceNameNotSet
            | Error::StartAndEndTimeNotSet
            | Error::StartTimeMinGreaterThanMax
            | Error::DurationMinGreaterThanMax
            | Error::InvalidTraceId(_)
            | Error::InvalidSpanId(_) => ErrorKind::Validation,
            Error::NotSupported(_) => ErrorKind::NotSupported,
            Error::Storage { .. } | Error::Codec { .. } => ErrorKind::EngineFailure,
            Error::TraceNotFound(_) => ErrorKind::NotFound,
            Error::Cancelled | Error::DeadlineExceeded => ErrorKind::Cancelled,
            Error::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Check if this is a caller mistake
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if the store failed
    pub fn is_engine_failure(&self) -> bool {
        self.kind() == ErrorKind::EngineFailure
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Operation attached to an engine failure
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Error::Storage { operation, .. } | Error::Codec { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}
