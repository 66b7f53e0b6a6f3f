//! Durability layer for spanstore
//!
//! This crate implements write-ahead logging for the storage engines:
//! - WAL: segmented, append-only write-ahead log
//! - WalEntry types: Samples, BlobPut
//! - Entry encoding/decoding with CRC32 checksums
//! - Durability modes: None, Strict, Batched (default)
//! - Recovery: replay segments in order, truncating torn tails

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod mode;
pub mod recovery;
pub mod wal;

pub use encoding::{decode_entry, encode_entry, EncodingError};
pub use mode::DurabilityMode;
pub use recovery::ReplayStats;
pub use wal::{SampleRecord, SegmentMeta, Wal, WalEntry, WalError, WalOptions, DEFAULT_SEGMENT_SIZE};
