//! WAL fsync policy
//!
//! Defines when committed samples and blob writes reach stable storage.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When WAL appends are fsynced
///
/// Serialized with a `mode` tag, e.g. `{ mode = "batched", interval_ms = 100, batch_size = 1000 }`.
///
/// # Loss window
///
/// | Mode | Loss window on crash | Use Case |
/// |------|----------------------|----------|
/// | None | Everything | Tests, ephemeral stores |
/// | Batched | Up to `batch_size` commits or `interval_ms` | Production (balanced) |
/// | Strict | Nothing committed | Audit-grade ingestion |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DurabilityMode {
    /// No WAL; a restart starts empty
    None,

    /// Every append is fsynced before it returns
    Strict,

    /// fsync once `batch_size` appends are pending or `interval_ms` passed
    Batched {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum commits between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Whether appends go through the WAL at all
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::None)
    }

    /// Whether `pending` unsynced appends, last synced `since_sync` ago,
    /// must be fsynced now
    pub fn should_sync(&self, pending: usize, since_sync: Duration) -> bool {
        match *self {
            DurabilityMode::None => false,
            DurabilityMode::Strict => pending > 0,
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                pending >= batch_size.max(1)
                    || (pending > 0 && since_sync >= Duration::from_millis(interval_ms))
            }
        }
    }

    /// Stable name used in logs and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            DurabilityMode::None => "none",
            DurabilityMode::Strict => "strict",
            DurabilityMode::Batched { .. } => "batched",
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}
