//! Engine options

use spanstore_core::StorageError;
use spanstore_durability::{DurabilityMode, DEFAULT_SEGMENT_SIZE};
use std::time::Duration;

/// Default block ranges: 10m, 1h, 2h, 10h, 50h
pub fn default_block_ranges() -> Vec<Duration> {
    [10 * 60, 60 * 60, 2 * 60 * 60, 10 * 60 * 60, 50 * 60 * 60]
        .into_iter()
        .map(Duration::from_secs)
        .collect()
}

/// Time-series engine options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsdbOptions {
    /// How far behind the newest sample data is kept
    pub retention: Duration,
    /// WAL segment size in bytes
    pub wal_segment_size: u64,
    /// Block ranges, ascending; the smallest one aligns the retention cutoff
    pub block_ranges: Vec<Duration>,
    /// Skip the directory lockfile
    pub no_lockfile: bool,
    /// WAL fsync policy; `None` disables the WAL
    pub durability: DurabilityMode,
}

impl Default for TsdbOptions {
    fn default() -> Self {
        TsdbOptions {
            retention: Duration::from_secs(60 * 60),
            wal_segment_size: DEFAULT_SEGMENT_SIZE,
            block_ranges: default_block_ranges(),
            no_lockfile: true,
            durability: DurabilityMode::default(),
        }
    }
}

impl TsdbOptions {
    /// Options with the given retention and defaults elsewhere
    pub fn with_retention(retention: Duration) -> Self {
        TsdbOptions {
            retention,
            ..Default::default()
        }
    }

    /// Reject unusable values
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.retention.is_zero() {
            return Err(StorageError::InvalidOptions("retention must be positive".into()));
        }
        if self.wal_segment_size == 0 {
            return Err(StorageError::InvalidOptions("WAL segment size must be positive".into()));
        }
        if self.block_ranges.iter().any(|r| r.is_zero()) {
            return Err(StorageError::InvalidOptions("block ranges must be positive".into()));
        }
        if self.block_ranges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(StorageError::InvalidOptions(
                "block ranges must be strictly ascending".into(),
            ));
        }
        Ok(())
    }

    /// Oldest timestamp kept when the newest sample is at `max_time`
    ///
    /// `max_time - retention`, aligned down to the smallest block range.
    pub fn retention_cutoff(&self, max_time: i64) -> i64 {
        let retention = duration_micros(self.retention);
        let raw = max_time.saturating_sub(retention);
        match self.block_ranges.first().map(|r| duration_micros(*r)) {
            Some(step) if step > 0 => raw.div_euclid(step) * step,
            _ => raw,
        }
    }
}

fn duration_micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}
