//! Engine configuration
//!
//! Loaded from TOML; every field has a default so a partial file works:
//!
//! ```toml
//! storage_path = "/var/lib/spanstore"
//! retention_secs = 3600
//! payload_backend = "blob"
//! lockfile = true
//!
//! [durability]
//! mode = "batched"
//! interval_ms = 100
//! batch_size = 1000
//! ```

use serde::{Deserialize, Serialize};
use spanstore_core::{Error, Result};
use spanstore_durability::{DurabilityMode, DEFAULT_SEGMENT_SIZE};
use spanstore_storage::{BlobOptions, TsdbOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where get-trace reads span payloads from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadBackend {
    /// Sample payloads in the time-series engine
    #[default]
    Series,
    /// One blob per trace in the blob store
    Blob,
}

impl PayloadBackend {
    /// Stable name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadBackend::Series => "series",
            PayloadBackend::Blob => "blob",
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Storage root; the engines live in `tsdb/` and `blob/` below it
    pub storage_path: PathBuf,
    /// Data retention in seconds
    pub retention_secs: u64,
    /// Payload source for get-trace
    pub payload_backend: PayloadBackend,
    /// Take a lockfile on the storage directories
    pub lockfile: bool,
    /// WAL segment size in bytes
    pub wal_segment_size: u64,
    /// WAL fsync policy
    pub durability: DurabilityMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            storage_path: PathBuf::from("./spanstore-data"),
            retention_secs: 3600,
            payload_backend: PayloadBackend::default(),
            lockfile: false,
            wal_segment_size: DEFAULT_SEGMENT_SIZE,
            durability: DurabilityMode::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject unusable values
    pub fn validate(&self) -> Result<()> {
        if self.retention_secs == 0 {
            return Err(Error::Config("retention_secs must be positive".into()));
        }
        if self.wal_segment_size == 0 {
            return Err(Error::Config("wal_segment_size must be positive".into()));
        }
        if let DurabilityMode::Batched { batch_size: 0, .. } = self.durability {
            return Err(Error::Config("durability.batch_size must be positive".into()));
        }
        Ok(())
    }

    /// Retention as a duration
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Time-series engine options
    pub fn tsdb_options(&self) -> TsdbOptions {
        TsdbOptions {
            retention: self.retention(),
            wal_segment_size: self.wal_segment_size,
            no_lockfile: !self.lockfile,
            durability: self.durability,
            ..TsdbOptions::default()
        }
    }

    /// Blob store options
    pub fn blob_options(&self) -> BlobOptions {
        BlobOptions {
            wal_segment_size: self.wal_segment_size,
            no_lockfile: !self.lockfile,
            durability: self.durability,
        }
    }
}
