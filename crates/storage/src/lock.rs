//! Storage directory lockfile

use spanstore_core::StorageError;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Lockfile name inside a storage directory
pub const LOCK_FILE: &str = "lock";

/// Exclusive claim on a storage directory, released on drop
///
/// The lockfile holds the owner's pid. A lockfile left behind by a crashed
/// process must be removed by hand.
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
}

impl DirLock {
    /// Create the lockfile, failing with `Locked` if it already exists
    pub fn acquire(dir: &Path) -> Result<Self, StorageError> {
        let path = dir.join(LOCK_FILE);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id())?;
                file.sync_all()?;
                debug!(path = %path.display(), "Acquired directory lock");
                Ok(DirLock { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StorageError::Locked(path)),
            Err(e) => Err(e.into()),
        }
    }

    /// Lockfile path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove lockfile");
        }
    }
}
