//! Cancellation context for read requests
//!
//! A [`QueryContext`] carries a shared cancel flag and an optional deadline.
//! Readers call [`QueryContext::check`] at iteration boundaries and bail out
//! with [`Error::Cancelled`] or [`Error::DeadlineExceeded`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Cancellation-capable request context
///
/// Cloning shares the cancel flag, so a clone handed to another thread can
/// cancel the request.
///
/// # Example
///
/// ```
/// use spanstore_core::QueryContext;
///
/// let ctx = QueryContext::background();
/// let handle = ctx.clone();
/// handle.cancel();
/// assert!(ctx.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl QueryContext {
    /// Context that is never cancelled on its own
    pub fn background() -> Self {
        Self::default()
    }

    /// Context that expires after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        QueryContext {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail if cancelled or past the deadline
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
