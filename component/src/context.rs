//! The ambient invocation context handed to condition checks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Deadline and cancellation for a bootstrap operation.
///
/// Clones share the cancellation flag, so cancelling any clone cancels all of
/// them. Derived contexts keep the earlier of the two deadlines.
#[derive(Debug, Clone, Default)]
pub struct Context {
  deadline: Option<Instant>,
  cancelled: Arc<AtomicBool>,
}

impl Context {
  /// A context that is never done unless cancelled.
  pub fn background() -> Self {
    Self::default()
  }

  pub fn with_timeout(&self, timeout: Duration) -> Self {
    self.with_deadline(Instant::now() + timeout)
  }

  pub fn with_deadline(&self, deadline: Instant) -> Self {
    let deadline = match self.deadline {
      Some(existing) if existing < deadline => existing,
      _ => deadline,
    };
    Self {
      deadline: Some(deadline),
      cancelled: Arc::clone(&self.cancelled),
    }
  }

  pub fn deadline(&self) -> Option<Instant> {
    self.deadline
  }

  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::Release);
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::Acquire)
  }

  /// Cancelled, or past the deadline.
  pub fn is_done(&self) -> bool {
    self.is_cancelled() || self.deadline.map_or(false, |deadline| Instant::now() >= deadline)
  }
}
