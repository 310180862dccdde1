use tokio::runtime::Handle;

use super::{Scheduler, Task};

/// Runs tasks on a tokio runtime's blocking pool.
///
/// Subscriber callbacks are plain synchronous code that may block, so they
/// are kept off the async worker threads.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  pub fn new(handle: Handle) -> Self { TokioScheduler { handle } }

  /// The runtime the caller is running on, if any.
  pub fn try_current() -> Option<Self> { Handle::try_current().ok().map(Self::new) }
}

impl Scheduler for TokioScheduler {
  fn spawn(&self, task: Task) {
    // Detached: the join handle is not needed to keep the task running.
    drop(self.handle.spawn_blocking(task));
  }
}
