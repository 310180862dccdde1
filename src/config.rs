//! Runtime configuration shared by the asynchronous publishers.
use std::{fmt, num::NonZeroUsize, sync::Arc};

use crate::scheduler::{default_scheduler, Scheduler};

/// Elements a production pass emits before it yields its execution context.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
  Some(size) => size,
  None => unreachable!(),
};

/// How an asynchronous publisher runs its subscriptions.
///
/// `batch_size` bounds one production pass: after that many elements the
/// pass is rescheduled behind whatever else is queued for the subscription
/// (a `cancel`, a new `request`) instead of looping on. Any positive value
/// keeps every contract guarantee; it only trades latency for throughput.
#[derive(Clone)]
pub struct PublisherConfig {
  pub batch_size: NonZeroUsize,
  pub scheduler: Arc<dyn Scheduler>,
}

impl PublisherConfig {
  pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
    self.batch_size = batch_size;
    self
  }

  pub fn with_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
    self.scheduler = Arc::new(scheduler);
    self
  }
}

impl Default for PublisherConfig {
  fn default() -> Self {
    PublisherConfig { batch_size: DEFAULT_BATCH_SIZE, scheduler: default_scheduler() }
  }
}

impl fmt::Debug for PublisherConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PublisherConfig")
      .field("batch_size", &self.batch_size)
      .finish_non_exhaustive()
  }
}
