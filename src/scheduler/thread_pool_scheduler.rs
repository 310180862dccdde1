use futures::{executor::ThreadPool, future};
use once_cell::sync::Lazy;
use tracing::warn;

use super::{Scheduler, Task};

static DEFAULT_POOL: Lazy<Option<ThreadPool>> = Lazy::new(|| {
  ThreadPool::builder()
    .name_prefix("reactive-streams-")
    .create()
    .map_err(|err| warn!(%err, "failed to create the shared thread pool"))
    .ok()
});

/// Runs tasks on a `futures` thread pool.
///
/// [`ThreadPoolScheduler::shared`] uses one lazily created, process-wide
/// pool; [`ThreadPoolScheduler::new`] wraps a pool of the caller's choosing.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: Option<ThreadPool>,
}

impl ThreadPoolScheduler {
  pub fn new(pool: ThreadPool) -> Self { ThreadPoolScheduler { pool: Some(pool) } }

  pub fn shared() -> Self { ThreadPoolScheduler { pool: DEFAULT_POOL.clone() } }
}

impl Scheduler for ThreadPoolScheduler {
  fn spawn(&self, task: Task) {
    match &self.pool {
      Some(pool) => pool.spawn_ok(future::lazy(move |_| task())),
      // No pool could be built; fall back to a plain thread.
      None => {
        std::thread::spawn(task);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{sync::mpsc, time::Duration};

  use super::*;

  #[reactive_streams_macro::test]
  fn shared_pool_runs_tasks() {
    let (tx, rx) = mpsc::channel();
    let scheduler = ThreadPoolScheduler::shared();
    for i in 0..4 {
      let tx = tx.clone();
      scheduler.spawn(Box::new(move || {
        tx.send(i).ok();
      }));
    }
    let mut seen: Vec<i32> =
      (0..4).map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap()).collect();
    seen.sort();
    assert_eq!(seen, vec![0, 1, 2, 3]);
  }
}
