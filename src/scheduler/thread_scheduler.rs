use tracing::warn;

use super::{Scheduler, Task};

/// Spawns a new OS thread for every task.
#[derive(Debug, Clone, Default)]
pub struct NewThreadScheduler {
  name: Option<String>,
}

impl NewThreadScheduler {
  /// Names every spawned thread `name`.
  pub fn named(name: impl Into<String>) -> Self { NewThreadScheduler { name: Some(name.into()) } }
}

impl Scheduler for NewThreadScheduler {
  fn spawn(&self, task: Task) {
    let mut builder = std::thread::Builder::new();
    if let Some(name) = &self.name {
      builder = builder.name(name.clone());
    }
    // `Builder::spawn` drops the closure when it fails; keep the task
    // reachable for the inline fallback.
    let slot = std::sync::Arc::new(parking_lot::Mutex::new(Some(task)));
    let runner = slot.clone();
    if let Err(err) = builder.spawn(move || {
      if let Some(task) = runner.lock().take() {
        task();
      }
    }) {
      warn!(%err, "failed to spawn scheduler thread, running task inline");
      if let Some(task) = slot.lock().take() {
        task();
      }
    }
  }
}
