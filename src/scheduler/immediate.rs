use std::{cell::RefCell, collections::VecDeque};

use super::{Scheduler, Task};

thread_local! {
  static TRAMPOLINE: RefCell<Option<VecDeque<Task>>> = const { RefCell::new(None) };
}

/// Runs tasks on the calling thread before `spawn` returns.
///
/// Tasks spawned while another immediate task is running on the same thread
/// are queued and run by the outermost `spawn` once the current task
/// returns, so the stack stays flat. Publishers on this scheduler become fully
/// deterministic, which is what the tests use it for.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn spawn(&self, task: Task) {
    let mut task = Some(task);
    TRAMPOLINE.with(|queue| {
      if let Some(queue) = queue.borrow_mut().as_mut() {
        queue.extend(task.take());
      }
    });
    let Some(task) = task else { return };

    TRAMPOLINE.with(|queue| *queue.borrow_mut() = Some(VecDeque::new()));
    let _reset = ResetTrampoline;
    task();
    while let Some(next) = TRAMPOLINE.with(|queue| queue.borrow_mut().as_mut()?.pop_front()) {
      next();
    }
  }
}

struct ResetTrampoline;

impl Drop for ResetTrampoline {
  fn drop(&mut self) { TRAMPOLINE.with(|queue| *queue.borrow_mut() = None); }
}
