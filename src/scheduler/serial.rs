use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use super::{Scheduler, Task};

/// Tasks one drain runs before handing its thread back to the scheduler.
const DRAIN_BUDGET: usize = 64;

/// A strictly sequential task queue on top of any [`Scheduler`].
///
/// Tasks run in dispatch order, one at a time, and each task observes every
/// memory effect of the tasks before it. At most one drain is alive per queue;
/// a task dispatched while the queue is draining (including from inside a
/// running task) is appended and picked up by that same drain, so dispatching
/// never recurses.
#[derive(Clone)]
pub struct SerialQueue {
  scheduler: Arc<dyn Scheduler>,
  state: Arc<Mutex<QueueState>>,
}

#[derive(Default)]
struct QueueState {
  tasks: VecDeque<Task>,
  running: bool,
}

impl SerialQueue {
  pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
    SerialQueue { scheduler, state: Arc::new(Mutex::new(QueueState::default())) }
  }

  /// Enqueues `task` behind every task dispatched before it.
  pub fn dispatch(&self, task: impl FnOnce() + Send + 'static) {
    {
      let mut state = self.state.lock();
      state.tasks.push_back(Box::new(task));
      if state.running {
        return;
      }
      state.running = true;
    }
    spawn_drain(self.scheduler.clone(), self.state.clone());
  }

  /// `true` when nothing is queued or running.
  pub fn is_idle(&self) -> bool {
    let state = self.state.lock();
    !state.running && state.tasks.is_empty()
  }
}

fn spawn_drain(scheduler: Arc<dyn Scheduler>, state: Arc<Mutex<QueueState>>) {
  let respawn_on = scheduler.clone();
  scheduler.spawn(Box::new(move || {
    if drain(&state) {
      spawn_drain(respawn_on, state);
    }
  }));
}

/// Runs queued tasks until the queue is empty or the budget is spent.
/// Returns `true` when tasks remain and the drain must be rescheduled.
fn drain(state: &Mutex<QueueState>) -> bool {
  let _guard = Draining(state);
  for _ in 0..DRAIN_BUDGET {
    let task = {
      let mut state = state.lock();
      match state.tasks.pop_front() {
        Some(task) => task,
        None => {
          state.running = false;
          return false;
        }
      }
    };
    task();
  }
  true
}

/// Releases the drain slot if a task unwinds, so the queue is not wedged.
struct Draining<'a>(&'a Mutex<QueueState>);

impl Drop for Draining<'_> {
  fn drop(&mut self) {
    if std::thread::panicking() {
      self.0.lock().running = false;
    }
  }
}
