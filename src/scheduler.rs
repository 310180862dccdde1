//! Execution contexts.
//!
//! A [`Scheduler`] runs boxed tasks somewhere else (a thread pool, a fresh
//! thread, a tokio runtime, or the calling thread). Publishers never talk to
//! a scheduler directly: each asynchronous subscription owns a
//! [`SerialQueue`] on top of one, which turns "run this somewhere" into "run
//! this after everything dispatched before it, and never at the same time".
use std::sync::Arc;

mod immediate;
mod serial;
mod thread_scheduler;
#[cfg(feature = "futures-scheduler")]
mod thread_pool_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use immediate::ImmediateScheduler;
pub use serial::SerialQueue;
pub use thread_scheduler::NewThreadScheduler;
#[cfg(feature = "futures-scheduler")]
pub use thread_pool_scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// A unit of work handed to a scheduler.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A Scheduler is an object that runs tasks, possibly on another thread.
///
/// `spawn` must not block waiting for the task to finish.
pub trait Scheduler: Send + Sync {
  fn spawn(&self, task: Task);
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  #[inline]
  fn spawn(&self, task: Task) { (**self).spawn(task) }
}

impl<S: Scheduler + ?Sized> Scheduler for Box<S> {
  #[inline]
  fn spawn(&self, task: Task) { (**self).spawn(task) }
}

/// The scheduler publishers use when none is configured: the shared thread
/// pool with the `futures-scheduler` feature, a new thread per drain
/// otherwise.
pub fn default_scheduler() -> Arc<dyn Scheduler> {
  #[cfg(feature = "futures-scheduler")]
  {
    Arc::new(ThreadPoolScheduler::shared())
  }
  #[cfg(not(feature = "futures-scheduler"))]
  {
    Arc::new(NewThreadScheduler::default())
  }
}
