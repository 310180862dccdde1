use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use super::Subscriber;
use crate::{error::StreamError, subscription::SubscriptionHandle};

/// One signal as seen by a [`RecordingSubscriber`].
#[derive(Debug, Clone)]
pub enum Signal<T> {
  Subscribe,
  Next(T),
  Error(StreamError),
  Complete,
}

impl<T> Signal<T> {
  pub fn is_terminal(&self) -> bool { matches!(self, Signal::Error(_) | Signal::Complete) }
}

/// A subscriber that records every signal it receives, in order.
///
/// It requests `initial_request` elements from inside `on_subscribe` (none
/// when zero) and otherwise leaves demand to whoever holds it, through
/// [`request`](Self::request) and [`cancel`](Self::cancel). The `await_*`
/// methods block the calling thread until a condition holds or a timeout
/// passes, which is how tests join asynchronous publishers.
///
/// Unlike the other reference subscribers it never asserts: signals that
/// break the contract are recorded as they arrive so they can be inspected.
pub struct RecordingSubscriber<T> {
  initial_request: i64,
  state: Mutex<Recording<T>>,
  signaled: Condvar,
}

struct Recording<T> {
  subscription: Option<SubscriptionHandle>,
  subscribed: bool,
  signals: Vec<Signal<T>>,
}

impl<T> RecordingSubscriber<T> {
  pub fn new(initial_request: i64) -> Self {
    RecordingSubscriber {
      initial_request,
      state: Mutex::new(Recording { subscription: None, subscribed: false, signals: Vec::new() }),
      signaled: Condvar::new(),
    }
  }

  /// Requests `i64::MAX`, i.e. everything, as soon as it is subscribed.
  pub fn unbounded() -> Self { Self::new(i64::MAX) }

  /// Forwards to the current subscription, if any.
  pub fn request(&self, count: i64) {
    let subscription = self.state.lock().subscription.clone();
    if let Some(subscription) = subscription {
      subscription.request(count);
    }
  }

  /// Cancels and forgets the current subscription, if any.
  pub fn cancel(&self) {
    let subscription = self.state.lock().subscription.take();
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }

  pub fn signals(&self) -> Vec<Signal<T>>
  where
    T: Clone,
  {
    self.state.lock().signals.clone()
  }

  pub fn elements(&self) -> Vec<T>
  where
    T: Clone,
  {
    let state = self.state.lock();
    state
      .signals
      .iter()
      .filter_map(|signal| match signal {
        Signal::Next(element) => Some(element.clone()),
        _ => None,
      })
      .collect()
  }

  pub fn errors(&self) -> Vec<StreamError> {
    let state = self.state.lock();
    state
      .signals
      .iter()
      .filter_map(|signal| match signal {
        Signal::Error(err) => Some(err.clone()),
        _ => None,
      })
      .collect()
  }

  pub fn next_count(&self) -> usize { Self::count_next(&self.state.lock()) }

  pub fn subscribe_count(&self) -> usize {
    self.state.lock().signals.iter().filter(|s| matches!(s, Signal::Subscribe)).count()
  }

  pub fn complete_count(&self) -> usize {
    self.state.lock().signals.iter().filter(|s| matches!(s, Signal::Complete)).count()
  }

  pub fn terminal_count(&self) -> usize {
    self.state.lock().signals.iter().filter(|s| s.is_terminal()).count()
  }

  pub fn is_complete(&self) -> bool { self.complete_count() > 0 }

  pub fn is_terminated(&self) -> bool { self.terminal_count() > 0 }

  /// `true` while a subscription is held, i.e. subscribed and neither
  /// terminated nor canceled.
  pub fn has_subscription(&self) -> bool { self.state.lock().subscription.is_some() }

  /// Blocks until a terminal signal arrives. Returns `false` on timeout.
  pub fn await_terminal(&self, timeout: Duration) -> bool {
    self.await_until(timeout, |state| state.signals.iter().any(Signal::is_terminal))
  }

  /// Blocks until at least `count` elements arrived. Returns `false` on
  /// timeout.
  pub fn await_next_count(&self, count: usize, timeout: Duration) -> bool {
    self.await_until(timeout, |state| Self::count_next(state) >= count)
  }

  fn await_until(&self, timeout: Duration, done: impl Fn(&Recording<T>) -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    let mut state = self.state.lock();
    while !done(&state) {
      if self.signaled.wait_until(&mut state, deadline).timed_out() {
        return done(&state);
      }
    }
    true
  }

  fn count_next(state: &Recording<T>) -> usize {
    state.signals.iter().filter(|s| matches!(s, Signal::Next(_))).count()
  }

  fn record(&self, mut state: MutexGuard<'_, Recording<T>>, signal: Signal<T>) {
    if signal.is_terminal() {
      state.subscription = None;
    }
    state.signals.push(signal);
    drop(state);
    self.signaled.notify_all();
  }
}

impl<T: Send> Subscriber<T> for RecordingSubscriber<T> {
  fn on_subscribe(&self, subscription: SubscriptionHandle) {
    let mut state = self.state.lock();
    if state.subscription.is_some() {
      drop(state);
      subscription.cancel();
      return;
    }
    state.subscription = Some(subscription.clone());
    state.subscribed = true;
    self.record(state, Signal::Subscribe);
    if self.initial_request != 0 {
      subscription.request(self.initial_request);
    }
  }

  fn on_next(&self, element: T) { self.record(self.state.lock(), Signal::Next(element)); }

  fn on_error(&self, error: StreamError) { self.record(self.state.lock(), Signal::Error(error)); }

  fn on_complete(&self) { self.record(self.state.lock(), Signal::Complete); }
}
