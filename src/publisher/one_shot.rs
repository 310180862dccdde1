use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
  config::PublisherConfig,
  error::StreamError,
  publisher::Publisher,
  scheduler::SerialQueue,
  subscriber::{AnySubscriber, Subscriber},
  subscription::{CanceledSubscription, Subscription},
};

/// Emits one value to exactly one subscriber, asynchronously.
///
/// The value moves to the first subscriber; every later subscriber is
/// refused with `on_subscribe` of an inert subscription followed by
/// [`StreamError::MultipleSubscribers`]. All signals are delivered on the
/// publisher's own sequential queue.
pub struct OneShotPublisher<T> {
  value: Mutex<Option<T>>,
  subscribed: AtomicBool,
  queue: SerialQueue,
}

impl<T> OneShotPublisher<T> {
  pub fn new(value: T) -> Self { Self::with_config(value, PublisherConfig::default()) }

  /// Only the scheduler of `config` is used.
  pub fn with_config(value: T, config: PublisherConfig) -> Self {
    OneShotPublisher {
      value: Mutex::new(Some(value)),
      subscribed: AtomicBool::new(false),
      queue: SerialQueue::new(config.scheduler),
    }
  }

  pub fn is_subscribed(&self) -> bool { self.subscribed.load(Ordering::Acquire) }
}

impl<T: Send + 'static> Publisher<T> for OneShotPublisher<T> {
  fn subscribe(&self, subscriber: AnySubscriber<T>) {
    if self.subscribed.swap(true, Ordering::AcqRel) {
      warn!("one-shot publisher refused a second subscriber");
      self.queue.dispatch(move || {
        subscriber.on_subscribe(CanceledSubscription::handle());
        subscriber.on_error(StreamError::MultipleSubscribers);
      });
      return;
    }

    let subscription = Arc::new(OneShotSubscription {
      queue: self.queue.clone(),
      session: Arc::new(Session {
        canceled: AtomicBool::new(false),
        state: Mutex::new(SessionState {
          subscriber: Some(subscriber.clone()),
          value: self.value.lock().take(),
        }),
      }),
    });
    self.queue.dispatch(move || subscriber.on_subscribe(subscription));
  }
}

struct OneShotSubscription<T> {
  queue: SerialQueue,
  session: Arc<Session<T>>,
}

struct Session<T> {
  canceled: AtomicBool,
  state: Mutex<SessionState<T>>,
}

struct SessionState<T> {
  /// Cleared once the subscription has terminated or been canceled.
  subscriber: Option<AnySubscriber<T>>,
  value: Option<T>,
}

impl<T: Send + 'static> Subscription for OneShotSubscription<T> {
  fn request(&self, count: i64) {
    let session = self.session.clone();
    self.queue.dispatch(move || session.deliver(count));
  }

  fn cancel(&self) {
    if self.session.canceled.swap(true, Ordering::AcqRel) {
      return;
    }
    let session = self.session.clone();
    self.queue.dispatch(move || {
      let mut state = session.state.lock();
      state.subscriber = None;
      state.value = None;
    });
  }
}

impl<T> Session<T> {
  fn is_canceled(&self) -> bool { self.canceled.load(Ordering::Acquire) }

  fn deliver(&self, count: i64) {
    if self.is_canceled() {
      return;
    }
    let (subscriber, value) = {
      let mut state = self.state.lock();
      let Some(subscriber) = state.subscriber.take() else { return };
      (subscriber, state.value.take())
    };

    if count < 1 {
      warn!(count, "non-positive request, terminating subscription");
      self.canceled.store(true, Ordering::Release);
      subscriber.on_error(StreamError::IllegalRequest { count });
      return;
    }
    if let Some(value) = value {
      subscriber.on_next(value);
    }
    if !self.is_canceled() {
      debug!("one-shot publisher completed");
      subscriber.on_complete();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::{
    scheduler::ImmediateScheduler,
    subscriber::{RecordingSubscriber, Signal},
  };

  fn immediate<T>(value: T) -> OneShotPublisher<T> {
    let config = PublisherConfig::default().with_scheduler(ImmediateScheduler);
    OneShotPublisher::with_config(value, config)
  }

  #[reactive_streams_macro::test]
  fn delivers_once_then_completes() {
    let publisher = immediate(42);
    let probe = Arc::new(RecordingSubscriber::new(0));
    publisher.subscribe(AnySubscriber::from(probe.clone()));
    assert!(publisher.is_subscribed());
    assert_eq!(probe.signals().len(), 1);

    probe.request(1);
    assert!(matches!(
      probe.signals().as_slice(),
      [Signal::Subscribe, Signal::Next(42), Signal::Complete]
    ));
  }

  #[reactive_streams_macro::test]
  fn second_subscriber_is_refused() {
    let publisher = immediate(1);
    let first = Arc::new(RecordingSubscriber::unbounded());
    let second = Arc::new(RecordingSubscriber::unbounded());
    publisher.subscribe(AnySubscriber::from(first.clone()));
    publisher.subscribe(AnySubscriber::from(second.clone()));

    assert_eq!(first.elements(), vec![1]);
    assert!(matches!(
      second.signals().as_slice(),
      [Signal::Subscribe, Signal::Error(StreamError::MultipleSubscribers)]
    ));
  }

  #[reactive_streams_macro::test]
  fn cancel_suppresses_delivery() {
    let publisher = immediate(1);
    let probe = Arc::new(RecordingSubscriber::<i32>::new(0));
    publisher.subscribe(AnySubscriber::from(probe.clone()));
    probe.cancel();
    probe.request(1);
    assert_eq!(probe.signals().len(), 1);
  }

  #[reactive_streams_macro::test]
  fn zero_request_errors() {
    let publisher = immediate(1);
    let probe = Arc::new(RecordingSubscriber::<i32>::new(0));
    publisher.subscribe(AnySubscriber::from(probe.clone()));
    probe.request(0);
    assert!(matches!(probe.errors().as_slice(), [StreamError::IllegalRequest { count: 0 }]));
  }

  #[reactive_streams_macro::test]
  fn delivers_off_thread_by_default() {
    let publisher = OneShotPublisher::new(String::from("late"));
    let probe = Arc::new(RecordingSubscriber::unbounded());
    publisher.subscribe(AnySubscriber::from(probe.clone()));
    assert!(probe.await_terminal(Duration::from_secs(5)));
    assert_eq!(probe.elements(), vec![String::from("late")]);
  }
}
