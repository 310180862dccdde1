use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::{
  error::StreamError,
  publisher::{AnyPublisher, IntoAnyPublisher, Publisher},
  subscriber::{AnySubscriber, Subscriber},
  subscription::Subscription,
};

/// Emits a single value to every subscriber, then completes.
///
/// Delivery is synchronous: the first positive `request` emits the value and
/// `on_complete` on the requesting thread, before `request` returns.
#[derive(Debug, Clone)]
pub struct JustPublisher<T> {
  value: T,
}

impl<T> JustPublisher<T> {
  pub fn new(value: T) -> Self { JustPublisher { value } }
}

/// Shorthand for `JustPublisher::new(value).into_publisher()`.
pub fn just<T>(value: T) -> AnyPublisher<T>
where
  T: Clone + Send + Sync + 'static,
{
  JustPublisher::new(value).into_publisher()
}

impl<T> Publisher<T> for JustPublisher<T>
where
  T: Clone + Send + Sync + 'static,
{
  fn subscribe(&self, subscriber: AnySubscriber<T>) {
    let subscription = Arc::new(JustSubscription {
      state: Mutex::new(JustState {
        phase: Phase::Idle,
        subscriber: Some(subscriber.clone()),
        value: Some(self.value.clone()),
        violation: None,
      }),
    });
    subscriber.on_subscribe(subscription);
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  Idle,
  Emitting,
  Done,
}

struct JustSubscription<T> {
  state: Mutex<JustState<T>>,
}

struct JustState<T> {
  phase: Phase,
  subscriber: Option<AnySubscriber<T>>,
  value: Option<T>,
  /// First non-positive count seen while `on_next` was running.
  violation: Option<i64>,
}

impl<T> JustState<T> {
  fn release(&mut self) -> Option<AnySubscriber<T>> {
    self.phase = Phase::Done;
    self.value = None;
    self.subscriber.take()
  }
}

impl<T: Send> Subscription for JustSubscription<T> {
  fn request(&self, count: i64) {
    let mut state = self.state.lock();
    match state.phase {
      Phase::Done => return,
      Phase::Emitting => {
        // Reentrant: the value is already on its way.
        if count < 1 && state.violation.is_none() {
          state.violation = Some(count);
        }
        return;
      }
      Phase::Idle => {}
    }

    if count < 1 {
      let subscriber = state.release();
      drop(state);
      warn!(count, "non-positive request, terminating subscription");
      if let Some(subscriber) = subscriber {
        subscriber.on_error(StreamError::IllegalRequest { count });
      }
      return;
    }

    state.phase = Phase::Emitting;
    let subscriber = state.subscriber.clone();
    let value = state.value.take();
    drop(state);
    let Some(subscriber) = subscriber else { return };
    if let Some(value) = value {
      subscriber.on_next(value);
    }

    let mut state = self.state.lock();
    let canceled = state.phase == Phase::Done;
    let violation = state.violation.take();
    state.release();
    drop(state);
    if canceled {
      return;
    }
    match violation {
      Some(count) => subscriber.on_error(StreamError::IllegalRequest { count }),
      None => subscriber.on_complete(),
    }
  }

  fn cancel(&self) { self.state.lock().release(); }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    subscriber::{RecordingSubscriber, Signal},
    subscription::SubscriptionHandle,
  };

  #[reactive_streams_macro::test]
  fn emits_then_completes_on_request() {
    let probe = Arc::new(RecordingSubscriber::new(0));
    just(5).subscribe(AnySubscriber::from(probe.clone()));
    assert_eq!(probe.signals().len(), 1);

    probe.request(1);
    assert!(matches!(
      probe.signals().as_slice(),
      [Signal::Subscribe, Signal::Next(5), Signal::Complete]
    ));
  }

  #[reactive_streams_macro::test]
  fn each_subscriber_gets_the_value() {
    let publisher = JustPublisher::new("hi");
    let first = Arc::new(RecordingSubscriber::unbounded());
    let second = Arc::new(RecordingSubscriber::unbounded());
    publisher.subscribe(AnySubscriber::from(first.clone()));
    publisher.subscribe(AnySubscriber::from(second.clone()));
    assert_eq!(first.elements(), vec!["hi"]);
    assert_eq!(second.elements(), vec!["hi"]);
    assert!(first.is_complete() && second.is_complete());
  }

  #[reactive_streams_macro::test]
  fn non_positive_request_errors() {
    let probe = Arc::new(RecordingSubscriber::<u8>::new(0));
    just(1).subscribe(AnySubscriber::from(probe.clone()));
    probe.request(-3);
    assert!(matches!(probe.errors().as_slice(), [StreamError::IllegalRequest { count: -3 }]));
    probe.request(1);
    assert_eq!(probe.next_count(), 0);
  }

  #[reactive_streams_macro::test]
  fn cancel_before_request_emits_nothing() {
    let probe = Arc::new(RecordingSubscriber::<u8>::new(0));
    just(1).subscribe(AnySubscriber::from(probe.clone()));
    probe.cancel();
    probe.request(1);
    assert_eq!(probe.signals().len(), 1);
  }

  /// Issues one follow-up call on the subscription from inside `on_next`.
  struct Reentrant {
    follow_up: fn(&SubscriptionHandle),
    subscription: Mutex<Option<SubscriptionHandle>>,
    log: Mutex<Vec<&'static str>>,
  }

  impl Reentrant {
    fn new(follow_up: fn(&SubscriptionHandle)) -> Arc<Self> {
      Arc::new(Reentrant { follow_up, subscription: Mutex::new(None), log: Mutex::new(vec![]) })
    }
  }

  impl Subscriber<u8> for Reentrant {
    fn on_subscribe(&self, subscription: SubscriptionHandle) {
      *self.subscription.lock() = Some(subscription.clone());
      subscription.request(1);
    }
    fn on_next(&self, _: u8) {
      self.log.lock().push("next");
      let subscription = self.subscription.lock().clone();
      if let Some(subscription) = subscription {
        (self.follow_up)(&subscription);
      }
    }
    fn on_error(&self, _: StreamError) { self.log.lock().push("error") }
    fn on_complete(&self) { self.log.lock().push("complete") }
  }

  #[reactive_streams_macro::test]
  fn reentrant_request_does_not_emit_twice() {
    let subscriber = Reentrant::new(|s| s.request(1));
    just(1).subscribe(AnySubscriber::from(subscriber.clone()));
    assert_eq!(*subscriber.log.lock(), vec!["next", "complete"]);
  }

  #[reactive_streams_macro::test]
  fn reentrant_violation_is_reported_after_on_next() {
    let subscriber = Reentrant::new(|s| s.request(0));
    just(1).subscribe(AnySubscriber::from(subscriber.clone()));
    assert_eq!(*subscriber.log.lock(), vec!["next", "error"]);
  }

  #[reactive_streams_macro::test]
  fn cancel_during_on_next_skips_completion() {
    let subscriber = Reentrant::new(|s| s.cancel());
    just(1).subscribe(AnySubscriber::from(subscriber.clone()));
    assert_eq!(*subscriber.log.lock(), vec!["next"]);
  }
}
