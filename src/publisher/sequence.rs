//! Unicast publisher over a replayable pull source.
use std::{
  error::Error,
  iter::Map,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{
  config::PublisherConfig,
  demand::Demand,
  error::StreamError,
  publisher::Publisher,
  scheduler::SerialQueue,
  subscriber::{AnySubscriber, Subscriber},
  subscription::Subscription,
};

/// Something a [`SequencePublisher`] can pull from, once per subscriber.
///
/// `open` starts a fresh pass over the elements; the cursor yields
/// `Some(Ok(_))` per element, `Some(Err(_))` when producing fails and `None`
/// once exhausted.
pub trait Source: Send + Sync + 'static {
  type Item: Send + 'static;
  type Cursor: Iterator<Item = Result<Self::Item, StreamError>> + Send + 'static;

  fn open(&self) -> Self::Cursor;
}

/// A [`Source`] that never fails.
#[derive(Debug, Clone)]
pub struct Elements<I>(I);

impl<I> Source for Elements<I>
where
  I: IntoIterator + Clone + Send + Sync + 'static,
  I::IntoIter: Send + 'static,
  I::Item: Send + 'static,
{
  type Item = I::Item;
  type Cursor = Map<I::IntoIter, fn(I::Item) -> Result<I::Item, StreamError>>;

  fn open(&self) -> Self::Cursor {
    self.0.clone().into_iter().map(Ok as fn(I::Item) -> Result<I::Item, StreamError>)
  }
}

/// A [`Source`] of `Result`s; the first `Err` ends the stream with
/// [`StreamError::Source`].
#[derive(Debug, Clone)]
pub struct Results<I>(I);

fn lift<T, E: Error + Send + Sync + 'static>(item: Result<T, E>) -> Result<T, StreamError> {
  item.map_err(StreamError::source)
}

impl<I, T, E> Source for Results<I>
where
  I: IntoIterator<Item = Result<T, E>> + Clone + Send + Sync + 'static,
  I::IntoIter: Send + 'static,
  T: Send + 'static,
  E: Error + Send + Sync + 'static,
{
  type Item = T;
  type Cursor = Map<I::IntoIter, fn(Result<T, E>) -> Result<T, StreamError>>;

  fn open(&self) -> Self::Cursor {
    self.0.clone().into_iter().map(lift::<T, E> as fn(Result<T, E>) -> Result<T, StreamError>)
  }
}

/// Emits the elements of a source to each subscriber, independently.
///
/// Every subscription gets its own cursor over the source and its own
/// sequential queue on the configured scheduler. Elements are only produced
/// against outstanding demand, and at most `batch_size` of them in one
/// scheduled pass, so a subscriber with unbounded demand never monopolizes a
/// worker thread. When the source runs dry the subscriber receives
/// `on_complete`, even if demand is left over.
///
/// ```
/// use reactive_streams::prelude::*;
///
/// let publisher = SequencePublisher::new(vec![1, 2, 3]);
/// publisher.subscribe_on_next(|v: i32| println!("{v}"));
/// ```
pub struct SequencePublisher<S> {
  source: S,
  config: PublisherConfig,
}

impl<I> SequencePublisher<Elements<I>>
where
  Elements<I>: Source,
{
  pub fn new(elements: I) -> Self { Self::with_config(elements, PublisherConfig::default()) }

  pub fn with_config(elements: I, config: PublisherConfig) -> Self {
    Self::from_source(Elements(elements), config)
  }
}

impl<I> SequencePublisher<Results<I>>
where
  Results<I>: Source,
{
  pub fn from_results(results: I) -> Self {
    Self::from_source(Results(results), PublisherConfig::default())
  }
}

impl<S: Source> SequencePublisher<S> {
  /// Publishes a custom [`Source`].
  pub fn from_source(source: S, config: PublisherConfig) -> Self {
    SequencePublisher { source, config }
  }

  /// Replaces the configuration used by subscriptions started afterwards.
  pub fn configured(mut self, config: PublisherConfig) -> Self {
    self.config = config;
    self
  }

  pub fn config(&self) -> &PublisherConfig { &self.config }
}

impl<S: Source> Publisher<S::Item> for SequencePublisher<S> {
  fn subscribe(&self, subscriber: AnySubscriber<S::Item>) {
    let queue = SerialQueue::new(self.config.scheduler.clone());
    let session = Arc::new(Session {
      queue: queue.clone(),
      batch_size: self.config.batch_size.get(),
      cancel_requested: AtomicBool::new(false),
      state: Mutex::new(SessionState {
        subscriber: Some(subscriber.clone()),
        cursor: self.source.open(),
        demand: Demand::none(),
        finished: false,
      }),
    });
    let subscription = Arc::new(SequenceSubscription(session));
    // Queued so that anything requested from inside `on_subscribe` runs
    // after it returns.
    queue.dispatch(move || subscriber.on_subscribe(subscription));
  }
}

struct SequenceSubscription<C, T>(Arc<Session<C, T>>);

struct Session<C, T> {
  queue: SerialQueue,
  batch_size: usize,
  cancel_requested: AtomicBool,
  state: Mutex<SessionState<C, T>>,
}

struct SessionState<C, T> {
  subscriber: Option<AnySubscriber<T>>,
  cursor: C,
  demand: Demand,
  finished: bool,
}

impl<C, T> Subscription for SequenceSubscription<C, T>
where
  C: Iterator<Item = Result<T, StreamError>> + Send + 'static,
  T: Send + 'static,
{
  fn request(&self, count: i64) {
    trace!(count, "sequence request");
    let session = self.0.clone();
    self.0.queue.dispatch(move || session.on_request(count));
  }

  fn cancel(&self) {
    if self.0.cancel_requested.swap(true, Ordering::AcqRel) {
      return;
    }
    let session = self.0.clone();
    self.0.queue.dispatch(move || session.on_cancel());
  }
}

impl<C, T> Session<C, T>
where
  C: Iterator<Item = Result<T, StreamError>> + Send + 'static,
  T: Send + 'static,
{
  fn is_canceled(&self) -> bool { self.cancel_requested.load(Ordering::Acquire) }

  fn on_request(self: Arc<Self>, count: i64) {
    let mut state = self.state.lock();
    if state.finished || self.is_canceled() {
      return;
    }
    if let Err(err) = state.demand.add(count) {
      warn!(count, "non-positive request, terminating subscription");
      self.cancel_requested.store(true, Ordering::Release);
      state.finished = true;
      let subscriber = state.subscriber.take();
      drop(state);
      if let Some(subscriber) = subscriber {
        subscriber.on_error(err);
      }
      return;
    }
    drop(state);
    self.produce();
  }

  fn on_cancel(self: Arc<Self>) {
    let mut state = self.state.lock();
    if !state.finished {
      debug!("sequence subscription canceled");
    }
    state.finished = true;
    state.subscriber = None;
  }

  /// One scheduled pass: emits up to `batch_size` elements, then yields the
  /// thread and continues in a later pass if demand remains.
  ///
  /// Only this session's queue touches the state, so holding the lock while
  /// signaling cannot contend; a request or cancel issued from inside
  /// `on_next` is queued behind this pass.
  fn produce(self: Arc<Self>) {
    let mut state = self.state.lock();
    let Some(subscriber) = state.subscriber.clone() else { return };
    let mut budget = self.batch_size;
    while budget > 0 && !state.demand.is_empty() {
      if state.finished || self.is_canceled() {
        return;
      }
      match state.cursor.next() {
        Some(Ok(element)) => {
          state.demand.take_one();
          budget -= 1;
          subscriber.on_next(element);
        }
        Some(Err(err)) => {
          debug!(error = %err, "source failed");
          Self::finish(&mut state);
          drop(state);
          subscriber.on_error(err);
          return;
        }
        None => {
          debug!("source exhausted");
          Self::finish(&mut state);
          drop(state);
          subscriber.on_complete();
          return;
        }
      }
    }
    if state.finished || self.is_canceled() || state.demand.is_empty() {
      return;
    }
    drop(state);
    let session = self.clone();
    self.queue.dispatch(move || session.produce());
  }

  fn finish(state: &mut SessionState<C, T>) {
    state.finished = true;
    state.subscriber = None;
  }
}

#[cfg(test)]
mod tests {
  use std::{fmt, num::NonZeroUsize, sync::atomic::AtomicUsize, time::Duration};

  use super::*;
  use crate::{
    scheduler::{ImmediateScheduler, NewThreadScheduler},
    subscriber::{RecordingSubscriber, Signal},
    subscription::SubscriptionHandle,
  };

  const WAIT: Duration = Duration::from_secs(5);

  fn immediate() -> PublisherConfig {
    PublisherConfig::default().with_scheduler(ImmediateScheduler)
  }

  fn recorder(initial: i64) -> Arc<RecordingSubscriber<i32>> {
    Arc::new(RecordingSubscriber::new(initial))
  }

  #[derive(Debug, Clone)]
  struct Broken;

  impl fmt::Display for Broken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("broken") }
  }

  impl Error for Broken {}

  #[reactive_streams_macro::test]
  fn emits_only_what_was_requested() {
    let publisher = SequencePublisher::new(1..=10).configured(immediate());
    let probe = recorder(3);
    publisher.subscribe(AnySubscriber::from(probe.clone()));
    assert_eq!(probe.elements(), vec![1, 2, 3]);
    assert!(!probe.is_terminated());

    probe.request(2);
    assert_eq!(probe.elements(), vec![1, 2, 3, 4, 5]);
  }

  #[reactive_streams_macro::test]
  fn completes_when_exhausted_even_with_demand_left() {
    let publisher = SequencePublisher::new(vec![1, 2]).configured(immediate());
    let probe = recorder(10);
    publisher.subscribe(AnySubscriber::from(probe.clone()));
    assert_eq!(probe.elements(), vec![1, 2]);
    assert_eq!(probe.complete_count(), 1);
    assert!(!probe.has_subscription());
  }

  #[reactive_streams_macro::test]
  fn empty_source_completes_after_first_request() {
    let publisher = SequencePublisher::new(Vec::<i32>::new()).configured(immediate());
    let probe = recorder(0);
    publisher.subscribe(AnySubscriber::from(probe.clone()));
    assert_eq!(probe.signals().len(), 1);

    probe.request(1);
    assert!(matches!(probe.signals().as_slice(), [Signal::Subscribe, Signal::Complete]));
  }

  #[reactive_streams_macro::test]
  fn every_subscriber_gets_its_own_pass() {
    let publisher = SequencePublisher::new(vec![7, 8, 9]).configured(immediate());
    let first = recorder(i64::MAX);
    let second = recorder(2);
    publisher.subscribe(AnySubscriber::from(first.clone()));
    publisher.subscribe(AnySubscriber::from(second.clone()));
    assert_eq!(first.elements(), vec![7, 8, 9]);
    assert_eq!(second.elements(), vec![7, 8]);
  }

  #[reactive_streams_macro::test]
  fn non_positive_request_cancels_then_errors() {
    for count in [0, -1, i64::MIN] {
      let publisher = SequencePublisher::new(1..100).configured(immediate());
      let probe = recorder(0);
      publisher.subscribe(AnySubscriber::from(probe.clone()));
      probe.request(count);
      let errors = probe.errors();
      assert_eq!(errors.len(), 1);
      assert!(matches!(errors[0], StreamError::IllegalRequest { count: c } if c == count));

      probe.request(5);
      assert_eq!(probe.next_count(), 0);
    }
  }

  #[reactive_streams_macro::test]
  fn cancel_from_on_next_stops_the_pass() {
    struct CancelAfterTwo {
      seen: AtomicUsize,
      subscription: Mutex<Option<SubscriptionHandle>>,
    }
    impl Subscriber<i32> for CancelAfterTwo {
      fn on_subscribe(&self, subscription: SubscriptionHandle) {
        subscription.request(100);
        *self.subscription.lock() = Some(subscription);
      }
      fn on_next(&self, _: i32) {
        if self.seen.fetch_add(1, Ordering::SeqCst) == 1 {
          if let Some(subscription) = self.subscription.lock().take() {
            subscription.cancel();
          }
        }
      }
      fn on_error(&self, _: StreamError) { panic!("no error expected") }
      fn on_complete(&self) { panic!("no completion expected") }
    }

    let publisher = SequencePublisher::new(1..1000).configured(immediate());
    let subscriber =
      Arc::new(CancelAfterTwo { seen: AtomicUsize::new(0), subscription: Mutex::new(None) });
    publisher.subscribe(AnySubscriber::from(subscriber.clone()));
    assert_eq!(subscriber.seen.load(Ordering::SeqCst), 2);
  }

  #[reactive_streams_macro::test]
  fn unbounded_demand_spans_many_batches() {
    let config = PublisherConfig::default()
      .with_scheduler(ImmediateScheduler)
      .with_batch_size(NonZeroUsize::MIN);
    let publisher = SequencePublisher::new(0..500).configured(config);
    let probe = recorder(i64::MAX);
    publisher.subscribe(AnySubscriber::from(probe.clone()));
    assert_eq!(probe.elements(), (0..500).collect::<Vec<_>>());
    assert!(probe.is_complete());
  }

  #[reactive_streams_macro::test]
  fn source_failure_becomes_on_error() {
    let items = vec![Ok(1), Ok(2), Err(Broken), Ok(3)];
    let publisher = SequencePublisher::from_results(items).configured(immediate());
    let probe = recorder(i64::MAX);
    publisher.subscribe(AnySubscriber::from(probe.clone()));
    assert_eq!(probe.elements(), vec![1, 2]);
    let errors = probe.errors();
    assert!(matches!(errors.as_slice(), [StreamError::Source(_)]));
    assert_eq!(errors[0].to_string(), "source failed: broken");
  }

  #[reactive_streams_macro::test]
  fn in_order_across_threads() {
    let config = PublisherConfig::default().with_scheduler(NewThreadScheduler::default());
    let publisher = SequencePublisher::new(0..200).configured(config);
    let probe = recorder(i64::MAX);
    publisher.subscribe(AnySubscriber::from(probe.clone()));
    assert!(probe.await_terminal(WAIT));
    assert_eq!(probe.elements(), (0..200).collect::<Vec<_>>());
  }

  #[reactive_streams_macro::test]
  fn pool_delivery_completes() {
    let publisher = SequencePublisher::new(vec!["a", "b", "c"]);
    let probe = Arc::new(RecordingSubscriber::<&str>::new(2));
    publisher.subscribe(AnySubscriber::from(probe.clone()));
    assert!(probe.await_next_count(2, WAIT));
    probe.request(5);
    assert!(probe.await_terminal(WAIT));
    assert_eq!(probe.elements(), vec!["a", "b", "c"]);
  }
}
