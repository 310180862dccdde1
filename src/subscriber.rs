//! The consuming side of a stream.
use std::{fmt, sync::Arc};

use crate::{error::StreamError, subscription::SubscriptionHandle, util::reuse_erased};

mod logging;
mod on_next;
mod recording;
mod sync;

pub use logging::LoggingSubscriber;
pub use on_next::OnNextSubscriber;
pub use recording::{RecordingSubscriber, Signal};
pub use sync::SyncSubscriber;

/// A `Subscriber` consumes the signals of exactly one subscription.
///
/// It receives `on_subscribe` once, then any number of `on_next` (never more
/// than it requested), then at most one of `on_error` / `on_complete`.
///
/// # Rules
///
/// 1. Signals to one subscriber are delivered sequentially, never
///    concurrently, even when they come from different threads.
/// 2. A subscriber must signal demand through
///    [`Subscription::request`](crate::subscription::Subscription::request)
///    to receive elements.
/// 3. After a terminal signal the subscription is considered canceled and the
///    subscriber must drop its reference to it.
/// 4. A subscriber that already holds an active subscription must cancel any
///    further subscription it is offered.
/// 5. Callbacks must return normally; failures are reported by canceling the
///    subscription, not by panicking.
///
/// Callbacks take `&self` so that subscribers can be shared between the
/// publisher delivering to them and the code observing them.
pub trait Subscriber<T>: Send + Sync {
  /// Invoked once, before anything else, when a subscription starts.
  fn on_subscribe(&self, subscription: SubscriptionHandle);

  /// The next element, sent in response to demand.
  fn on_next(&self, element: T);

  /// Failed terminal state. No further signals follow.
  fn on_error(&self, error: StreamError);

  /// Successful terminal state. No further signals follow.
  fn on_complete(&self);
}

impl<T, S: Subscriber<T> + ?Sized> Subscriber<T> for Arc<S> {
  #[inline]
  fn on_subscribe(&self, subscription: SubscriptionHandle) { (**self).on_subscribe(subscription) }
  #[inline]
  fn on_next(&self, element: T) { (**self).on_next(element) }
  #[inline]
  fn on_error(&self, error: StreamError) { (**self).on_error(error) }
  #[inline]
  fn on_complete(&self) { (**self).on_complete() }
}

impl<T, S: Subscriber<T> + ?Sized> Subscriber<T> for Box<S> {
  #[inline]
  fn on_subscribe(&self, subscription: SubscriptionHandle) { (**self).on_subscribe(subscription) }
  #[inline]
  fn on_next(&self, element: T) { (**self).on_next(element) }
  #[inline]
  fn on_error(&self, error: StreamError) { (**self).on_error(error) }
  #[inline]
  fn on_complete(&self) { (**self).on_complete() }
}

/// A type-erased [`Subscriber`].
///
/// Forwards every call unchanged to the subscriber it wraps. Clones share the
/// wrapped subscriber, and two handles compare equal exactly when they wrap
/// the same allocation.
pub struct AnySubscriber<T>(pub(crate) Arc<dyn Subscriber<T>>);

impl<T> AnySubscriber<T> {
  /// Erases `subscriber`; a subscriber that is already an `AnySubscriber` is
  /// returned as is.
  pub fn new<S>(subscriber: S) -> Self
  where
    S: Subscriber<T> + 'static,
    T: 'static,
  {
    match reuse_erased(subscriber) {
      Ok(erased) => erased,
      Err(subscriber) => AnySubscriber(Arc::new(subscriber)),
    }
  }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
  }
}

impl<T> Subscriber<T> for AnySubscriber<T> {
  #[inline]
  fn on_subscribe(&self, subscription: SubscriptionHandle) { self.0.on_subscribe(subscription) }
  #[inline]
  fn on_next(&self, element: T) { self.0.on_next(element) }
  #[inline]
  fn on_error(&self, error: StreamError) { self.0.on_error(error) }
  #[inline]
  fn on_complete(&self) { self.0.on_complete() }
}

impl<T> Clone for AnySubscriber<T> {
  fn clone(&self) -> Self { AnySubscriber(self.0.clone()) }
}

impl<T> PartialEq for AnySubscriber<T> {
  fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl<T> Eq for AnySubscriber<T> {}

impl<T> fmt::Debug for AnySubscriber<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("AnySubscriber").field(&Arc::as_ptr(&self.0).cast::<()>()).finish()
  }
}

/// Shares the caller's allocation: handles built from clones of one `Arc`
/// compare equal.
impl<T, S: Subscriber<T> + 'static> From<Arc<S>> for AnySubscriber<T> {
  fn from(subscriber: Arc<S>) -> Self { AnySubscriber(subscriber) }
}

/// Conversion into the canonical erased subscriber.
pub trait IntoAnySubscriber<T> {
  fn into_subscriber(self) -> AnySubscriber<T>;
}

impl<T: 'static, S: Subscriber<T> + 'static> IntoAnySubscriber<T> for S {
  #[inline]
  fn into_subscriber(self) -> AnySubscriber<T> { AnySubscriber::new(self) }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Inert;

  impl Subscriber<()> for Inert {
    fn on_subscribe(&self, _: SubscriptionHandle) {}
    fn on_next(&self, _: ()) {}
    fn on_error(&self, _: StreamError) {}
    fn on_complete(&self) {}
  }

  fn erase<S: Subscriber<E> + 'static, E: 'static>(subscriber: S) -> AnySubscriber<E> {
    subscriber.into_subscriber()
  }

  #[reactive_streams_macro::test]
  fn rewrapping_is_a_no_op() {
    let first = Inert.into_subscriber();
    let second = first.clone().into_subscriber();
    assert!(first.ptr_eq(&second));
    assert_eq!(first, AnySubscriber::new(second));
  }

  #[reactive_streams_macro::test]
  fn rewrapping_through_generic_code_is_a_no_op() {
    let first = Inert.into_subscriber();
    let second = erase(first.clone());
    assert_eq!(first, second);
  }

  #[reactive_streams_macro::test]
  fn distinct_subscribers_differ() {
    assert_ne!(Inert.into_subscriber(), Inert.into_subscriber());
  }

  #[reactive_streams_macro::test]
  fn handles_from_one_arc_are_equal() {
    let shared = Arc::new(RecordingSubscriber::<()>::unbounded());
    let a = AnySubscriber::from(shared.clone());
    let b = AnySubscriber::from(shared);
    assert_eq!(a, b);
  }

  #[reactive_streams_macro::test]
  fn forwards_every_signal() {
    let probe = Arc::new(RecordingSubscriber::<i32>::new(0));
    let erased = AnySubscriber::from(probe.clone());
    erased.on_subscribe(crate::subscription::CanceledSubscription::handle());
    erased.on_next(1);
    erased.on_next(2);
    erased.on_complete();
    assert_eq!(probe.elements(), vec![1, 2]);
    assert!(probe.is_complete());
  }
}
