//! The producing side of a stream.
use std::{convert::Infallible, error::Error, fmt, sync::Arc};

use crate::{
  processor::MapProcessor,
  subscriber::{AnySubscriber, IntoAnySubscriber, OnNextSubscriber, Subscriber},
  util::reuse_erased,
};

mod just;
mod one_shot;
mod sequence;

pub use just::{just, JustPublisher};
pub use one_shot::OneShotPublisher;
pub use sequence::{Elements, Results, SequencePublisher, Source};

/// A `Publisher` provides a potentially unbounded sequence of elements,
/// publishing them according to the demand received from its subscribers.
///
/// # Rules
///
/// 1. The number of `on_next` signals sent to a subscriber never exceeds the
///    total it requested.
/// 2. A publisher may send fewer elements than requested and then terminate
///    with `on_complete` or `on_error`.
/// 3. Signals to one subscriber are sequential, never concurrent.
/// 4. A failing publisher signals `on_error`; a finite stream that ends
///    normally signals `on_complete`.
/// 5. After a terminal signal the subscription is considered canceled and
///    nothing else is signaled.
/// 6. Once a subscription is canceled its subscriber eventually stops being
///    signaled.
/// 7. `subscribe` calls `on_subscribe` before any other signal. The only way
///    to refuse a subscriber is `on_subscribe` followed by `on_error`.
/// 8. `subscribe` may be called any number of times, each time with a
///    different subscriber, and each call starts an independent session.
///    Whether sessions share elements (multicast) or each get their own run
///    (unicast) is up to the publisher.
pub trait Publisher<T>: Send + Sync {
  /// Starts a new subscription for `subscriber`.
  fn subscribe(&self, subscriber: AnySubscriber<T>);
}

impl<T, P: Publisher<T> + ?Sized> Publisher<T> for Arc<P> {
  #[inline]
  fn subscribe(&self, subscriber: AnySubscriber<T>) { (**self).subscribe(subscriber) }
}

impl<T, P: Publisher<T> + ?Sized> Publisher<T> for Box<P> {
  #[inline]
  fn subscribe(&self, subscriber: AnySubscriber<T>) { (**self).subscribe(subscriber) }
}

/// A type-erased [`Publisher`].
///
/// Forwards `subscribe` unchanged. Clones share the wrapped publisher, and
/// two handles compare equal exactly when they wrap the same allocation.
pub struct AnyPublisher<T>(pub(crate) Arc<dyn Publisher<T>>);

impl<T> AnyPublisher<T> {
  /// Erases `publisher`; a publisher that is already an `AnyPublisher` is
  /// returned as is.
  pub fn new<P>(publisher: P) -> Self
  where
    P: Publisher<T> + 'static,
    T: 'static,
  {
    match reuse_erased(publisher) {
      Ok(erased) => erased,
      Err(publisher) => AnyPublisher(Arc::new(publisher)),
    }
  }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
  }
}

impl<T> Publisher<T> for AnyPublisher<T> {
  #[inline]
  fn subscribe(&self, subscriber: AnySubscriber<T>) { self.0.subscribe(subscriber) }
}

impl<T> Clone for AnyPublisher<T> {
  fn clone(&self) -> Self { AnyPublisher(self.0.clone()) }
}

impl<T> PartialEq for AnyPublisher<T> {
  fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl<T> Eq for AnyPublisher<T> {}

impl<T> fmt::Debug for AnyPublisher<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("AnyPublisher").field(&Arc::as_ptr(&self.0).cast::<()>()).finish()
  }
}

/// Shares the caller's allocation: handles built from clones of one `Arc`
/// compare equal.
impl<T, P: Publisher<T> + 'static> From<Arc<P>> for AnyPublisher<T> {
  fn from(publisher: Arc<P>) -> Self { AnyPublisher(publisher) }
}

/// Conversion into the canonical erased publisher.
pub trait IntoAnyPublisher<T> {
  fn into_publisher(self) -> AnyPublisher<T>;
}

impl<T: 'static, P: Publisher<T> + 'static> IntoAnyPublisher<T> for P {
  #[inline]
  fn into_publisher(self) -> AnyPublisher<T> { AnyPublisher::new(self) }
}

/// Conveniences available on every publisher.
pub trait PublisherExt<T>: Publisher<T> {
  /// Subscribes any concrete subscriber, erasing it first.
  fn subscribe_with<S>(&self, subscriber: S)
  where
    S: Subscriber<T> + 'static,
    T: 'static,
  {
    self.subscribe(subscriber.into_subscriber())
  }

  /// Requests elements one at a time and hands each to `on_next`.
  fn subscribe_on_next<F>(&self, on_next: F)
  where
    F: Fn(T) + Send + Sync + 'static,
    T: 'static,
  {
    self.subscribe_with(OnNextSubscriber::new(on_next))
  }

  /// Creates a new stream which calls a closure on each element and uses
  /// its return as the element.
  ///
  /// A [`MapProcessor`] is subscribed to `self` right away; it only asks for
  /// elements once something subscribes to the returned publisher and
  /// requests them.
  fn map<U, F>(&self, f: F) -> AnyPublisher<U>
  where
    F: Fn(T) -> U + Send + Sync + 'static,
    T: Send + 'static,
    U: Send + 'static,
  {
    self.try_map(move |element| Ok::<_, Infallible>(f(element)))
  }

  /// Like [`map`](Self::map), for transforms that can fail. A failure
  /// terminates the downstream with
  /// [`StreamError::Transform`](crate::error::StreamError::Transform) and
  /// cancels the upstream.
  fn try_map<U, E, F>(&self, f: F) -> AnyPublisher<U>
  where
    F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
    E: Error + Send + Sync + 'static,
    T: Send + 'static,
    U: Send + 'static,
  {
    let processor = MapProcessor::new(f);
    self.subscribe(AnySubscriber::from(processor.clone()));
    AnyPublisher::from(processor)
  }
}

impl<T, P: Publisher<T> + ?Sized> PublisherExt<T> for P {}
