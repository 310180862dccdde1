//! The session between one publisher and one subscriber.
use std::sync::Arc;

mod delegating;

pub use delegating::{DelegatingSubscription, SubscriptionDelegate};

/// A `Subscription` represents the one-to-one lifecycle of a
/// [`Subscriber`](crate::subscriber::Subscriber) subscribed to a
/// [`Publisher`](crate::publisher::Publisher).
///
/// It is used both to signal demand and to cancel it.
///
/// # Rules
///
/// 1. `request` and `cancel` may only be called from within the subscriber's
///    context, but they may be called from inside `on_subscribe`/`on_next`
///    (the publisher may then deliver synchronously) or from any other
///    thread.
/// 2. `request(count)` with `count < 1` is a contract violation: the
///    subscription signals `on_error(StreamError::IllegalRequest)` and is
///    canceled.
/// 3. Outstanding demand adds up with saturation; reaching `i64::MAX` means
///    unbounded.
/// 4. `cancel` is idempotent, non-blocking and safe to race with `request`.
///    After it, the subscriber eventually stops receiving signals; signals
///    already in flight may still arrive.
/// 5. After a terminal signal, further `request`/`cancel` calls have no
///    effect.
pub trait Subscription: Send + Sync {
  /// Adds `count` elements to the outstanding demand.
  fn request(&self, count: i64);

  /// Asks the publisher to stop sending elements and release resources.
  fn cancel(&self);
}

/// How subscriptions are handed to subscribers.
pub type SubscriptionHandle = Arc<dyn Subscription>;

impl<S: Subscription + ?Sized> Subscription for Arc<S> {
  #[inline]
  fn request(&self, count: i64) { (**self).request(count) }

  #[inline]
  fn cancel(&self) { (**self).cancel() }
}

impl<S: Subscription + ?Sized> Subscription for Box<S> {
  #[inline]
  fn request(&self, count: i64) { (**self).request(count) }

  #[inline]
  fn cancel(&self) { (**self).cancel() }
}

/// A subscription that is already over.
///
/// Handed to subscribers a publisher refuses, right before their
/// `on_error`, so that `on_subscribe` still comes first.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanceledSubscription;

impl CanceledSubscription {
  pub fn handle() -> SubscriptionHandle { Arc::new(CanceledSubscription) }
}

impl Subscription for CanceledSubscription {
  fn request(&self, _count: i64) {}

  fn cancel(&self) {}
}
