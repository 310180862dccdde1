use std::sync::{
  atomic::{AtomicBool, Ordering},
  Weak,
};

use tracing::trace;

use super::Subscription;

/// Receives the calls made on a [`DelegatingSubscription`].
///
/// The delegate is responsible for everything a subscription must guarantee
/// beyond cancel idempotence: validating counts, producing elements, and
/// tolerating a late `did_request` that raced with its own teardown.
pub trait SubscriptionDelegate: Send + Sync {
  /// The subscriber asked for `count` more elements. Only called while the
  /// subscription is not canceled.
  fn did_request(&self, subscription: &DelegatingSubscription, count: i64);

  /// The subscriber canceled. Called at most once per subscription.
  fn did_cancel(&self, subscription: &DelegatingSubscription);
}

/// A [`Subscription`] that forwards to a delegate and only adds the
/// cancellation latch.
///
/// The delegate is held weakly: the subscription never keeps it alive, and
/// once the delegate is gone every call is a no-op.
pub struct DelegatingSubscription {
  delegate: Weak<dyn SubscriptionDelegate>,
  canceled: AtomicBool,
}

impl DelegatingSubscription {
  pub fn new(delegate: Weak<dyn SubscriptionDelegate>) -> Self {
    DelegatingSubscription { delegate, canceled: AtomicBool::new(false) }
  }

  pub fn is_canceled(&self) -> bool { self.canceled.load(Ordering::Acquire) }
}

impl Subscription for DelegatingSubscription {
  fn request(&self, count: i64) {
    // Not atomic with the forward: a cancel may land in between, which the
    // delegate has to tolerate.
    if self.is_canceled() {
      return;
    }
    if let Some(delegate) = self.delegate.upgrade() {
      delegate.did_request(self, count);
    }
  }

  fn cancel(&self) {
    if self.canceled.swap(true, Ordering::AcqRel) {
      return;
    }
    trace!("delegating subscription canceled");
    if let Some(delegate) = self.delegate.upgrade() {
      delegate.did_cancel(self);
    }
  }
}
