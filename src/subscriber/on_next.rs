use std::marker::PhantomData;

use parking_lot::Mutex;

use super::Subscriber;
use crate::{error::StreamError, subscription::SubscriptionHandle};

/// Feeds every element to a closure, requesting them one at a time.
///
/// Errors and completion only release the subscription.
pub struct OnNextSubscriber<T, F> {
  on_next: F,
  subscription: Mutex<Option<SubscriptionHandle>>,
  _element: PhantomData<fn(T)>,
}

impl<T, F> OnNextSubscriber<T, F>
where
  F: Fn(T),
{
  pub fn new(on_next: F) -> Self {
    OnNextSubscriber { on_next, subscription: Mutex::new(None), _element: PhantomData }
  }
}

impl<T, F> Subscriber<T> for OnNextSubscriber<T, F>
where
  F: Fn(T) + Send + Sync,
{
  fn on_subscribe(&self, subscription: SubscriptionHandle) {
    {
      let mut current = self.subscription.lock();
      if current.is_some() {
        drop(current);
        subscription.cancel();
        return;
      }
      *current = Some(subscription.clone());
    }
    subscription.request(1);
  }

  fn on_next(&self, element: T) {
    (self.on_next)(element);
    let subscription = self.subscription.lock().clone();
    if let Some(subscription) = subscription {
      subscription.request(1);
    }
  }

  fn on_error(&self, _error: StreamError) { self.subscription.lock().take(); }

  fn on_complete(&self) { self.subscription.lock().take(); }
}
