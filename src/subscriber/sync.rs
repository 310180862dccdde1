use std::{error::Error, marker::PhantomData};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::Subscriber;
use crate::{error::StreamError, subscription::SubscriptionHandle};

/// A subscriber that processes elements on the publisher's thread, asking
/// for one element at a time.
///
/// `when_next` decides after every element whether more are wanted:
/// `Ok(true)` requests the next one, `Ok(false)` cancels the subscription,
/// and `Err` cancels it and logs the error.
///
/// # Panics
///
/// Signals arriving before `on_subscribe` mean the publisher broke the
/// contract; they trip an assertion.
pub struct SyncSubscriber<T, F> {
  when_next: F,
  state: Mutex<SyncState>,
  _element: PhantomData<fn(T)>,
}

#[derive(Default)]
struct SyncState {
  subscription: Option<SubscriptionHandle>,
  subscribed: bool,
  done: bool,
}

impl<T, F> SyncSubscriber<T, F> {
  pub fn new<E>(when_next: F) -> Self
  where
    F: Fn(T) -> Result<bool, E>,
  {
    SyncSubscriber { when_next, state: Mutex::default(), _element: PhantomData }
  }

  /// Marks the subscriber done and cancels; idempotent.
  fn finish(&self) {
    let subscription = {
      let mut state = self.state.lock();
      if state.done {
        return;
      }
      state.done = true;
      state.subscription.take()
    };
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }

  fn assert_subscribed(&self, signal: &str) {
    assert!(
      self.state.lock().subscribed,
      "publisher signaled {signal} before on_subscribe"
    );
  }
}

impl<T, F, E> Subscriber<T> for SyncSubscriber<T, F>
where
  F: Fn(T) -> Result<bool, E> + Send + Sync,
  E: Error + Send + Sync + 'static,
{
  fn on_subscribe(&self, subscription: SubscriptionHandle) {
    {
      let mut state = self.state.lock();
      // Subscribed twice by mistake: keep the first, drop the newcomer.
      if state.subscription.is_some() || state.done {
        drop(state);
        subscription.cancel();
        return;
      }
      state.subscription = Some(subscription.clone());
      state.subscribed = true;
    }
    subscription.request(1);
  }

  fn on_next(&self, element: T) {
    self.assert_subscribed("on_next");
    if self.state.lock().done {
      return;
    }
    match (self.when_next)(element) {
      Ok(true) => {
        let subscription = self.state.lock().subscription.clone();
        if let Some(subscription) = subscription {
          subscription.request(1);
        }
      }
      Ok(false) => self.finish(),
      Err(err) => {
        self.finish();
        warn!(%err, "element handler failed, subscription canceled");
      }
    }
  }

  fn on_error(&self, error: StreamError) {
    self.assert_subscribed("on_error");
    debug!(%error, "stream failed");
    let mut state = self.state.lock();
    state.subscription = None;
    state.done = true;
  }

  fn on_complete(&self) {
    self.assert_subscribed("on_complete");
    let mut state = self.state.lock();
    state.subscription = None;
    state.done = true;
  }
}
