use std::fmt::Debug;

use parking_lot::Mutex;
use tracing::info;

use super::Subscriber;
use crate::{error::StreamError, subscription::SubscriptionHandle};

/// Requests everything up front and logs every signal at `INFO`, tagged with
/// the subscriber's name.
pub struct LoggingSubscriber {
  name: String,
  subscription: Mutex<Option<SubscriptionHandle>>,
}

impl LoggingSubscriber {
  pub fn new(name: impl Into<String>) -> Self {
    LoggingSubscriber { name: name.into(), subscription: Mutex::new(None) }
  }

  pub fn name(&self) -> &str { &self.name }
}

impl<T: Debug> Subscriber<T> for LoggingSubscriber {
  fn on_subscribe(&self, subscription: SubscriptionHandle) {
    info!(subscriber = %self.name, "onSubscribe: subscription has started");
    *self.subscription.lock() = Some(subscription.clone());
    subscription.request(i64::MAX);
  }

  fn on_next(&self, element: T) {
    info!(subscriber = %self.name, ?element, "onNext: publisher has signaled an element");
  }

  fn on_error(&self, error: StreamError) {
    self.subscription.lock().take();
    info!(subscriber = %self.name, %error, "onError: subscription has terminated with an error");
  }

  fn on_complete(&self) {
    self.subscription.lock().take();
    info!(subscriber = %self.name, "onComplete: subscription has terminated normally");
  }
}
