//! Stages that are a subscriber upstream and a publisher downstream.
use std::{fmt, sync::Arc};

use crate::{
  error::StreamError,
  publisher::{AnyPublisher, Publisher},
  subscriber::{AnySubscriber, Subscriber},
  subscription::SubscriptionHandle,
  util::reuse_erased,
};

mod map;

pub use map::{MapProcessor, MapStage};

/// A processing stage: consumes `In` as a [`Subscriber`] and produces `Out`
/// as a [`Publisher`], obeying the contracts of both.
pub trait Processor<In, Out>: Subscriber<In> + Publisher<Out> {}

impl<In, Out, P> Processor<In, Out> for P where P: Subscriber<In> + Publisher<Out> + ?Sized {}

/// A type-erased [`Processor`].
pub struct AnyProcessor<In, Out>(Arc<dyn Processor<In, Out>>);

impl<In: 'static, Out: 'static> AnyProcessor<In, Out> {
  pub fn new<P: Processor<In, Out> + 'static>(processor: P) -> Self {
    match reuse_erased(processor) {
      Ok(erased) => erased,
      Err(processor) => AnyProcessor(Arc::new(processor)),
    }
  }
}

impl<In, Out> AnyProcessor<In, Out> {
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
  }

  /// The publishing side, sharing this processor's allocation.
  pub fn as_publisher(&self) -> AnyPublisher<Out>
  where
    Out: 'static,
    In: 'static,
  {
    let publisher: Arc<dyn Publisher<Out>> = self.0.clone();
    AnyPublisher(publisher)
  }

  /// The subscribing side, sharing this processor's allocation.
  pub fn as_subscriber(&self) -> AnySubscriber<In>
  where
    Out: 'static,
    In: 'static,
  {
    let subscriber: Arc<dyn Subscriber<In>> = self.0.clone();
    AnySubscriber(subscriber)
  }
}

impl<In, Out> Subscriber<In> for AnyProcessor<In, Out> {
  #[inline]
  fn on_subscribe(&self, subscription: SubscriptionHandle) { self.0.on_subscribe(subscription) }

  #[inline]
  fn on_next(&self, element: In) { self.0.on_next(element) }

  #[inline]
  fn on_error(&self, error: StreamError) { self.0.on_error(error) }

  #[inline]
  fn on_complete(&self) { self.0.on_complete() }
}

impl<In, Out> Publisher<Out> for AnyProcessor<In, Out> {
  #[inline]
  fn subscribe(&self, subscriber: AnySubscriber<Out>) { self.0.subscribe(subscriber) }
}

impl<In, Out> Clone for AnyProcessor<In, Out> {
  fn clone(&self) -> Self { AnyProcessor(self.0.clone()) }
}

impl<In, Out> PartialEq for AnyProcessor<In, Out> {
  fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl<In, Out> Eq for AnyProcessor<In, Out> {}

impl<In, Out> fmt::Debug for AnyProcessor<In, Out> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("AnyProcessor").field(&Arc::as_ptr(&self.0).cast::<()>()).finish()
  }
}

impl<In, Out, P: Processor<In, Out> + 'static> From<Arc<P>> for AnyProcessor<In, Out> {
  fn from(processor: Arc<P>) -> Self { AnyProcessor(processor) }
}

pub trait IntoAnyProcessor<In, Out> {
  fn into_processor(self) -> AnyProcessor<In, Out>;
}

impl<In: 'static, Out: 'static, P: Processor<In, Out> + 'static> IntoAnyProcessor<In, Out> for P {
  #[inline]
  fn into_processor(self) -> AnyProcessor<In, Out> { AnyProcessor::new(self) }
}
