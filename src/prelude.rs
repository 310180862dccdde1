//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Scheduler core and built-in schedulers
#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
pub use crate::scheduler::{
  default_scheduler, ImmediateScheduler, NewThreadScheduler, Scheduler, SerialQueue, Task,
};
pub use crate::{
  config::{PublisherConfig, DEFAULT_BATCH_SIZE},
  demand::Demand,
  error::{BoxError, StreamError},
  processor::{AnyProcessor, IntoAnyProcessor, MapProcessor, MapStage, Processor},
  publisher::{
    just, AnyPublisher, IntoAnyPublisher, JustPublisher, OneShotPublisher, Publisher,
    PublisherExt, SequencePublisher, Source,
  },
  subscriber::{
    AnySubscriber, IntoAnySubscriber, LoggingSubscriber, OnNextSubscriber, RecordingSubscriber,
    Signal, Subscriber, SyncSubscriber,
  },
  subscription::{
    CanceledSubscription, DelegatingSubscription, Subscription, SubscriptionDelegate,
    SubscriptionHandle,
  },
};
