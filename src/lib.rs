//! # reactive-streams: asynchronous streams with non-blocking backpressure
//!
//! A [Reactive Streams](https://www.reactive-streams.org/) core for Rust: the
//! four-call contract between publishers and subscribers, the type-erased
//! handles that let stages compose, and reference publishers and processors
//! that honor every rule of the contract under concurrent use.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::{sync::Arc, time::Duration};
//!
//! use reactive_streams::prelude::*;
//!
//! let probe = Arc::new(RecordingSubscriber::unbounded());
//! SequencePublisher::new(0..10)
//!   .map(|v: i32| v * 2)
//!   .subscribe(AnySubscriber::from(probe.clone()));
//!
//! assert!(probe.await_terminal(Duration::from_secs(5)));
//! assert_eq!(probe.elements(), (0..10).map(|v| v * 2).collect::<Vec<_>>());
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Publisher`] | Produces elements, only as many as were requested |
//! | [`Subscriber`] | Receives `on_subscribe`, `on_next`, `on_error`, `on_complete` |
//! | [`Subscription`] | The link between the two: `request(n)` and `cancel()` |
//! | [`Processor`] | A stage that is a subscriber upstream and a publisher downstream |
//! | [`AnyPublisher`] / [`AnySubscriber`] / [`AnyProcessor`] | Type-erased handles |
//! | [`Scheduler`] | Where asynchronous publishers run their work |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): a process-wide `futures` thread pool
//!   backs the default scheduler
//! - **`tokio-scheduler`**: [`TokioScheduler`](scheduler::TokioScheduler)
//!   running work on a tokio runtime's blocking pool
//!
//! [`Publisher`]: publisher::Publisher
//! [`Subscriber`]: subscriber::Subscriber
//! [`Subscription`]: subscription::Subscription
//! [`Processor`]: processor::Processor
//! [`AnyPublisher`]: publisher::AnyPublisher
//! [`AnySubscriber`]: subscriber::AnySubscriber
//! [`AnyProcessor`]: processor::AnyProcessor
//! [`Scheduler`]: scheduler::Scheduler

pub mod config;
pub mod demand;
pub mod error;
pub mod prelude;
pub mod processor;
pub mod publisher;
pub mod scheduler;
pub mod subscriber;
pub mod subscription;
mod util;

pub use prelude::*;
