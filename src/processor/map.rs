use std::{
  error::Error,
  marker::PhantomData,
  sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{
  demand::Demand,
  error::StreamError,
  publisher::Publisher,
  subscriber::{AnySubscriber, Subscriber},
  subscription::{
    CanceledSubscription, DelegatingSubscription, Subscription, SubscriptionDelegate,
    SubscriptionHandle,
  },
};

/// Lifecycle of a [`MapProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStage {
  Unsubscribed,
  SubscribedUpstream,
  HasDownstream,
  Done,
}

/// A one-to-one transforming stage.
///
/// Accepts one upstream subscription and one downstream subscriber.
/// Downstream demand is forwarded upstream unchanged, so the stage never
/// buffers elements: every upstream element is transformed and passed on as
/// soon as it arrives. A transform error terminates the downstream with
/// [`StreamError::Transform`] and cancels the upstream.
///
/// Demand the downstream requests from inside its `on_subscribe` is
/// forwarded once `on_subscribe` has returned, so no element can reach the
/// downstream while it is still being subscribed.
///
/// Signals carry no subscription identity. A second upstream is refused by
/// canceling the subscription it offers, but if that upstream then answers
/// with `on_error` (as [`OneShotPublisher`](crate::publisher::OneShotPublisher)
/// does for its later subscribers), the error cannot be told apart from the
/// accepted upstream's and terminates the current session.
pub struct MapProcessor<In, Out, F> {
  transform: F,
  this: Weak<Self>,
  state: Mutex<MapState<Out>>,
  _input: PhantomData<fn(In)>,
}

enum Terminal {
  Complete,
  Error(StreamError),
}

impl Terminal {
  fn deliver<T>(self, subscriber: &AnySubscriber<T>) {
    match self {
      Terminal::Complete => subscriber.on_complete(),
      Terminal::Error(err) => subscriber.on_error(err),
    }
  }
}

struct MapState<Out> {
  upstream: Option<SubscriptionHandle>,
  upstream_attached: bool,
  downstream: Option<AnySubscriber<Out>>,
  has_downstream: bool,
  /// Set while the downstream's `on_subscribe` runs. Demand and terminals are
  /// held back until it returns.
  announcing: bool,
  /// Downstream demand not yet forwarded: it arrived before the upstream, or
  /// during `on_subscribe`.
  pending: Demand,
  /// A terminal signal waiting for the downstream to be ready.
  retained: Option<Terminal>,
  done: bool,
}

impl<In, Out, F> MapProcessor<In, Out, F> {
  pub fn new<E>(transform: F) -> Arc<Self>
  where
    F: Fn(In) -> Result<Out, E>,
  {
    Arc::new_cyclic(|this| MapProcessor {
      transform,
      this: this.clone(),
      state: Mutex::new(MapState {
        upstream: None,
        upstream_attached: false,
        downstream: None,
        has_downstream: false,
        announcing: false,
        pending: Demand::none(),
        retained: None,
        done: false,
      }),
      _input: PhantomData,
    })
  }

  pub fn stage(&self) -> MapStage {
    let state = self.state.lock();
    if state.done {
      MapStage::Done
    } else if state.has_downstream {
      MapStage::HasDownstream
    } else if state.upstream_attached {
      MapStage::SubscribedUpstream
    } else {
      MapStage::Unsubscribed
    }
  }

  /// Marks the stage done, releases both sides and signals `terminal`
  /// downstream, or keeps it for a downstream that is not ready yet.
  fn finish(&self, terminal: Terminal, cancel_upstream: bool) {
    let mut state = self.state.lock();
    if state.done {
      return;
    }
    state.done = true;
    let upstream = state.upstream.take();
    let downstream = state.downstream.take();
    let terminal = if state.has_downstream && !state.announcing {
      Some(terminal)
    } else {
      state.retained = Some(terminal);
      None
    };
    drop(state);

    debug!(canceling_upstream = cancel_upstream, "map processor finished");
    if cancel_upstream {
      if let Some(upstream) = upstream {
        upstream.cancel();
      }
    }
    if let (Some(downstream), Some(terminal)) = (downstream, terminal) {
      terminal.deliver(&downstream);
    }
  }
}

impl<In, Out, E, F> Subscriber<In> for MapProcessor<In, Out, F>
where
  F: Fn(In) -> Result<Out, E> + Send + Sync,
  E: Error + Send + Sync + 'static,
  Out: Send,
{
  fn on_subscribe(&self, subscription: SubscriptionHandle) {
    let mut state = self.state.lock();
    if state.upstream_attached || state.done {
      let second = state.upstream_attached;
      drop(state);
      if second {
        warn!("map processor rejected a second upstream subscription");
      }
      subscription.cancel();
      return;
    }
    state.upstream_attached = true;
    state.upstream = Some(subscription.clone());
    let pending = if state.announcing { Demand::none() } else { state.pending.take() };
    drop(state);

    if !pending.is_empty() {
      trace!(count = pending.get(), "forwarding demand buffered before upstream attached");
      subscription.request(pending.get());
    }
  }

  fn on_next(&self, element: In) {
    let downstream = {
      let state = self.state.lock();
      if state.done {
        return;
      }
      state.downstream.clone()
    };
    let Some(downstream) = downstream else { return };
    match (self.transform)(element) {
      Ok(mapped) => downstream.on_next(mapped),
      Err(err) => {
        warn!(error = %err, "transform failed");
        self.finish(Terminal::Error(StreamError::transform(err)), true);
      }
    }
  }

  fn on_error(&self, error: StreamError) { self.finish(Terminal::Error(error), false) }

  fn on_complete(&self) { self.finish(Terminal::Complete, false) }
}

impl<In, Out, E, F> Publisher<Out> for MapProcessor<In, Out, F>
where
  F: Fn(In) -> Result<Out, E> + Send + Sync + 'static,
  E: Error + Send + Sync + 'static,
  In: 'static,
  Out: Send + 'static,
{
  fn subscribe(&self, subscriber: AnySubscriber<Out>) {
    let mut state = self.state.lock();
    if state.has_downstream {
      drop(state);
      warn!("map processor refused a second downstream subscriber");
      subscriber.on_subscribe(CanceledSubscription::handle());
      subscriber.on_error(StreamError::MultipleSubscribers);
      return;
    }
    state.has_downstream = true;
    state.announcing = true;
    if !state.done {
      state.downstream = Some(subscriber.clone());
    }
    drop(state);

    let delegate: Weak<dyn SubscriptionDelegate> = self.this.clone();
    subscriber.on_subscribe(Arc::new(DelegatingSubscription::new(delegate)));

    let (upstream, pending, retained) = {
      let mut state = self.state.lock();
      state.announcing = false;
      let upstream = state.upstream.clone();
      let pending = if upstream.is_some() { state.pending.take() } else { Demand::none() };
      (upstream, pending, state.retained.take())
    };
    if let Some(upstream) = upstream.filter(|_| !pending.is_empty()) {
      trace!(count = pending.get(), "forwarding demand requested during on_subscribe");
      upstream.request(pending.get());
    }
    if let Some(terminal) = retained {
      terminal.deliver(&subscriber);
    }
  }
}

impl<In, Out, E, F> SubscriptionDelegate for MapProcessor<In, Out, F>
where
  F: Fn(In) -> Result<Out, E> + Send + Sync,
  Out: Send,
{
  fn did_request(&self, _: &DelegatingSubscription, count: i64) {
    let mut state = self.state.lock();
    if state.done {
      return;
    }
    if !state.announcing {
      if let Some(upstream) = state.upstream.clone() {
        drop(state);
        trace!(count, "map processor forwarding request");
        upstream.request(count);
        return;
      }
    }
    if let Err(err) = state.pending.add(count) {
      drop(state);
      warn!(count, "non-positive request while demand is held back");
      self.finish(Terminal::Error(err), true);
    }
  }

  fn did_cancel(&self, _: &DelegatingSubscription) {
    let mut state = self.state.lock();
    state.downstream = None;
    state.retained = None;
    if state.done {
      return;
    }
    // An upstream attaching later sees `done` and is canceled on arrival.
    state.done = true;
    let upstream = state.upstream.take();
    drop(state);
    debug!("map processor canceled by downstream");
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
  }
}
