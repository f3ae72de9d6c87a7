//! Shared machinery behind both subject flavours.
//!
//! # Architecture
//!
//! A subject owns a registry of [`Outlet`]s, one per live subscription, keyed
//! by an id so a subscription can unregister itself on cancel. Each outlet
//! carries that subscriber's outstanding demand; the subject itself never
//! buffers. `send` snapshots the registry under the lock, releases the lock
//! and then offers the value to every outlet that has demand, so subscriber
//! callbacks may call back into the subject (send, subscribe, cancel)
//! without deadlocking.
//!
//! ## Termination
//!
//! The first completion is recorded and delivered to every registered
//! outlet; the registry is emptied and later sends are ignored. Subscribers
//! that arrive afterwards receive the recorded completion right after
//! `on_subscribe`. When the last strong handle to the core goes away, any
//! subscriber still open is sent `finished`.
//!
//! ## Relaying
//!
//! A subject may itself subscribe to publishers. Those upstream subscriptions
//! are kept here, requested with unlimited demand and cancelled once the
//! subject terminates.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Weak,
};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{
  demand::Demand,
  error::Completion,
  subscriber::Subscriber,
  subscription::{dynamic::Registry, outlet::Outlet, Cancellable, Subscription, SubscriptionRef},
};

struct CoreState<Item, Err> {
  outlets: Registry<Arc<Outlet<Item, Err>>>,
  completion: Option<Completion<Err>>,
  upstreams: SmallVec<[SubscriptionRef; 1]>,
}

pub(crate) struct SubjectCore<Item, Err> {
  state: Mutex<CoreState<Item, Err>>,
}

impl<Item, Err> SubjectCore<Item, Err> {
  pub(crate) fn new() -> Arc<Self> {
    Arc::new(SubjectCore {
      state: Mutex::new(CoreState {
        outlets: Registry::default(),
        completion: None,
        upstreams: SmallVec::new(),
      }),
    })
  }

  pub(crate) fn subscriber_count(&self) -> usize { self.state.lock().outlets.len() }

  pub(crate) fn is_terminated(&self) -> bool { self.state.lock().completion.is_some() }

  fn remove(&self, id: usize) { self.state.lock().outlets.remove(id); }

  /// Register `subscriber`. `current`, when given, is offered as the first
  /// value once the subscriber requests anything.
  pub(crate) fn attach<S>(self: &Arc<Self>, subscriber: S, current: Option<Arc<Mutex<Item>>>)
  where
    S: Subscriber<Item, Err> + 'static,
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
  {
    let outlet = Arc::new(Outlet::new(subscriber));
    let registered = {
      let mut state = self.state.lock();
      match &state.completion {
        Some(completion) => Err(completion.clone()),
        None => Ok(state.outlets.insert(outlet.clone())),
      }
    };
    match registered {
      Ok(id) => {
        let subscription = SubjectSubscription {
          outlet: outlet.clone(),
          core: Arc::downgrade(self),
          id,
          current,
          primed: AtomicBool::new(false),
        };
        outlet.subscribe(Arc::new(subscription));
      }
      Err(completion) => {
        outlet.subscribe(outlet.clone());
        outlet.finish(completion);
      }
    }
  }

  /// Offer `value` to every subscriber with demand. `on_accept` runs under
  /// the subject lock before delivery, and only if the subject is still live.
  pub(crate) fn send(&self, value: Item, on_accept: impl FnOnce(&Item))
  where
    Item: Clone,
  {
    let ready: SmallVec<[_; 2]> = {
      let state = self.state.lock();
      if state.completion.is_some() {
        tracing::trace!("send on a terminated subject ignored");
        return;
      }
      on_accept(&value);
      state.outlets.snapshot().into_iter().filter(|outlet| outlet.demand().has_demand()).collect()
    };

    let mut ready = ready.into_iter().peekable();
    while let Some(outlet) = ready.next() {
      if ready.peek().is_none() {
        offer(&outlet, value);
        return;
      }
      offer(&outlet, value.clone());
    }
  }

  /// Record the terminal signal and deliver it to every open subscriber.
  /// Returns `false` if the subject had already terminated.
  pub(crate) fn complete(&self, completion: Completion<Err>) -> bool
  where
    Err: Clone,
  {
    let (outlets, upstreams) = {
      let mut state = self.state.lock();
      if state.completion.is_some() {
        tracing::debug!("subject already terminated; completion ignored");
        return false;
      }
      state.completion = Some(completion.clone());
      (state.outlets.take_all(), std::mem::take(&mut state.upstreams))
    };
    tracing::debug!(subscribers = outlets.len(), "subject terminated");
    for upstream in upstreams {
      upstream.cancel();
    }
    for outlet in outlets {
      outlet.finish(completion.clone());
    }
    true
  }

  /// Keep an upstream subscription for relaying and ask it for everything.
  pub(crate) fn relay_from(&self, upstream: SubscriptionRef) {
    let accepted = {
      let mut state = self.state.lock();
      let live = state.completion.is_none();
      if live {
        state.upstreams.push(upstream.clone());
      }
      live
    };
    if accepted {
      upstream.request(Demand::UNLIMITED);
    } else {
      upstream.cancel();
    }
  }
}

fn offer<Item, Err>(outlet: &Outlet<Item, Err>, value: Item) {
  if outlet.offer(value).is_err() {
    tracing::trace!("subscriber lost its demand during send; value dropped");
  }
}

impl<Item, Err> Drop for SubjectCore<Item, Err> {
  fn drop(&mut self) {
    let state = self.state.get_mut();
    let upstreams = std::mem::take(&mut state.upstreams);
    for upstream in upstreams {
      upstream.cancel();
    }
    if state.completion.is_some() {
      return;
    }
    let outlets = state.outlets.take_all();
    if !outlets.is_empty() {
      tracing::debug!(subscribers = outlets.len(), "subject dropped; finishing open subscriptions");
    }
    for outlet in outlets {
      outlet.finish(Completion::Finished);
    }
  }
}

struct SubjectSubscription<Item, Err> {
  outlet: Arc<Outlet<Item, Err>>,
  core: Weak<SubjectCore<Item, Err>>,
  id: usize,
  current: Option<Arc<Mutex<Item>>>,
  primed: AtomicBool,
}

impl<Item, Err> Cancellable for SubjectSubscription<Item, Err>
where
  Item: Send,
  Err: Send,
{
  fn cancel(&self) {
    self.outlet.cancel();
    if let Some(core) = self.core.upgrade() {
      core.remove(self.id);
    }
  }
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err>
where
  Item: Clone + Send,
  Err: Send,
{
  fn request(&self, demand: Demand) {
    let (Some(current), Some(core)) = (&self.current, self.core.upgrade()) else {
      self.outlet.add_demand(demand);
      return;
    };
    // The current value is queued under the subject lock, in the same step
    // that makes the demand visible to `send`, so no sent value can overtake
    // it.
    {
      let _state = core.state.lock();
      if !self.outlet.add_demand(demand) || self.primed.swap(true, Ordering::AcqRel) {
        return;
      }
      let value = current.lock().clone();
      if self.outlet.enqueue(value).is_err() {
        tracing::trace!("current value not primed; subscriber closed");
      }
    }
    self.outlet.flush();
  }
}
