//! Flattening that follows only the most recent inner publisher.
//!
//! The outer publisher is asked for unlimited demand. Every inner
//! subscription is tagged with a generation number; a newer inner publisher
//! bumps the generation and cancels the previous subscription, and anything
//! still arriving from an older generation is dropped. Downstream demand
//! that the previous inner did not use is requested from the new one.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  demand::Demand,
  error::Completion,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{outlet::Outlet, Cancellable, Subscription, SubscriptionRef},
};

/// Emits the values of the latest publisher produced by the source.
///
/// Finishes when the source has finished and the current inner publisher,
/// if any, has finished too. A failure from the source or from the current
/// inner publisher is forwarded at once.
#[derive(Clone)]
pub struct SwitchToLatest<S> {
  source: S,
}

impl<S> SwitchToLatest<S> {
  pub fn new(source: S) -> Self { SwitchToLatest { source } }
}

impl<S> Publisher for SwitchToLatest<S>
where
  S: Publisher,
  S::Item: Publisher<Err = S::Err>,
  <S::Item as Publisher>::Item: Send + 'static,
  S::Err: Send + 'static,
{
  type Item = <S::Item as Publisher>::Item;
  type Err = S::Err;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Self::Item, S::Err> + 'static,
  {
    let shared = Arc::new(SwitchShared {
      outlet: Outlet::new(subscriber),
      state: Mutex::new(SwitchState {
        outer: None,
        inner: None,
        generation: 0,
        inner_active: false,
        outer_finished: false,
        done: false,
      }),
    });
    shared.outlet.subscribe(shared.clone());
    if !shared.outlet.is_closed() {
      self.source.subscribe(OuterSubscriber { shared });
    }
  }
}

struct SwitchState {
  outer: Option<SubscriptionRef>,
  inner: Option<SubscriptionRef>,
  generation: u64,
  inner_active: bool,
  outer_finished: bool,
  done: bool,
}

impl SwitchState {
  fn close(&mut self) -> Vec<SubscriptionRef> {
    self.done = true;
    self.inner_active = false;
    self.outer.take().into_iter().chain(self.inner.take()).collect()
  }
}

struct SwitchShared<Item, Err> {
  outlet: Outlet<Item, Err>,
  state: Mutex<SwitchState>,
}

impl<Item, Err> SwitchShared<Item, Err> {
  fn fail(&self, err: Err) {
    let rest = {
      let mut state = self.state.lock();
      if state.done {
        return;
      }
      state.close()
    };
    for subscription in rest {
      subscription.cancel();
    }
    self.outlet.finish(Completion::Failed(err));
  }

  fn finish_if_idle(&self) {
    {
      let mut state = self.state.lock();
      if state.done || !state.outer_finished || state.inner_active {
        return;
      }
      state.done = true;
    }
    self.outlet.finish(Completion::Finished);
  }
}

impl<Item: Send, Err: Send> Cancellable for SwitchShared<Item, Err> {
  fn cancel(&self) {
    self.outlet.cancel();
    let rest = self.state.lock().close();
    for subscription in rest {
      subscription.cancel();
    }
  }
}

impl<Item: Send, Err: Send> Subscription for SwitchShared<Item, Err> {
  fn request(&self, demand: Demand) {
    let inner = {
      let state = self.state.lock();
      if !self.outlet.add_demand(demand) {
        return;
      }
      state.inner.clone()
    };
    if let Some(inner) = inner {
      inner.request(demand);
    }
  }
}

// ==================== Outer ====================

struct OuterSubscriber<Item, Err> {
  shared: Arc<SwitchShared<Item, Err>>,
}

impl<P, Item, Err> Subscriber<P, Err> for OuterSubscriber<Item, Err>
where
  P: Publisher<Item = Item, Err = Err>,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    let live = {
      let mut state = self.shared.state.lock();
      if !state.done {
        state.outer = Some(subscription.clone());
      }
      !state.done
    };
    if live {
      subscription.request(Demand::UNLIMITED);
    } else {
      subscription.cancel();
    }
  }

  fn on_value(&mut self, publisher: P) -> Demand {
    let (generation, previous) = {
      let mut state = self.shared.state.lock();
      if state.done {
        return Demand::NONE;
      }
      state.generation += 1;
      state.inner_active = true;
      (state.generation, state.inner.take())
    };
    if let Some(previous) = previous {
      tracing::trace!("switch_to_latest: generation {generation} replaces the previous inner");
      previous.cancel();
    }
    publisher.subscribe(InnerSubscriber { shared: self.shared.clone(), generation });
    Demand::NONE
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    match completion {
      Completion::Finished => {
        {
          let mut state = self.shared.state.lock();
          state.outer_finished = true;
          state.outer = None;
        }
        self.shared.finish_if_idle();
      }
      Completion::Failed(err) => self.shared.fail(err),
    }
  }
}

// ==================== Inner ====================

struct InnerSubscriber<Item, Err> {
  shared: Arc<SwitchShared<Item, Err>>,
  generation: u64,
}

impl<Item, Err> InnerSubscriber<Item, Err> {
  fn is_current(&self) -> bool {
    let state = self.shared.state.lock();
    !state.done && state.generation == self.generation
  }
}

impl<Item: Send, Err: Send> Subscriber<Item, Err> for InnerSubscriber<Item, Err> {
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    let outstanding = {
      let mut state = self.shared.state.lock();
      if state.done || state.generation != self.generation {
        None
      } else {
        state.inner = Some(subscription.clone());
        Some(self.shared.outlet.demand())
      }
    };
    match outstanding {
      None => subscription.cancel(),
      Some(demand) if demand.has_demand() => subscription.request(demand),
      Some(_) => {}
    }
  }

  fn on_value(&mut self, value: Item) -> Demand {
    if !self.is_current() {
      return Demand::NONE;
    }
    self.shared.outlet.offer(value).unwrap_or(Demand::NONE)
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    if !self.is_current() {
      return;
    }
    match completion {
      Completion::Finished => {
        {
          let mut state = self.shared.state.lock();
          state.inner = None;
          state.inner_active = false;
        }
        self.shared.finish_if_idle();
      }
      Completion::Failed(err) => self.shared.fail(err),
    }
  }
}
