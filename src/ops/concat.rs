//! Sequential concatenation, the operator behind `prepend` and `append`.
//!
//! The second publisher is subscribed only after the first one finishes, so
//! a live subject in second position misses whatever it sends before that.
//! Demand the downstream still has outstanding at the switch is requested
//! from the second publisher as soon as it subscribes.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  demand::Demand,
  error::Completion,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{outlet::Outlet, Cancellable, Subscription, SubscriptionRef},
};

/// Emits everything `first` emits, then everything `second` emits.
#[derive(Clone)]
pub struct Concat<A, B> {
  first: A,
  second: B,
}

impl<A, B> Concat<A, B> {
  pub fn new(first: A, second: B) -> Self { Concat { first, second } }
}

impl<A, B> Publisher for Concat<A, B>
where
  A: Publisher,
  B: Publisher<Item = A::Item, Err = A::Err> + Send + 'static,
  A::Item: Send + 'static,
  A::Err: Send + 'static,
{
  type Item = A::Item;
  type Err = A::Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<A::Item, A::Err> + 'static,
  {
    let shared = Arc::new(ConcatShared {
      outlet: Outlet::new(subscriber),
      state: Mutex::new(ConcatState { second: Some(self.second), current: None }),
    });
    shared.outlet.subscribe(shared.clone());
    if shared.outlet.is_closed() {
      return;
    }
    self.first.subscribe(Phase { shared, first: true });
  }
}

struct ConcatState<B> {
  second: Option<B>,
  current: Option<SubscriptionRef>,
}

struct ConcatShared<Item, Err, B> {
  outlet: Outlet<Item, Err>,
  state: Mutex<ConcatState<B>>,
}

impl<Item, Err, B> Cancellable for ConcatShared<Item, Err, B>
where
  Item: Send,
  Err: Send,
  B: Send,
{
  fn cancel(&self) {
    self.outlet.cancel();
    let current = {
      let mut state = self.state.lock();
      state.second = None;
      state.current.take()
    };
    if let Some(current) = current {
      current.cancel();
    }
  }
}

impl<Item, Err, B> Subscription for ConcatShared<Item, Err, B>
where
  Item: Send,
  Err: Send,
  B: Send,
{
  fn request(&self, demand: Demand) {
    let current = {
      let state = self.state.lock();
      if !self.outlet.add_demand(demand) {
        return;
      }
      state.current.clone()
    };
    if let Some(current) = current {
      current.request(demand);
    }
  }
}

// ==================== Phases ====================

struct Phase<Item, Err, B> {
  shared: Arc<ConcatShared<Item, Err, B>>,
  first: bool,
}

impl<Item, Err, B> Subscriber<Item, Err> for Phase<Item, Err, B>
where
  Item: Send + 'static,
  Err: Send + 'static,
  B: Publisher<Item = Item, Err = Err> + Send + 'static,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    let outstanding = {
      let mut state = self.shared.state.lock();
      if self.shared.outlet.is_closed() {
        None
      } else {
        state.current = Some(subscription.clone());
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
    self.shared.outlet.offer(value).unwrap_or(Demand::NONE)
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    let next = {
      let mut state = self.shared.state.lock();
      state.current = None;
      if self.first && completion.is_finished() { state.second.take() } else { None }
    };
    match next {
      Some(second) => second.subscribe(Phase { shared: self.shared.clone(), first: false }),
      // cancelled while the first phase was running
      None if self.first && completion.is_finished() => {}
      None => {
        self.shared.outlet.finish(completion);
      }
    }
  }
}
