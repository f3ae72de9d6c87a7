use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  demand::Demand,
  error::Completion,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{Cancellable, Subscription, SubscriptionRef},
};

/// Forwards at most `count` values, then cancels upstream and finishes.
///
/// Requests passing through are capped at the number of values still
/// allowed, so the source is never asked for more than `count` values.
#[derive(Clone)]
pub struct Prefix<S> {
  source: S,
  count: usize,
}

impl<S> Prefix<S> {
  pub fn new(source: S, count: usize) -> Self { Prefix { source, count } }
}

impl<S: Publisher> Publisher for Prefix<S> {
  type Item = S::Item;
  type Err = S::Err;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<S::Item, S::Err> + 'static,
  {
    let gate = Arc::new(PrefixGate {
      upstream: Mutex::new(None),
      unrequested: Mutex::new(self.count),
    });
    self.source.subscribe(PrefixSubscriber {
      downstream: subscriber,
      remaining: self.count,
      gate,
      done: false,
    })
  }
}

// ==================== Gate ====================

/// The subscription handed downstream. It caps requests and owns the
/// upstream subscription so the subscriber side can cancel it.
struct PrefixGate {
  upstream: Mutex<Option<SubscriptionRef>>,
  unrequested: Mutex<usize>,
}

impl PrefixGate {
  /// The part of `demand` that may still go upstream.
  fn admit(&self, demand: Demand) -> Demand {
    let mut unrequested = self.unrequested.lock();
    let admitted = demand.at_most(*unrequested);
    *unrequested -= admitted.count().unwrap_or(0);
    admitted
  }
}

impl Cancellable for PrefixGate {
  fn cancel(&self) {
    let upstream = self.upstream.lock().take();
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
  }
}

impl Subscription for PrefixGate {
  fn request(&self, demand: Demand) {
    let admitted = self.admit(demand);
    if admitted.is_none() {
      return;
    }
    let upstream = self.upstream.lock().clone();
    if let Some(upstream) = upstream {
      upstream.request(admitted);
    }
  }
}

// ==================== Subscriber ====================

struct PrefixSubscriber<D> {
  downstream: D,
  remaining: usize,
  gate: Arc<PrefixGate>,
  done: bool,
}

impl<Item, Err, D> Subscriber<Item, Err> for PrefixSubscriber<D>
where
  D: Subscriber<Item, Err>,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    *self.gate.upstream.lock() = Some(subscription);
    self.downstream.on_subscribe(self.gate.clone());
    if self.remaining == 0 && !self.done {
      self.done = true;
      self.gate.cancel();
      self.downstream.on_completion(Completion::Finished);
    }
  }

  fn on_value(&mut self, value: Item) -> Demand {
    if self.done {
      return Demand::NONE;
    }
    self.remaining -= 1;
    let more = self.downstream.on_value(value);
    if self.remaining == 0 {
      self.done = true;
      self.gate.cancel();
      self.downstream.on_completion(Completion::Finished);
      return Demand::NONE;
    }
    self.gate.admit(more)
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    if !self.done {
      self.done = true;
      self.downstream.on_completion(completion);
    }
  }
}
