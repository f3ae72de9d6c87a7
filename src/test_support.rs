//! Recording subscriber shared by the unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{demand::Demand, error::Completion, subscriber::Subscriber, subscription::SubscriptionRef};

struct ProbeState<Item, Err> {
  values: Vec<Item>,
  completion: Option<Completion<Err>>,
  completions: usize,
  subscription: Option<SubscriptionRef>,
}

/// Inspects what a publisher delivered and drives demand by hand.
pub(crate) struct Probe<Item, Err> {
  state: Arc<Mutex<ProbeState<Item, Err>>>,
}

impl<Item, Err> Clone for Probe<Item, Err> {
  fn clone(&self) -> Self { Probe { state: self.state.clone() } }
}

impl<Item, Err> Probe<Item, Err> {
  pub(crate) fn new() -> Self {
    Probe {
      state: Arc::new(Mutex::new(ProbeState {
        values: vec![],
        completion: None,
        completions: 0,
        subscription: None,
      })),
    }
  }

  /// A subscriber that requests `initial` on subscribe and nothing more.
  pub(crate) fn subscriber(&self, initial: Demand) -> ProbeSubscriber<Item, Err> {
    self.subscriber_with(initial, |_| Demand::NONE)
  }

  /// A subscriber that requests `initial` on subscribe and answers every
  /// value with `reply`.
  pub(crate) fn subscriber_with(
    &self, initial: Demand, reply: impl FnMut(&Item) -> Demand + Send + 'static,
  ) -> ProbeSubscriber<Item, Err> {
    ProbeSubscriber { state: self.state.clone(), initial, reply: Box::new(reply) }
  }

  pub(crate) fn values(&self) -> Vec<Item>
  where
    Item: Clone,
  {
    self.state.lock().values.clone()
  }

  pub(crate) fn completion(&self) -> Option<Completion<Err>>
  where
    Err: Clone,
  {
    self.state.lock().completion.clone()
  }

  pub(crate) fn completions(&self) -> usize { self.state.lock().completions }

  pub(crate) fn is_finished(&self) -> bool {
    matches!(self.state.lock().completion, Some(Completion::Finished))
  }

  pub(crate) fn request(&self, demand: Demand) {
    let subscription = self.state.lock().subscription.clone();
    if let Some(subscription) = subscription {
      subscription.request(demand);
    }
  }

  pub(crate) fn cancel(&self) {
    let subscription = self.state.lock().subscription.take();
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }
}

pub(crate) struct ProbeSubscriber<Item, Err> {
  state: Arc<Mutex<ProbeState<Item, Err>>>,
  initial: Demand,
  reply: Box<dyn FnMut(&Item) -> Demand + Send>,
}

impl<Item: Send, Err: Send> Subscriber<Item, Err> for ProbeSubscriber<Item, Err> {
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    self.state.lock().subscription = Some(subscription.clone());
    if self.initial.has_demand() {
      subscription.request(self.initial);
    }
  }

  fn on_value(&mut self, value: Item) -> Demand {
    let more = (self.reply)(&value);
    self.state.lock().values.push(value);
    more
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    let mut state = self.state.lock();
    state.completions += 1;
    state.completion = Some(completion);
  }
}
