use crate::{
  demand::Demand, error::Completion, publisher::Publisher, subscriber::Subscriber,
  subscription::SubscriptionRef,
};

/// Forwards values while a predicate holds. The first value failing it is
/// dropped, upstream is cancelled and the subscriber is finished.
#[derive(Clone)]
pub struct PrefixWhile<S, F> {
  source: S,
  predicate: F,
}

impl<S, F> PrefixWhile<S, F> {
  pub fn new(source: S, predicate: F) -> Self { PrefixWhile { source, predicate } }
}

impl<S, F> Publisher for PrefixWhile<S, F>
where
  S: Publisher,
  F: FnMut(&S::Item) -> bool + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<S::Item, S::Err> + 'static,
  {
    self.source.subscribe(PrefixWhileSubscriber {
      downstream: subscriber,
      predicate: self.predicate,
      upstream: None,
      done: false,
    })
  }
}

struct PrefixWhileSubscriber<D, F> {
  downstream: D,
  predicate: F,
  upstream: Option<SubscriptionRef>,
  done: bool,
}

impl<Item, Err, D, F> Subscriber<Item, Err> for PrefixWhileSubscriber<D, F>
where
  D: Subscriber<Item, Err>,
  F: FnMut(&Item) -> bool + Send,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    self.upstream = Some(subscription.clone());
    self.downstream.on_subscribe(subscription)
  }

  fn on_value(&mut self, value: Item) -> Demand {
    if self.done {
      return Demand::NONE;
    }
    if (self.predicate)(&value) {
      return self.downstream.on_value(value);
    }
    self.done = true;
    if let Some(upstream) = self.upstream.take() {
      upstream.cancel();
    }
    self.downstream.on_completion(Completion::Finished);
    Demand::NONE
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.upstream = None;
    if !self.done {
      self.done = true;
      self.downstream.on_completion(completion);
    }
  }
}
