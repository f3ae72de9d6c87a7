use std::convert::Infallible;

use crate::{
  demand::Demand, error::Completion, publisher::Publisher, subscriber::Subscriber,
  subscription::SubscriptionRef,
};

/// Converts the failure of the source with a function. Values and normal
/// completion pass through.
#[derive(Clone)]
pub struct MapErr<S, F> {
  source: S,
  func: F,
}

impl<S, F> MapErr<S, F> {
  pub fn new(source: S, func: F) -> Self { MapErr { source, func } }
}

/// The failure conversion used by `set_failure_type`. It can never run.
pub(crate) fn absurd<E>(never: Infallible) -> E { match never {} }

impl<S, F, E> Publisher for MapErr<S, F>
where
  S: Publisher,
  F: FnMut(S::Err) -> E + Send + 'static,
{
  type Item = S::Item;
  type Err = E;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<S::Item, E> + 'static,
  {
    self.source.subscribe(MapErrSubscriber { downstream: subscriber, func: self.func })
  }
}

struct MapErrSubscriber<D, F> {
  downstream: D,
  func: F,
}

impl<Item, Err, E, D, F> Subscriber<Item, Err> for MapErrSubscriber<D, F>
where
  D: Subscriber<Item, E>,
  F: FnMut(Err) -> E + Send,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    self.downstream.on_subscribe(subscription)
  }

  fn on_value(&mut self, value: Item) -> Demand { self.downstream.on_value(value) }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.downstream.on_completion(completion.map_err(&mut self.func))
  }
}
