use crate::{
  demand::Demand, error::Completion, publisher::Publisher, subscriber::Subscriber,
  subscription::SubscriptionRef,
};

/// Applies a function to every value.
#[derive(Clone)]
pub struct Map<S, F> {
  source: S,
  func: F,
}

impl<S, F> Map<S, F> {
  pub fn new(source: S, func: F) -> Self { Map { source, func } }
}

impl<S, F, Out> Publisher for Map<S, F>
where
  S: Publisher,
  F: FnMut(S::Item) -> Out + Send + 'static,
{
  type Item = Out;
  type Err = S::Err;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Out, S::Err> + 'static,
  {
    self.source.subscribe(MapSubscriber { downstream: subscriber, func: self.func })
  }
}

struct MapSubscriber<D, F> {
  downstream: D,
  func: F,
}

impl<Item, Out, Err, D, F> Subscriber<Item, Err> for MapSubscriber<D, F>
where
  D: Subscriber<Out, Err>,
  F: FnMut(Item) -> Out + Send,
{
  #[inline]
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    self.downstream.on_subscribe(subscription)
  }

  #[inline]
  fn on_value(&mut self, value: Item) -> Demand { self.downstream.on_value((self.func)(value)) }

  #[inline]
  fn on_completion(&mut self, completion: Completion<Err>) {
    self.downstream.on_completion(completion)
  }
}

#[cfg(test)]
mod tests {
  use crate::{prelude::*, test_support::Probe};

  #[rxdemand_macro::test]
  fn transforms_each_value() {
    let probe = Probe::new();
    from_iter(1..=3).map(|v| v * 10).subscribe(probe.subscriber(Demand::UNLIMITED));
    assert_eq!(probe.values(), vec![10, 20, 30]);
    assert!(probe.is_finished());
  }

  #[rxdemand_macro::test]
  fn changes_the_item_type() {
    let probe = Probe::new();
    from_iter(vec!['a', 'b']).map(|c| c.to_string()).subscribe(probe.subscriber(Demand::max(1)));
    assert_eq!(probe.values(), vec!["a".to_string()]);
  }
}
