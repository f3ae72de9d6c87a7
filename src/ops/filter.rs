use crate::{
  demand::Demand, error::Completion, publisher::Publisher, subscriber::Subscriber,
  subscription::SubscriptionRef,
};

/// Forwards only the values matching a predicate.
///
/// Every dropped value gives its unit of demand back upstream, so the
/// downstream still receives as many matching values as it requested.
#[derive(Clone)]
pub struct Filter<S, F> {
  source: S,
  predicate: F,
}

impl<S, F> Filter<S, F> {
  pub fn new(source: S, predicate: F) -> Self { Filter { source, predicate } }
}

impl<S, F> Publisher for Filter<S, F>
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
    self.source.subscribe(FilterSubscriber { downstream: subscriber, predicate: self.predicate })
  }
}

struct FilterSubscriber<D, F> {
  downstream: D,
  predicate: F,
}

impl<Item, Err, D, F> Subscriber<Item, Err> for FilterSubscriber<D, F>
where
  D: Subscriber<Item, Err>,
  F: FnMut(&Item) -> bool + Send,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    self.downstream.on_subscribe(subscription)
  }

  fn on_value(&mut self, value: Item) -> Demand {
    if (self.predicate)(&value) { self.downstream.on_value(value) } else { Demand::max(1) }
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.downstream.on_completion(completion)
  }
}

#[cfg(test)]
mod tests {
  use crate::{prelude::*, test_support::Probe};

  #[rxdemand_macro::test]
  fn dropped_values_do_not_use_up_demand() {
    let probe = Probe::new();
    from_iter(1..=10).filter(|v| v % 3 == 0).subscribe(probe.subscriber(Demand::max(2)));
    assert_eq!(probe.values(), vec![3, 6]);
    assert!(!probe.is_finished());

    probe.request(Demand::max(5));
    assert_eq!(probe.values(), vec![3, 6, 9]);
    assert!(probe.is_finished());
  }
}
