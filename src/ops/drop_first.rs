use crate::{
  demand::Demand, error::Completion, publisher::Publisher, subscriber::Subscriber,
  subscription::SubscriptionRef,
};

/// Skips the first `count` values, then passes everything through.
#[derive(Clone)]
pub struct DropFirst<S> {
  source: S,
  count: usize,
}

impl<S> DropFirst<S> {
  pub fn new(source: S, count: usize) -> Self { DropFirst { source, count } }
}

impl<S: Publisher> Publisher for DropFirst<S> {
  type Item = S::Item;
  type Err = S::Err;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<S::Item, S::Err> + 'static,
  {
    self.source.subscribe(DropFirstSubscriber { downstream: subscriber, remaining: self.count })
  }
}

struct DropFirstSubscriber<D> {
  downstream: D,
  remaining: usize,
}

impl<Item, Err, D> Subscriber<Item, Err> for DropFirstSubscriber<D>
where
  D: Subscriber<Item, Err>,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    self.downstream.on_subscribe(subscription)
  }

  fn on_value(&mut self, value: Item) -> Demand {
    if self.remaining > 0 {
      self.remaining -= 1;
      // replace the unit the skipped value used up
      return Demand::max(1);
    }
    self.downstream.on_value(value)
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.downstream.on_completion(completion)
  }
}
