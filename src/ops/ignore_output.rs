use std::sync::Arc;

use crate::{
  demand::Demand,
  error::Completion,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{Cancellable, Subscription, SubscriptionRef},
};

/// Drops every value and forwards only the terminal signal.
///
/// Upstream is asked for unlimited demand as soon as it subscribes; requests
/// made downstream have nothing to govern and are ignored.
#[derive(Clone)]
pub struct IgnoreOutput<S> {
  source: S,
}

impl<S> IgnoreOutput<S> {
  pub fn new(source: S) -> Self { IgnoreOutput { source } }
}

impl<S: Publisher> Publisher for IgnoreOutput<S> {
  type Item = S::Item;
  type Err = S::Err;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<S::Item, S::Err> + 'static,
  {
    self.source.subscribe(IgnoreOutputSubscriber { downstream: subscriber })
  }
}

struct IgnoreOutputSubscriber<D> {
  downstream: D,
}

struct CancelOnly(SubscriptionRef);

impl Cancellable for CancelOnly {
  fn cancel(&self) { self.0.cancel() }
}

impl Subscription for CancelOnly {
  fn request(&self, demand: Demand) {
    tracing::trace!("ignore_output: downstream request for {demand} ignored");
  }
}

impl<Item, Err, D> Subscriber<Item, Err> for IgnoreOutputSubscriber<D>
where
  D: Subscriber<Item, Err>,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    self.downstream.on_subscribe(Arc::new(CancelOnly(subscription.clone())));
    subscription.request(Demand::UNLIMITED);
  }

  fn on_value(&mut self, _: Item) -> Demand { Demand::NONE }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.downstream.on_completion(completion)
  }
}
