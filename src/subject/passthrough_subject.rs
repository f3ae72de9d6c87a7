use std::{convert::Infallible, sync::Arc};

use super::{subject_core::SubjectCore, Subject};
use crate::{
  demand::Demand, error::Completion, publisher::Publisher, subscriber::Subscriber,
  subscription::SubscriptionRef,
};

/// A subject without memory: subscribers only see what is sent after they
/// subscribed and while they have demand.
///
/// Dropping the last handle, or calling [`close`](Self::close), finishes
/// every open subscription.
pub struct PassthroughSubject<Item, Err = Infallible> {
  core: Arc<SubjectCore<Item, Err>>,
}

impl<Item, Err> PassthroughSubject<Item, Err> {
  pub fn new() -> Self { PassthroughSubject { core: SubjectCore::new() } }

  /// Number of subscriptions currently registered.
  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }

  pub fn is_terminated(&self) -> bool { self.core.is_terminated() }

  /// Finish every open subscription now, without waiting for the last
  /// handle to be dropped.
  pub fn close(&self)
  where
    Err: Clone,
  {
    self.core.complete(Completion::Finished);
  }
}

impl<Item, Err> Default for PassthroughSubject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> Clone for PassthroughSubject<Item, Err> {
  fn clone(&self) -> Self { PassthroughSubject { core: self.core.clone() } }
}

impl<Item, Err> Publisher for PassthroughSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Item, Err> + 'static,
  {
    self.core.attach(subscriber, None)
  }
}

impl<Item, Err> Subject<Item, Err> for PassthroughSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn send(&self, value: Item) { self.core.send(value, |_| {}) }

  fn send_completion(&self, completion: Completion<Err>) { self.core.complete(completion); }
}

/// Relays another publisher into this subject, with unlimited demand.
impl<Item, Err> Subscriber<Item, Err> for PassthroughSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) { self.core.relay_from(subscription) }

  fn on_value(&mut self, value: Item) -> Demand {
    Subject::send(self, value);
    Demand::NONE
  }

  fn on_completion(&mut self, completion: Completion<Err>) { self.send_completion(completion) }
}
