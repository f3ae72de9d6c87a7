use std::{convert::Infallible, sync::Arc};

use parking_lot::Mutex;

use super::{subject_core::SubjectCore, Subject};
use crate::{
  demand::Demand, error::Completion, publisher::Publisher, subscriber::Subscriber,
  subscription::SubscriptionRef,
};

/// A subject that always holds a current value.
///
/// A new subscriber receives the current value as soon as it requests
/// anything, followed by whatever is sent afterwards. Once the subject has
/// terminated, new subscribers only receive the completion.
pub struct CurrentValueSubject<Item, Err = Infallible> {
  core: Arc<SubjectCore<Item, Err>>,
  current: Arc<Mutex<Item>>,
}

impl<Item, Err> CurrentValueSubject<Item, Err> {
  pub fn new(value: Item) -> Self {
    CurrentValueSubject { core: SubjectCore::new(), current: Arc::new(Mutex::new(value)) }
  }

  /// The most recently sent value, or the initial one.
  pub fn value(&self) -> Item
  where
    Item: Clone,
  {
    self.current.lock().clone()
  }

  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }

  pub fn is_terminated(&self) -> bool { self.core.is_terminated() }

  pub fn close(&self)
  where
    Err: Clone,
  {
    self.core.complete(Completion::Finished);
  }
}

impl<Item, Err> CurrentValueSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  /// Same as [`Subject::send`].
  pub fn set_value(&self, value: Item) { self.send(value) }
}

impl<Item: Default, Err> Default for CurrentValueSubject<Item, Err> {
  fn default() -> Self { Self::new(Item::default()) }
}

impl<Item, Err> Clone for CurrentValueSubject<Item, Err> {
  fn clone(&self) -> Self {
    CurrentValueSubject { core: self.core.clone(), current: self.current.clone() }
  }
}

impl<Item, Err> Publisher for CurrentValueSubject<Item, Err>
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
    self.core.attach(subscriber, Some(self.current.clone()))
  }
}

impl<Item, Err> Subject<Item, Err> for CurrentValueSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn send(&self, value: Item) {
    let current = &self.current;
    self.core.send(value, |value| *current.lock() = value.clone())
  }

  fn send_completion(&self, completion: Completion<Err>) { self.core.complete(completion); }
}

impl<Item, Err> Subscriber<Item, Err> for CurrentValueSubject<Item, Err>
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
