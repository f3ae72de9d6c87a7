//! The consumer side of the protocol.

use crate::{demand::Demand, error::Completion, subscription::SubscriptionRef};

mod sink;
pub use sink::Sink;

/// A consumer of `Item`s that may fail with `Err`.
///
/// A publisher calls `on_subscribe` exactly once, before anything else. After
/// that it calls `on_value` at most as many times as the subscriber has
/// demanded, and `on_completion` at most once. Nothing is delivered after
/// `on_completion` or after the subscription was cancelled.
pub trait Subscriber<Item, Err>: Send {
  fn on_subscribe(&mut self, subscription: SubscriptionRef);

  /// Receive one value and return how many *additional* values may be sent.
  fn on_value(&mut self, value: Item) -> Demand;

  fn on_completion(&mut self, completion: Completion<Err>);
}

pub type BoxedSubscriber<Item, Err> = Box<dyn Subscriber<Item, Err>>;

impl<Item, Err, S> Subscriber<Item, Err> for Box<S>
where
  S: Subscriber<Item, Err> + ?Sized,
{
  #[inline]
  fn on_subscribe(&mut self, subscription: SubscriptionRef) { (**self).on_subscribe(subscription) }

  #[inline]
  fn on_value(&mut self, value: Item) -> Demand { (**self).on_value(value) }

  #[inline]
  fn on_completion(&mut self, completion: Completion<Err>) { (**self).on_completion(completion) }
}
