use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use parking_lot::Mutex;

use crate::{
  demand::Demand,
  error::Completion,
  subscriber::Subscriber,
  subscription::{AnyCancellable, Cancellable, SubscriptionRef},
};

/// Terminal subscriber built from closures. It requests unlimited demand as
/// soon as it is subscribed.
///
/// Usually created through `PublisherExt::sink` or
/// `PublisherExt::sink_completion`, which also return the cancel handle.
pub struct Sink<F, C> {
  on_value: F,
  on_completion: Option<C>,
  link: Arc<SinkLink>,
}

#[derive(Default)]
struct SinkLink {
  upstream: Mutex<Option<SubscriptionRef>>,
  cancelled: AtomicBool,
}

impl Cancellable for SinkLink {
  fn cancel(&self) {
    if self.cancelled.swap(true, Ordering::AcqRel) {
      return;
    }
    let upstream = self.upstream.lock().take();
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
  }
}

impl<F, C> Sink<F, C> {
  pub fn new(on_value: F, on_completion: C) -> Self {
    Sink { on_value, on_completion: Some(on_completion), link: Arc::default() }
  }

  /// A handle that cancels this sink's subscription, including on drop.
  pub fn cancellable(&self) -> AnyCancellable { AnyCancellable::from_arc(self.link.clone()) }
}

impl<Item, Err, F, C> Subscriber<Item, Err> for Sink<F, C>
where
  F: FnMut(Item) + Send,
  C: FnOnce(Completion<Err>) + Send,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    if self.link.cancelled.load(Ordering::Acquire) {
      subscription.cancel();
      return;
    }
    *self.link.upstream.lock() = Some(subscription.clone());
    subscription.request(Demand::UNLIMITED);
  }

  fn on_value(&mut self, value: Item) -> Demand {
    (self.on_value)(value);
    Demand::NONE
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.link.upstream.lock().take();
    if let Some(on_completion) = self.on_completion.take() {
      on_completion(completion);
    }
  }
}
