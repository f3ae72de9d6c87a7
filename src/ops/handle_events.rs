//! Side-effect hooks on every subscription event.

use std::{marker::PhantomData, sync::Arc};

use crate::{
  demand::Demand,
  error::Completion,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{Cancellable, Subscription, SubscriptionRef},
};

/// Callbacks invoked as events pass through [`HandleEvents`]. Every method
/// defaults to doing nothing.
///
/// `request` and `cancel` are driven from the downstream side, the others
/// from upstream, so a handler may be called from several threads.
pub trait EventHandler<Item, Err>: Send + Sync + 'static {
  fn subscription(&self) {}

  fn value(&self, _value: &Item) {}

  fn completion(&self, _completion: &Completion<Err>) {}

  fn cancel(&self) {}

  fn request(&self, _demand: Demand) {}
}

type Hook<T> = Option<Box<dyn Fn(T) + Send + Sync>>;

/// An [`EventHandler`] assembled from optional closures.
pub struct EventHooks<Item, Err> {
  on_subscription: Hook<()>,
  on_value: Option<Box<dyn Fn(&Item) + Send + Sync>>,
  on_completion: Option<Box<dyn Fn(&Completion<Err>) + Send + Sync>>,
  on_cancel: Hook<()>,
  on_request: Hook<Demand>,
}

impl<Item, Err> Default for EventHooks<Item, Err> {
  fn default() -> Self {
    EventHooks {
      on_subscription: None,
      on_value: None,
      on_completion: None,
      on_cancel: None,
      on_request: None,
    }
  }
}

impl<Item, Err> EventHooks<Item, Err> {
  pub fn new() -> Self { Self::default() }

  pub fn on_subscription(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
    self.on_subscription = Some(Box::new(move |()| f()));
    self
  }

  pub fn on_value(mut self, f: impl Fn(&Item) + Send + Sync + 'static) -> Self {
    self.on_value = Some(Box::new(f));
    self
  }

  pub fn on_completion(mut self, f: impl Fn(&Completion<Err>) + Send + Sync + 'static) -> Self {
    self.on_completion = Some(Box::new(f));
    self
  }

  pub fn on_cancel(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
    self.on_cancel = Some(Box::new(move |()| f()));
    self
  }

  pub fn on_request(mut self, f: impl Fn(Demand) + Send + Sync + 'static) -> Self {
    self.on_request = Some(Box::new(f));
    self
  }
}

impl<Item: 'static, Err: 'static> EventHandler<Item, Err> for EventHooks<Item, Err> {
  fn subscription(&self) {
    if let Some(f) = &self.on_subscription {
      f(())
    }
  }

  fn value(&self, value: &Item) {
    if let Some(f) = &self.on_value {
      f(value)
    }
  }

  fn completion(&self, completion: &Completion<Err>) {
    if let Some(f) = &self.on_completion {
      f(completion)
    }
  }

  fn cancel(&self) {
    if let Some(f) = &self.on_cancel {
      f(())
    }
  }

  fn request(&self, demand: Demand) {
    if let Some(f) = &self.on_request {
      f(demand)
    }
  }
}

// ==================== Operator ====================

/// Forwards everything unchanged, reporting each event to a handler first.
#[derive(Clone)]
pub struct HandleEvents<S, H> {
  source: S,
  handler: H,
}

impl<S, H> HandleEvents<S, H> {
  pub fn new(source: S, handler: H) -> Self { HandleEvents { source, handler } }
}

impl<S, H> Publisher for HandleEvents<S, H>
where
  S: Publisher,
  S::Item: 'static,
  S::Err: 'static,
  H: EventHandler<S::Item, S::Err>,
{
  type Item = S::Item;
  type Err = S::Err;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<S::Item, S::Err> + 'static,
  {
    self
      .source
      .subscribe(HandleEventsSubscriber { downstream: subscriber, handler: Arc::new(self.handler) })
  }
}

struct HandleEventsSubscriber<D, H> {
  downstream: D,
  handler: Arc<H>,
}

struct HandleEventsSubscription<H, Item, Err> {
  upstream: SubscriptionRef,
  handler: Arc<H>,
  _events: PhantomData<fn(Item, Err)>,
}

impl<Item, Err, D, H> Subscriber<Item, Err> for HandleEventsSubscriber<D, H>
where
  Item: 'static,
  Err: 'static,
  D: Subscriber<Item, Err>,
  H: EventHandler<Item, Err>,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    self.handler.subscription();
    let wrapped = HandleEventsSubscription::<H, Item, Err> {
      upstream: subscription,
      handler: self.handler.clone(),
      _events: PhantomData,
    };
    self.downstream.on_subscribe(Arc::new(wrapped))
  }

  fn on_value(&mut self, value: Item) -> Demand {
    self.handler.value(&value);
    self.downstream.on_value(value)
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.handler.completion(&completion);
    self.downstream.on_completion(completion)
  }
}

impl<H, Item, Err> Cancellable for HandleEventsSubscription<H, Item, Err>
where
  H: EventHandler<Item, Err>,
{
  fn cancel(&self) {
    self.handler.cancel();
    self.upstream.cancel()
  }
}

impl<H, Item, Err> Subscription for HandleEventsSubscription<H, Item, Err>
where
  H: EventHandler<Item, Err>,
{
  fn request(&self, demand: Demand) {
    self.handler.request(demand);
    self.upstream.request(demand)
  }
}
