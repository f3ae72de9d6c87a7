//! Multicast one upstream subscription to many subscribers.
//!
//! `share` puts a [`PassthroughSubject`] between the source and its
//! subscribers and counts them. The first subscriber connects the source to
//! the subject; when the last one cancels, the source is cancelled and the
//! next subscriber connects a fresh copy of it.
//!
//! The subject asks the source for unlimited demand, so a subscriber without
//! outstanding demand misses values just as it would on a subject.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use parking_lot::Mutex;

use crate::{
  demand::Demand,
  error::Completion,
  publisher::Publisher,
  subject::PassthroughSubject,
  subscriber::Subscriber,
  subscription::{Cancellable, Subscription, SubscriptionRef},
};

pub struct Share<S: Publisher> {
  shared: Arc<Mutex<ShareState<S>>>,
}

struct ShareState<S: Publisher> {
  source: S,
  subject: PassthroughSubject<S::Item, S::Err>,
  connected: bool,
  subscribers: usize,
  generation: u64,
}

impl<S: Publisher> Share<S> {
  pub fn new(source: S) -> Self {
    Share {
      shared: Arc::new(Mutex::new(ShareState {
        source,
        subject: PassthroughSubject::new(),
        connected: false,
        subscribers: 0,
        generation: 0,
      })),
    }
  }
}

impl<S: Publisher> Clone for Share<S> {
  fn clone(&self) -> Self { Share { shared: self.shared.clone() } }
}

impl<S> Publisher for Share<S>
where
  S: Publisher + Clone + Send + 'static,
  S::Item: Clone + Send + 'static,
  S::Err: Clone + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<S::Item, S::Err> + 'static,
  {
    let (subject, generation, connect) = {
      let mut state = self.shared.lock();
      state.subscribers += 1;
      let connect = (!state.connected).then(|| state.source.clone());
      state.connected = true;
      (state.subject.clone(), state.generation, connect)
    };
    subject.clone().subscribe(ShareSubscriber {
      downstream: subscriber,
      shared: self.shared.clone(),
      generation,
    });
    if let Some(source) = connect {
      tracing::trace!(generation, "share connected");
      source.subscribe(subject);
    }
  }
}

/// Drop one subscriber of `generation`, disconnecting the source when it was
/// the last one.
fn release<S>(shared: &Mutex<ShareState<S>>, generation: u64)
where
  S: Publisher,
  S::Err: Clone,
{
  let retired = {
    let mut state = shared.lock();
    if state.generation != generation {
      return;
    }
    state.subscribers = state.subscribers.saturating_sub(1);
    if state.subscribers > 0 {
      return;
    }
    state.generation += 1;
    state.connected = false;
    std::mem::take(&mut state.subject)
  };
  tracing::trace!(generation, "share disconnected");
  retired.close();
}

struct ShareSubscriber<D, S: Publisher> {
  downstream: D,
  shared: Arc<Mutex<ShareState<S>>>,
  generation: u64,
}

impl<D, S> Subscriber<S::Item, S::Err> for ShareSubscriber<D, S>
where
  D: Subscriber<S::Item, S::Err>,
  S: Publisher + Send + 'static,
  S::Item: Send + 'static,
  S::Err: Clone + Send + 'static,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    self.downstream.on_subscribe(Arc::new(ShareSubscription {
      upstream: subscription,
      shared: self.shared.clone(),
      generation: self.generation,
      released: AtomicBool::new(false),
    }))
  }

  fn on_value(&mut self, value: S::Item) -> Demand { self.downstream.on_value(value) }

  fn on_completion(&mut self, completion: Completion<S::Err>) {
    self.downstream.on_completion(completion)
  }
}

struct ShareSubscription<S: Publisher> {
  upstream: SubscriptionRef,
  shared: Arc<Mutex<ShareState<S>>>,
  generation: u64,
  released: AtomicBool,
}

impl<S> Cancellable for ShareSubscription<S>
where
  S: Publisher + Send + 'static,
  S::Item: Send + 'static,
  S::Err: Clone + Send + 'static,
{
  fn cancel(&self) {
    self.upstream.cancel();
    if !self.released.swap(true, Ordering::AcqRel) {
      release(&self.shared, self.generation);
    }
  }
}

impl<S> Subscription for ShareSubscription<S>
where
  S: Publisher + Send + 'static,
  S::Item: Send + 'static,
  S::Err: Clone + Send + 'static,
{
  fn request(&self, demand: Demand) { self.upstream.request(demand) }
}
