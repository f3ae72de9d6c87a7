//! Time shift of every signal by a fixed duration.
//!
//! Each value and the terminal signal are queued in arrival order and one
//! timer is scheduled per signal. All timers share the same delay, so they
//! fire in arrival order; each firing marks one more queued signal as due,
//! and due signals are delivered from the front of the queue by a single
//! drain at a time, even when timers fire on different threads. Demand is
//! forwarded upstream unchanged; demand granted by the subscriber when a
//! delayed value is delivered is requested upstream at that moment.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
  demand::Demand,
  error::Completion,
  publisher::Publisher,
  scheduler::{Scheduler, TaskHandle},
  subscriber::Subscriber,
  subscription::{outlet::Outlet, trampoline::Trampoline, Cancellable, Subscription, SubscriptionRef},
};

/// Re-emits values and completion `delay` later on a scheduler.
#[derive(Clone)]
pub struct Delay<S, SD> {
  source: S,
  delay: Duration,
  scheduler: SD,
}

impl<S, SD> Delay<S, SD> {
  pub fn new(source: S, delay: Duration, scheduler: SD) -> Self {
    Delay { source, delay, scheduler }
  }
}

impl<S, SD> Publisher for Delay<S, SD>
where
  S: Publisher,
  S::Item: Send + 'static,
  S::Err: Send + 'static,
  SD: Scheduler,
{
  type Item = S::Item;
  type Err = S::Err;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<S::Item, S::Err> + 'static,
  {
    let shared = Arc::new(DelayShared {
      outlet: Outlet::new(subscriber),
      delay: self.delay,
      scheduler: self.scheduler,
      state: Mutex::new(DelayState {
        upstream: None,
        pending: VecDeque::new(),
        due: 0,
        timers: vec![],
      }),
      trampoline: Trampoline::default(),
    });
    self.source.subscribe(DelaySubscriber { shared });
  }
}

enum Pending<Item, Err> {
  Value(Item),
  Completion(Completion<Err>),
}

struct DelayState<Item, Err> {
  upstream: Option<SubscriptionRef>,
  pending: VecDeque<Pending<Item, Err>>,
  due: usize,
  timers: Vec<TaskHandle>,
}

struct DelayShared<Item, Err, SD> {
  outlet: Outlet<Item, Err>,
  delay: Duration,
  scheduler: SD,
  state: Mutex<DelayState<Item, Err>>,
  trampoline: Trampoline,
}

impl<Item, Err, SD> DelayShared<Item, Err, SD>
where
  Item: Send + 'static,
  Err: Send + 'static,
  SD: Scheduler,
{
  fn enqueue(self: &Arc<Self>, signal: Pending<Item, Err>) {
    if self.outlet.is_closed() {
      return;
    }
    self.state.lock().pending.push_back(signal);
    let this = self.clone();
    let timer = self.scheduler.schedule(self.delay, Box::new(move || this.fire()));
    let mut state = self.state.lock();
    state.timers.retain(|timer| !timer.is_closed());
    if !timer.is_closed() {
      state.timers.push(timer);
    }
  }

  fn fire(&self) {
    self.state.lock().due += 1;
    self.trampoline.run(|| loop {
      let signal = {
        let mut state = self.state.lock();
        if state.due == 0 {
          break;
        }
        state.due -= 1;
        match state.pending.pop_front() {
          Some(signal) => signal,
          None => break,
        }
      };
      match signal {
        Pending::Value(value) => {
          if let Ok(granted) = self.outlet.offer(value) {
            let upstream = self.state.lock().upstream.clone();
            if let (true, Some(upstream)) = (granted.has_demand(), upstream) {
              upstream.request(granted);
            }
          }
        }
        Pending::Completion(completion) => {
          self.state.lock().upstream = None;
          self.outlet.finish(completion);
        }
      }
    });
  }
}

impl<Item: Send, Err: Send, SD: Scheduler> Cancellable for DelayShared<Item, Err, SD> {
  fn cancel(&self) {
    self.outlet.cancel();
    let (upstream, timers) = {
      let mut state = self.state.lock();
      state.pending.clear();
      state.due = 0;
      (state.upstream.take(), std::mem::take(&mut state.timers))
    };
    for timer in timers {
      timer.cancel();
    }
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
  }
}

impl<Item: Send, Err: Send, SD: Scheduler> Subscription for DelayShared<Item, Err, SD> {
  fn request(&self, demand: Demand) {
    if !self.outlet.add_demand(demand) {
      return;
    }
    let upstream = self.state.lock().upstream.clone();
    if let Some(upstream) = upstream {
      upstream.request(demand);
    }
  }
}

struct DelaySubscriber<Item, Err, SD> {
  shared: Arc<DelayShared<Item, Err, SD>>,
}

impl<Item, Err, SD> Subscriber<Item, Err> for DelaySubscriber<Item, Err, SD>
where
  Item: Send + 'static,
  Err: Send + 'static,
  SD: Scheduler,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    self.shared.state.lock().upstream = Some(subscription);
    self.shared.outlet.subscribe(self.shared.clone());
  }

  fn on_value(&mut self, value: Item) -> Demand {
    self.shared.enqueue(Pending::Value(value));
    Demand::NONE
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.shared.enqueue(Pending::Completion(completion))
  }
}
