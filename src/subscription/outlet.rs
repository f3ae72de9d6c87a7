//! The delivery end of one subscription.
//!
//! Every publisher in the crate that owns its subscriber (leaf sources,
//! subjects and the multi-source operators) pushes signals through an
//! [`Outlet`]. The outlet keeps the demand counter, queues signals and drains
//! them on a [`Trampoline`], so a subscriber that requests more demand or
//! triggers another `send` from inside `on_value` never recurses into itself.
//!
//! Locks are never held while a subscriber callback runs, except the slot
//! that owns the subscriber itself. [`Outlet::cancel`] from another thread
//! waits for a callback in flight on that slot, so nothing is delivered once
//! it returns; a cancel from inside the callback leaves the release to the
//! running drain.

use std::{
  cell::RefCell,
  collections::VecDeque,
  sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::{Mutex, ReentrantMutex};

use super::{trampoline::Trampoline, Cancellable, Subscription, SubscriptionRef};
use crate::{
  demand::Demand,
  error::{Completion, ProtocolViolation},
  subscriber::{BoxedSubscriber, Subscriber},
};

enum Signal<Item, Err> {
  Subscribe(SubscriptionRef),
  Value(Item),
  Completion(Completion<Err>),
}

struct OutletState<Item, Err> {
  demand: Demand,
  queue: VecDeque<Signal<Item, Err>>,
  started: bool,
  terminated: bool,
}

type Slot<Item, Err> = ReentrantMutex<RefCell<Option<BoxedSubscriber<Item, Err>>>>;

pub(crate) struct Outlet<Item, Err> {
  subscriber: Slot<Item, Err>,
  state: Mutex<OutletState<Item, Err>>,
  trampoline: Trampoline,
  cancelled: AtomicBool,
}

impl<Item, Err> Outlet<Item, Err> {
  pub(crate) fn new<S>(subscriber: S) -> Self
  where
    S: Subscriber<Item, Err> + 'static,
  {
    Outlet {
      subscriber: ReentrantMutex::new(RefCell::new(Some(Box::new(subscriber)))),
      state: Mutex::new(OutletState {
        demand: Demand::NONE,
        queue: VecDeque::new(),
        started: false,
        terminated: false,
      }),
      trampoline: Trampoline::default(),
      cancelled: AtomicBool::new(false),
    }
  }

  /// Hand the subscription to the subscriber. Nothing is delivered before
  /// this call; signals offered earlier wait in the queue behind it.
  ///
  /// Returns the demand the subscriber granted from `on_value` while the
  /// queue drained.
  pub(crate) fn subscribe(&self, subscription: SubscriptionRef) -> Demand {
    {
      let mut state = self.state.lock();
      if state.started {
        tracing::warn!("subscription handed to a subscriber twice; ignored");
        return Demand::NONE;
      }
      state.started = true;
      state.queue.push_front(Signal::Subscribe(subscription));
    }
    self.drain()
  }

  /// Why nothing more may be delivered, if the outlet is closed.
  pub(crate) fn check_open(&self) -> Result<(), ProtocolViolation> {
    Self::open(&self.state.lock(), self.is_cancelled())
  }

  fn open(state: &OutletState<Item, Err>, cancelled: bool) -> Result<(), ProtocolViolation> {
    if cancelled {
      Err(ProtocolViolation::Cancelled)
    } else if state.terminated {
      Err(ProtocolViolation::AlreadyTerminated)
    } else {
      Ok(())
    }
  }

  /// Record demand requested by the subscriber. Returns `false` when the
  /// request was dropped, either because it was for zero values or because
  /// this outlet is already closed.
  pub(crate) fn add_demand(&self, demand: Demand) -> bool {
    if demand.is_none() {
      tracing::warn!("{}", ProtocolViolation::ZeroDemandRequest);
      return false;
    }
    let mut state = self.state.lock();
    if let Err(violation) = Self::open(&state, self.is_cancelled()) {
      tracing::trace!("{violation}; request ignored");
      return false;
    }
    state.demand += demand;
    true
  }

  /// Outstanding demand, `NONE` once closed.
  pub(crate) fn demand(&self) -> Demand {
    let state = self.state.lock();
    if state.terminated || self.is_cancelled() { Demand::NONE } else { state.demand }
  }

  #[inline]
  pub(crate) fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::Acquire) }

  pub(crate) fn is_closed(&self) -> bool { self.check_open().is_err() }

  /// Deliver one value if the subscriber has demand for it.
  ///
  /// On success one unit of demand is consumed and the demand granted back
  /// by the subscriber during the drain is returned. Without demand, or once
  /// closed, the value is handed back untouched.
  pub(crate) fn offer(&self, value: Item) -> Result<Demand, Item> {
    self.enqueue(value)?;
    Ok(self.drain())
  }

  /// Consume one unit of demand and queue `value` behind whatever is already
  /// queued, without delivering it. Callers follow up with [`Outlet::flush`].
  pub(crate) fn enqueue(&self, value: Item) -> Result<(), Item> {
    let mut state = self.state.lock();
    if let Err(violation) = Self::open(&state, self.is_cancelled()) {
      tracing::trace!("{violation}; value dropped");
      return Err(value);
    }
    if let Err(violation) = state.demand.consume_one() {
      tracing::trace!("{violation}; value dropped");
      return Err(value);
    }
    state.queue.push_back(Signal::Value(value));
    Ok(())
  }

  /// Deliver everything queued so far.
  pub(crate) fn flush(&self) -> Demand { self.drain() }

  /// Deliver the terminal signal. Returns `false` if the outlet was already
  /// terminated or cancelled, in which case `completion` is dropped.
  pub(crate) fn finish(&self, completion: Completion<Err>) -> bool {
    {
      let mut state = self.state.lock();
      if let Err(violation) = Self::open(&state, self.is_cancelled()) {
        tracing::debug!("{violation}; completion dropped");
        return false;
      }
      state.terminated = true;
      state.queue.push_back(Signal::Completion(completion));
    }
    self.drain();
    true
  }

  /// Stop every further delivery. Idempotent.
  pub(crate) fn cancel(&self) {
    if self.cancelled.swap(true, Ordering::AcqRel) {
      return;
    }
    {
      let mut state = self.state.lock();
      state.terminated = true;
      state.demand = Demand::NONE;
      state.queue.clear();
    }
    // Blocks while another thread is inside a callback. On the draining
    // thread itself the slot is borrowed and the drain releases it.
    let guard = self.subscriber.lock();
    let released = match guard.try_borrow_mut() {
      Ok(mut slot) => slot.take(),
      Err(_) => None,
    };
    drop(guard);
    drop(released);
  }

  fn drain(&self) -> Demand {
    let mut granted = Demand::NONE;
    self.trampoline.run(|| loop {
      let signal = {
        let mut state = self.state.lock();
        if !state.started {
          break;
        }
        match state.queue.pop_front() {
          Some(signal) => signal,
          None => break,
        }
      };

      let guard = self.subscriber.lock();
      let Ok(mut slot) = guard.try_borrow_mut() else { break };
      if self.is_cancelled() {
        let released = slot.take();
        drop(slot);
        drop(guard);
        drop(released);
        break;
      }
      let Some(subscriber) = slot.as_mut() else { break };
      match signal {
        Signal::Subscribe(subscription) => subscriber.on_subscribe(subscription),
        Signal::Value(value) => {
          let more = subscriber.on_value(value);
          if more.has_demand() && !self.is_cancelled() {
            self.state.lock().demand += more;
            granted += more;
          }
        }
        Signal::Completion(completion) => {
          let finished = slot.take();
          drop(slot);
          if let Some(mut subscriber) = finished {
            subscriber.on_completion(completion);
            drop(guard);
            drop(subscriber);
          }
          continue;
        }
      }
      if self.is_cancelled() {
        let released = slot.take();
        drop(slot);
        drop(guard);
        drop(released);
        break;
      }
    });
    granted
  }
}

impl<Item, Err> Cancellable for Outlet<Item, Err>
where
  Item: Send,
  Err: Send,
{
  fn cancel(&self) { Outlet::cancel(self) }
}

/// An outlet is a complete subscription for sources that produce nothing on
/// demand, such as `Empty` and `Fail`.
impl<Item, Err> Subscription for Outlet<Item, Err>
where
  Item: Send,
  Err: Send,
{
  fn request(&self, demand: Demand) { self.add_demand(demand); }
}
