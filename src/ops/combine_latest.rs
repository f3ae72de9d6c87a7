//! Latest-value combination of two publishers.

use std::sync::Arc;

use parking_lot::Mutex;

use super::map::Map;
use crate::{
  demand::Demand,
  error::Completion,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{outlet::Outlet, trampoline::Trampoline, Cancellable, Subscription, SubscriptionRef},
};

/// Emits `(a, b)` with the latest value of each source whenever either one
/// produces a value, once both have produced at least one.
///
/// Both sources are asked for unlimited demand. Combinations are coalesced:
/// while downstream has no demand only the most recent combination is kept,
/// and it is delivered when demand arrives.
/// Finishes when both sources have finished, or as soon as one finishes
/// without ever having produced a value. The first failure is forwarded at
/// once and cancels the other source.
#[derive(Clone)]
pub struct CombineLatest<A, B> {
  a: A,
  b: B,
}

impl<A, B> CombineLatest<A, B> {
  pub fn new(a: A, b: B) -> Self { CombineLatest { a, b } }
}

/// Three-source `CombineLatest`, built from two nested ones.
pub type CombineLatest3<A, B, C> = Map<
  CombineLatest<CombineLatest<A, B>, C>,
  fn(
    ((<A as Publisher>::Item, <B as Publisher>::Item), <C as Publisher>::Item),
  ) -> (<A as Publisher>::Item, <B as Publisher>::Item, <C as Publisher>::Item),
>;

impl<A, B> Publisher for CombineLatest<A, B>
where
  A: Publisher,
  B: Publisher<Err = A::Err>,
  A::Item: Clone + Send + 'static,
  B::Item: Clone + Send + 'static,
  A::Err: Send + 'static,
{
  type Item = (A::Item, B::Item);
  type Err = A::Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<(A::Item, B::Item), A::Err> + 'static,
  {
    let shared = Arc::new(CombineShared {
      outlet: Outlet::new(subscriber),
      state: Mutex::new(CombineState {
        left: None,
        right: None,
        dirty: false,
        finished: [false; 2],
        upstreams: [None, None],
        done: false,
      }),
      trampoline: Trampoline::default(),
    });
    shared.outlet.subscribe(shared.clone());
    self.a.subscribe(Left(shared.clone()));
    if !shared.state.lock().done {
      self.b.subscribe(Right(shared));
    }
  }
}

const LEFT: usize = 0;
const RIGHT: usize = 1;

struct CombineState<L, R> {
  left: Option<L>,
  right: Option<R>,
  dirty: bool,
  finished: [bool; 2],
  upstreams: [Option<SubscriptionRef>; 2],
  done: bool,
}

impl<L, R> CombineState<L, R> {
  fn can_finish(&self) -> bool {
    let starved = (self.finished[LEFT] && self.left.is_none())
      || (self.finished[RIGHT] && self.right.is_none());
    starved || (self.finished[LEFT] && self.finished[RIGHT] && !self.dirty)
  }

  fn close(&mut self) -> Vec<SubscriptionRef> {
    self.done = true;
    self.dirty = false;
    self.upstreams.iter_mut().filter_map(Option::take).collect()
  }
}

struct CombineShared<L, R, Err> {
  outlet: Outlet<(L, R), Err>,
  state: Mutex<CombineState<L, R>>,
  trampoline: Trampoline,
}

enum Step<T> {
  Emit(T),
  Finish(Vec<SubscriptionRef>),
  Idle,
}

impl<L: Clone, R: Clone, Err> CombineShared<L, R, Err> {
  fn drain(&self) {
    self.trampoline.run(|| loop {
      let step = {
        let mut state = self.state.lock();
        if state.done {
          Step::Idle
        } else if state.dirty && self.outlet.demand().has_demand() {
          state.dirty = false;
          match (&state.left, &state.right) {
            (Some(l), Some(r)) => Step::Emit((l.clone(), r.clone())),
            _ => Step::Idle,
          }
        } else if state.can_finish() {
          Step::Finish(state.close())
        } else {
          Step::Idle
        }
      };
      match step {
        Step::Emit(pair) => {
          if self.outlet.offer(pair).is_err() {
            break;
          }
        }
        Step::Finish(rest) => {
          for upstream in rest {
            upstream.cancel();
          }
          self.outlet.finish(Completion::Finished);
          break;
        }
        Step::Idle => break,
      }
    });
  }

  fn update(&self, write: impl FnOnce(&mut CombineState<L, R>)) -> Demand {
    {
      let mut state = self.state.lock();
      if state.done {
        return Demand::NONE;
      }
      write(&mut state);
      state.dirty = state.left.is_some() && state.right.is_some();
    }
    self.drain();
    Demand::NONE
  }
}

impl<L, R, Err> CombineShared<L, R, Err> {
  fn attach(&self, side: usize, subscription: SubscriptionRef) {
    let live = {
      let mut state = self.state.lock();
      if !state.done {
        state.upstreams[side] = Some(subscription.clone());
      }
      !state.done
    };
    if live {
      subscription.request(Demand::UNLIMITED);
    } else {
      subscription.cancel();
    }
  }

  fn side_completed(&self, side: usize, completion: Completion<Err>)
  where
    L: Clone,
    R: Clone,
  {
    match completion {
      Completion::Finished => {
        {
          let mut state = self.state.lock();
          if state.done {
            return;
          }
          state.finished[side] = true;
          state.upstreams[side] = None;
        }
        self.drain();
      }
      Completion::Failed(err) => {
        let rest = {
          let mut state = self.state.lock();
          if state.done {
            return;
          }
          state.close()
        };
        for upstream in rest {
          upstream.cancel();
        }
        self.outlet.finish(Completion::Failed(err));
      }
    }
  }
}

impl<L: Send, R: Send, Err: Send> Cancellable for CombineShared<L, R, Err> {
  fn cancel(&self) {
    self.outlet.cancel();
    let rest = self.state.lock().close();
    for upstream in rest {
      upstream.cancel();
    }
  }
}

impl<L, R, Err> Subscription for CombineShared<L, R, Err>
where
  L: Clone + Send,
  R: Clone + Send,
  Err: Send,
{
  fn request(&self, demand: Demand) {
    if self.outlet.add_demand(demand) {
      self.drain();
    }
  }
}

// ==================== Sides ====================

struct Left<L, R, Err>(Arc<CombineShared<L, R, Err>>);

struct Right<L, R, Err>(Arc<CombineShared<L, R, Err>>);

impl<L, R, Err> Subscriber<L, Err> for Left<L, R, Err>
where
  L: Clone + Send,
  R: Clone + Send,
  Err: Send,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) { self.0.attach(LEFT, subscription) }

  fn on_value(&mut self, value: L) -> Demand { self.0.update(|state| state.left = Some(value)) }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.0.side_completed(LEFT, completion)
  }
}

impl<L, R, Err> Subscriber<R, Err> for Right<L, R, Err>
where
  L: Clone + Send,
  R: Clone + Send,
  Err: Send,
{
  fn on_subscribe(&mut self, subscription: SubscriptionRef) { self.0.attach(RIGHT, subscription) }

  fn on_value(&mut self, value: R) -> Demand { self.0.update(|state| state.right = Some(value)) }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.0.side_completed(RIGHT, completion)
  }
}
