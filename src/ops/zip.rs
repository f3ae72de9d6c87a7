//! Pairwise combination by position.

use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use super::map::Map;
use crate::{
  demand::Demand,
  error::Completion,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{outlet::Outlet, trampoline::Trampoline, Cancellable, Subscription, SubscriptionRef},
};

/// Emits `(a, b)` from the n-th value of each source.
///
/// Each side keeps its own FIFO backlog; a pair is formed once both sides
/// have a value waiting and downstream has demand. The zip finishes as soon
/// as one side has finished with an empty backlog, cancelling the other. The
/// first failure from either side is forwarded at once.
#[derive(Clone)]
pub struct Zip<A, B> {
  a: A,
  b: B,
}

impl<A, B> Zip<A, B> {
  pub fn new(a: A, b: B) -> Self { Zip { a, b } }
}

/// A three-way zip, built from two nested ones.
pub type Zip3<A, B, C> = Map<
  Zip<Zip<A, B>, C>,
  fn(
    ((<A as Publisher>::Item, <B as Publisher>::Item), <C as Publisher>::Item),
  ) -> (<A as Publisher>::Item, <B as Publisher>::Item, <C as Publisher>::Item),
>;

impl<A, B> Publisher for Zip<A, B>
where
  A: Publisher,
  B: Publisher<Err = A::Err>,
  A::Item: Send + 'static,
  B::Item: Send + 'static,
  A::Err: Send + 'static,
{
  type Item = (A::Item, B::Item);
  type Err = A::Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<(A::Item, B::Item), A::Err> + 'static,
  {
    let shared = Arc::new(ZipShared {
      outlet: Outlet::new(subscriber),
      state: Mutex::new(ZipState {
        left: VecDeque::new(),
        right: VecDeque::new(),
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

struct ZipState<L, R> {
  left: VecDeque<L>,
  right: VecDeque<R>,
  finished: [bool; 2],
  upstreams: [Option<SubscriptionRef>; 2],
  done: bool,
}

impl<L, R> ZipState<L, R> {
  /// A side that finished with nothing left to pair ends the zip.
  fn exhausted(&self) -> bool {
    (self.finished[LEFT] && self.left.is_empty()) || (self.finished[RIGHT] && self.right.is_empty())
  }

  /// Mark the zip done and hand back the upstreams still attached.
  fn close(&mut self) -> Vec<SubscriptionRef> {
    self.done = true;
    self.left.clear();
    self.right.clear();
    self.upstreams.iter_mut().filter_map(Option::take).collect()
  }
}

struct ZipShared<L, R, Err> {
  outlet: Outlet<(L, R), Err>,
  state: Mutex<ZipState<L, R>>,
  trampoline: Trampoline,
}

enum Step<T> {
  Emit(T),
  Finish(Vec<SubscriptionRef>),
  Idle,
}

impl<L, R, Err> ZipShared<L, R, Err> {
  fn request_both(&self, demand: Demand) {
    let upstreams: Vec<_> = self.state.lock().upstreams.iter().flatten().cloned().collect();
    for upstream in upstreams {
      upstream.request(demand);
    }
  }

  fn drain(&self) {
    self.trampoline.run(|| loop {
      let step = {
        let mut state = self.state.lock();
        if state.done {
          Step::Idle
        } else if !state.left.is_empty()
          && !state.right.is_empty()
          && self.outlet.demand().has_demand()
        {
          match (state.left.pop_front(), state.right.pop_front()) {
            (Some(l), Some(r)) => Step::Emit((l, r)),
            _ => Step::Idle,
          }
        } else if state.exhausted() {
          Step::Finish(state.close())
        } else {
          Step::Idle
        }
      };
      match step {
        Step::Emit(pair) => match self.outlet.offer(pair) {
          Ok(granted) if granted.has_demand() => self.request_both(granted),
          Ok(_) => {}
          Err(_) => break,
        },
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

  fn attach(&self, side: usize, subscription: SubscriptionRef) {
    let outstanding = {
      let mut state = self.state.lock();
      if state.done {
        None
      } else {
        state.upstreams[side] = Some(subscription.clone());
        Some(self.outlet.demand())
      }
    };
    match outstanding {
      None => subscription.cancel(),
      Some(demand) if demand.has_demand() => subscription.request(demand),
      Some(_) => {}
    }
  }

  fn side_completed(&self, side: usize, completion: Completion<Err>) {
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

impl<L: Send, R: Send, Err: Send> Cancellable for ZipShared<L, R, Err> {
  fn cancel(&self) {
    self.outlet.cancel();
    let rest = self.state.lock().close();
    for upstream in rest {
      upstream.cancel();
    }
  }
}

impl<L: Send, R: Send, Err: Send> Subscription for ZipShared<L, R, Err> {
  fn request(&self, demand: Demand) {
    let upstreams: Vec<_> = {
      let state = self.state.lock();
      if !self.outlet.add_demand(demand) {
        return;
      }
      state.upstreams.iter().flatten().cloned().collect()
    };
    for upstream in upstreams {
      upstream.request(demand);
    }
    self.drain();
  }
}

// ==================== Sides ====================

struct Left<L, R, Err>(Arc<ZipShared<L, R, Err>>);

struct Right<L, R, Err>(Arc<ZipShared<L, R, Err>>);

impl<L: Send, R: Send, Err: Send> Subscriber<L, Err> for Left<L, R, Err> {
  fn on_subscribe(&mut self, subscription: SubscriptionRef) { self.0.attach(LEFT, subscription) }

  fn on_value(&mut self, value: L) -> Demand {
    {
      let mut state = self.0.state.lock();
      if state.done {
        return Demand::NONE;
      }
      state.left.push_back(value);
    }
    self.0.drain();
    Demand::NONE
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.0.side_completed(LEFT, completion)
  }
}

impl<L: Send, R: Send, Err: Send> Subscriber<R, Err> for Right<L, R, Err> {
  fn on_subscribe(&mut self, subscription: SubscriptionRef) { self.0.attach(RIGHT, subscription) }

  fn on_value(&mut self, value: R) -> Demand {
    {
      let mut state = self.0.state.lock();
      if state.done {
        return Demand::NONE;
      }
      state.right.push_back(value);
    }
    self.0.drain();
    Demand::NONE
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    self.0.side_completed(RIGHT, completion)
  }
}

#[cfg(test)]
mod tests {
  use crate::{prelude::*, test_support::Probe};

  #[rxdemand_macro::test]
  fn pairs_by_position_and_stops_with_the_shorter_side() {
    let probe = Probe::new();
    from_iter([1, 2, 3]).zip(from_iter(["a", "b"])).subscribe(probe.subscriber(Demand::UNLIMITED));
    assert_eq!(probe.values(), vec![(1, "a"), (2, "b")]);
    assert!(probe.is_finished());
  }

  #[rxdemand_macro::test]
  fn backlog_waits_for_the_slow_side() {
    let numbers = PassthroughSubject::<i32>::new();
    let letters = PassthroughSubject::<&'static str>::new();
    let probe = Probe::new();
    numbers.clone().zip(letters.clone()).subscribe(probe.subscriber(Demand::UNLIMITED));

    numbers.send(1);
    numbers.send(2);
    letters.send("a");
    letters.send("b");
    letters.send("X");
    numbers.send(3);
    letters.send("c");
    letters.send("d");
    assert_eq!(probe.values(), vec![(1, "a"), (2, "b"), (3, "X")]);

    numbers.finish();
    assert!(probe.is_finished());
    assert_eq!(letters.subscriber_count(), 0);
  }

  #[rxdemand_macro::test]
  fn finished_side_with_backlog_keeps_going() {
    let numbers = PassthroughSubject::<i32>::new();
    let letters = PassthroughSubject::<char>::new();
    let probe = Probe::new();
    numbers.clone().zip(letters.clone()).subscribe(probe.subscriber(Demand::UNLIMITED));

    numbers.send(1);
    numbers.send(2);
    numbers.finish();
    assert!(probe.completion().is_none());

    letters.send('a');
    assert!(probe.completion().is_none());
    letters.send('b');
    assert_eq!(probe.values(), vec![(1, 'a'), (2, 'b')]);
    assert!(probe.is_finished());
  }

  #[rxdemand_macro::test]
  fn respects_downstream_demand() {
    let probe = Probe::new();
    from_iter(1..).zip(from_iter(10..)).subscribe(probe.subscriber(Demand::max(2)));
    assert_eq!(probe.values(), vec![(1, 10), (2, 11)]);

    probe.request(Demand::max(1));
    assert_eq!(probe.values(), vec![(1, 10), (2, 11), (3, 12)]);
  }

  #[rxdemand_macro::test]
  fn failure_is_immediate() {
    let a = PassthroughSubject::<i32, &'static str>::new();
    let b = PassthroughSubject::<i32, &'static str>::new();
    let probe = Probe::new();
    a.clone().zip(b.clone()).subscribe(probe.subscriber(Demand::UNLIMITED));

    a.send(1);
    b.fail("b broke");
    assert!(probe.values().is_empty());
    assert_eq!(probe.completion(), Some(Completion::Failed("b broke")));
    assert_eq!(a.subscriber_count(), 0);
  }

  #[rxdemand_macro::test]
  fn three_way() {
    let probe = Probe::new();
    from_iter([1, 2])
      .zip3(from_iter(['a', 'b']), from_iter([true, false, true]))
      .subscribe(probe.subscriber(Demand::UNLIMITED));
    assert_eq!(probe.values(), vec![(1, 'a', true), (2, 'b', false)]);
    assert!(probe.is_finished());
  }
}
