//! Interleaving of any number of publishers.
//!
//! Every downstream request is forwarded to each live source, so sources
//! together may deliver more than the downstream asked for. The excess waits
//! in a FIFO buffer inside the operator until demand arrives. Arrival order
//! is kept across sources.

use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{
  demand::Demand,
  error::Completion,
  publisher::{BoxedPublisher, Publisher},
  subscriber::Subscriber,
  subscription::{outlet::Outlet, trampoline::Trampoline, Cancellable, Subscription, SubscriptionRef},
};

/// Emits the values of all sources as they arrive. Finishes once every
/// source has finished; the first failure cancels the rest and is forwarded.
pub struct Merge<Item, Err> {
  sources: Vec<BoxedPublisher<Item, Err>>,
}

impl<Item, Err> Merge<Item, Err> {
  pub fn new(sources: impl IntoIterator<Item = BoxedPublisher<Item, Err>>) -> Self {
    Merge { sources: sources.into_iter().collect() }
  }

  /// Add one more source.
  pub fn with<P>(mut self, source: P) -> Self
  where
    P: Publisher<Item = Item, Err = Err> + Send + 'static,
    Item: 'static,
    Err: 'static,
  {
    self.sources.push(BoxedPublisher::new(source));
    self
  }
}

impl<Item, Err> Publisher for Merge<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Item, Err> + 'static,
  {
    let count = self.sources.len();
    let shared = Arc::new(MergeShared {
      outlet: Outlet::new(subscriber),
      state: Mutex::new(MergeState {
        upstreams: (0..count).map(|_| None).collect(),
        buffer: VecDeque::new(),
        active: count,
        done: false,
      }),
      trampoline: Trampoline::default(),
    });
    shared.outlet.subscribe(shared.clone());
    if count == 0 {
      shared.state.lock().done = true;
      shared.outlet.finish(Completion::Finished);
      return;
    }
    for (index, source) in self.sources.into_iter().enumerate() {
      if shared.state.lock().done {
        break;
      }
      source.subscribe(MergeSource { shared: shared.clone(), index });
    }
  }
}

struct MergeState<Item> {
  upstreams: Vec<Option<SubscriptionRef>>,
  buffer: VecDeque<Item>,
  active: usize,
  done: bool,
}

struct MergeShared<Item, Err> {
  outlet: Outlet<Item, Err>,
  state: Mutex<MergeState<Item>>,
  trampoline: Trampoline,
}

enum Step<Item> {
  Emit(Item),
  Finish,
  Idle,
}

impl<Item, Err> MergeShared<Item, Err> {
  fn live_upstreams(&self) -> SmallVec<[SubscriptionRef; 4]> {
    self.state.lock().upstreams.iter().flatten().cloned().collect()
  }

  fn request_all(&self, demand: Demand) {
    for upstream in self.live_upstreams() {
      upstream.request(demand);
    }
  }

  /// Move buffered values downstream while there is demand, and finish once
  /// every source is done and the buffer is empty.
  fn drain(&self) {
    self.trampoline.run(|| loop {
      let step = {
        let mut state = self.state.lock();
        if state.done {
          Step::Idle
        } else if state.buffer.is_empty() {
          if state.active == 0 {
            state.done = true;
            Step::Finish
          } else {
            Step::Idle
          }
        } else if self.outlet.demand().has_demand() {
          state.buffer.pop_front().map_or(Step::Idle, Step::Emit)
        } else {
          Step::Idle
        }
      };
      match step {
        Step::Emit(value) => match self.outlet.offer(value) {
          Ok(granted) if granted.has_demand() => self.request_all(granted),
          Ok(_) => {}
          Err(_) => break,
        },
        Step::Finish => {
          self.outlet.finish(Completion::Finished);
          break;
        }
        Step::Idle => break,
      }
    });
  }

  /// Tear down every source. Returns the sources that were still live.
  fn close(&self) -> SmallVec<[SubscriptionRef; 4]> {
    let mut state = self.state.lock();
    state.done = true;
    state.buffer.clear();
    state.upstreams.iter_mut().filter_map(Option::take).collect()
  }
}

impl<Item: Send, Err: Send> Cancellable for MergeShared<Item, Err> {
  fn cancel(&self) {
    self.outlet.cancel();
    for upstream in self.close() {
      upstream.cancel();
    }
  }
}

impl<Item: Send, Err: Send> Subscription for MergeShared<Item, Err> {
  fn request(&self, demand: Demand) {
    let upstreams: SmallVec<[SubscriptionRef; 4]> = {
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

// ==================== Sources ====================

struct MergeSource<Item, Err> {
  shared: Arc<MergeShared<Item, Err>>,
  index: usize,
}

impl<Item: Send, Err: Send> Subscriber<Item, Err> for MergeSource<Item, Err> {
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    let outstanding = {
      let mut state = self.shared.state.lock();
      if state.done {
        None
      } else {
        state.upstreams[self.index] = Some(subscription.clone());
        Some(self.shared.outlet.demand())
      }
    };
    match outstanding {
      None => subscription.cancel(),
      Some(demand) if demand.has_demand() => subscription.request(demand),
      Some(_) => {}
    }
  }

  fn on_value(&mut self, value: Item) -> Demand {
    {
      let mut state = self.shared.state.lock();
      if state.done {
        return Demand::NONE;
      }
      state.buffer.push_back(value);
    }
    self.shared.drain();
    Demand::NONE
  }

  fn on_completion(&mut self, completion: Completion<Err>) {
    match completion {
      Completion::Finished => {
        {
          let mut state = self.shared.state.lock();
          if state.done {
            return;
          }
          state.upstreams[self.index] = None;
          state.active = state.active.saturating_sub(1);
        }
        self.shared.drain();
      }
      Completion::Failed(err) => {
        if self.shared.state.lock().done {
          return;
        }
        let siblings = self.shared.close();
        for upstream in siblings {
          upstream.cancel();
        }
        self.shared.outlet.finish(Completion::Failed(err));
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::Merge;
  use crate::{prelude::*, test_support::Probe};

  #[rxdemand_macro::test]
  fn interleaves_in_arrival_order() {
    let a = PassthroughSubject::<i32>::new();
    let b = PassthroughSubject::<i32>::new();
    let probe = Probe::new();
    a.clone().merge(b.clone()).subscribe(probe.subscriber(Demand::UNLIMITED));

    a.send(1);
    b.send(10);
    a.send(2);
    b.send(20);
    assert_eq!(probe.values(), vec![1, 10, 2, 20]);

    a.finish();
    assert!(probe.completion().is_none());
    b.finish();
    assert!(probe.is_finished());
  }

  #[rxdemand_macro::test]
  fn failure_cancels_the_other_sources() {
    let a = PassthroughSubject::<i32, &'static str>::new();
    let b = PassthroughSubject::<i32, &'static str>::new();
    let probe = Probe::new();
    a.clone().merge(b.clone()).subscribe(probe.subscriber(Demand::UNLIMITED));

    a.send(1);
    a.fail("a broke");
    b.send(2);
    assert_eq!(probe.values(), vec![1]);
    assert_eq!(probe.completion(), Some(Completion::Failed("a broke")));
    assert_eq!(b.subscriber_count(), 0);
  }

  #[rxdemand_macro::test]
  fn excess_is_buffered_until_requested() {
    let probe = Probe::new();
    from_iter([1, 2, 3]).merge(from_iter([4, 5, 6])).subscribe(probe.subscriber(Demand::max(2)));
    assert_eq!(probe.values(), vec![1, 2]);

    probe.request(Demand::max(3));
    assert_eq!(probe.values(), vec![1, 2, 3, 4, 5]);
    assert!(probe.completion().is_none());

    probe.request(Demand::UNLIMITED);
    assert_eq!(probe.values(), vec![1, 2, 3, 4, 5, 6]);
    assert!(probe.is_finished());
  }

  #[rxdemand_macro::test]
  fn three_sources() {
    let probe = Probe::new();
    Merge::new([just(1).boxed(), just(2).boxed()])
      .with(from_iter([3, 4]))
      .subscribe(probe.subscriber(Demand::UNLIMITED));
    assert_eq!(probe.values(), vec![1, 2, 3, 4]);
    assert!(probe.is_finished());
  }

  #[rxdemand_macro::test]
  fn no_sources_finishes_at_once() {
    let probe = Probe::new();
    Merge::<i32, std::convert::Infallible>::new([]).subscribe(probe.subscriber(Demand::NONE));
    assert!(probe.is_finished());
  }
}
