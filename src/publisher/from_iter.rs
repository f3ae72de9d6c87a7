use std::{convert::Infallible, iter::Peekable, marker::PhantomData, sync::Arc};

use parking_lot::Mutex;

use super::Publisher;
use crate::{
  demand::Demand,
  error::Completion,
  subscriber::Subscriber,
  subscription::{outlet::Outlet, trampoline::Trampoline, Cancellable, Subscription},
};

/// Emits the items of an iterator, one per unit of demand, then finishes.
///
/// `finished` follows the last item without waiting for more demand; an
/// empty iterator finishes right after `on_subscribe`.
pub struct FromIter<I, Err = Infallible> {
  iter: I,
  _err: PhantomData<fn() -> Err>,
}

/// Publish the items of `iter`.
pub fn from_iter<I>(iter: I) -> FromIter<I::IntoIter>
where
  I: IntoIterator,
{
  FromIter::new(iter.into_iter())
}

impl<I, Err> FromIter<I, Err> {
  pub fn new(iter: I) -> Self { FromIter { iter, _err: PhantomData } }
}

impl<I: Clone, Err> Clone for FromIter<I, Err> {
  fn clone(&self) -> Self { FromIter::new(self.iter.clone()) }
}

impl<I, Err> Publisher for FromIter<I, Err>
where
  I: Iterator + Send + 'static,
  I::Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = I::Item;
  type Err = Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<I::Item, Err> + 'static,
  {
    let source = Arc::new(IterSource {
      outlet: Outlet::new(subscriber),
      iter: Mutex::new(Some(self.iter.peekable())),
      pump: Trampoline::default(),
    });
    source.outlet.subscribe(source.clone());
    source.pump();
  }
}

struct IterSource<I: Iterator, Err> {
  outlet: Outlet<I::Item, Err>,
  iter: Mutex<Option<Peekable<I>>>,
  pump: Trampoline,
}

impl<I, Err> IterSource<I, Err>
where
  I: Iterator,
{
  fn pump(&self) {
    self.pump.run(|| loop {
      let next = {
        let mut guard = self.iter.lock();
        let Some(iter) = guard.as_mut() else { break };
        if iter.peek().is_none() {
          guard.take();
          None
        } else if self.outlet.demand().has_demand() {
          iter.next()
        } else {
          break;
        }
      };
      match next {
        Some(value) => {
          if self.outlet.offer(value).is_err() {
            break;
          }
        }
        None => {
          self.outlet.finish(Completion::Finished);
          break;
        }
      }
    });
  }
}

impl<I, Err> Cancellable for IterSource<I, Err>
where
  I: Iterator + Send,
  I::Item: Send,
  Err: Send,
{
  fn cancel(&self) {
    self.outlet.cancel();
    self.iter.lock().take();
  }
}

impl<I, Err> Subscription for IterSource<I, Err>
where
  I: Iterator + Send,
  I::Item: Send,
  Err: Send,
{
  fn request(&self, demand: Demand) {
    if self.outlet.add_demand(demand) {
      self.pump();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use crate::prelude::*;

  /// Requests `initial` values up front and answers each value with `reply`.
  struct Stepper {
    initial: usize,
    reply: fn(i32) -> Demand,
    log: Arc<Mutex<Vec<String>>>,
  }

  impl Subscriber<i32, std::convert::Infallible> for Stepper {
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
      if self.initial > 0 {
        subscription.request(Demand::max(self.initial));
      }
    }

    fn on_value(&mut self, value: i32) -> Demand {
      self.log.lock().push(value.to_string());
      (self.reply)(value)
    }

    fn on_completion(&mut self, _: Completion<std::convert::Infallible>) {
      self.log.lock().push("finished".into());
    }
  }

  #[rxdemand_macro::test]
  fn emits_everything_then_finishes() {
    let log = Arc::new(Mutex::new(vec![]));
    let l = log.clone();
    let _ = from_iter(vec![1, 2, 3]).sink_completion(
      move |c| assert!(c.is_finished()),
      move |v| l.lock().push(v),
    );
    assert_eq!(*log.lock(), vec![1, 2, 3]);
  }

  #[rxdemand_macro::test]
  fn dynamic_demand_from_on_value() {
    let log = Arc::new(Mutex::new(vec![]));
    from_iter(1..=6).subscribe(Stepper {
      initial: 2,
      reply: |v| match v {
        1 => Demand::max(2),
        3 => Demand::max(1),
        _ => Demand::NONE,
      },
      log: log.clone(),
    });
    // 2 requested up front, 2 more after 1, 1 more after 3
    assert_eq!(*log.lock(), vec!["1", "2", "3", "4", "5"]);
  }

  #[rxdemand_macro::test]
  fn finishes_right_after_the_last_value() {
    let log = Arc::new(Mutex::new(vec![]));
    from_iter(1..=2).subscribe(Stepper { initial: 2, reply: |_| Demand::NONE, log: log.clone() });
    assert_eq!(*log.lock(), vec!["1", "2", "finished"]);
  }

  #[rxdemand_macro::test]
  fn empty_iterator_finishes_without_demand() {
    let log = Arc::new(Mutex::new(vec![]));
    from_iter(Vec::<i32>::new()).subscribe(Stepper {
      initial: 0,
      reply: |_| Demand::NONE,
      log: log.clone(),
    });
    assert_eq!(*log.lock(), vec!["finished"]);
  }
}
