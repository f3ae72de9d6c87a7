use std::{convert::Infallible, iter::Once};

use super::{FromIter, Publisher};
use crate::subscriber::Subscriber;

/// Emits a single value once it is demanded, then finishes.
#[derive(Clone)]
pub struct Just<T>(pub T);

pub fn just<T>(value: T) -> Just<T> { Just(value) }

impl<T> Publisher for Just<T>
where
  T: Send + 'static,
{
  type Item = T;
  type Err = Infallible;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<T, Infallible> + 'static,
  {
    FromIter::<Once<T>, Infallible>::new(std::iter::once(self.0)).subscribe(subscriber)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use crate::prelude::*;

  #[rxdemand_macro::test]
  fn one_value_then_finished() {
    let events = Arc::new(Mutex::new(vec![]));
    let (e1, e2) = (events.clone(), events.clone());
    let _ = just("hello").sink_completion(
      move |c| e1.lock().push(format!("{c:?}")),
      move |v| e2.lock().push(v.to_string()),
    );
    assert_eq!(*events.lock(), vec!["hello", "Finished"]);
  }
}
