use std::{convert::Infallible, marker::PhantomData, sync::Arc};

use super::Publisher;
use crate::{error::Completion, subscriber::Subscriber, subscription::outlet::Outlet};

/// Finishes right after `on_subscribe` without emitting anything.
pub struct Empty<Item, Err = Infallible>(PhantomData<fn() -> (Item, Err)>);

/// Fails with the given error right after `on_subscribe`.
#[derive(Clone)]
pub struct Fail<Item, Err> {
  err: Err,
  _item: PhantomData<fn() -> Item>,
}

pub fn empty<Item, Err>() -> Empty<Item, Err> { Empty(PhantomData) }

pub fn fail<Item, Err>(err: Err) -> Fail<Item, Err> { Fail { err, _item: PhantomData } }

impl<Item, Err> Clone for Empty<Item, Err> {
  fn clone(&self) -> Self { empty() }
}

fn terminate<Item, Err, S>(subscriber: S, completion: Completion<Err>)
where
  Item: Send + 'static,
  Err: Send + 'static,
  S: Subscriber<Item, Err> + 'static,
{
  let outlet = Arc::new(Outlet::new(subscriber));
  outlet.subscribe(outlet.clone());
  outlet.finish(completion);
}

impl<Item, Err> Publisher for Empty<Item, Err>
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
    terminate(subscriber, Completion::Finished)
  }
}

impl<Item, Err> Publisher for Fail<Item, Err>
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
    terminate(subscriber, Completion::Failed(self.err))
  }
}
