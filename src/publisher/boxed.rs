use super::Publisher;
use crate::subscriber::{BoxedSubscriber, Subscriber};

trait DynPublisher<Item, Err>: Send {
  fn box_subscribe(self: Box<Self>, subscriber: BoxedSubscriber<Item, Err>);
}

impl<P> DynPublisher<P::Item, P::Err> for P
where
  P: Publisher + Send,
  P::Item: 'static,
  P::Err: 'static,
{
  fn box_subscribe(self: Box<Self>, subscriber: BoxedSubscriber<P::Item, P::Err>) {
    (*self).subscribe(subscriber)
  }
}

/// A publisher with its concrete pipeline type erased.
///
/// Lets pipelines of different shapes be stored together, as `Merge` does
/// with its sources.
pub struct BoxedPublisher<Item, Err>(Box<dyn DynPublisher<Item, Err>>);

impl<Item, Err> BoxedPublisher<Item, Err> {
  pub fn new<P>(publisher: P) -> Self
  where
    P: Publisher<Item = Item, Err = Err> + Send + 'static,
    Item: 'static,
    Err: 'static,
  {
    BoxedPublisher(Box::new(publisher))
  }
}

impl<Item, Err> Publisher for BoxedPublisher<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Item, Err> + 'static,
  {
    self.0.box_subscribe(Box::new(subscriber))
  }
}
