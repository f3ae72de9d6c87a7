//! Publishers and the operator surface.
//!
//! [`Publisher`] is the producer half of the protocol. Subscribing consumes
//! the publisher value, so a pipeline is built by nesting operator structs
//! and then handing the outermost one its subscriber. Publishers that can be
//! subscribed repeatedly (leaf sources, subjects) implement `Clone`.
//!
//! [`PublisherExt`] is implemented for every publisher and provides the
//! operator methods and the closure sinks.

use std::{convert::Infallible, time::Duration};

use crate::{
  error::Completion,
  ops::{
    flatten3,
    combine_latest::{CombineLatest, CombineLatest3},
    concat::Concat,
    delay::Delay,
    drop_first::DropFirst,
    filter::Filter,
    handle_events::{EventHandler, HandleEvents},
    ignore_output::IgnoreOutput,
    log_events::EventLogger,
    map::Map,
    map_err::{absurd, MapErr},
    merge::Merge,
    prefix::Prefix,
    prefix_while::PrefixWhile,
    share::Share,
    switch_to_latest::SwitchToLatest,
    zip::{Zip, Zip3},
  },
  scheduler::Scheduler,
  subscriber::{Sink, Subscriber},
  subscription::AnyCancellable,
};

mod boxed;
mod empty;
mod from_iter;
mod just;

pub use boxed::BoxedPublisher;
pub use empty::{empty, fail, Empty, Fail};
pub use from_iter::{from_iter, FromIter};
pub use just::{just, Just};

/// A producer of `Item`s that may fail with `Err`.
///
/// `subscribe` must call the subscriber's `on_subscribe` exactly once before
/// delivering anything, and must never deliver more values than requested.
pub trait Publisher {
  type Item;
  type Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Self::Item, Self::Err> + 'static;
}

pub trait PublisherExt: Publisher + Sized {
  /// Transform every value with `f`.
  fn map<Out, F>(self, f: F) -> Map<Self, F>
  where
    F: FnMut(Self::Item) -> Out,
  {
    Map::new(self, f)
  }

  /// Transform the failure with `f`.
  fn map_err<E, F>(self, f: F) -> MapErr<Self, F>
  where
    F: FnMut(Self::Err) -> E,
  {
    MapErr::new(self, f)
  }

  /// Give a publisher that never fails any failure type, so it can be
  /// combined with fallible publishers.
  fn set_failure_type<E>(self) -> MapErr<Self, fn(Infallible) -> E>
  where
    Self: Publisher<Err = Infallible>,
  {
    MapErr::new(self, absurd::<E> as fn(Infallible) -> E)
  }

  /// Only forward values for which `predicate` returns `true`.
  fn filter<F>(self, predicate: F) -> Filter<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    Filter::new(self, predicate)
  }

  /// Skip the first `count` values.
  fn drop_first(self, count: usize) -> DropFirst<Self> { DropFirst::new(self, count) }

  /// Forward at most `count` values, then finish and cancel upstream.
  fn prefix(self, count: usize) -> Prefix<Self> { Prefix::new(self, count) }

  /// Forward values while `predicate` holds, then finish and cancel upstream.
  fn prefix_while<F>(self, predicate: F) -> PrefixWhile<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    PrefixWhile::new(self, predicate)
  }

  /// Emit everything `other` emits before this publisher is subscribed.
  fn prepend<P>(self, other: P) -> Concat<P, Self>
  where
    P: Publisher<Item = Self::Item, Err = Self::Err>,
  {
    Concat::new(other, self)
  }

  fn prepend_values<I>(self, values: I) -> Concat<FromIter<I::IntoIter, Self::Err>, Self>
  where
    I: IntoIterator<Item = Self::Item>,
  {
    Concat::new(FromIter::new(values.into_iter()), self)
  }

  /// Once this publisher finishes, continue with `other`.
  fn append<P>(self, other: P) -> Concat<Self, P>
  where
    P: Publisher<Item = Self::Item, Err = Self::Err>,
  {
    Concat::new(self, other)
  }

  fn append_values<I>(self, values: I) -> Concat<Self, FromIter<I::IntoIter, Self::Err>>
  where
    I: IntoIterator<Item = Self::Item>,
  {
    Concat::new(self, FromIter::new(values.into_iter()))
  }

  /// Interleave the values of both publishers as they arrive.
  fn merge<P>(self, other: P) -> Merge<Self::Item, Self::Err>
  where
    Self: Send + 'static,
    P: Publisher<Item = Self::Item, Err = Self::Err> + Send + 'static,
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    Merge::new([self.boxed(), other.boxed()])
  }

  /// Emit the latest value of each publisher whenever either one emits.
  fn combine_latest<P>(self, other: P) -> CombineLatest<Self, P>
  where
    P: Publisher<Err = Self::Err>,
  {
    CombineLatest::new(self, other)
  }

  fn combine_latest3<B, C>(self, b: B, c: C) -> CombineLatest3<Self, B, C>
  where
    B: Publisher<Err = Self::Err>,
    C: Publisher<Err = Self::Err>,
  {
    let flatten: fn(((Self::Item, B::Item), C::Item)) -> (Self::Item, B::Item, C::Item) = flatten3;
    Map::new(CombineLatest::new(CombineLatest::new(self, b), c), flatten)
  }

  /// Pair up the n-th values of both publishers.
  fn zip<P>(self, other: P) -> Zip<Self, P>
  where
    P: Publisher<Err = Self::Err>,
  {
    Zip::new(self, other)
  }

  fn zip3<B, C>(self, b: B, c: C) -> Zip3<Self, B, C>
  where
    B: Publisher<Err = Self::Err>,
    C: Publisher<Err = Self::Err>,
  {
    let flatten: fn(((Self::Item, B::Item), C::Item)) -> (Self::Item, B::Item, C::Item) = flatten3;
    Map::new(Zip::new(Zip::new(self, b), c), flatten)
  }

  /// Flatten a publisher of publishers, following only the most recent one.
  fn switch_to_latest(self) -> SwitchToLatest<Self>
  where
    Self::Item: Publisher<Err = Self::Err>,
  {
    SwitchToLatest::new(self)
  }

  /// Re-emit every signal `delay` later on `scheduler`.
  fn delay<SD: Scheduler>(self, delay: Duration, scheduler: SD) -> Delay<Self, SD> {
    Delay::new(self, delay, scheduler)
  }

  /// Observe subscription events without changing them.
  fn handle_events<H>(self, handler: H) -> HandleEvents<Self, H>
  where
    H: EventHandler<Self::Item, Self::Err>,
  {
    HandleEvents::new(self, handler)
  }

  /// Log every subscription event at `info` level, tagged with `prefix`.
  fn log_events(self, prefix: impl Into<String>) -> HandleEvents<Self, EventLogger> {
    HandleEvents::new(self, EventLogger::new(prefix))
  }

  /// Drop every value and forward only the terminal signal.
  fn ignore_output(self) -> IgnoreOutput<Self> { IgnoreOutput::new(self) }

  /// Multicast this publisher: every subscriber of the returned handle shares
  /// a single upstream subscription, which is cancelled when the last
  /// subscriber cancels.
  fn share(self) -> Share<Self>
  where
    Self: Clone + Send + 'static,
    Self::Item: Clone + Send + 'static,
    Self::Err: Clone + Send + 'static,
  {
    Share::new(self)
  }

  /// Erase the concrete type of this pipeline.
  fn boxed(self) -> BoxedPublisher<Self::Item, Self::Err>
  where
    Self: Send + 'static,
  {
    BoxedPublisher::new(self)
  }

  /// Subscribe with a value closure. Only for publishers that cannot fail.
  fn sink<F>(self, on_value: F) -> AnyCancellable
  where
    Self: Publisher<Err = Infallible>,
    Self::Item: 'static,
    F: FnMut(Self::Item) + Send + 'static,
  {
    self.sink_completion(|_: Completion<Infallible>| {}, on_value)
  }

  /// Subscribe with a completion closure and a value closure.
  ///
  /// The sink requests unlimited demand. The returned handle cancels the
  /// subscription when cancelled or dropped.
  fn sink_completion<F, C>(self, on_completion: C, on_value: F) -> AnyCancellable
  where
    Self::Item: 'static,
    Self::Err: 'static,
    F: FnMut(Self::Item) + Send + 'static,
    C: FnOnce(Completion<Self::Err>) + Send + 'static,
  {
    let sink = Sink::new(on_value, on_completion);
    let handle = sink.cancellable();
    self.subscribe(sink);
    handle
  }
}

impl<P: Publisher> PublisherExt for P {}
