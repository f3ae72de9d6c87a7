//! Subscriptions and cancellation handles.
//!
//! A [`Subscription`] is what a publisher hands its subscriber in
//! `on_subscribe`: the channel for asking for more values and for
//! withdrawing interest. [`AnyCancellable`] is the owner-side handle returned
//! by the terminal sinks; dropping it cancels. [`CancelBag`] collects handles
//! so a whole group can be released at once.

use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::demand::Demand;

pub(crate) mod dynamic;
pub(crate) mod outlet;
pub(crate) mod trampoline;

/// Anything that can be cancelled. Cancelling is idempotent and safe after
/// termination.
pub trait Cancellable: Send + Sync {
  fn cancel(&self);
}

/// The link between one publisher and one subscriber.
pub trait Subscription: Cancellable {
  /// Ask for `demand` more values. Requests accumulate; asking for zero is a
  /// protocol violation and is ignored.
  fn request(&self, demand: Demand);
}

/// Shared handle to a subscription, as passed to `on_subscribe`.
pub type SubscriptionRef = Arc<dyn Subscription>;

impl<F> Cancellable for Mutex<Option<F>>
where
  F: FnOnce() + Send,
{
  fn cancel(&self) {
    let teardown = self.lock().take();
    if let Some(teardown) = teardown {
      teardown();
    }
  }
}

/// Cancels the wrapped cancellable when dropped.
#[must_use = "dropping an AnyCancellable cancels its subscription immediately"]
pub struct AnyCancellable(Arc<dyn Cancellable>);

impl AnyCancellable {
  pub fn new(cancellable: impl Cancellable + 'static) -> Self { AnyCancellable(Arc::new(cancellable)) }

  pub fn from_arc(cancellable: Arc<dyn Cancellable>) -> Self { AnyCancellable(cancellable) }

  /// Run `teardown` once, on the first cancel or on drop.
  pub fn from_fn(teardown: impl FnOnce() + Send + 'static) -> Self {
    AnyCancellable::new(Mutex::new(Some(teardown)))
  }

  /// Move this handle into `bag`; it is then cancelled together with the
  /// rest of the bag.
  pub fn store(self, bag: &mut CancelBag) { bag.insert(self) }
}

impl Cancellable for AnyCancellable {
  fn cancel(&self) { self.0.cancel() }
}

impl Drop for AnyCancellable {
  fn drop(&mut self) { self.0.cancel() }
}

/// An owning collection of cancellation handles.
///
/// Handles stored into a bag live as long as the bag does. `cancel_all`, or
/// dropping the bag, cancels every one of them. Handles inserted after
/// `cancel_all` are cancelled on the spot.
#[derive(Default)]
pub struct CancelBag {
  closed: bool,
  handles: SmallVec<[AnyCancellable; 4]>,
}

impl CancelBag {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, handle: AnyCancellable) {
    if self.closed {
      handle.cancel();
    } else {
      self.handles.push(handle);
    }
  }

  #[inline]
  pub fn len(&self) -> usize { self.handles.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.handles.is_empty() }

  pub fn cancel_all(&mut self) {
    self.closed = true;
    tracing::trace!(count = self.handles.len(), "cancel bag released");
    // each handle cancels on drop
    self.handles.clear();
  }
}

impl Drop for CancelBag {
  fn drop(&mut self) { self.cancel_all() }
}
