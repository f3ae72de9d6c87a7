//! Bridges from external event sources into the engine.
//!
//! Adapters feed values in only through a subject's `send`; the engine has
//! no other ingestion path.

use std::{
  marker::PhantomData,
  sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
  },
  time::Duration,
};

use parking_lot::Mutex;

use crate::{
  scheduler::{Scheduler, TaskHandle},
  subject::{PassthroughSubject, Subject},
  subscription::{AnyCancellable, Cancellable},
};

/// A periodic tick source.
///
/// Every `period` the timer sends the running tick count, starting at zero,
/// into a subject. Each tick arms the next one on the scheduler, so a
/// scheduler that runs work synchronously (such as `ImmediateScheduler`)
/// would never return from `drive` and must not be used here.
#[derive(Clone, Debug)]
pub struct Timer<SD> {
  period: Duration,
  scheduler: SD,
}

impl<SD: Scheduler> Timer<SD> {
  pub fn new(period: Duration, scheduler: SD) -> Self { Timer { period, scheduler } }

  pub fn period(&self) -> Duration { self.period }

  /// Start ticking into `subject` until the returned handle is cancelled or
  /// dropped. The subject is left open when the timer stops.
  pub fn drive<S, Err>(self, subject: S) -> AnyCancellable
  where
    S: Subject<usize, Err> + Send + Sync + 'static,
    Err: 'static,
  {
    let ticker = Arc::new(Ticker {
      subject,
      period: self.period,
      scheduler: self.scheduler,
      ticks: AtomicUsize::new(0),
      next: Mutex::new(None),
      stopped: AtomicBool::new(false),
      _err: PhantomData,
    });
    ticker.arm();
    AnyCancellable::from_arc(ticker)
  }

  /// Start ticking into a fresh subject and return it with the handle that
  /// stops the timer.
  pub fn autoconnect(self) -> (PassthroughSubject<usize>, AnyCancellable) {
    let subject = PassthroughSubject::new();
    let handle = self.drive(subject.clone());
    (subject, handle)
  }
}

struct Ticker<S, SD, Err> {
  subject: S,
  period: Duration,
  scheduler: SD,
  ticks: AtomicUsize,
  next: Mutex<Option<TaskHandle>>,
  stopped: AtomicBool,
  _err: PhantomData<fn(Err)>,
}

impl<S, SD, Err> Ticker<S, SD, Err>
where
  S: Subject<usize, Err> + Send + Sync + 'static,
  SD: Scheduler,
  Err: 'static,
{
  fn arm(self: &Arc<Self>) {
    if self.stopped.load(Ordering::Acquire) {
      return;
    }
    let this = self.clone();
    let handle = self.scheduler.schedule(self.period, Box::new(move || this.tick()));
    *self.next.lock() = Some(handle.clone());
    // lost the race with cancel
    if self.stopped.load(Ordering::Acquire) {
      handle.cancel();
    }
  }

  fn tick(self: &Arc<Self>) {
    if self.stopped.load(Ordering::Acquire) {
      return;
    }
    let tick = self.ticks.fetch_add(1, Ordering::AcqRel);
    tracing::trace!("timer tick {tick}");
    self.subject.send(tick);
    self.arm();
  }
}

impl<S, SD, Err> Cancellable for Ticker<S, SD, Err>
where
  S: Send + Sync,
  SD: Scheduler,
{
  fn cancel(&self) {
    if self.stopped.swap(true, Ordering::AcqRel) {
      return;
    }
    let next = self.next.lock().take();
    if let Some(next) = next {
      next.cancel();
    }
    tracing::debug!("timer stopped after {} ticks", self.ticks.load(Ordering::Acquire));
  }
}
