//! Schedulers decide when and on which thread deferred work runs.
//!
//! Time-based operators and adapters never sleep themselves; they hand a
//! closure and a delay to a [`Scheduler`] and keep the returned
//! [`TaskHandle`], which cancels the work if it has not started yet.
//!
//! | Scheduler | Runs work |
//! |-----------|-----------|
//! | [`ImmediateScheduler`] | right away on the calling thread, ignoring the delay |
//! | [`ThreadScheduler`] | on a new thread per task |
//! | `ThreadPoolScheduler` | on a shared `futures` thread pool (`futures-scheduler`) |
//! | `TokioScheduler` | on the current tokio runtime (`tokio-scheduler`) |
//! | [`TestScheduler`] | when virtual time is advanced, on the test thread |

use std::{
  sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
  },
  time::Duration,
};

use crate::subscription::Cancellable;

mod immediate;
mod test_scheduler;
#[cfg(all(feature = "futures-scheduler", not(target_arch = "wasm32")))]
mod thread_pool_scheduler;
mod thread_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use immediate::ImmediateScheduler;
pub use test_scheduler::TestScheduler;
#[cfg(all(feature = "futures-scheduler", not(target_arch = "wasm32")))]
pub use thread_pool_scheduler::ThreadPoolScheduler;
pub use thread_scheduler::ThreadScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// A unit of deferred work.
pub type Work = Box<dyn FnOnce() + Send>;

/// Runs work after a delay.
///
/// Implementations must run `work` at most once, and never after the
/// returned handle has been cancelled.
pub trait Scheduler: Clone + Send + Sync + 'static {
  fn schedule(&self, after: Duration, work: Work) -> TaskHandle;
}

// ==================== TaskHandle ====================

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const FINISHED: u8 = 2;
const CANCELLED: u8 = 3;

/// Tracks one scheduled task. Cloning shares the same task.
#[derive(Clone, Debug)]
pub struct TaskHandle {
  state: Arc<AtomicU8>,
}

impl Default for TaskHandle {
  fn default() -> Self { Self::new() }
}

impl TaskHandle {
  pub fn new() -> Self { TaskHandle { state: Arc::new(AtomicU8::new(PENDING)) } }

  /// A handle for work that already ran.
  pub fn finished() -> Self { TaskHandle { state: Arc::new(AtomicU8::new(FINISHED)) } }

  /// Run `work` unless the task was cancelled first. Used by scheduler
  /// implementations when the delay has elapsed.
  pub fn run(&self, work: Work) {
    if self
      .state
      .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return;
    }
    work();
    self.state.store(FINISHED, Ordering::Release);
  }

  pub fn is_cancelled(&self) -> bool { self.state.load(Ordering::Acquire) == CANCELLED }

  pub fn is_finished(&self) -> bool { self.state.load(Ordering::Acquire) == FINISHED }

  /// `true` once the task can no longer start.
  pub fn is_closed(&self) -> bool { self.state.load(Ordering::Acquire) != PENDING }
}

impl Cancellable for TaskHandle {
  /// Prevent the work from starting. Work that is already running is not
  /// interrupted.
  fn cancel(&self) {
    if self
      .state
      .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
    {
      tracing::trace!("scheduled task cancelled before it ran");
    }
  }
}
