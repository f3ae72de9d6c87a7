use std::time::Duration;

use futures::executor::ThreadPool;
use once_cell::sync::Lazy;

use super::{thread_scheduler::ThreadScheduler, Scheduler, TaskHandle, Work};

static DEFAULT_POOL: Lazy<Option<ThreadPool>> = Lazy::new(|| match ThreadPool::new() {
  Ok(pool) => Some(pool),
  Err(err) => {
    tracing::warn!("thread pool unavailable, falling back to a thread per task: {err}");
    None
  }
});

/// Runs work on a process-wide `futures` thread pool, created on first use.
///
/// With the `timer` feature the delay is an async sleep, so waiting tasks
/// do not occupy pool threads. Without it, delayed work is handed to
/// [`ThreadScheduler`] and only immediate work runs on the pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadPoolScheduler;

impl Scheduler for ThreadPoolScheduler {
  fn schedule(&self, after: Duration, work: Work) -> TaskHandle {
    match DEFAULT_POOL.as_ref() {
      Some(pool) => spawn(pool, after, work),
      None => ThreadScheduler.schedule(after, work),
    }
  }
}

#[cfg(feature = "timer")]
fn spawn(pool: &ThreadPool, after: Duration, work: Work) -> TaskHandle {
  let handle = TaskHandle::new();
  let task = handle.clone();
  pool.spawn_ok(async move {
    if !after.is_zero() && !task.is_closed() {
      futures_time::task::sleep(after.into()).await;
    }
    task.run(work);
  });
  handle
}

#[cfg(not(feature = "timer"))]
fn spawn(pool: &ThreadPool, after: Duration, work: Work) -> TaskHandle {
  if !after.is_zero() {
    return ThreadScheduler.schedule(after, work);
  }
  let handle = TaskHandle::new();
  let task = handle.clone();
  pool.spawn_ok(async move { task.run(work) });
  handle
}

#[cfg(test)]
mod tests {
  use std::sync::mpsc;

  use super::*;
  use crate::subscription::Cancellable;

  #[rxdemand_macro::test]
  fn runs_after_the_delay() {
    let (tx, rx) = mpsc::channel();
    ThreadPoolScheduler.schedule(
      Duration::from_millis(10),
      Box::new(move || {
        let _ = tx.send(42);
      }),
    );
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(42));
  }

  #[rxdemand_macro::test]
  fn waiting_tasks_leave_the_pool_free() {
    let (tx, rx) = mpsc::channel();
    let waiting: Vec<_> = (0..64)
      .map(|_| ThreadPoolScheduler.schedule(Duration::from_millis(500), Box::new(|| {})))
      .collect();
    ThreadPoolScheduler.schedule(
      Duration::ZERO,
      Box::new(move || {
        let _ = tx.send(());
      }),
    );
    assert_eq!(rx.recv_timeout(Duration::from_millis(250)), Ok(()));
    for handle in waiting {
      handle.cancel();
    }
  }

  #[rxdemand_macro::test]
  fn cancelled_task_is_skipped() {
    let (tx, rx) = mpsc::channel::<()>();
    let handle = ThreadPoolScheduler.schedule(
      Duration::from_millis(50),
      Box::new(move || {
        let _ = tx.send(());
      }),
    );
    handle.cancel();
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
  }
}
