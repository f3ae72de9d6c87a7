use std::{thread, time::Duration};

use super::{Scheduler, TaskHandle, Work};

/// Spawns a new thread for every task; the thread sleeps for the delay and
/// then runs the work unless it was cancelled meanwhile.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
  fn schedule(&self, after: Duration, work: Work) -> TaskHandle {
    let handle = TaskHandle::new();
    let task = handle.clone();
    thread::spawn(move || {
      if !after.is_zero() && !task.is_closed() {
        thread::sleep(after);
      }
      task.run(work);
    });
    handle
  }
}
