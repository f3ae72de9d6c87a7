use std::time::Duration;

use super::{Scheduler, TaskHandle, Work};

/// Runs work synchronously on the calling thread, ignoring the delay.
///
/// Useful to exercise time-based operators without any timing at all. Work
/// that schedules more work on this scheduler recurses, so repeating
/// sources such as the `Timer` adapter should not be driven by it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn schedule(&self, _after: Duration, work: Work) -> TaskHandle {
    let handle = TaskHandle::new();
    handle.run(work);
    handle
  }
}
