use std::time::Duration;

use super::{thread_scheduler::ThreadScheduler, Scheduler, TaskHandle, Work};

/// Spawns work onto the tokio runtime of the calling thread.
///
/// Outside a runtime the task falls back to [`ThreadScheduler`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
  fn schedule(&self, after: Duration, work: Work) -> TaskHandle {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
      tracing::debug!("no tokio runtime on this thread, using a dedicated thread");
      return ThreadScheduler.schedule(after, work);
    };
    let handle = TaskHandle::new();
    let task = handle.clone();
    runtime.spawn(async move {
      if !after.is_zero() && !task.is_closed() {
        tokio::time::sleep(after).await;
      }
      task.run(work);
    });
    handle
  }
}
