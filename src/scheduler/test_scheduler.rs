//! Virtual-time scheduler for deterministic tests of time-based operators.
//!
//! Time only moves when a test calls [`TestScheduler::advance_by`] or
//! [`TestScheduler::flush`]; due work then runs synchronously on the test
//! thread, earliest first and FIFO among tasks due at the same instant.
//!
//! State is thread-local, so tests running in parallel on different threads
//! do not see each other's clocks or queues. Call [`TestScheduler::init`] at
//! the start of each test.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use rxdemand::prelude::*;
//!
//! TestScheduler::init();
//! let _handle = just(42)
//!   .delay(Duration::from_millis(100), TestScheduler)
//!   .sink(|v| println!("{v}"));
//! TestScheduler::advance_by(Duration::from_millis(100));
//! ```

use std::{cell::RefCell, cmp::Ordering, collections::BinaryHeap, time::Duration};

use super::{Scheduler, TaskHandle, Work};

// ==================== Internal State ====================

#[derive(Default)]
struct TestSchedulerState {
  virtual_time: Duration,
  queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
}

struct ScheduledTask {
  due: Duration,
  task_id: usize,
  work: Work,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.task_id == other.task_id }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // min-heap on (due, task_id)
    other.due.cmp(&self.due).then_with(|| other.task_id.cmp(&self.task_id))
  }
}

thread_local! {
  static STATE: RefCell<TestSchedulerState> = RefCell::new(TestSchedulerState::default());
}

// ==================== TestScheduler ====================

/// A zero-sized handle to the calling thread's virtual clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestScheduler;

impl TestScheduler {
  /// Reset the clock to zero and drop every pending task.
  pub fn init() {
    STATE.with(|state| {
      let mut state = state.borrow_mut();
      state.virtual_time = Duration::ZERO;
      state.queue.clear();
      state.next_task_id = 0;
    });
  }

  pub fn now() -> Duration { STATE.with(|state| state.borrow().virtual_time) }

  /// Tasks scheduled and not yet run, cancelled ones included.
  pub fn pending_count() -> usize { STATE.with(|state| state.borrow().queue.len()) }

  /// Move the clock forward by `duration`, running every task that falls due
  /// on the way, including tasks scheduled by those tasks.
  pub fn advance_by(duration: Duration) {
    let target = Self::now() + duration;
    Self::run_until(Some(target));
    STATE.with(|state| state.borrow_mut().virtual_time = target);
  }

  /// Run every pending task, moving the clock to each one's due time.
  pub fn flush() { Self::run_until(None) }

  fn run_until(limit: Option<Duration>) {
    loop {
      // The borrow ends before the work runs; work is free to schedule more.
      let next = STATE.with(|state| {
        let mut state = state.borrow_mut();
        let due = state.queue.peek().map(|task| task.due)?;
        if limit.is_some_and(|limit| due > limit) {
          return None;
        }
        let task = state.queue.pop()?;
        state.virtual_time = task.due;
        Some(task)
      });
      let Some(task) = next else { break };
      task.handle.run(task.work);
    }
  }
}

impl Scheduler for TestScheduler {
  fn schedule(&self, after: Duration, work: Work) -> TaskHandle {
    let handle = TaskHandle::new();
    STATE.with(|state| {
      let mut state = state.borrow_mut();
      let task_id = state.next_task_id;
      state.next_task_id += 1;
      let due = state.virtual_time + after;
      state.queue.push(ScheduledTask { due, task_id, work, handle: handle.clone() });
    });
    handle
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use super::*;
  use crate::subscription::Cancellable;

  type Log = Arc<Mutex<Vec<u32>>>;

  fn record(log: &Log, tag: u32) -> Work {
    let log = log.clone();
    Box::new(move || log.lock().push(tag))
  }

  #[rxdemand_macro::test]
  fn runs_due_tasks_in_time_then_fifo_order() {
    TestScheduler::init();
    let log = Log::default();
    TestScheduler.schedule(Duration::from_millis(20), record(&log, 3));
    TestScheduler.schedule(Duration::from_millis(10), record(&log, 1));
    TestScheduler.schedule(Duration::from_millis(10), record(&log, 2));

    TestScheduler::advance_by(Duration::from_millis(10));
    assert_eq!(*log.lock(), vec![1, 2]);
    assert_eq!(TestScheduler::now(), Duration::from_millis(10));
    assert_eq!(TestScheduler::pending_count(), 1);

    TestScheduler::flush();
    assert_eq!(*log.lock(), vec![1, 2, 3]);
    assert_eq!(TestScheduler::now(), Duration::from_millis(20));
  }

  #[rxdemand_macro::test]
  fn advance_moves_the_clock_even_when_idle() {
    TestScheduler::init();
    TestScheduler::advance_by(Duration::from_millis(100));
    TestScheduler::advance_by(Duration::from_millis(50));
    assert_eq!(TestScheduler::now(), Duration::from_millis(150));

    TestScheduler::init();
    assert_eq!(TestScheduler::now(), Duration::ZERO);
  }

  #[rxdemand_macro::test]
  fn cancelled_tasks_are_skipped() {
    TestScheduler::init();
    let log = Log::default();
    let handle = TestScheduler.schedule(Duration::from_millis(5), record(&log, 1));
    handle.cancel();
    TestScheduler::flush();
    assert!(log.lock().is_empty());
    assert_eq!(TestScheduler::pending_count(), 0);
  }

  #[rxdemand_macro::test]
  fn work_may_schedule_more_work() {
    TestScheduler::init();
    let log = Log::default();
    let inner = log.clone();
    TestScheduler.schedule(
      Duration::from_millis(10),
      Box::new(move || {
        inner.lock().push(1);
        TestScheduler.schedule(Duration::from_millis(10), record(&inner, 2));
      }),
    );
    TestScheduler::advance_by(Duration::from_millis(30));
    assert_eq!(*log.lock(), vec![1, 2]);
  }
}
