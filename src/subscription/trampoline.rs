use std::sync::atomic::{AtomicUsize, Ordering};

/// Serializes a drain loop without recursion.
///
/// The first caller to enter runs the work; anyone arriving while it runs
/// (re-entrantly from a callback, or from another thread) only records that
/// more work is pending and returns immediately. The running caller repeats
/// the work until no request is left, so stack depth stays constant no matter
/// how often callbacks re-enter.
#[derive(Default)]
pub(crate) struct Trampoline {
  wip: AtomicUsize,
}

impl Trampoline {
  pub(crate) fn run(&self, mut work: impl FnMut()) {
    if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
      return;
    }
    let mut missed = 1;
    loop {
      work();
      missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
      if missed == 0 {
        break;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, rc::Rc};

  use super::*;

  struct Probe {
    trampoline: Trampoline,
    runs: Cell<usize>,
    depth: Cell<usize>,
    max_depth: Cell<usize>,
  }

  fn step(probe: &Rc<Probe>) {
    probe.trampoline.run(|| {
      probe.depth.set(probe.depth.get() + 1);
      probe.max_depth.set(probe.max_depth.get().max(probe.depth.get()));
      probe.runs.set(probe.runs.get() + 1);
      if probe.runs.get() < 100 {
        step(probe);
      }
      probe.depth.set(probe.depth.get() - 1);
    });
  }

  #[rxdemand_macro::test]
  fn reentrant_calls_are_flattened() {
    let probe = Rc::new(Probe {
      trampoline: Trampoline::default(),
      runs: Cell::new(0),
      depth: Cell::new(0),
      max_depth: Cell::new(0),
    });

    step(&probe);
    assert_eq!(probe.runs.get(), 100);
    assert_eq!(probe.max_depth.get(), 1);
  }
}
