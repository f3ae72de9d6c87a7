//! `tracing` output for every subscription event, the backing of
//! `PublisherExt::log_events`.

use std::fmt::Debug;

use super::handle_events::EventHandler;
use crate::{demand::Demand, error::Completion};

/// Logs each event at `info` level, prefixed with a caller-chosen tag.
#[derive(Clone, Debug)]
pub struct EventLogger {
  prefix: String,
}

impl EventLogger {
  pub fn new(prefix: impl Into<String>) -> Self { EventLogger { prefix: prefix.into() } }

  pub fn prefix(&self) -> &str { &self.prefix }
}

impl<Item, Err> EventHandler<Item, Err> for EventLogger
where
  Item: Debug,
  Err: Debug,
{
  fn subscription(&self) { tracing::info!(prefix = %self.prefix, "receive subscription"); }

  fn value(&self, value: &Item) {
    tracing::info!(prefix = %self.prefix, "receive value: ({value:?})");
  }

  fn completion(&self, completion: &Completion<Err>) {
    match completion {
      Completion::Finished => tracing::info!(prefix = %self.prefix, "receive finished"),
      Completion::Failed(err) => {
        tracing::info!(prefix = %self.prefix, "receive error: ({err:?})")
      }
    }
  }

  fn cancel(&self) { tracing::info!(prefix = %self.prefix, "receive cancel"); }

  fn request(&self, demand: Demand) {
    tracing::info!(prefix = %self.prefix, "request {demand}");
  }
}

#[cfg(test)]
mod tests {
  use crate::{prelude::*, test_support::Probe};

  #[rxdemand_macro::test]
  fn logging_leaves_the_stream_untouched() {
    let probe = Probe::new();
    from_iter(["a", "b"]).log_events("letters").subscribe(probe.subscriber(Demand::max(1)));
    assert_eq!(probe.values(), vec!["a"]);

    probe.request(Demand::max(1));
    assert_eq!(probe.values(), vec!["a", "b"]);
    assert!(probe.is_finished());
  }
}
