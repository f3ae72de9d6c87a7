//! Subjects: publishers that are fed imperatively.
//!
//! A subject multicasts whatever is sent into it to every current
//! subscriber, respecting each subscriber's own demand. Subscribers without
//! demand miss the value; nothing is buffered per subscriber.

use crate::{error::Completion, publisher::Publisher};

mod current_value_subject;
mod passthrough_subject;
mod subject_core;

pub use current_value_subject::CurrentValueSubject;
pub use passthrough_subject::PassthroughSubject;

/// The imperative side of a subject.
///
/// Subject handles are cheap to clone; every clone feeds the same set of
/// subscribers.
pub trait Subject<Item, Err>: Publisher<Item = Item, Err = Err> + Clone {
  fn send(&self, value: Item);

  /// Terminate the subject. Only the first completion counts.
  fn send_completion(&self, completion: Completion<Err>);

  #[inline]
  fn finish(&self) { self.send_completion(Completion::Finished) }

  #[inline]
  fn fail(&self, err: Err) { self.send_completion(Completion::Failed(err)) }
}
