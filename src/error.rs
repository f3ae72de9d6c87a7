//! Terminal signals and protocol violations.

use thiserror::Error;

/// The one-time terminal signal of a subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion<Err> {
  /// The publisher finished normally.
  Finished,
  /// The publisher terminated with a failure.
  Failed(Err),
}

impl<Err> Completion<Err> {
  #[inline]
  pub fn is_finished(&self) -> bool { matches!(self, Completion::Finished) }

  #[inline]
  pub fn is_failed(&self) -> bool { matches!(self, Completion::Failed(_)) }

  /// Convert the failure with `f`, keeping `Finished` as is.
  pub fn map_err<E2>(self, f: impl FnOnce(Err) -> E2) -> Completion<E2> {
    match self {
      Completion::Finished => Completion::Finished,
      Completion::Failed(err) => Completion::Failed(f(err)),
    }
  }

  #[inline]
  pub fn into_result(self) -> Result<(), Err> {
    match self {
      Completion::Finished => Ok(()),
      Completion::Failed(err) => Err(err),
    }
  }
}

impl<Err> From<Result<(), Err>> for Completion<Err> {
  fn from(result: Result<(), Err>) -> Self {
    match result {
      Ok(()) => Completion::Finished,
      Err(err) => Completion::Failed(err),
    }
  }
}

/// Misuse of the publisher/subscriber contract.
///
/// These are programmer errors. The engine never panics on them: the
/// offending call is logged and dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
  #[error("value delivered without outstanding demand")]
  DemandExhausted,
  #[error("request for zero demand")]
  ZeroDemandRequest,
  #[error("signal delivered after the terminal signal")]
  AlreadyTerminated,
  #[error("signal delivered after cancellation")]
  Cancelled,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxdemand_macro::test]
  fn completion_result_conversions() {
    let finished: Completion<&str> = Ok(()).into();
    assert!(finished.is_finished());
    assert_eq!(finished.into_result(), Ok(()));

    let failed: Completion<&str> = Err("boom").into();
    assert!(failed.is_failed());
    assert_eq!(failed.map_err(str::len), Completion::Failed(4));
  }

  #[rxdemand_macro::test]
  fn violations_render_messages() {
    assert_eq!(
      ProtocolViolation::DemandExhausted.to_string(),
      "value delivered without outstanding demand"
    );
  }
}
