//! Demand: how many more values a subscriber is willing to receive.
//!
//! A `Demand` is either a finite count or unbounded. Adding demand saturates
//! at [`Demand::UNLIMITED`]; consuming a unit from a finite count decrements
//! it, and consuming from zero is a protocol violation.

use std::{
  fmt::{Display, Formatter},
  ops::{Add, AddAssign},
};

use crate::error::ProtocolViolation;

/// The number of values a subscriber permits a publisher to deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Demand {
  /// At most this many more values.
  Finite(usize),
  /// Any number of values.
  Unbounded,
}

impl Demand {
  /// No additional values.
  pub const NONE: Demand = Demand::Finite(0);

  /// Any number of values.
  pub const UNLIMITED: Demand = Demand::Unbounded;

  /// Demand for at most `count` values.
  #[inline]
  pub const fn max(count: usize) -> Self { Demand::Finite(count) }

  #[inline]
  pub const fn is_none(&self) -> bool { matches!(self, Demand::Finite(0)) }

  #[inline]
  pub const fn is_unlimited(&self) -> bool { matches!(self, Demand::Unbounded) }

  /// `true` when at least one more value may be delivered.
  #[inline]
  pub const fn has_demand(&self) -> bool { !self.is_none() }

  /// The finite count, or `None` when unbounded.
  #[inline]
  pub const fn count(&self) -> Option<usize> {
    match self {
      Demand::Finite(n) => Some(*n),
      Demand::Unbounded => None,
    }
  }

  /// Use up one unit of demand for a delivered value.
  ///
  /// Consuming from `Finite(0)` leaves the demand untouched and reports
  /// [`ProtocolViolation::DemandExhausted`].
  pub fn consume_one(&mut self) -> Result<(), ProtocolViolation> {
    match self {
      Demand::Finite(0) => Err(ProtocolViolation::DemandExhausted),
      Demand::Finite(n) => {
        *n -= 1;
        Ok(())
      }
      Demand::Unbounded => Ok(()),
    }
  }

  /// The smaller of this demand and `limit`, as a finite demand.
  #[inline]
  pub fn at_most(self, limit: usize) -> Demand {
    match self {
      Demand::Finite(n) => Demand::Finite(n.min(limit)),
      Demand::Unbounded => Demand::Finite(limit),
    }
  }
}

impl Default for Demand {
  fn default() -> Self { Demand::NONE }
}

impl Add for Demand {
  type Output = Demand;

  fn add(self, rhs: Demand) -> Demand {
    match (self, rhs) {
      (Demand::Finite(a), Demand::Finite(b)) => {
        a.checked_add(b).map_or(Demand::Unbounded, Demand::Finite)
      }
      _ => Demand::Unbounded,
    }
  }
}

impl Add<usize> for Demand {
  type Output = Demand;

  fn add(self, rhs: usize) -> Demand { self + Demand::Finite(rhs) }
}

impl AddAssign for Demand {
  fn add_assign(&mut self, rhs: Demand) { *self = *self + rhs; }
}

impl AddAssign<usize> for Demand {
  fn add_assign(&mut self, rhs: usize) { *self = *self + rhs; }
}

impl From<usize> for Demand {
  fn from(count: usize) -> Self { Demand::Finite(count) }
}

impl Display for Demand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Demand::Finite(n) => write!(f, "max({n})"),
      Demand::Unbounded => f.write_str("unlimited"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxdemand_macro::test]
  fn zero_is_additive_identity() {
    assert_eq!(Demand::NONE + Demand::max(3), Demand::max(3));
    assert_eq!(Demand::max(3) + Demand::NONE, Demand::max(3));
  }

  #[rxdemand_macro::test]
  fn unlimited_absorbs_everything() {
    assert_eq!(Demand::UNLIMITED + Demand::max(1), Demand::UNLIMITED);
    assert_eq!(Demand::max(1) + Demand::UNLIMITED, Demand::UNLIMITED);
    assert_eq!(Demand::max(usize::MAX) + 1, Demand::UNLIMITED);
  }

  #[rxdemand_macro::test]
  fn consume_counts_down_and_stops_at_zero() {
    let mut demand = Demand::max(2);
    assert!(demand.consume_one().is_ok());
    assert!(demand.consume_one().is_ok());
    assert!(demand.is_none());
    assert_eq!(demand.consume_one(), Err(ProtocolViolation::DemandExhausted));
    assert_eq!(demand, Demand::NONE);

    let mut unlimited = Demand::UNLIMITED;
    assert!(unlimited.consume_one().is_ok());
    assert!(unlimited.is_unlimited());
  }

  #[rxdemand_macro::test]
  fn at_most_caps_demand() {
    assert_eq!(Demand::UNLIMITED.at_most(2), Demand::max(2));
    assert_eq!(Demand::max(5).at_most(2), Demand::max(2));
    assert_eq!(Demand::max(1).at_most(2), Demand::max(1));
  }

  #[rxdemand_macro::test]
  fn display() {
    assert_eq!(Demand::max(4).to_string(), "max(4)");
    assert_eq!(Demand::UNLIMITED.to_string(), "unlimited");
  }
}
