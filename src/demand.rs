//! Outstanding demand of a subscription.
//!
//! Demand accumulates with saturating arithmetic. Once the running total
//! would pass `i64::MAX` it is pinned there, and a pinned counter means
//! *unbounded*: it is never decremented again, so a subscriber that asked
//! for "everything" keeps getting everything.

use crate::error::StreamError;

/// Saturating, never negative count of elements a subscriber has authorized
/// but not yet received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Demand(i64);

impl Demand {
  /// The pinned value standing for unbounded demand.
  pub const UNBOUNDED: Demand = Demand(i64::MAX);

  pub const fn none() -> Self { Demand(0) }

  /// Adds a `request(count)` to the outstanding demand.
  ///
  /// Fails with [`StreamError::IllegalRequest`] when `count < 1`; the demand
  /// is left untouched in that case.
  pub fn add(&mut self, count: i64) -> Result<(), StreamError> {
    if count < 1 {
      return Err(StreamError::IllegalRequest { count });
    }
    self.0 = self.0.saturating_add(count);
    Ok(())
  }

  /// Takes one unit of demand for an element about to be delivered.
  ///
  /// Returns `false` when there is nothing left to take.
  pub fn take_one(&mut self) -> bool {
    match self.0 {
      0 => false,
      i64::MAX => true,
      _ => {
        self.0 -= 1;
        true
      }
    }
  }

  /// Moves all outstanding demand out, leaving none behind.
  pub fn take(&mut self) -> Demand { std::mem::take(self) }

  #[inline]
  pub fn is_empty(&self) -> bool { self.0 == 0 }

  #[inline]
  pub fn is_unbounded(&self) -> bool { self.0 == i64::MAX }

  #[inline]
  pub fn get(&self) -> i64 { self.0 }
}
