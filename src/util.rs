use std::any::Any;

/// Hands `value` back as an `E` when it already is one.
///
/// The erasure handles use this to make re-wrapping a handle return that
/// very handle instead of boxing it again.
pub(crate) fn reuse_erased<S: Any, E: Any>(value: S) -> Result<E, S> {
  let mut slot = Some(value);
  let erased = (&mut slot as &mut dyn Any).downcast_mut::<Option<E>>().and_then(Option::take);
  if let Some(erased) = erased {
    return Ok(erased);
  }
  // A failed downcast leaves the slot untouched.
  slot.map_or_else(|| unreachable!("slot emptied without a matching downcast"), Err)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[reactive_streams_macro::test]
  fn same_type_is_reused() {
    assert_eq!(reuse_erased::<u8, u8>(7), Ok(7));
  }

  #[reactive_streams_macro::test]
  fn other_type_is_returned() {
    assert_eq!(reuse_erased::<u8, String>(7), Err(7));
  }
}
