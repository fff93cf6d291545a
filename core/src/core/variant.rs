// sluice/src/core/variant.rs

//! Runtime type dispatch for `when_type_is` / `when_type_matches`.

use std::any::Any;

/// An input type that may hold a narrower `T`.
///
/// Model inputs as a closed enum where possible and implement `Narrow` once per
/// variant payload: `narrow` pulls the payload out, `widen` puts it back.
/// Open-ended inputs can use `Box<dyn Any + Send>`, for which a checked
/// downcast is provided.
pub trait Narrow<T>: Sized {
  /// Returns the narrowed value, or hands the input back untouched when it is
  /// not a `T`.
  fn narrow(self) -> Result<T, Self>;

  /// Re-widens a narrowed value so it can fall through to the outer pipeline.
  fn widen(value: T) -> Self;
}

impl<T: Any + Send> Narrow<T> for Box<dyn Any + Send> {
  fn narrow(self) -> Result<T, Self> {
    self.downcast::<T>().map(|boxed| *boxed)
  }

  fn widen(value: T) -> Self {
    Box::new(value)
  }
}
