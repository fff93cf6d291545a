// sluice/src/pipeline/scope.rs

//! The configuration-time capability surface.
//!
//! `Stage` is what configuration callbacks see: register a wrapper, spawn an
//! independent nested builder. Binding is deliberately absent, so a nested
//! configuration callback can never run the pipeline before configuration
//! completes. Only the party that created a `PipelineBuilder` or
//! `ParallelBuilder` can bind it.

use crate::core::continuation::{Continuation, Nested, Wrapper};
use std::fmt;
use std::sync::Arc;

/// Register wrappers and spawn nested builders.
///
/// Every combinator (see `crate::combinators`) is expressed through these two
/// operations, so they are available on any `Stage`: a `Scope` handed to a
/// configuration callback, a `PipelineBuilder`, or a `ParallelBuilder`.
pub trait Stage<In: 'static, Out: 'static> {
  /// Appends a wrapper. Registration order is outer-to-inner execution order.
  fn register(&mut self, wrapper: Wrapper<In, Out>);

  /// Appends a wrapper given as a closure.
  fn wrap<W>(&mut self, wrapper: W)
  where
    W: Fn(Continuation<In, Out>) -> Continuation<In, Out> + Send + Sync + 'static,
  {
    self.register(Box::new(wrapper));
  }

  /// Creates a fresh, independent builder for another input/output pair, runs
  /// `configure` against it and returns its bind function.
  ///
  /// The parent decides how to wire the returned handle; nothing is registered
  /// on `self`.
  fn spawn<In2, Out2, C>(&self, configure: C) -> Nested<In2, Out2>
  where
    In2: 'static,
    Out2: 'static,
    C: FnOnce(&mut Scope<In2, Out2>),
  {
    let mut scope = Scope::new();
    configure(&mut scope);
    scope.freeze()
  }
}

/// An ordered list of wrappers under configuration.
pub struct Scope<In, Out> {
  wrappers: Vec<Wrapper<In, Out>>,
}

impl<In: 'static, Out: 'static> Scope<In, Out> {
  pub(crate) fn new() -> Self {
    Self { wrappers: Vec::new() }
  }

  /// Number of registered wrappers.
  pub fn len(&self) -> usize {
    self.wrappers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.wrappers.is_empty()
  }

  /// Folds the wrappers right-to-left around `terminal`.
  ///
  /// The last registered wrapper sees `terminal` as its continuation; the
  /// first registered one is outermost. Each wrapper costs one call frame per
  /// invocation, so nesting depth grows with chain length.
  pub(crate) fn fold(&self, terminal: Continuation<In, Out>) -> Continuation<In, Out> {
    self.wrappers.iter().rev().fold(terminal, |next, wrapper| wrapper(next))
  }

  /// Binds every wrapper independently against the same `tail`, in
  /// registration order.
  pub(crate) fn fork(&self, tail: &Continuation<In, Out>) -> Vec<Continuation<In, Out>> {
    self.wrappers.iter().map(|wrapper| wrapper(Arc::clone(tail))).collect()
  }

  /// Freezes the wrapper list behind an opaque bind function.
  pub(crate) fn freeze(self) -> Nested<In, Out> {
    let frozen = Arc::new(self);
    Arc::new(move |tail: Continuation<In, Out>| frozen.fold(tail))
  }
}

impl<In: 'static, Out: 'static> Stage<In, Out> for Scope<In, Out> {
  fn register(&mut self, wrapper: Wrapper<In, Out>) {
    self.wrappers.push(wrapper);
  }
}

impl<In, Out> fmt::Debug for Scope<In, Out> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Scope")
      .field("input_type", &std::any::type_name::<In>())
      .field("output_type", &std::any::type_name::<Out>())
      .field("wrappers", &self.wrappers.len())
      .finish()
  }
}
