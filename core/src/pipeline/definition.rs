// sluice/src/pipeline/definition.rs

//! Contains the `PipelineBuilder<In, Out>` struct: the linear bind engine.

use crate::core::continuation::{continuation, Continuation, Wrapper};
use crate::pipeline::scope::{Scope, Stage};
use std::fmt;
use tracing::{event, instrument, Level};

/// Owns an ordered list of wrappers and folds them around a terminal handler.
///
/// A builder may be bound any number of times against different terminal
/// handlers. Each bind produces an independent pipeline; the wrapper list is
/// the only thing they share, and registering more wrappers afterwards does
/// not alter pipelines that were already bound.
pub struct PipelineBuilder<In, Out> {
  scope: Scope<In, Out>,
}

impl<In: 'static, Out: 'static> PipelineBuilder<In, Out> {
  pub fn new() -> Self {
    Self { scope: Scope::new() }
  }

  /// Runs `configure` against this builder's capability surface.
  pub fn configure<C>(mut self, configure: C) -> Self
  where
    C: FnOnce(&mut Scope<In, Out>),
  {
    configure(&mut self.scope);
    self
  }

  /// Number of registered wrappers.
  pub fn len(&self) -> usize {
    self.scope.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scope.is_empty()
  }

  /// Folds all registered wrappers around `terminal` into one composed pipeline.
  pub fn bind<H>(&self, terminal: H) -> Continuation<In, Out>
  where
    H: Fn(In) -> Out + Send + Sync + 'static,
  {
    self.bind_continuation(continuation(terminal))
  }

  /// `bind` for a terminal that is already a `Continuation` (for instance
  /// another bound pipeline).
  #[instrument(
        name = "PipelineBuilder::bind",
        skip_all,
        fields(
            input_type = %std::any::type_name::<In>(),
            output_type = %std::any::type_name::<Out>(),
            wrappers = self.scope.len(),
        )
    )]
  pub fn bind_continuation(&self, terminal: Continuation<In, Out>) -> Continuation<In, Out> {
    let pipeline = self.scope.fold(terminal);
    event!(Level::DEBUG, "Pipeline bound.");
    pipeline
  }
}

impl<In: 'static, Out: 'static> Default for PipelineBuilder<In, Out> {
  fn default() -> Self {
    Self::new()
  }
}

impl<In: 'static, Out: 'static> Stage<In, Out> for PipelineBuilder<In, Out> {
  fn register(&mut self, wrapper: Wrapper<In, Out>) {
    self.scope.register(wrapper);
  }
}

impl<In, Out> fmt::Debug for PipelineBuilder<In, Out> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PipelineBuilder").field("scope", &self.scope).finish()
  }
}

/// Configures a fresh builder and binds it against `terminal` in one go.
///
/// ```
/// use sluice::Linear;
///
/// let pipeline = sluice::build(|input: f64| input.floor() as i64, |p| {
///   p.use_with(|input, next| next(input + std::f64::consts::PI));
/// });
/// assert_eq!(pipeline(30.0), 33);
/// ```
pub fn build<In, Out, H, C>(terminal: H, configure: C) -> Continuation<In, Out>
where
  In: 'static,
  Out: 'static,
  H: Fn(In) -> Out + Send + Sync + 'static,
  C: FnOnce(&mut Scope<In, Out>),
{
  PipelineBuilder::new().configure(configure).bind(terminal)
}
