// sluice/src/combinators/fan_out.rs

use crate::core::continuation::Continuation;
use crate::pipeline::parallel::{Forks, ParallelBuilder};
use crate::pipeline::scope::{Scope, Stage};
use std::sync::Arc;

pub trait FanOut<In: 'static, Out: 'static>: Stage<In, Out> {
  /// Fans out to the wrappers registered by `configure`, each bound on its own
  /// against the rest of this pipeline. `choose` receives the input and the
  /// forks on every invocation and returns the single output.
  ///
  /// Every fork that falls through runs the rest of this pipeline, so a tail
  /// after `in_parallel` runs once per invoked fork.
  fn in_parallel<K, C>(&mut self, choose: K, configure: C)
  where
    K: Fn(In, Forks<In, Out>) -> Out + Send + Sync + 'static,
    C: FnOnce(&mut Scope<In, Out>),
  {
    let mut forks = Scope::new();
    configure(&mut forks);
    let fan = Arc::new(ParallelBuilder::from_scope(forks, choose));
    self.wrap(move |next: Continuation<In, Out>| fan.bind_continuation(next));
  }
}

impl<In: 'static, Out: 'static, S: Stage<In, Out>> FanOut<In, Out> for S {}
