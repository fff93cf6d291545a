// sluice/src/pipeline/parallel.rs

//! The fan-out/fan-in engine.
//!
//! `ParallelBuilder` exposes the same configuration surface as the linear
//! builder but binds differently: every registered wrapper is bound on its own
//! against the shared tail, producing an ordered set of forks. A caller
//! supplied `choose` function receives the input and the forks and decides
//! which to run, how to combine their outputs, and which single output to
//! return.
//!
//! The engine adds no scheduling of its own. Running forks concurrently,
//! waiting on the first to finish, or signalling between forks is entirely up
//! to `choose` and the forks. Forks with a mutual dependency that `choose`
//! invokes one after another will never complete.

use crate::core::continuation::{continuation, Continuation, Wrapper};
use crate::pipeline::scope::{Scope, Stage};
use std::fmt;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// The caller-supplied fan-in policy.
pub type Choose<In, Out> = Arc<dyn Fn(In, Forks<In, Out>) -> Out + Send + Sync>;

/// Wrappers bound independently to the same tail, in registration order.
pub struct Forks<In, Out> {
  forks: Arc<[Continuation<In, Out>]>,
}

impl<In, Out> Forks<In, Out> {
  pub(crate) fn new(forks: Vec<Continuation<In, Out>>) -> Self {
    Self { forks: forks.into() }
  }

  pub fn len(&self) -> usize {
    self.forks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.forks.is_empty()
  }

  /// The fork at `index`, if there is one.
  pub fn get(&self, index: usize) -> Option<&Continuation<In, Out>> {
    self.forks.get(index)
  }

  /// Invokes a single fork. Returns `None` when `index` is out of range.
  pub fn invoke(&self, index: usize, input: In) -> Option<Out> {
    self.forks.get(index).map(|fork| fork(input))
  }

  pub fn iter(&self) -> impl Iterator<Item = &Continuation<In, Out>> {
    self.forks.iter()
  }

  /// Invokes every fork with a copy of `input` and returns their outputs in
  /// fork order.
  ///
  /// Over eventual outputs this only creates the futures; whether they then
  /// run concurrently or one after another is decided by how the caller
  /// awaits them.
  pub fn invoke_all(&self, input: In) -> Vec<Out>
  where
    In: Clone,
  {
    self.forks.iter().map(|fork| fork(input.clone())).collect()
  }
}

impl<In, Out> Clone for Forks<In, Out> {
  fn clone(&self) -> Self {
    Self {
      forks: Arc::clone(&self.forks),
    }
  }
}

impl<In, Out> fmt::Debug for Forks<In, Out> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Forks").field("len", &self.forks.len()).finish()
  }
}

/// Builder whose wrappers become parallel forks rather than a chain.
pub struct ParallelBuilder<In, Out> {
  scope: Scope<In, Out>,
  choose: Choose<In, Out>,
}

impl<In: 'static, Out: 'static> ParallelBuilder<In, Out> {
  pub fn new<K>(choose: K) -> Self
  where
    K: Fn(In, Forks<In, Out>) -> Out + Send + Sync + 'static,
  {
    Self::from_scope(Scope::new(), choose)
  }

  pub(crate) fn from_scope<K>(scope: Scope<In, Out>, choose: K) -> Self
  where
    K: Fn(In, Forks<In, Out>) -> Out + Send + Sync + 'static,
  {
    Self {
      scope,
      choose: Arc::new(choose),
    }
  }

  /// Number of registered forks.
  pub fn len(&self) -> usize {
    self.scope.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scope.is_empty()
  }

  pub fn bind<H>(&self, terminal: H) -> Continuation<In, Out>
  where
    H: Fn(In) -> Out + Send + Sync + 'static,
  {
    self.bind_continuation(continuation(terminal))
  }

  /// Binds each wrapper against `tail` and hands the resulting forks to
  /// `choose` on every invocation.
  #[instrument(
        name = "ParallelBuilder::bind",
        skip_all,
        fields(
            input_type = %std::any::type_name::<In>(),
            output_type = %std::any::type_name::<Out>(),
            forks = self.scope.len(),
        )
    )]
  pub fn bind_continuation(&self, tail: Continuation<In, Out>) -> Continuation<In, Out> {
    let forks = Forks::new(self.scope.fork(&tail));
    let choose = Arc::clone(&self.choose);
    event!(Level::DEBUG, "Parallel forks bound.");
    continuation(move |input: In| choose(input, forks.clone()))
  }
}

impl<In: 'static, Out: 'static> Stage<In, Out> for ParallelBuilder<In, Out> {
  fn register(&mut self, wrapper: Wrapper<In, Out>) {
    self.scope.register(wrapper);
  }
}

impl<In, Out> fmt::Debug for ParallelBuilder<In, Out> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ParallelBuilder").field("scope", &self.scope).finish()
  }
}
