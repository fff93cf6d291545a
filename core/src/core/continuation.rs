// sluice/src/core/continuation.rs

//! Function types the engine folds together.

use std::sync::Arc;

/// Everything downstream of the current wrapper, as one callable.
///
/// The terminal handler is the innermost continuation. Continuations are
/// reference-counted so a wrapper can hand the same downstream to several
/// branches (or forks) without rebinding it.
pub type Continuation<In, Out> = Arc<dyn Fn(In) -> Out + Send + Sync>;

/// Takes the rest of the pipeline and returns a continuation that incorporates
/// its own logic. Called once per `bind`.
pub type Wrapper<In, Out> = Box<dyn Fn(Continuation<In, Out>) -> Continuation<In, Out> + Send + Sync>;

/// Opaque bind function of a spawned sub-pipeline.
///
/// Given a tail, returns the sub-pipeline bound against it. The sub-builder
/// itself is frozen inside the handle and is not reachable from the outside.
pub type Nested<In, Out> = Arc<dyn Fn(Continuation<In, Out>) -> Continuation<In, Out> + Send + Sync>;

/// Erases a closure into a `Continuation`.
pub fn continuation<In, Out, F>(f: F) -> Continuation<In, Out>
where
  F: Fn(In) -> Out + Send + Sync + 'static,
{
  Arc::new(f)
}
