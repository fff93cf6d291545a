// sluice/src/combinators/nested.rs

//! `use_nested`: a sub-pipeline over a different input/output pair.
//!
//! Four converters bridge the two pairs:
//!  - `to_nested_input`: outer input -> nested input
//!  - `to_next_input`: nested input -> outer input, used when the nested
//!    pipeline hands control back to the rest of the outer pipeline
//!  - `from_next_output`: outer output -> nested output, the rest of the outer
//!    pipeline's result as the nested pipeline sees it
//!  - `from_nested_output`: nested output -> outer output
//!
//! The nested pipeline's tail is the outer continuation composed with the
//! middle two converters, so nested logic can fall through to the outer
//! pipeline without knowing the types differ.

use crate::core::continuation::{continuation, Continuation, Nested};
use crate::core::deferred::{Deferred, Flavor, Settled};
use crate::pipeline::scope::{Scope, Stage};
use std::sync::Arc;

pub trait Nesting<In: 'static, Out: 'static>: Stage<In, Out> {
  /// Spawns the nested pipeline from `configure` and wires it in.
  fn use_nested<In2, Out2, A, B, X, Y, C>(
    &mut self,
    to_nested_input: A,
    to_next_input: B,
    from_next_output: X,
    from_nested_output: Y,
    configure: C,
  ) where
    In2: 'static,
    Out2: 'static,
    A: Fn(In) -> In2 + Send + Sync + 'static,
    B: Fn(In2) -> In + Send + Sync + 'static,
    X: Fn(Out) -> Out2 + Send + Sync + 'static,
    Y: Fn(Out2) -> Out + Send + Sync + 'static,
    C: FnOnce(&mut Scope<In2, Out2>),
  {
    let nested = self.spawn(configure);
    self.use_nested_with(nested, to_nested_input, to_next_input, from_next_output, from_nested_output);
  }

  /// Wires in an already spawned nested pipeline.
  fn use_nested_with<In2, Out2, A, B, X, Y>(
    &mut self,
    nested: Nested<In2, Out2>,
    to_nested_input: A,
    to_next_input: B,
    from_next_output: X,
    from_nested_output: Y,
  ) where
    In2: 'static,
    Out2: 'static,
    A: Fn(In) -> In2 + Send + Sync + 'static,
    B: Fn(In2) -> In + Send + Sync + 'static,
    X: Fn(Out) -> Out2 + Send + Sync + 'static,
    Y: Fn(Out2) -> Out + Send + Sync + 'static,
  {
    let to_nested_input = Arc::new(to_nested_input);
    let to_next_input = Arc::new(to_next_input);
    let from_next_output = Arc::new(from_next_output);
    let from_nested_output = Arc::new(from_nested_output);
    self.wrap(move |next: Continuation<In, Out>| {
      let (to_next_input, from_next_output) = (Arc::clone(&to_next_input), Arc::clone(&from_next_output));
      let inner = nested(continuation(move |passed_out: In2| {
        from_next_output(next(to_next_input(passed_out)))
      }));

      let (to_nested_input, from_nested_output) = (Arc::clone(&to_nested_input), Arc::clone(&from_nested_output));
      continuation(move |input: In| from_nested_output(inner(to_nested_input(input))))
    });
  }

  /// Deferred `use_nested`: every converter yields a deferred value and the
  /// four conversions and two pipeline calls run strictly one after another.
  fn use_nested_async<In2, Out2, A, B, X, Y, C>(
    &mut self,
    to_nested_input: A,
    to_next_input: B,
    from_next_output: X,
    from_nested_output: Y,
    configure: C,
  ) where
    In: Send,
    Out: Deferred,
    In2: Send + 'static,
    Out2: Deferred<Flavor = Out::Flavor, Err = Out::Err>,
    A: Fn(In) -> Settled<Out, In2> + Send + Sync + 'static,
    B: Fn(In2) -> Settled<Out, In> + Send + Sync + 'static,
    X: Fn(Out::Ok) -> Settled<Out, Out2::Ok> + Send + Sync + 'static,
    Y: Fn(Out2::Ok) -> Settled<Out, Out::Ok> + Send + Sync + 'static,
    C: FnOnce(&mut Scope<In2, Out2>),
  {
    let nested = self.spawn(configure);
    self.use_nested_async_with(nested, to_nested_input, to_next_input, from_next_output, from_nested_output);
  }

  fn use_nested_async_with<In2, Out2, A, B, X, Y>(
    &mut self,
    nested: Nested<In2, Out2>,
    to_nested_input: A,
    to_next_input: B,
    from_next_output: X,
    from_nested_output: Y,
  ) where
    In: Send,
    Out: Deferred,
    In2: Send + 'static,
    Out2: Deferred<Flavor = Out::Flavor, Err = Out::Err>,
    A: Fn(In) -> Settled<Out, In2> + Send + Sync + 'static,
    B: Fn(In2) -> Settled<Out, In> + Send + Sync + 'static,
    X: Fn(Out::Ok) -> Settled<Out, Out2::Ok> + Send + Sync + 'static,
    Y: Fn(Out2::Ok) -> Settled<Out, Out::Ok> + Send + Sync + 'static,
  {
    let to_nested_input = Arc::new(to_nested_input);
    let to_next_input = Arc::new(to_next_input);
    let from_next_output = Arc::new(from_next_output);
    let from_nested_output = Arc::new(from_nested_output);
    self.wrap(move |next: Continuation<In, Out>| {
      let (to_next_input, from_next_output) = (Arc::clone(&to_next_input), Arc::clone(&from_next_output));
      let inner = nested(continuation(move |passed_out: In2| {
        let converted = to_next_input(passed_out);
        let (next, from_next_output) = (Arc::clone(&next), Arc::clone(&from_next_output));
        Out2::from_flavored(<Out::Flavor as Flavor>::and_then(converted, move |outer_input| {
          <Out::Flavor as Flavor>::and_then(next(outer_input).into_flavored(), move |outer_output| {
            from_next_output(outer_output)
          })
        }))
      }));

      let (to_nested_input, from_nested_output) = (Arc::clone(&to_nested_input), Arc::clone(&from_nested_output));
      continuation(move |input: In| {
        let converted = to_nested_input(input);
        let (inner, from_nested_output) = (Arc::clone(&inner), Arc::clone(&from_nested_output));
        Out::from_flavored(<Out::Flavor as Flavor>::and_then(converted, move |nested_input| {
          <Out::Flavor as Flavor>::and_then(inner(nested_input).into_flavored(), move |nested_output| {
            from_nested_output(nested_output)
          })
        }))
      })
    });
  }
}

impl<In: 'static, Out: 'static, S: Stage<In, Out>> Nesting<In, Out> for S {}
