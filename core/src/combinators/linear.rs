// sluice/src/combinators/linear.rs

//! Linear combinators: `use_with`, `run`, `process`, and the result observers.
//!
//! All of them are sugar over `Stage::register`. `run` short-circuits; the
//! others always forward to the continuation. `process_result` and friends
//! observe faults but never swallow them.

use crate::core::continuation::{continuation, Continuation};
use crate::core::deferred::{Deferred, Flavor, Settled};
use crate::pipeline::scope::{Scope, Stage};
use std::sync::Arc;

pub trait Linear<In: 'static, Out: 'static>: Stage<In, Out> {
  /// Registers a handler that receives the input and the rest of the pipeline,
  /// and may or may not call it.
  fn use_with<H>(&mut self, handler: H)
  where
    H: Fn(In, &Continuation<In, Out>) -> Out + Send + Sync + 'static,
  {
    let handler = Arc::new(handler);
    self.wrap(move |next: Continuation<In, Out>| {
      let handler = Arc::clone(&handler);
      continuation(move |input: In| handler(input, &next))
    });
  }

  /// Terminates this path with `handler`. Anything registered after it on the
  /// same path never executes.
  fn run<H>(&mut self, handler: H)
  where
    H: Fn(In) -> Out + Send + Sync + 'static,
  {
    let handler: Continuation<In, Out> = continuation(handler);
    self.wrap(move |_next: Continuation<In, Out>| Arc::clone(&handler));
  }

  /// Terminates this path with a constant output.
  fn run_value(&mut self, value: Out)
  where
    Out: Clone + Send + Sync,
  {
    self.run(move |_input: In| value.clone());
  }

  /// Terminates this path with a nested pipeline over another input/output
  /// pair. The nested pipeline's own tail yields `Out2::default()`; `adapt`
  /// turns the bound nested pipeline into a handler for this one.
  fn run_nested<In2, Out2, A, C>(&mut self, adapt: A, configure: C)
  where
    In2: 'static,
    Out2: Default + 'static,
    A: Fn(Continuation<In2, Out2>) -> Continuation<In, Out> + Send + Sync + 'static,
    C: FnOnce(&mut Scope<In2, Out2>),
  {
    let nested = self.spawn(configure);
    self.wrap(move |_next: Continuation<In, Out>| {
      let inner = nested(continuation(|_input: In2| Out2::default()));
      adapt(inner)
    });
  }

  /// Performs a side effect on the input, then always forwards to the
  /// continuation.
  fn process<A>(&mut self, action: A)
  where
    A: Fn(&In) + Send + Sync + 'static,
  {
    let action = Arc::new(action);
    self.wrap(move |next: Continuation<In, Out>| {
      let action = Arc::clone(&action);
      continuation(move |input: In| {
        action(&input);
        next(input)
      })
    });
  }

  /// Deferred `process`: the continuation is invoked only after the action's
  /// deferred value settles. A fault from the action propagates and the
  /// continuation is not invoked.
  fn process_async<A>(&mut self, action: A)
  where
    In: Send,
    Out: Deferred,
    A: Fn(&In) -> Settled<Out, ()> + Send + Sync + 'static,
  {
    let action = Arc::new(action);
    self.wrap(move |next: Continuation<In, Out>| {
      let action = Arc::clone(&action);
      continuation(move |input: In| {
        let acted = action(&input);
        let next = Arc::clone(&next);
        Out::from_flavored(<Out::Flavor as Flavor>::and_then(acted, move |()| {
          next(input).into_flavored()
        }))
      })
    });
  }

  /// Observes the downstream outcome without changing it.
  fn process_output<S>(&mut self, on_success: S)
  where
    In: Clone + Send,
    Out: Deferred,
    S: Fn(&In, &Out::Ok) + Send + Sync + 'static,
  {
    self.process_result(on_success, |_input: &In, _fault: &Out::Err| {});
  }

  /// Invokes the continuation, then calls `on_success(input, output)` or
  /// `on_fault(input, fault)`. The output is returned unchanged and a fault
  /// is always re-raised: the observer cannot suppress it.
  fn process_result<S, F>(&mut self, on_success: S, on_fault: F)
  where
    In: Clone + Send,
    Out: Deferred,
    S: Fn(&In, &Out::Ok) + Send + Sync + 'static,
    F: Fn(&In, &Out::Err) + Send + Sync + 'static,
  {
    let on_success = Arc::new(on_success);
    let on_fault = Arc::new(on_fault);
    self.wrap(move |next: Continuation<In, Out>| {
      let (on_success, on_fault) = (Arc::clone(&on_success), Arc::clone(&on_fault));
      continuation(move |input: In| {
        let observed = input.clone();
        let (on_success, on_fault) = (Arc::clone(&on_success), Arc::clone(&on_fault));
        let pending = next(input).into_flavored();
        Out::from_flavored(<Out::Flavor as Flavor>::then(pending, move |outcome| {
          match &outcome {
            Ok(output) => on_success(&observed, output),
            Err(fault) => on_fault(&observed, fault),
          }
          <Out::Flavor as Flavor>::resolved(outcome)
        }))
      })
    });
  }

  /// Deferred `process_result`. `on_success` may replace the output before it
  /// is returned upstream. Any fault, from downstream or from `on_success`, is
  /// passed to `on_fault` and re-raised once `on_fault` settles, unless
  /// `on_fault` itself faults, in which case that fault replaces it.
  fn process_result_async<S, F>(&mut self, on_success: S, on_fault: F)
  where
    In: Clone + Send,
    Out: Deferred,
    S: Fn(&In, Out::Ok) -> Settled<Out, Out::Ok> + Send + Sync + 'static,
    F: Fn(&In, &Out::Err) -> Settled<Out, ()> + Send + Sync + 'static,
  {
    let on_success = Arc::new(on_success);
    let on_fault = Arc::new(on_fault);
    self.wrap(move |next: Continuation<In, Out>| {
      let (on_success, on_fault) = (Arc::clone(&on_success), Arc::clone(&on_fault));
      continuation(move |input: In| {
        let observed = input.clone();
        let (on_success, on_fault) = (Arc::clone(&on_success), Arc::clone(&on_fault));
        let pending = next(input).into_flavored();
        Out::from_flavored(<Out::Flavor as Flavor>::then(pending, move |outcome| {
          let replaced = match outcome {
            Ok(output) => on_success(&observed, output),
            Err(fault) => <Out::Flavor as Flavor>::resolved(Err(fault)),
          };
          <Out::Flavor as Flavor>::then(replaced, move |outcome| match outcome {
            Ok(output) => <Out::Flavor as Flavor>::resolved(Ok(output)),
            Err(fault) => {
              let observing = on_fault(&observed, &fault);
              <Out::Flavor as Flavor>::and_then(observing, move |()| {
                <Out::Flavor as Flavor>::resolved(Err(fault))
              })
            }
          })
        }))
      })
    });
  }

  /// Like `process_result_async`, but `on_success` only observes the output,
  /// which is returned unchanged once the observer settles.
  fn observe_result_async<S, F>(&mut self, on_success: S, on_fault: F)
  where
    In: Clone + Send,
    Out: Deferred,
    S: Fn(&In, &Out::Ok) -> Settled<Out, ()> + Send + Sync + 'static,
    F: Fn(&In, &Out::Err) -> Settled<Out, ()> + Send + Sync + 'static,
  {
    self.process_result_async(
      move |input: &In, output: Out::Ok| -> Settled<Out, Out::Ok> {
        let observing = on_success(input, &output);
        <Out::Flavor as Flavor>::and_then(observing, move |()| <Out::Flavor as Flavor>::resolved(Ok(output)))
      },
      on_fault,
    );
  }
}

impl<In: 'static, Out: 'static, S: Stage<In, Out>> Linear<In, Out> for S {}
