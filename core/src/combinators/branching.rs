// sluice/src/combinators/branching.rs

//! Branching combinators: `when`, `when_type_is`, `when_type_matches`,
//! `switch`, and their deferred-decision variants.
//!
//! Every branch is a spawned sub-pipeline bound with the outer continuation as
//! its own tail, so a branch that does not short-circuit falls through to the
//! remainder of the outer pipeline.

use crate::core::continuation::{continuation, Continuation, Nested};
use crate::core::deferred::{Deferred, Flavor, Settled};
use crate::core::variant::Narrow;
use crate::error::fatal;
use crate::pipeline::scope::{Scope, Stage};
use std::sync::Arc;
use tracing::{event, Level};

/// Configuration callback for one `switch` arm.
pub type Arm<In, Out> = Box<dyn FnOnce(&mut Scope<In, Out>)>;

/// Boxes a configuration callback as a `switch` arm.
pub fn arm<In, Out, C>(configure: C) -> Arm<In, Out>
where
  C: FnOnce(&mut Scope<In, Out>) + 'static,
{
  Box::new(configure)
}

pub trait Branching<In: 'static, Out: 'static>: Stage<In, Out> {
  /// Runs the branch configured by `configure` when `predicate` holds,
  /// otherwise continues directly with the outer pipeline.
  fn when<P, C>(&mut self, predicate: P, configure: C)
  where
    P: Fn(&In) -> bool + Send + Sync + 'static,
    C: FnOnce(&mut Scope<In, Out>),
  {
    let branch = self.spawn(configure);
    let predicate = Arc::new(predicate);
    self.wrap(move |next: Continuation<In, Out>| {
      let taken = branch(Arc::clone(&next));
      let predicate = Arc::clone(&predicate);
      continuation(move |input: In| {
        if predicate(&input) {
          event!(Level::TRACE, "Branch taken.");
          taken(input)
        } else {
          next(input)
        }
      })
    });
  }

  /// `when` with a deferred predicate. The decision is made once the
  /// predicate's value settles; a fault from the predicate propagates and
  /// neither path runs.
  fn when_async<P, C>(&mut self, predicate: P, configure: C)
  where
    In: Send,
    Out: Deferred,
    P: Fn(&In) -> Settled<Out, bool> + Send + Sync + 'static,
    C: FnOnce(&mut Scope<In, Out>),
  {
    let branch = self.spawn(configure);
    let predicate = Arc::new(predicate);
    self.wrap(move |next: Continuation<In, Out>| {
      let taken = branch(Arc::clone(&next));
      let predicate = Arc::clone(&predicate);
      continuation(move |input: In| {
        let decision = predicate(&input);
        let (taken, next) = (Arc::clone(&taken), Arc::clone(&next));
        Out::from_flavored(<Out::Flavor as Flavor>::and_then(decision, move |holds| {
          let path = if holds { taken } else { next };
          path(input).into_flavored()
        }))
      })
    });
  }

  /// Runs the branch for inputs that narrow to `T`. Inside the branch the
  /// input is a `T`; falling through re-widens it for the outer pipeline.
  fn when_type_is<T, C>(&mut self, configure: C)
  where
    In: Narrow<T>,
    T: 'static,
    C: FnOnce(&mut Scope<T, Out>),
  {
    self.when_type_matches(|_value: &T| true, configure);
  }

  /// Runs the branch for inputs that narrow to `T` and satisfy `predicate`.
  fn when_type_matches<T, P, C>(&mut self, predicate: P, configure: C)
  where
    In: Narrow<T>,
    T: 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
    C: FnOnce(&mut Scope<T, Out>),
  {
    let branch: Nested<T, Out> = self.spawn(configure);
    let predicate = Arc::new(predicate);
    self.wrap(move |next: Continuation<In, Out>| {
      let widened = Arc::clone(&next);
      let taken = branch(continuation(move |value: T| widened(<In as Narrow<T>>::widen(value))));
      let predicate = Arc::clone(&predicate);
      continuation(move |input: In| match <In as Narrow<T>>::narrow(input) {
        Ok(value) if predicate(&value) => {
          event!(Level::TRACE, narrowed_to = %std::any::type_name::<T>(), "Branch taken.");
          taken(value)
        }
        Ok(value) => next(<In as Narrow<T>>::widen(value)),
        Err(input) => next(input),
      })
    });
  }

  /// Multi-way branch. `selector` returns the index of the arm to run, or
  /// `None` to continue directly with the outer pipeline.
  ///
  /// An index outside the configured arms is a fatal configuration error.
  fn switch<K, I>(&mut self, selector: K, arms: I)
  where
    K: Fn(&In) -> Option<usize> + Send + Sync + 'static,
    I: IntoIterator<Item = Arm<In, Out>>,
  {
    let branches: Arc<[Nested<In, Out>]> = arms.into_iter().map(|arm| self.spawn(arm)).collect();
    let selector = Arc::new(selector);
    self.wrap(move |next: Continuation<In, Out>| {
      let tails: Arc<[Continuation<In, Out>]> = branches.iter().map(|branch| branch(Arc::clone(&next))).collect();
      let selector = Arc::clone(&selector);
      continuation(move |input: In| {
        let clause = selector(&input);
        select(&tails, clause).unwrap_or(&next)(input)
      })
    });
  }

  /// `switch` with a deferred selector. The arm is picked once the selector's
  /// value settles.
  fn switch_async<K, I>(&mut self, selector: K, arms: I)
  where
    In: Send,
    Out: Deferred,
    K: Fn(&In) -> Settled<Out, Option<usize>> + Send + Sync + 'static,
    I: IntoIterator<Item = Arm<In, Out>>,
  {
    let branches: Arc<[Nested<In, Out>]> = arms.into_iter().map(|arm| self.spawn(arm)).collect();
    let selector = Arc::new(selector);
    self.wrap(move |next: Continuation<In, Out>| {
      let tails: Arc<[Continuation<In, Out>]> = branches.iter().map(|branch| branch(Arc::clone(&next))).collect();
      let selector = Arc::clone(&selector);
      continuation(move |input: In| {
        let clause = selector(&input);
        let (tails, next) = (Arc::clone(&tails), Arc::clone(&next));
        Out::from_flavored(<Out::Flavor as Flavor>::and_then(clause, move |clause| {
          select(&tails, clause).unwrap_or(&next)(input).into_flavored()
        }))
      })
    });
  }
}

impl<In: 'static, Out: 'static, S: Stage<In, Out>> Branching<In, Out> for S {}

/// Resolves a selector result to a branch tail. `None` means fall through.
fn select<In, Out>(tails: &[Continuation<In, Out>], clause: Option<usize>) -> Option<&Continuation<In, Out>> {
  let index = clause?;
  match tails.get(index) {
    Some(tail) => {
      event!(Level::TRACE, branch = index, "Switch arm selected.");
      Some(tail)
    }
    None => fatal(format!(
      "switch selector returned arm {} but only {} arms are configured",
      index,
      tails.len()
    )),
  }
}
