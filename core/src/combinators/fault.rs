// sluice/src/combinators/fault.rs

//! Fault capture (`try_with`) and retry.

use crate::core::continuation::{continuation, Continuation};
use crate::core::deferred::{Deferred, Flavor};
use crate::error::{fatal, SluiceError};
use crate::pipeline::scope::Stage;
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

/// How many times `retry` invokes the continuation, and which faults it retries.
pub struct RetryPolicy<E> {
  max_attempts: u32,
  should_retry: Arc<dyn Fn(&E, u32) -> bool + Send + Sync>,
}

impl<E: 'static> RetryPolicy<E> {
  /// Up to `max_attempts` invocations, retrying every fault.
  ///
  /// Zero attempts is a fatal configuration error.
  #[track_caller]
  pub fn new(max_attempts: u32) -> Self {
    if max_attempts == 0 {
      fatal("retry policy needs at least one attempt".to_string());
    }
    Self {
      max_attempts,
      should_retry: Arc::new(|_fault: &E, _attempt: u32| true),
    }
  }

  /// Retries only faults for which `predicate` holds.
  pub fn retry_if<P>(self, predicate: P) -> Self
  where
    P: Fn(&E) -> bool + Send + Sync + 'static,
  {
    self.retry_when(move |fault: &E, _attempt: u32| predicate(fault))
  }

  /// Retries only when `predicate(fault, attempt)` holds. `attempt` is the
  /// 1-based number of the attempt that just failed.
  pub fn retry_when<P>(mut self, predicate: P) -> Self
  where
    P: Fn(&E, u32) -> bool + Send + Sync + 'static,
  {
    self.should_retry = Arc::new(predicate);
    self
  }

  pub fn max_attempts(&self) -> u32 {
    self.max_attempts
  }
}

impl<E> Clone for RetryPolicy<E> {
  fn clone(&self) -> Self {
    Self {
      max_attempts: self.max_attempts,
      should_retry: Arc::clone(&self.should_retry),
    }
  }
}

impl<E> fmt::Debug for RetryPolicy<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RetryPolicy")
      .field("max_attempts", &self.max_attempts)
      .finish_non_exhaustive()
  }
}

pub trait Faults<In: 'static, Out: 'static>: Stage<In, Out> {
  /// Hands `handler` a continuation whose invocations always settle into the
  /// deferred output, with faults (including panics raised downstream) captured
  /// in it rather than unwinding through the caller. The handler decides
  /// whether to resolve a fault into an output or re-raise it.
  fn try_with<H>(&mut self, handler: H)
  where
    In: Send,
    Out: Deferred,
    Out::Err: From<SluiceError>,
    H: Fn(Continuation<In, Out>) -> Continuation<In, Out> + Send + Sync + 'static,
  {
    self.wrap(move |next: Continuation<In, Out>| {
      let captured = continuation(move |input: In| {
        let next = Arc::clone(&next);
        Out::from_flavored(<Out::Flavor as Flavor>::capture(move || next(input).into_flavored()))
      });
      handler(captured)
    });
  }

  /// Invokes the continuation up to `max_attempts` times, stopping at the
  /// first success. Each fault is offered to `should_retry`; once attempts run
  /// out or the predicate declines, the most recent fault propagates.
  #[track_caller]
  fn retry<P>(&mut self, max_attempts: u32, should_retry: P)
  where
    In: Clone + Send,
    Out: Deferred,
    Out::Err: From<SluiceError>,
    P: Fn(&Out::Err) -> bool + Send + Sync + 'static,
  {
    self.retry_with(RetryPolicy::new(max_attempts).retry_if(should_retry));
  }

  fn retry_with(&mut self, policy: RetryPolicy<Out::Err>)
  where
    In: Clone + Send,
    Out: Deferred,
    Out::Err: From<SluiceError>,
  {
    self.try_with(move |captured: Continuation<In, Out>| {
      let policy = policy.clone();
      continuation(move |input: In| attempt(Arc::clone(&captured), input, 1, policy.clone()))
    });
  }
}

impl<In: 'static, Out: 'static, S: Stage<In, Out>> Faults<In, Out> for S {}

/// Runs attempt number `attempt_no`, scheduling the next one from the settled
/// outcome if the policy allows.
fn attempt<In, Out>(next: Continuation<In, Out>, input: In, attempt_no: u32, policy: RetryPolicy<Out::Err>) -> Out
where
  In: Clone + Send + 'static,
  Out: Deferred,
{
  let pending = next(input.clone()).into_flavored();
  Out::from_flavored(<Out::Flavor as Flavor>::then(pending, move |outcome| match outcome {
    Ok(output) => <Out::Flavor as Flavor>::resolved(Ok(output)),
    Err(fault) if attempt_no < policy.max_attempts && (policy.should_retry)(&fault, attempt_no) => {
      event!(
        Level::WARN,
        attempt = attempt_no,
        max_attempts = policy.max_attempts,
        "Attempt failed, retrying."
      );
      attempt(next, input, attempt_no + 1, policy).into_flavored()
    }
    Err(fault) => {
      event!(Level::DEBUG, attempt = attempt_no, "Attempt failed, giving up.");
      <Out::Flavor as Flavor>::resolved(Err(fault))
    }
  }))
}
