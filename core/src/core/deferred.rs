// sluice/src/core/deferred.rs

//! Deferred values: "a result, possibly later".
//!
//! Combinators that must look at a continuation's outcome (result observers,
//! fault capture, retries, deferred predicates and converters) are written once
//! against [`Flavor`]. The synchronous specialization is [`Immediate`], whose
//! deferred values are plain `Result`s that are already settled. The
//! asynchronous one is [`Eventual`], whose deferred values are boxed futures.
//!
//! A pipeline picks its flavor through its output type: a pipeline producing
//! `Result<T, E>` is immediate, one producing `BoxFuture<'static, Result<T, E>>`
//! is eventual. [`Deferred`] maps the output type back to its flavor so the
//! flavor never has to be named at call sites.

use crate::error::SluiceError;
use futures::future::{self, BoxFuture, FutureExt};
use std::panic::{self, AssertUnwindSafe};

/// A family of deferred-value types sharing one production strategy.
pub trait Flavor: Send + Sync + 'static {
  /// A value of type `T` or a fault of type `E`, observed once settled.
  type Deferred<T: Send + 'static, E: Send + 'static>: Send + 'static;

  /// Wraps an already available result.
  fn resolved<T, E>(result: Result<T, E>) -> Self::Deferred<T, E>
  where
    T: Send + 'static,
    E: Send + 'static;

  /// Continues with `k` once `deferred` has settled.
  ///
  /// This is the only place a suspension may occur: `k` runs strictly after
  /// `deferred` completes and its own deferred value is awaited in turn.
  fn then<T, U, E, K>(deferred: Self::Deferred<T, E>, k: K) -> Self::Deferred<U, E>
  where
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
    K: FnOnce(Result<T, E>) -> Self::Deferred<U, E> + Send + 'static;

  /// Produces the deferred value from `k`, turning a panic raised while
  /// producing or settling it into a `SluiceError::HandlerPanicked` fault.
  fn capture<T, E, K>(k: K) -> Self::Deferred<T, E>
  where
    T: Send + 'static,
    E: From<SluiceError> + Send + 'static,
    K: FnOnce() -> Self::Deferred<T, E> + Send + 'static;

  /// Like [`Flavor::then`], but faults skip `k` and propagate unchanged.
  fn and_then<T, U, E, K>(deferred: Self::Deferred<T, E>, k: K) -> Self::Deferred<U, E>
  where
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
    K: FnOnce(T) -> Self::Deferred<U, E> + Send + 'static,
  {
    Self::then(deferred, move |outcome| match outcome {
      Ok(value) => k(value),
      Err(fault) => Self::resolved(Err(fault)),
    })
  }
}

/// Synchronous flavor. Every deferred value is already settled.
#[derive(Debug, Clone, Copy)]
pub enum Immediate {}

impl Flavor for Immediate {
  type Deferred<T: Send + 'static, E: Send + 'static> = Result<T, E>;

  fn resolved<T, E>(result: Result<T, E>) -> Result<T, E>
  where
    T: Send + 'static,
    E: Send + 'static,
  {
    result
  }

  fn then<T, U, E, K>(deferred: Result<T, E>, k: K) -> Result<U, E>
  where
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
    K: FnOnce(Result<T, E>) -> Result<U, E> + Send + 'static,
  {
    k(deferred)
  }

  fn capture<T, E, K>(k: K) -> Result<T, E>
  where
    T: Send + 'static,
    E: From<SluiceError> + Send + 'static,
    K: FnOnce() -> Result<T, E> + Send + 'static,
  {
    match panic::catch_unwind(AssertUnwindSafe(k)) {
      Ok(outcome) => outcome,
      Err(payload) => Err(E::from(SluiceError::panicked(payload))),
    }
  }
}

/// Asynchronous flavor backed by boxed `Send` futures.
#[derive(Debug, Clone, Copy)]
pub enum Eventual {}

impl Flavor for Eventual {
  type Deferred<T: Send + 'static, E: Send + 'static> = BoxFuture<'static, Result<T, E>>;

  fn resolved<T, E>(result: Result<T, E>) -> BoxFuture<'static, Result<T, E>>
  where
    T: Send + 'static,
    E: Send + 'static,
  {
    future::ready(result).boxed()
  }

  fn then<T, U, E, K>(deferred: BoxFuture<'static, Result<T, E>>, k: K) -> BoxFuture<'static, Result<U, E>>
  where
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
    K: FnOnce(Result<T, E>) -> BoxFuture<'static, Result<U, E>> + Send + 'static,
  {
    async move {
      let settled = deferred.await;
      k(settled).await
    }
    .boxed()
  }

  fn capture<T, E, K>(k: K) -> BoxFuture<'static, Result<T, E>>
  where
    T: Send + 'static,
    E: From<SluiceError> + Send + 'static,
    K: FnOnce() -> BoxFuture<'static, Result<T, E>> + Send + 'static,
  {
    async move {
      let pending = match panic::catch_unwind(AssertUnwindSafe(k)) {
        Ok(pending) => pending,
        Err(payload) => return Err(E::from(SluiceError::panicked(payload))),
      };
      match AssertUnwindSafe(pending).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(E::from(SluiceError::panicked(payload))),
      }
    }
    .boxed()
  }
}

/// An output type that is the deferred value of some [`Flavor`].
///
/// Implemented for `Result<T, E>` (immediate) and
/// `BoxFuture<'static, Result<T, E>>` (eventual). The conversions are
/// identities; they exist so generic code can move between the output type
/// and its flavor's family.
pub trait Deferred: Sized + Send + 'static {
  type Ok: Send + 'static;
  type Err: Send + 'static;
  type Flavor: Flavor;

  fn into_flavored(self) -> Settled<Self, Self::Ok>;

  fn from_flavored(deferred: Settled<Self, Self::Ok>) -> Self;
}

/// The deferred value of `D`'s flavor carrying a `T` (or `D`'s fault type).
pub type Settled<D, T> = <<D as Deferred>::Flavor as Flavor>::Deferred<T, <D as Deferred>::Err>;

impl<T: Send + 'static, E: Send + 'static> Deferred for Result<T, E> {
  type Ok = T;
  type Err = E;
  type Flavor = Immediate;

  fn into_flavored(self) -> Result<T, E> {
    self
  }

  fn from_flavored(deferred: Result<T, E>) -> Self {
    deferred
  }
}

impl<T: Send + 'static, E: Send + 'static> Deferred for BoxFuture<'static, Result<T, E>> {
  type Ok = T;
  type Err = E;
  type Flavor = Eventual;

  fn into_flavored(self) -> BoxFuture<'static, Result<T, E>> {
    self
  }

  fn from_flavored(deferred: BoxFuture<'static, Result<T, E>>) -> Self {
    deferred
  }
}
