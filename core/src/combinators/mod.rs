// sluice/src/combinators/mod.rs

//! Combinators over the capability surface.
//!
//! Each area is an extension trait blanket-implemented for every `Stage`, so
//! the same methods are available on builders and on the `Scope` handed to
//! configuration callbacks. Bring them into scope with `use sluice::prelude::*`.
//!
//! Combinators that only pick a continuation (`when`, `switch`, `use_nested`,
//! `in_parallel`, ...) work for any output type. Those that look at the
//! outcome (`process_result`, `try_with`, `retry`, and every `*_async`
//! variant) require the output to be `Deferred`: `Result<T, E>` for
//! synchronous pipelines, `BoxFuture<'static, Result<T, E>>` for asynchronous
//! ones.

pub mod branching;
pub mod fan_out;
pub mod fault;
pub mod linear;
pub mod nested;

pub use branching::{arm, Arm, Branching};
pub use fan_out::FanOut;
pub use fault::{Faults, RetryPolicy};
pub use linear::Linear;
pub use nested::Nesting;
