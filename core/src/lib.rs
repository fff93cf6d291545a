// src/lib.rs

//! Sluice: a composition engine for ordered handler chains.
//!
//! A pipeline is configured by registering wrappers (middleware) on a builder
//! and then bound against a terminal handler. Binding folds the wrappers
//! right-to-left into one callable: the first registered wrapper runs first
//! and decides whether, and with what, to call the rest of the chain.
//!
//! On top of that single primitive, the combinators provide:
//!  - Linear handlers (`use_with`, `run`, `process`, result observers).
//!  - Branching on a predicate, on the runtime variant of the input, or on a
//!    computed index (`when`, `when_type_is`, `switch`).
//!  - Nested pipelines over a different input/output pair (`use_nested`).
//!  - Fault capture and retry (`try_with`, `retry`).
//!  - Fan-out to independently bound forks (`in_parallel`).
//!  - A JSON-lines sink for asynchronous pipelines (`write_json`).
//!
//! Every combinator has a synchronous form, where the output is a plain value
//! or a `Result`, and a deferred form for pipelines whose output is a boxed
//! future. Both are the same code, parameterized by a [`Flavor`].

pub mod combinators;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod sink;

// --- Re-exports for the Public API ---

pub use crate::core::continuation::{continuation, Continuation, Nested, Wrapper};
pub use crate::core::deferred::{Deferred, Eventual, Flavor, Immediate, Settled};
pub use crate::core::variant::Narrow;

pub use crate::pipeline::definition::{build, PipelineBuilder};
pub use crate::pipeline::parallel::{Choose, Forks, ParallelBuilder};
pub use crate::pipeline::scope::{Scope, Stage};

pub use crate::combinators::{arm, Arm, Branching, FanOut, Faults, Linear, Nesting, RetryPolicy};
pub use crate::sink::{Appender, SinkExt};

pub use crate::error::{SluiceError, SluiceResult};

/// Everything needed to configure pipelines: the builders and every
/// combinator trait.
pub mod prelude {
  pub use crate::combinators::{arm, Arm, Branching, FanOut, Faults, Linear, Nesting, RetryPolicy};
  pub use crate::core::continuation::{continuation, Continuation};
  pub use crate::core::variant::Narrow;
  pub use crate::pipeline::{build, Forks, ParallelBuilder, PipelineBuilder, Scope, Stage};
  pub use crate::sink::{Appender, SinkExt};
  pub use crate::error::SluiceError;
}
