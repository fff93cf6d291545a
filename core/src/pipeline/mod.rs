// sluice/src/pipeline/mod.rs

//! Builders, their shared configuration surface, and the bind engines.

pub mod definition;
pub mod parallel;
pub mod scope;

// Re-export the main builder types
pub use definition::{build, PipelineBuilder};
pub use parallel::{Choose, Forks, ParallelBuilder};
pub use scope::{Scope, Stage};
