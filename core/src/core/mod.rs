pub mod continuation;
pub mod deferred;
pub mod variant;

// Re-export key types for easier access from other sluice modules (and lib.rs)
pub use continuation::{continuation, Continuation, Nested, Wrapper};
pub use deferred::{Deferred, Eventual, Flavor, Immediate, Settled};
pub use variant::Narrow;
