//! argus: configurable program analysis over control-flow automata.
//!
//! This crate only re-exports the workspace members. Start with
//! [`cpa::Verifier`] to check a [`cfa::Cfa`] with a composite analysis.

pub use argus_analyses as analyses;
pub use argus_cfa as cfa;
pub use argus_cpa as cpa;
pub use argus_interval as interval;

pub mod prelude {
    pub use argus_analyses::*;
    pub use argus_cfa::*;
    pub use argus_cpa::*;
    pub use argus_interval::*;
}
