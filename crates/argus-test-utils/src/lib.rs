//! Shared fixtures for argus tests: lattice-law assertions, small CFAs, a
//! trivial component analysis and a scriptable refiner.

pub mod fixtures;
pub mod lattice;
mod refiner;
mod unit;

pub use refiner::ScriptedRefiner;
pub use unit::{UnitAnalysis, UnitState};
