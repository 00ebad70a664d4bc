//! Interval abstract domain and an interval value analysis for argus.
//!
//! [`Interval`] is the per-variable value lattice; [`IntervalState`] maps
//! variables to intervals; [`IntervalAnalysis`] plugs the domain into a
//! [`argus_cpa::CompositeAnalysis`] as one component.

mod analysis;
mod interval;
mod precision;
mod state;

pub use analysis::{IntervalAnalysis, assume, eval};
pub use interval::{Bound, Interval, interval_add, interval_mul, interval_neg, interval_sub};
pub use precision::IntervalPrecision;
pub use state::IntervalState;
