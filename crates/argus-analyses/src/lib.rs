//! Standard component analyses for the argus reachability engine.
//!
//! - [`ErrorLocationAnalysis`] decides which states violate the property.
//! - [`PathLengthAnalysis`] counts the edges along each explored path.
//! - [`ConditionsAnalysis`] stops exploration once a resource bound is hit.
//!
//! None of these track program data; combine them with a value analysis such
//! as `argus-interval` in a [`argus_cpa::CompositeAnalysis`].

mod conditions;
mod error_location;
mod path_length;

pub use conditions::{ConditionsAnalysis, ConditionsState};
pub use error_location::{ErrorLocationAnalysis, ErrorState};
pub use path_length::{PathLength, PathLengthAnalysis};
