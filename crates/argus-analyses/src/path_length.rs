use std::fmt;

use argus_cfa::{Cfa, EdgeRef, Location};
use argus_cpa::{
    AbstractState, Cpa, HasBottom, Lattice, Successors, TransferContext, TransferError,
};
use smallvec::smallvec;

/// Number of edges on the path that led to a state.
///
/// Ordered as a preorder in which all counts are equivalent: the count is
/// carried along for other components to read, but never separates two
/// states. Joins keep the larger count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathLength(pub u32);

impl PathLength {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PathLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Lattice for PathLength {
    fn join(&self, other: &Self) -> Self {
        (*self).max(*other)
    }

    fn is_subseteq(&self, _other: &Self) -> bool {
        true
    }
}

impl HasBottom for PathLength {
    fn bottom() -> Self {
        PathLength(0)
    }

    fn is_bottom(&self) -> bool {
        self.0 == 0
    }
}

impl AbstractState for PathLength {}

/// Counts edges along every explored path.
///
/// [`PathLength`] never separates states, so adding this component does not
/// make the exploration any finer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLengthAnalysis;

impl Cpa for PathLengthAnalysis {
    type State = PathLength;
    type Precision = ();

    fn name(&self) -> &str {
        "path-length"
    }

    fn initial_state(&self, _cfa: &Cfa, _entry: Location) -> PathLength {
        PathLength(0)
    }

    fn initial_precision(&self, _cfa: &Cfa, _entry: Location) {}

    fn successors(
        &self,
        state: &PathLength,
        _precision: &(),
        _edge: EdgeRef<'_>,
        _ctx: &TransferContext<'_>,
    ) -> Result<Successors<PathLength>, TransferError> {
        Ok(smallvec![PathLength(state.0.saturating_add(1))])
    }
}
