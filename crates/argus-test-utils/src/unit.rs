use argus_cfa::{Cfa, EdgeRef, Location};
use argus_cpa::{
    AbstractState, Cpa, HasBottom, HasTop, Lattice, Successors, TransferContext, TransferError,
};
use smallvec::smallvec;

/// The one-element lattice: carries no information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UnitState;

impl Lattice for UnitState {
    fn join(&self, _other: &Self) -> Self {
        UnitState
    }

    fn is_subseteq(&self, _other: &Self) -> bool {
        true
    }
}

impl HasBottom for UnitState {
    fn bottom() -> Self {
        UnitState
    }
}

impl HasTop for UnitState {
    fn top() -> Self {
        UnitState
    }
}

impl AbstractState for UnitState {}

/// A component that follows every edge and never distinguishes states.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitAnalysis;

impl Cpa for UnitAnalysis {
    type State = UnitState;
    type Precision = ();

    fn name(&self) -> &str {
        "unit"
    }

    fn initial_state(&self, _cfa: &Cfa, _entry: Location) -> UnitState {
        UnitState
    }

    fn initial_precision(&self, _cfa: &Cfa, _entry: Location) {}

    fn successors(
        &self,
        _state: &UnitState,
        _precision: &(),
        _edge: EdgeRef<'_>,
        _ctx: &TransferContext<'_>,
    ) -> Result<Successors<UnitState>, TransferError> {
        Ok(smallvec![UnitState])
    }
}
