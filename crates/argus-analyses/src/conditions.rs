use argus_cfa::{Cfa, EdgeRef, Location};
use argus_cpa::{
    AbstractState, AdjustContext, Adjustment, Cpa, HasBottom, HasTop, Lattice, Successors,
    TransferContext, TransferError,
};
use log::debug;
use smallvec::smallvec;

use crate::PathLength;

/// The conditions component keeps no per-state information.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionsState;

impl Lattice for ConditionsState {
    fn join(&self, _other: &Self) -> Self {
        ConditionsState
    }

    fn is_subseteq(&self, _other: &Self) -> bool {
        true
    }
}

impl HasBottom for ConditionsState {
    fn bottom() -> Self {
        ConditionsState
    }
}

impl HasTop for ConditionsState {
    fn top() -> Self {
        ConditionsState
    }
}

impl AbstractState for ConditionsState {}

/// Resource bounds enforced during precision adjustment.
///
/// A successor that exceeds a bound is dropped and recorded as a cutoff, so a
/// run that hit any bound can no longer end SAFE. The path-length bound reads
/// the [`PathLength`] sibling and has no effect unless a
/// [`crate::PathLengthAnalysis`] is part of the composite.
#[derive(Debug, Clone, Default)]
pub struct ConditionsAnalysis {
    max_path_length: Option<u32>,
    max_reached: Option<usize>,
}

impl ConditionsAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop successors whose path is longer than `bound` edges.
    pub fn with_max_path_length(mut self, bound: u32) -> Self {
        self.max_path_length = Some(bound);
        self
    }

    /// Drop successors once the reached set holds `bound` live states.
    pub fn with_max_reached(mut self, bound: usize) -> Self {
        self.max_reached = Some(bound);
        self
    }

    fn exceeded(&self, ctx: &AdjustContext<'_>) -> Option<String> {
        if let (Some(max), Some(length)) = (self.max_path_length, ctx.state.get::<PathLength>()) {
            if length.get() > max {
                return Some(format!("path length {length} exceeds {max} at {}", ctx.location));
            }
        }
        if let Some(max) = self.max_reached {
            let size = ctx.reached.len();
            if size >= max {
                return Some(format!("reached set size {size} hit {max} at {}", ctx.location));
            }
        }
        None
    }
}

impl Cpa for ConditionsAnalysis {
    type State = ConditionsState;
    type Precision = ();

    fn name(&self) -> &str {
        "conditions"
    }

    fn initial_state(&self, _cfa: &Cfa, _entry: Location) -> ConditionsState {
        ConditionsState
    }

    fn initial_precision(&self, _cfa: &Cfa, _entry: Location) {}

    fn successors(
        &self,
        _state: &ConditionsState,
        _precision: &(),
        _edge: EdgeRef<'_>,
        _ctx: &TransferContext<'_>,
    ) -> Result<Successors<ConditionsState>, TransferError> {
        Ok(smallvec![ConditionsState])
    }

    fn adjust_precision(
        &self,
        _state: &ConditionsState,
        _precision: &(),
        ctx: &AdjustContext<'_>,
    ) -> Result<Adjustment<ConditionsState, ()>, TransferError> {
        match self.exceeded(ctx) {
            Some(reason) => {
                debug!("conditions: {reason}");
                Ok(Adjustment::cutoff(reason))
            }
            None => Ok(Adjustment::keep()),
        }
    }
}
