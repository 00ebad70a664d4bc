use std::any::type_name;

use argus_cfa::{Cfa, EdgeRef, Location};
use smallvec::SmallVec;

use crate::{
    Action, AdjustContext, ComponentPrecision, ComponentState, Cpa, Lattice, MergeStrategy,
    StopStrategy, TransferContext, TransferError,
};

/// Adjustment of one component, with state and precision erased.
pub(crate) struct ErasedAdjustment {
    pub state: Option<ComponentState>,
    pub precision: Option<ComponentPrecision>,
    pub action: Action,
    pub cutoff: Option<String>,
}

/// Object-safe face of a [`Cpa`]. The composite resolves its component list
/// to a table of these once, at construction.
pub(crate) trait DynCpa {
    fn name(&self) -> &str;
    fn initial_state(&self, cfa: &Cfa, entry: Location) -> ComponentState;
    fn initial_precision(&self, cfa: &Cfa, entry: Location) -> ComponentPrecision;
    fn successors(
        &self,
        index: usize,
        state: &ComponentState,
        precision: &ComponentPrecision,
        edge: EdgeRef<'_>,
        ctx: &TransferContext<'_>,
    ) -> Result<SmallVec<[ComponentState; 2]>, TransferError>;
    fn merge_strategy(&self) -> MergeStrategy;
    fn stop_strategy(&self) -> StopStrategy;
    /// Fails if `state` does not have this component's state type.
    fn check_state(&self, index: usize, state: &ComponentState) -> Result<(), TransferError>;
    fn join(
        &self,
        index: usize,
        a: &ComponentState,
        b: &ComponentState,
    ) -> Result<ComponentState, TransferError>;
    fn widen(
        &self,
        index: usize,
        previous: &ComponentState,
        next: &ComponentState,
    ) -> Result<ComponentState, TransferError>;
    /// False for states of the wrong type.
    fn is_subseteq(&self, a: &ComponentState, b: &ComponentState) -> bool;
    fn adjust_precision(
        &self,
        index: usize,
        state: &ComponentState,
        precision: &ComponentPrecision,
        ctx: &AdjustContext<'_>,
    ) -> Result<ErasedAdjustment, TransferError>;
}

pub(crate) struct Component<C>(pub C);

impl<C: Cpa> Component<C> {
    /// Downcast a state stored at slot `index`.
    fn state<'s>(index: usize, state: &'s ComponentState) -> Result<&'s C::State, TransferError> {
        state
            .downcast_ref::<C::State>()
            .ok_or(TransferError::ComponentMismatch {
                index,
                expected: type_name::<C::State>(),
            })
    }

    fn precision<'p>(
        index: usize,
        precision: &'p ComponentPrecision,
    ) -> Result<&'p C::Precision, TransferError> {
        precision
            .downcast_ref::<C::Precision>()
            .ok_or(TransferError::ComponentMismatch {
                index,
                expected: type_name::<C::Precision>(),
            })
    }
}

impl<C: Cpa> DynCpa for Component<C> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn initial_state(&self, cfa: &Cfa, entry: Location) -> ComponentState {
        ComponentState::new(self.0.initial_state(cfa, entry))
    }

    fn initial_precision(&self, cfa: &Cfa, entry: Location) -> ComponentPrecision {
        ComponentPrecision::new(self.0.initial_precision(cfa, entry))
    }

    fn successors(
        &self,
        index: usize,
        state: &ComponentState,
        precision: &ComponentPrecision,
        edge: EdgeRef<'_>,
        ctx: &TransferContext<'_>,
    ) -> Result<SmallVec<[ComponentState; 2]>, TransferError> {
        let precision = Self::precision(index, precision)?;
        let successors = self
            .0
            .successors(Self::state(index, state)?, precision, edge, ctx)?;
        Ok(successors.into_iter().map(ComponentState::new).collect())
    }

    fn merge_strategy(&self) -> MergeStrategy {
        self.0.merge_strategy()
    }

    fn stop_strategy(&self) -> StopStrategy {
        self.0.stop_strategy()
    }

    fn check_state(&self, index: usize, state: &ComponentState) -> Result<(), TransferError> {
        Self::state(index, state).map(|_| ())
    }

    fn join(
        &self,
        index: usize,
        a: &ComponentState,
        b: &ComponentState,
    ) -> Result<ComponentState, TransferError> {
        let joined = Self::state(index, a)?.join(Self::state(index, b)?);
        Ok(ComponentState::new(joined))
    }

    fn widen(
        &self,
        index: usize,
        previous: &ComponentState,
        next: &ComponentState,
    ) -> Result<ComponentState, TransferError> {
        let widened = self
            .0
            .widen(Self::state(index, previous)?, Self::state(index, next)?);
        Ok(ComponentState::new(widened))
    }

    fn is_subseteq(&self, a: &ComponentState, b: &ComponentState) -> bool {
        match (a.downcast_ref::<C::State>(), b.downcast_ref::<C::State>()) {
            (Some(x), Some(y)) => a.ptr_eq(b) || x.is_subseteq(y),
            _ => false,
        }
    }

    fn adjust_precision(
        &self,
        index: usize,
        state: &ComponentState,
        precision: &ComponentPrecision,
        ctx: &AdjustContext<'_>,
    ) -> Result<ErasedAdjustment, TransferError> {
        let typed = Self::precision(index, precision)?;
        let adjustment = self
            .0
            .adjust_precision(Self::state(index, state)?, typed, ctx)?;
        Ok(ErasedAdjustment {
            state: adjustment.state.map(ComponentState::new),
            precision: adjustment.precision.map(ComponentPrecision::new),
            action: adjustment.action,
            cutoff: adjustment.cutoff,
        })
    }
}
