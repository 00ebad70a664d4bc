use argus_cfa::{Cfa, EdgeRef, Location};
use smallvec::SmallVec;

use crate::{
    AbstractState, CallStack, Lattice, Precision, ReachedSet, StateProjection, TransferError,
};

/// Successor states produced by one transfer; zero means "infeasible".
pub type Successors<S> = SmallVec<[S; 2]>;

/// How a fresh state is combined with an existing state at the same location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MergeStrategy {
    /// Keep states separate; the existing state is returned unchanged.
    #[default]
    Sep,
    /// Replace the existing state by the join of both.
    Join,
    /// Replace the existing state by `widen(existing, fresh)`.
    Widen,
}

/// Whether a component lets fresh states be covered at all.
///
/// Coverage itself is decided on the whole composite state, by a single
/// existing state or by the join of all of them (see
/// [`crate::CompositeStop`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopStrategy {
    /// Covered when the component state is below the covering one.
    #[default]
    Sep,
    /// Never covered; every state is explored.
    Never,
}

/// Whether exploration continues past a state after precision adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Break,
}

/// Result of [`Cpa::adjust_precision`].
#[derive(Debug, Clone)]
pub struct Adjustment<S, P> {
    pub state: Option<S>,
    pub precision: Option<P>,
    pub action: Action,
    /// Set when exploration was cut short for a reason other than soundness,
    /// which makes the final result incomplete.
    pub cutoff: Option<String>,
}

impl<S, P> Adjustment<S, P> {
    /// Leave state and precision untouched and continue.
    pub fn keep() -> Self {
        Self {
            state: None,
            precision: None,
            action: Action::Continue,
            cutoff: None,
        }
    }

    pub fn with_state(mut self, state: S) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_precision(mut self, precision: P) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Drop the state without losing soundness (it is known to be uninteresting).
    pub fn prune() -> Self {
        Self {
            action: Action::Break,
            ..Self::keep()
        }
    }

    /// Drop the state because a resource bound was hit. The verdict can no
    /// longer be SAFE.
    pub fn cutoff(reason: impl Into<String>) -> Self {
        Self {
            action: Action::Break,
            cutoff: Some(reason.into()),
            ..Self::keep()
        }
    }
}

/// What a component sees while computing successors.
#[derive(Clone, Copy)]
pub struct TransferContext<'a> {
    pub cfa: &'a Cfa,
    /// Call stack of the successor, after the edge's push or pop.
    pub call_stack: &'a CallStack,
    /// Sibling component states. Earlier components already hold their
    /// successor for this edge; later ones still hold the predecessor.
    pub siblings: StateProjection<'a>,
}

/// What a component sees while adjusting the precision of a fresh successor.
#[derive(Clone, Copy)]
pub struct AdjustContext<'a> {
    pub reached: &'a ReachedSet,
    pub location: Location,
    pub call_stack: &'a CallStack,
    /// The complete successor, including adjustments by earlier components.
    pub state: StateProjection<'a>,
}

/// A configurable program analysis: one abstract domain plus its operators.
///
/// Components are combined by [`crate::CompositeAnalysis`]; the engine never
/// sees a `Cpa` directly.
pub trait Cpa: 'static {
    type State: AbstractState;
    type Precision: Precision;

    fn name(&self) -> &str;

    fn initial_state(&self, cfa: &Cfa, entry: Location) -> Self::State;

    fn initial_precision(&self, cfa: &Cfa, entry: Location) -> Self::Precision;

    /// Abstract post of `state` along `edge`.
    fn successors(
        &self,
        state: &Self::State,
        precision: &Self::Precision,
        edge: EdgeRef<'_>,
        ctx: &TransferContext<'_>,
    ) -> Result<Successors<Self::State>, TransferError>;

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Sep
    }

    fn stop_strategy(&self) -> StopStrategy {
        StopStrategy::Sep
    }

    /// Over-approximating extrapolation used by [`MergeStrategy::Widen`].
    fn widen(&self, previous: &Self::State, next: &Self::State) -> Self::State {
        previous.join(next)
    }

    fn adjust_precision(
        &self,
        _state: &Self::State,
        _precision: &Self::Precision,
        _ctx: &AdjustContext<'_>,
    ) -> Result<Adjustment<Self::State, Self::Precision>, TransferError> {
        Ok(Adjustment::keep())
    }
}
