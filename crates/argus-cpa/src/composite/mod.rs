//! The composite combinator: a product of component analyses run in lockstep
//! over one location and call-stack context.

mod component;
mod state;

use argus_cfa::{Cfa, EdgeKind, EdgeRef, Location};
use log::trace;
use smallvec::SmallVec;

pub use state::CompositeState;

use self::component::{Component, DynCpa};
use crate::{
    Action, AdjustContext, AnalysisError, CallFrame, ComponentPrecision, ComponentState,
    CompositePrecision, Cpa, MergeStrategy, ReachedSet, StateProjection, StopStrategy,
    Successors, TransferContext, TransferError,
};

/// How the composite decides coverage against the states already reached at
/// the same location and call stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompositeStop {
    /// Covered if one single existing state covers every component.
    #[default]
    Sep,
    /// Covered if one single state does, or else if the component-wise join
    /// of all candidates does.
    Join,
}

/// Outcome of the composite stop operator. Indices refer to the candidate
/// slice passed to [`CompositeAnalysis::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopDecision {
    Continue,
    CoveredBy(usize),
    CoveredByJoin(SmallVec<[usize; 4]>),
}

/// A successor after every component adjusted its precision.
#[derive(Debug, Clone)]
pub struct PrecisionAdjustment {
    pub state: CompositeState,
    pub precision: CompositePrecision,
    pub action: Action,
    pub cutoff: Option<String>,
}

/// The product of an ordered list of component analyses.
///
/// Component order is significant: during transfer and precision adjustment
/// component `i` observes the fresh results of components `0..i`.
pub struct CompositeAnalysis {
    components: Vec<Box<dyn DynCpa>>,
    stop: CompositeStop,
    max_call_depth: Option<usize>,
}

impl Default for CompositeAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeAnalysis {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
            stop: CompositeStop::default(),
            max_call_depth: None,
        }
    }

    /// Append a component analysis.
    pub fn with_component<C: Cpa>(mut self, cpa: C) -> Self {
        self.components.push(Box::new(Component(cpa)));
        self
    }

    pub fn with_stop(mut self, stop: CompositeStop) -> Self {
        self.stop = stop;
        self
    }

    /// Bound the call-stack depth; deeper calls fail the transfer.
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = Some(depth);
        self
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.name())
    }

    /// Index of the component called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name() == name)
    }

    pub fn initial_state(&self, cfa: &Cfa, entry: Location) -> Result<CompositeState, AnalysisError> {
        if self.components.is_empty() {
            return Err(AnalysisError::EmptyComposite);
        }
        let components = self
            .components
            .iter()
            .map(|c| c.initial_state(cfa, entry))
            .collect();
        Ok(CompositeState::new(entry, Default::default(), components))
    }

    pub fn initial_precision(&self, cfa: &Cfa, entry: Location) -> CompositePrecision {
        CompositePrecision::new(
            self.components
                .iter()
                .map(|c| c.initial_precision(cfa, entry))
                .collect(),
        )
    }

    /// Check that `state` holds one state per component, each of the
    /// component's state type.
    pub fn check_state(&self, state: &CompositeState) -> Result<(), TransferError> {
        let found = state.components().len();
        if found != self.components.len() {
            return Err(TransferError::ComponentMismatch {
                index: found.min(self.components.len()),
                expected: "one state per component",
            });
        }
        self.components
            .iter()
            .zip(state.components())
            .enumerate()
            .try_for_each(|(index, (c, s))| c.check_state(index, s))
    }

    /// Abstract post of `state` along `edge`.
    ///
    /// Components run in order; each one's successors are combined with every
    /// partial tuple produced so far. If any component has no successor the
    /// composite has none either.
    pub fn successors(
        &self,
        state: &CompositeState,
        precision: &CompositePrecision,
        edge: EdgeRef<'_>,
        cfa: &Cfa,
    ) -> Result<Successors<CompositeState>, TransferError> {
        self.check_state(state)?;
        let Some(call_stack) = self.successor_call_stack(state, edge)? else {
            trace!("{edge}: return does not match call stack {}", state.call_stack());
            return Ok(Successors::new());
        };

        let mut partial: Vec<Vec<ComponentState>> = vec![state.components().to_vec()];
        for (index, component) in self.components.iter().enumerate() {
            let component_precision = self.component_precision(precision, index)?;
            let mut next = Vec::with_capacity(partial.len());
            for tuple in &partial {
                let ctx = TransferContext {
                    cfa,
                    call_stack: &call_stack,
                    siblings: StateProjection::new(tuple),
                };
                let successors =
                    component.successors(index, &tuple[index], component_precision, edge, &ctx)?;
                for successor in successors {
                    let mut extended = tuple.clone();
                    extended[index] = successor;
                    next.push(extended);
                }
            }
            if next.is_empty() {
                trace!("{edge}: component '{}' has no successor", component.name());
                return Ok(Successors::new());
            }
            partial = next;
        }

        Ok(partial
            .into_iter()
            .map(|components| CompositeState::new(edge.target, call_stack.clone(), components))
            .collect())
    }

    /// The call stack after `edge`, or `None` if a return edge does not match
    /// the innermost frame.
    fn successor_call_stack(
        &self,
        state: &CompositeState,
        edge: EdgeRef<'_>,
    ) -> Result<Option<crate::CallStack>, TransferError> {
        let stack = state.call_stack();
        match edge.kind {
            EdgeKind::Call {
                callee,
                return_site,
                ..
            } => {
                let depth = stack.depth() + 1;
                if let Some(max) = self.max_call_depth {
                    if depth > max {
                        return Err(TransferError::CallDepthExceeded { depth, max });
                    }
                }
                Ok(Some(stack.push(CallFrame {
                    function: callee.clone(),
                    call_site: edge.source,
                    return_site: *return_site,
                })))
            }
            EdgeKind::Return { call_site, .. } => match stack.top() {
                Some(frame) if frame.call_site == *call_site && frame.return_site == edge.target => {
                    Ok(stack.pop())
                }
                _ => Ok(None),
            },
            _ => Ok(Some(stack.clone())),
        }
    }

    fn component_precision<'p>(
        &self,
        precision: &'p CompositePrecision,
        index: usize,
    ) -> Result<&'p ComponentPrecision, TransferError> {
        precision
            .component(index)
            .ok_or(TransferError::ComponentMismatch {
                index,
                expected: "a precision for every component",
            })
    }

    /// Merge `fresh` into `existing`, component by component according to each
    /// component's strategy. Returns `existing` unchanged when every
    /// component is SEP or the states are in different partitions.
    pub fn merge(
        &self,
        fresh: &CompositeState,
        existing: &CompositeState,
    ) -> Result<CompositeState, TransferError> {
        self.check_state(fresh)?;
        self.check_state(existing)?;
        if !fresh.same_partition(existing)
            || self
                .components
                .iter()
                .all(|c| c.merge_strategy() == MergeStrategy::Sep)
        {
            return Ok(existing.clone());
        }
        let components = self
            .components
            .iter()
            .zip(fresh.components().iter().zip(existing.components()))
            .enumerate()
            .map(|(index, (c, (new, old)))| match c.merge_strategy() {
                MergeStrategy::Sep => Ok(old.clone()),
                MergeStrategy::Join => c.join(index, new, old),
                MergeStrategy::Widen => c.widen(index, old, new),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompositeState::new(
            existing.location(),
            existing.call_stack().clone(),
            components,
        ))
    }

    /// Component-wise order on states of the same partition. States that do
    /// not fit this composite are unordered.
    pub fn is_less_or_equal(&self, a: &CompositeState, b: &CompositeState) -> bool {
        a.same_partition(b)
            && a.components().len() == self.components.len()
            && b.components().len() == self.components.len()
            && self
                .components
                .iter()
                .zip(a.components().iter().zip(b.components()))
                .all(|(c, (x, y))| c.is_subseteq(x, y))
    }

    /// Whether `candidate` covers `state`: `state` is below it and no
    /// component has [`StopStrategy::Never`].
    pub fn is_covered_by(&self, state: &CompositeState, candidate: &CompositeState) -> bool {
        self.components
            .iter()
            .all(|c| c.stop_strategy() != StopStrategy::Never)
            && self.is_less_or_equal(state, candidate)
    }

    /// Component-wise join of `states`. `None` if there are none, or if they
    /// are not all from one partition of this composite.
    pub fn join_states(&self, states: &[&CompositeState]) -> Option<CompositeState> {
        let (first, rest) = states.split_first()?;
        self.check_state(first).ok()?;
        rest.iter().try_fold((*first).clone(), |acc, next| {
            if !acc.same_partition(next) || self.check_state(next).is_err() {
                return None;
            }
            let components = self
                .components
                .iter()
                .zip(acc.components().iter().zip(next.components()))
                .enumerate()
                .map(|(index, (c, (x, y)))| c.join(index, x, y))
                .collect::<Result<Vec<_>, _>>()
                .ok()?;
            Some(CompositeState::new(
                acc.location(),
                acc.call_stack().clone(),
                components,
            ))
        })
    }

    /// Decide whether `state` is already covered by `candidates`.
    ///
    /// Candidates from a different partition never cover. Under
    /// [`CompositeStop::Join`] a single covering candidate is still preferred,
    /// so that coverage points at one node whenever possible.
    pub fn stop(&self, state: &CompositeState, candidates: &[&CompositeState]) -> StopDecision {
        if let Some(index) = candidates.iter().position(|c| self.is_covered_by(state, c)) {
            return StopDecision::CoveredBy(index);
        }
        if self.stop == CompositeStop::Sep {
            return StopDecision::Continue;
        }

        let (indices, partition): (SmallVec<[usize; 4]>, Vec<&CompositeState>) = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| state.same_partition(c))
            .map(|(i, c)| (i, *c))
            .unzip();
        match self.join_states(&partition) {
            Some(joined) if self.is_covered_by(state, &joined) => {
                StopDecision::CoveredByJoin(indices)
            }
            _ => StopDecision::Continue,
        }
    }

    /// Run every component's precision adjustment on a fresh successor.
    ///
    /// Component `i` sees the successor as adjusted by components `0..i`. The
    /// first BREAK stops the remaining adjustments.
    pub fn adjust_precision(
        &self,
        state: CompositeState,
        precision: &CompositePrecision,
        reached: &ReachedSet,
    ) -> Result<PrecisionAdjustment, TransferError> {
        self.check_state(&state)?;
        let mut components = state.components().to_vec();
        let mut precisions: Option<Vec<ComponentPrecision>> = None;
        let mut changed = false;
        let mut result = (Action::Continue, None);

        for (index, component) in self.components.iter().enumerate() {
            let current = match &precisions {
                Some(p) => &p[index],
                None => self.component_precision(precision, index)?,
            };
            let ctx = AdjustContext {
                reached,
                location: state.location(),
                call_stack: state.call_stack(),
                state: StateProjection::new(&components),
            };
            let adjustment = component.adjust_precision(index, &components[index], current, &ctx)?;
            if let Some(new_state) = adjustment.state {
                components[index] = new_state;
                changed = true;
            }
            if let Some(new_precision) = adjustment.precision {
                precisions.get_or_insert_with(|| precision.components().to_vec())[index] =
                    new_precision;
            }
            if adjustment.action == Action::Break {
                trace!(
                    "component '{}' stopped exploration at {}",
                    component.name(),
                    state.location()
                );
                result = (Action::Break, adjustment.cutoff);
                break;
            }
        }

        let state = if changed {
            CompositeState::new(state.location(), state.call_stack().clone(), components)
        } else {
            state
        };
        let precision = match precisions {
            Some(p) => CompositePrecision::new(p),
            None => precision.clone(),
        };
        let (action, cutoff) = result;
        Ok(PrecisionAdjustment {
            state,
            precision,
            action,
            cutoff,
        })
    }
}
